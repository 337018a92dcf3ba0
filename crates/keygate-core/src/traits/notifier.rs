//! Outbound notification collaborator.

use async_trait::async_trait;

use crate::result::AppResult;

/// Fire-once delivery of an out-of-band message (e-mail in practice).
///
/// The OTP flows call this with the plaintext code. Delivery guarantees
/// (retry, provider fallback) belong to the implementation; the engine
/// treats a send as fire-once and a failure during signup leaves the
/// identity created but unverified.
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug + 'static {
    /// Send one message to one address.
    async fn send(&self, address: &str, subject: &str, body: &str) -> AppResult<()>;
}
