//! Notifier implementations.
//!
//! Production deployments plug a real mail sender in behind the
//! [`Notifier`] trait; the implementations here cover local operation
//! and tests.

use std::sync::Mutex;

use async_trait::async_trait;

use keygate_core::result::AppResult;
use keygate_core::traits::Notifier;

/// Notifier that writes message metadata to the log.
///
/// The body is withheld from the log because it carries the plaintext
/// one-time code.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl LogNotifier {
    /// Creates a new log notifier.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, address: &str, subject: &str, body: &str) -> AppResult<()> {
        tracing::info!(
            address,
            subject,
            body_bytes = body.len(),
            "Outbound notification"
        );
        Ok(())
    }
}

/// A message captured by [`CapturingNotifier`].
#[derive(Debug, Clone)]
pub struct CapturedMessage {
    /// Recipient address.
    pub address: String,
    /// Message subject.
    pub subject: String,
    /// Full message body, including any one-time code.
    pub body: String,
}

/// Notifier that records every message in memory (for testing).
#[derive(Debug, Default)]
pub struct CapturingNotifier {
    messages: Mutex<Vec<CapturedMessage>>,
}

impl CapturingNotifier {
    /// Creates an empty capturing notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages sent so far, oldest first.
    pub fn messages(&self) -> Vec<CapturedMessage> {
        self.messages.lock().expect("notifier lock poisoned").clone()
    }

    /// The most recent message sent to `address`, if any.
    pub fn last_for(&self, address: &str) -> Option<CapturedMessage> {
        self.messages
            .lock()
            .expect("notifier lock poisoned")
            .iter()
            .rev()
            .find(|m| m.address == address)
            .cloned()
    }

    /// Extract the first six-digit run from the most recent message to
    /// `address`. Convenience for tests that need the delivered code.
    pub fn last_code_for(&self, address: &str) -> Option<String> {
        let message = self.last_for(address)?;
        let mut run = String::new();
        for c in message.body.chars() {
            if c.is_ascii_digit() {
                run.push(c);
                if run.len() == crate::otp::OTP_LENGTH {
                    return Some(run);
                }
            } else {
                run.clear();
            }
        }
        None
    }
}

#[async_trait]
impl Notifier for CapturingNotifier {
    async fn send(&self, address: &str, subject: &str, body: &str) -> AppResult<()> {
        self.messages
            .lock()
            .expect("notifier lock poisoned")
            .push(CapturedMessage {
                address: address.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            });
        Ok(())
    }
}
