//! # keygate-auth
//!
//! Credential verification and the token protocol for Keygate.
//!
//! ## Modules
//!
//! - `jwt` — signed access token creation and validation
//! - `password` — Argon2id hashing and password policy enforcement
//! - `otp` — one-time code generation
//! - `tokens` — the rotating dual-token protocol (issue, refresh, revoke)
//! - `verifier` — registration, challenge, sign-in, and reset flows
//! - `notify` — out-of-band delivery of one-time codes

pub mod jwt;
pub mod notify;
pub mod otp;
pub mod password;
pub mod tokens;
pub mod verifier;

pub use jwt::{AccessClaims, JwtDecoder, JwtEncoder};
pub use notify::{CapturingNotifier, LogNotifier};
pub use password::{PasswordHasher, PasswordPolicy};
pub use tokens::{AuthContext, IssuedTokens, TokenService};
pub use verifier::{CredentialVerifier, SigninResult};
