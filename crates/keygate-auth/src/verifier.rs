//! Registration, challenge, sign-in, and password reset flows.
//!
//! One identity carries at most one pending one-time-code challenge.
//! Verification and password reset ride the same challenge mechanism;
//! the recorded verification instant is what authorizes a reset.

use std::sync::Arc;

use chrono::Duration;
use tracing::{info, warn};

use keygate_core::config::auth::AuthConfig;
use keygate_core::error::AppError;
use keygate_core::result::AppResult;
use keygate_core::traits::{Clock, Notifier};
use keygate_entity::identity::{CreateIdentity, Identity, IdentityProjection, normalize_email};
use keygate_entity::session::Platform;
use keygate_store::{IdentityStore, SessionStore};

use crate::otp;
use crate::password::{PasswordHasher, PasswordPolicy};
use crate::tokens::{IssuedTokens, TokenService};

const VERIFY_SUBJECT: &str = "Your verification code";
const RESET_SUBJECT: &str = "Your password reset code";

/// Result of a successful sign-in.
#[derive(Debug, Clone)]
pub struct SigninResult {
    /// The authenticated identity, projected for the response body.
    pub identity: IdentityProjection,
    /// The issued token pair.
    pub tokens: IssuedTokens,
}

/// Drives the identity lifecycle: register, verify, sign in, reset.
#[derive(Clone)]
pub struct CredentialVerifier {
    identities: Arc<dyn IdentityStore>,
    sessions: Arc<dyn SessionStore>,
    tokens: Arc<TokenService>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    hasher: PasswordHasher,
    policy: PasswordPolicy,
    otp_ttl: Duration,
    otp_max_attempts: i32,
    reset_window: Duration,
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("otp_ttl", &self.otp_ttl)
            .field("otp_max_attempts", &self.otp_max_attempts)
            .field("reset_window", &self.reset_window)
            .finish()
    }
}

impl CredentialVerifier {
    /// Creates a new verifier with its collaborators.
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        sessions: Arc<dyn SessionStore>,
        tokens: Arc<TokenService>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            identities,
            sessions,
            tokens,
            notifier,
            clock,
            hasher: PasswordHasher::new(),
            policy: PasswordPolicy::new(config),
            otp_ttl: Duration::seconds(config.otp_ttl_seconds as i64),
            otp_max_attempts: config.otp_max_attempts as i32,
            reset_window: Duration::seconds(config.reset_window_seconds as i64),
        }
    }

    /// Registers a new identity and arms its verification challenge.
    ///
    /// The identity starts unverified. A notification failure is logged
    /// and swallowed; the resend flow is the recovery path.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> AppResult<Identity> {
        let email = normalize_email(email);
        self.policy.validate(password, &[name, &email])?;

        let identity = self
            .identities
            .create(
                CreateIdentity {
                    name: name.trim().to_string(),
                    email,
                    password_hash: self.hasher.hash(password)?,
                },
                self.clock.now(),
            )
            .await?;

        info!(identity_id = %identity.id, "Registered new identity");
        self.arm_challenge(identity, VERIFY_SUBJECT).await
    }

    /// Verifies a one-time code against the pending challenge.
    ///
    /// On success the challenge is cleared, the identity is marked
    /// verified, and the verification instant is recorded; that instant
    /// is what later authorizes a password reset. A second call after
    /// success finds no challenge pending.
    pub async fn verify_otp(&self, email: &str, code: &str) -> AppResult<Identity> {
        let email = normalize_email(email);
        let now = self.clock.now();
        let mut identity = self
            .identities
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::not_found("No account for that address"))?;

        let Some(otp_hash) = identity.otp_hash.clone() else {
            return Err(AppError::otp_no_challenge("No verification code is pending"));
        };

        if identity.challenge_expired(now) {
            clear_challenge(&mut identity);
            identity.updated_at = now;
            self.identities.update(&identity).await?;
            return Err(AppError::otp_expired("The verification code has expired"));
        }

        if !self.hasher.verify(code, &otp_hash)? {
            identity.otp_attempts += 1;
            if identity.otp_attempts >= self.otp_max_attempts {
                warn!(
                    identity_id = %identity.id,
                    attempts = identity.otp_attempts,
                    "Challenge destroyed after repeated mismatches"
                );
                clear_challenge(&mut identity);
            }
            identity.updated_at = now;
            self.identities.update(&identity).await?;
            return Err(AppError::otp_mismatch("The verification code does not match"));
        }

        clear_challenge(&mut identity);
        identity.verified = true;
        identity.otp_verified_at = Some(now);
        identity.updated_at = now;
        let identity = self.identities.update(&identity).await?;

        info!(identity_id = %identity.id, "One-time code verified");
        Ok(identity)
    }

    /// Replaces the pending verification challenge with a fresh one.
    ///
    /// Only meaningful while the email is unverified; the reset flow
    /// re-arms through `forgot_password` instead.
    pub async fn resend_otp(&self, email: &str) -> AppResult<()> {
        let email = normalize_email(email);
        let identity = self
            .identities
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::not_found("No account for that address"))?;

        if identity.verified {
            return Err(AppError::validation("Email is already verified"));
        }

        self.arm_challenge(identity, VERIFY_SUBJECT).await?;
        Ok(())
    }

    /// Starts the password reset flow by arming a fresh challenge.
    ///
    /// Arming wipes any previously recorded verification instant, so a
    /// reset always requires verifying the newest code.
    pub async fn forgot_password(&self, email: &str) -> AppResult<()> {
        let email = normalize_email(email);
        let identity = self
            .identities
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::not_found("No account for that address"))?;

        self.arm_challenge(identity, RESET_SUBJECT).await?;
        Ok(())
    }

    /// Completes a password reset.
    ///
    /// Requires a successful `verify_otp` within the reset window. The
    /// new password-change instant is back-dated one second so an access
    /// token minted in the same second still compares stale. Every
    /// session record the identity owns is revoked; the verification
    /// instant is consumed, so a second reset needs a fresh code.
    pub async fn reset_password(&self, email: &str, new_password: &str) -> AppResult<Identity> {
        let email = normalize_email(email);
        let now = self.clock.now();
        let mut identity = self
            .identities
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::not_found("No account for that address"))?;

        if !identity.reset_ready(now, self.reset_window) {
            return Err(AppError::forbidden(
                "Password reset requires a recent code verification",
            ));
        }

        self.policy
            .validate(new_password, &[&identity.name, &identity.email])?;

        identity.password_hash = self.hasher.hash(new_password)?;
        identity.password_changed_at = Some(now - Duration::seconds(1));
        identity.otp_verified_at = None;
        clear_challenge(&mut identity);
        identity.updated_at = now;
        let identity = self.identities.update(&identity).await?;

        let revoked = self.sessions.remove_for_identity(identity.id, None).await?;
        info!(identity_id = %identity.id, revoked, "Password reset completed");
        Ok(identity)
    }

    /// Signs an identity in with email and password.
    ///
    /// Unknown email and wrong password produce the same error, so the
    /// endpoint cannot be used to probe which addresses are registered.
    pub async fn signin(
        &self,
        email: &str,
        password: &str,
        platform: Platform,
    ) -> AppResult<SigninResult> {
        let email = normalize_email(email);
        let identity = self
            .identities
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::invalid_credentials("Unknown email or wrong password"))?;

        if !self.hasher.verify(password, &identity.password_hash)? {
            warn!(identity_id = %identity.id, "Sign-in with wrong password");
            return Err(AppError::invalid_credentials("Unknown email or wrong password"));
        }

        if !identity.verified {
            return Err(AppError::forbidden("Email address has not been verified"));
        }

        let tokens = self.tokens.issue(&identity, platform).await?;
        info!(
            identity_id = %identity.id,
            session_id = %tokens.session.id,
            "Sign-in successful"
        );

        Ok(SigninResult {
            identity: IdentityProjection::from(&identity),
            tokens,
        })
    }

    /// Arms a fresh challenge on the identity and sends the code.
    ///
    /// Overwrites any pending challenge, resets the attempt counter, and
    /// wipes the recorded verification instant.
    async fn arm_challenge(&self, mut identity: Identity, subject: &str) -> AppResult<Identity> {
        let now = self.clock.now();
        let code = otp::generate_code();

        identity.otp_hash = Some(self.hasher.hash(&code)?);
        identity.otp_expires_at = Some(now + self.otp_ttl);
        identity.otp_attempts = 0;
        identity.otp_verified_at = None;
        identity.updated_at = now;
        let identity = self.identities.update(&identity).await?;

        let body = format!(
            "Hi {},\n\nYour one-time code is {}. It expires in {} minutes.\n",
            identity.name,
            code,
            self.otp_ttl.num_minutes()
        );
        if let Err(e) = self.notifier.send(&identity.email, subject, &body).await {
            warn!(
                identity_id = %identity.id,
                error = %e,
                "Failed to deliver one-time code"
            );
        }

        Ok(identity)
    }
}

/// Clears the challenge fields as a unit.
fn clear_challenge(identity: &mut Identity) {
    identity.otp_hash = None;
    identity.otp_expires_at = None;
    identity.otp_attempts = 0;
}
