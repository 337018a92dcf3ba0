//! One-time code generation.
//!
//! Codes are six decimal digits drawn from a CSPRNG. Only an Argon2id
//! hash of the code is ever stored; the plaintext goes out through the
//! notifier and is then forgotten.

use rand::Rng;

/// Number of digits in a one-time code.
pub const OTP_LENGTH: usize = 6;

/// Generate a six-digit one-time code.
///
/// The range starts at 100000 so every code prints as six digits with
/// no leading zero to drop in transit.
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    let code: u32 = rng.random_range(100_000..=999_999);
    code.to_string()
}
