//! Session token, cookie, and password primitives.

use argon2::password_hash::rand_core::OsRng as SaltRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;
use rand::RngCore;

pub const SESSION_COOKIE_NAME: &str = "beacon-session";

/// Bytes of entropy per session token; hex-encoded to twice this length.
const SESSION_TOKEN_BYTES: usize = 32;

/// Generate an opaque session token: 32 random bytes from the OS RNG,
/// hex-encoded. No uniqueness retry - collision probability is negligible.
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Build the Set-Cookie value that issues a session to the browser.
/// HttpOnly always; Secure only in production so local development over
/// plain HTTP keeps working.
pub fn session_cookie(token: &str, max_age_secs: i64) -> String {
    let secure_flag = if crate::is_production!() { "; Secure" } else { "" };
    format!(
        "{SESSION_COOKIE_NAME}={token}; HttpOnly{secure_flag}; SameSite=Lax; Path=/; Max-Age={max_age_secs}"
    )
}

/// Build the Set-Cookie value that clears the session cookie.
pub fn clear_session_cookie() -> String {
    let secure_flag = if crate::is_production!() { "; Secure" } else { "" };
    format!("{SESSION_COOKIE_NAME}=; HttpOnly{secure_flag}; SameSite=Lax; Path=/; Max-Age=0")
}

/// Pull the session token out of a Cookie header value.
pub fn session_token_from_cookie_header(header: &str) -> Option<&str> {
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE_NAME && !value.is_empty()).then_some(value)
    })
}

/// Hash a password with Argon2id into PHC string format.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut SaltRng);
    let argon2 = Argon2::default();
    Ok(argon2.hash_password(password.as_bytes(), &salt)?.to_string())
}

/// Verify a plaintext password against a stored Argon2id PHC hash.
///
/// Returns `Ok(false)` on mismatch; an error only for a malformed hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = argon2::PasswordHash::new(hash)?;
    let argon2 = Argon2::default();
    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_64_hex_chars_and_random() {
        let t1 = generate_session_token();
        let t2 = generate_session_token();
        assert_eq!(t1.len(), 64);
        assert!(t1.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(t1, t2);
    }

    #[test]
    fn cookie_round_trip() {
        let cookie = session_cookie("abc123", 2_592_000);
        assert!(cookie.starts_with("beacon-session=abc123"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=2592000"));

        // What the browser sends back is parseable
        assert_eq!(
            session_token_from_cookie_header("other=1; beacon-session=abc123; x=y"),
            Some("abc123")
        );
    }

    #[test]
    fn missing_or_empty_cookie_yields_none() {
        assert_eq!(session_token_from_cookie_header("other=1"), None);
        assert_eq!(session_token_from_cookie_header("beacon-session="), None);
    }

    #[test]
    fn clear_cookie_zeroes_max_age() {
        let cookie = clear_session_cookie();
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.starts_with("beacon-session=;"));
    }

    #[test]
    fn correct_password_matches() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn malformed_hash_returns_error() {
        assert!(verify_password("pw", "not-a-hash").is_err());
    }
}
