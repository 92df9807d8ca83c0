//! PBKDF2-HMAC-SHA256 password hashes.
//!
//! Stored form: `pbkdf2-sha256$<iterations>$<salt b64>$<hash b64>`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::AuthError;

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

pub const DEFAULT_ITERATIONS: u32 = 210_000;

fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> [u8; HASH_LEN] {
    let mut out = [0u8; HASH_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
    out
}

pub fn hash_password(password: &str, iterations: u32) -> Result<String, AuthError> {
    if iterations == 0 {
        return Err(AuthError::InvalidIterations);
    }
    let salt = generate_salt();
    let hash = derive(password, &salt, iterations);
    Ok(format!(
        "{SCHEME}${iterations}${}${}",
        STANDARD.encode(salt),
        STANDARD.encode(hash)
    ))
}

/// A well-formed hash of no real password, with the same cost as a stored
/// one. Login verifies against it when the username is unknown, so both
/// paths do one full PBKDF2 derivation.
pub fn decoy_hash(iterations: u32) -> String {
    let salt = [0u8; SALT_LEN];
    let iterations = iterations.max(1);
    let hash = derive("vigil-decoy", &salt, iterations);
    format!(
        "{SCHEME}${iterations}${}${}",
        STANDARD.encode(salt),
        STANDARD.encode(hash)
    )
}

struct ParsedHash {
    iterations: u32,
    salt: Vec<u8>,
    hash: Vec<u8>,
}

fn parse(stored: &str) -> Result<ParsedHash, AuthError> {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(hash), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(AuthError::MalformedHash);
    };
    if scheme != SCHEME {
        return Err(AuthError::MalformedHash);
    }
    let iterations: u32 = iterations.parse().map_err(|_| AuthError::MalformedHash)?;
    if iterations == 0 {
        return Err(AuthError::MalformedHash);
    }
    Ok(ParsedHash {
        iterations,
        salt: STANDARD.decode(salt).map_err(|_| AuthError::MalformedHash)?,
        hash: STANDARD.decode(hash).map_err(|_| AuthError::MalformedHash)?,
    })
}

/// Check `password` against a stored hash. A malformed hash never matches.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(parsed) = parse(stored) else {
        tracing::warn!("stored password hash is malformed");
        return false;
    };
    if parsed.hash.len() != HASH_LEN {
        return false;
    }
    let candidate = derive(password, &parsed.salt, parsed.iterations);
    candidate.as_slice().ct_eq(parsed.hash.as_slice()).into()
}
