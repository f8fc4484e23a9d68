use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

pub fn hash_password(plain: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| Error::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}

pub fn verify_password(plain: &str, hashed: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hashed).map_err(|e| Error::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed_hash)
        .is_ok())
}

fn state_signature(barber_id: Uuid, secret: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::Internal(format!("Invalid HMAC key: {}", e)))?;
    mac.update(b"calendar-connect:");
    mac.update(barber_id.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Builds the OAuth `state` parameter: `<barber_id>.<hex hmac>`.
pub fn sign_oauth_state(barber_id: Uuid, secret: &str) -> Result<String> {
    Ok(format!("{}.{}", barber_id, state_signature(barber_id, secret)?))
}

pub fn verify_oauth_state(state: &str, secret: &str) -> Option<Uuid> {
    let (id_part, signature) = state.split_once('.')?;
    let barber_id = Uuid::parse_str(id_part).ok()?;
    let expected = state_signature(barber_id, secret).ok()?;
    if expected.as_bytes().ct_eq(signature.as_bytes()).into() {
        Some(barber_id)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies_only_the_original() {
        let hash = hash_password("hunter22").unwrap();
        assert!(verify_password("hunter22", &hash).unwrap());
        assert!(!verify_password("hunter23", &hash).unwrap());
    }

    #[test]
    fn oauth_state_is_bound_to_barber_and_secret() {
        let barber_id = Uuid::new_v4();
        let state = sign_oauth_state(barber_id, "secret").unwrap();

        assert_eq!(verify_oauth_state(&state, "secret"), Some(barber_id));
        assert_eq!(verify_oauth_state(&state, "other"), None);

        let forged = format!("{}.{}", Uuid::new_v4(), state.split_once('.').unwrap().1);
        assert_eq!(verify_oauth_state(&forged, "secret"), None);
        assert_eq!(verify_oauth_state("garbage", "secret"), None);
    }
}
