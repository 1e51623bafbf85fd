//! Password hashing and bearer tokens for the account routes.
//!
//! Passwords are stored as argon2id PHC strings. Tokens are compact HS256
//! JWTs carrying `{ "user_id": <i64>, "exp": <unix seconds> }`, signed with
//! the configured secret.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{MedchatError, Result};
use crate::types::UserId;

type HmacSha256 = Hmac<Sha256>;

// ---------------------------------------------------------------------------
// Passwords
// ---------------------------------------------------------------------------

/// Hash a password with argon2id and a fresh random salt.
///
/// # Errors
/// Returns [`MedchatError::PasswordHash`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| MedchatError::PasswordHash(e.to_string()))
}

/// Check a password against a stored PHC string. Malformed hashes never match.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// Claims carried by a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account the token was issued to.
    pub user_id: UserId,
    /// Expiry as unix seconds.
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Issues and verifies HS256 tokens.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("ttl_hours", &self.ttl.num_hours())
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    /// Create a signer.
    ///
    /// # Errors
    /// Returns [`MedchatError::Config`] if the secret is empty.
    pub fn new(secret: impl Into<Vec<u8>>, ttl_hours: u32) -> Result<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(MedchatError::Config("auth.token_secret must be set".into()));
        }
        Ok(Self {
            secret,
            ttl: Duration::hours(i64::from(ttl_hours)),
        })
    }

    /// Issue a token for `user_id` valid from now.
    ///
    /// # Errors
    /// Returns [`MedchatError::Serialization`] if the claims cannot be encoded.
    pub fn issue(&self, user_id: UserId) -> Result<String> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    ///
    /// # Errors
    /// Returns [`MedchatError::Serialization`] if the claims cannot be encoded.
    pub fn issue_at(&self, user_id: UserId, now: DateTime<Utc>) -> Result<String> {
        let header = Header {
            alg: "HS256".into(),
            typ: "JWT".into(),
        };
        let claims = Claims {
            user_id,
            exp: (now + self.ttl).timestamp(),
        };

        let header = encode_segment(&header)?;
        let claims = encode_segment(&claims)?;
        let signing_input = format!("{header}.{claims}");
        let signature = URL_SAFE_NO_PAD.encode(self.mac(signing_input.as_bytes())?.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature}"))
    }

    /// Verify a token against the current time.
    ///
    /// # Errors
    /// [`MedchatError::TokenExpired`] if the signature is valid but `exp` has
    /// passed, [`MedchatError::TokenInvalid`] for anything else.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`.
    ///
    /// # Errors
    /// See [`TokenSigner::verify`].
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims> {
        let mut parts = token.trim().split('.');
        let (Some(header), Some(claims), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(MedchatError::TokenInvalid);
        };

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| MedchatError::TokenInvalid)?;
        let signing_input = format!("{header}.{claims}");
        self.mac(signing_input.as_bytes())?
            .verify_slice(&signature)
            .map_err(|_| MedchatError::TokenInvalid)?;

        let header: Header = decode_segment(header)?;
        if header.alg != "HS256" {
            return Err(MedchatError::TokenInvalid);
        }

        let claims: Claims = decode_segment(claims)?;
        if claims.exp <= now.timestamp() {
            return Err(MedchatError::TokenExpired);
        }
        Ok(claims)
    }

    fn mac(&self, data: &[u8]) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| MedchatError::Config(format!("token secret rejected: {e}")))?;
        mac.update(data);
        Ok(mac)
    }
}

/// Strip an optional `Bearer ` scheme from an `Authorization` header value.
#[must_use]
pub fn token_from_header(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .unwrap_or(value)
        .trim()
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_vec(value).map_err(|e| MedchatError::Serialization(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| MedchatError::TokenInvalid)?;
    serde_json::from_slice(&bytes).map_err(|_| MedchatError::TokenInvalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new("test-secret", 24).expect("signer")
    }

    #[test]
    fn password_round_trip() {
        let hash = hash_password("hunter2").expect("hash");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn malformed_hash_never_matches() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn token_round_trip() {
        let signer = signer();
        let token = signer.issue(UserId(42)).expect("issue");
        let claims = signer.verify(&token).expect("verify");
        assert_eq!(claims.user_id, UserId(42));
        assert_eq!(token.matches('.').count(), 2);
    }

    #[test]
    fn expired_token() {
        let signer = signer();
        let issued = Utc::now() - Duration::hours(25);
        let token = signer.issue_at(UserId(1), issued).expect("issue");
        assert!(matches!(signer.verify(&token), Err(MedchatError::TokenExpired)));
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = signer().issue(UserId(1)).expect("issue");
        let other = TokenSigner::new("other-secret", 24).expect("signer");
        assert!(matches!(other.verify(&token), Err(MedchatError::TokenInvalid)));
    }

    #[test]
    fn tampered_claims_are_invalid() {
        let signer = signer();
        let token = signer.issue(UserId(1)).expect("issue");
        let parts: Vec<&str> = token.split('.').collect();
        let forged_claims = encode_segment(&Claims {
            user_id: UserId(2),
            exp: i64::MAX,
        })
        .expect("encode");
        let forged = format!("{}.{}.{}", parts[0], forged_claims, parts[2]);
        assert!(matches!(signer.verify(&forged), Err(MedchatError::TokenInvalid)));
    }

    #[test]
    fn garbage_is_invalid() {
        let signer = signer();
        for token in ["", "abc", "a.b", "a.b.c", "a.b.c.d"] {
            assert!(matches!(signer.verify(token), Err(MedchatError::TokenInvalid)), "{token}");
        }
    }

    #[test]
    fn empty_secret_rejected() {
        assert!(TokenSigner::new("", 24).is_err());
    }

    #[test]
    fn bearer_prefix_is_optional() {
        assert_eq!(token_from_header("Bearer abc.def.ghi"), "abc.def.ghi");
        assert_eq!(token_from_header("abc.def.ghi"), "abc.def.ghi");
        assert_eq!(token_from_header("  bearer xyz "), "xyz");
    }
}
