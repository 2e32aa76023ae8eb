//! JWT token management

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AuthError;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Token issuance and verification
///
/// Keys, algorithm and TTL are fixed at construction and immutable for the
/// process lifetime. Expiry checking follows jsonwebtoken semantics with zero
/// leeway: a token whose `exp` is in the past fails verification.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    header: Header,
    validation: Validation,
    token_ttl_minutes: i64,
}

impl TokenService {
    /// Create a new token service
    ///
    /// `algorithm` is the configured identifier (e.g. "HS256"). Only HMAC
    /// variants are accepted since the key is a shared secret; anything else
    /// is a startup error.
    pub fn new(
        secret: &str,
        algorithm: &str,
        token_ttl_minutes: i64,
    ) -> Result<Self, AuthError> {
        let algorithm: Algorithm = algorithm
            .parse()
            .map_err(|_| AuthError::UnsupportedAlgorithm(algorithm.to_string()))?;
        if !matches!(
            algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(AuthError::UnsupportedAlgorithm(format!("{:?}", algorithm)));
        }

        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            header: Header::new(algorithm),
            validation,
            token_ttl_minutes,
        })
    }

    /// Issue a signed token for a subject
    pub fn issue(&self, subject_id: i64) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.token_ttl_minutes);

        let claims = Claims {
            sub: subject_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        debug!("Issuing token for subject: {}", subject_id);

        encode(&self.header, &claims, &self.encoding_key).map_err(AuthError::Jwt)
    }

    /// Verify a token and return its subject id
    ///
    /// Rejects tokens that are malformed, carry a bad signature, were signed
    /// with a different algorithm, or have expired.
    pub fn verify(&self, token: &str) -> Result<i64, AuthError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::InvalidToken,
                }
            })?;

        token_data
            .claims
            .sub
            .parse()
            .map_err(|_| AuthError::InvalidToken)
    }
}
