use async_trait::async_trait;
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// What the identity provider asserts about a caller once its token checks out.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    pub subject_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Verification of a provider-issued bearer token.
///
/// The provider is a black box; implementations may verify locally or call
/// out, as long as failures surface as `Unauthorized` (bad token) or
/// `Upstream` (verifier unreachable). Tests substitute a fake.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AppError>;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub exp: usize,
}

/// Local verification of the provider's signed ID tokens.
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AppError> {
        let decoded = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| AppError::Unauthorized)?;

        if decoded.claims.sub.is_empty() {
            return Err(AppError::Unauthorized);
        }

        Ok(VerifiedIdentity {
            subject_id: decoded.claims.sub,
            email: decoded.claims.email,
            display_name: decoded.claims.name,
        })
    }
}
