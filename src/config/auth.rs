//! Session token configuration

use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

/// Minimum HS256 key length accepted in production.
const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Settings for validating HS256 session tokens
#[derive(Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Shared signing secret
    pub jwt_secret: String,

    /// Expected `iss` claim; unchecked when absent
    #[serde(default)]
    pub issuer: Option<String>,
}

impl AuthConfig {
    pub fn validate(&self, environment: Environment) -> Result<(), ValidationError> {
        if self.jwt_secret.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__JWT_SECRET"));
        }
        if environment == Environment::Production
            && self.jwt_secret.len() < MIN_PRODUCTION_SECRET_LEN
        {
            return Err(ValidationError::JwtSecretTooShort(MIN_PRODUCTION_SECRET_LEN));
        }
        Ok(())
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .finish()
    }
}
