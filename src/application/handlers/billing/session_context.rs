//! Inputs shared by the checkout and portal handlers.

use crate::domain::billing::{reasons, BillingError};
use crate::domain::foundation::AuthenticatedUser;
use crate::ports::SessionValidator;

/// Redirect targets handed to Stripe-hosted pages. Fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUrls {
    pub success_url: String,
    pub cancel_url: String,
    pub billing_return_url: String,
}

/// Resolves a raw token to its user.
///
/// Every failure is reported to the caller as an unknown token; the cause
/// is only logged.
pub(crate) async fn authenticate(
    validator: &dyn SessionValidator,
    token: &str,
) -> Result<AuthenticatedUser, BillingError> {
    validator.validate(token).await.map_err(|e| {
        if e.is_transient() {
            tracing::error!(error = %e, "Session validation unavailable");
        } else {
            tracing::info!(error = %e, "Rejected session token");
        }
        BillingError::ClientInput(reasons::UNKNOWN_AUTH_TOKEN)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::MockSessionValidator;
    use crate::domain::foundation::AuthError;

    #[tokio::test]
    async fn known_token_resolves() {
        let validator = MockSessionValidator::new().with_test_user("tok", "u1");
        let user = authenticate(&validator, "tok").await.unwrap();
        assert_eq!(user.id.as_str(), "u1");
    }

    #[tokio::test]
    async fn all_failures_look_the_same() {
        let unknown = MockSessionValidator::new();
        let down = MockSessionValidator::new()
            .with_error(AuthError::service_unavailable("auth offline"));

        assert_eq!(
            authenticate(&unknown, "tok").await,
            Err(BillingError::ClientInput(reasons::UNKNOWN_AUTH_TOKEN))
        );
        assert_eq!(
            authenticate(&down, "tok").await,
            Err(BillingError::ClientInput(reasons::UNKNOWN_AUTH_TOKEN))
        );
    }
}
