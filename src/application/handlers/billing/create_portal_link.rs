//! CreatePortalLinkHandler - opens the Stripe billing portal for a user.

use std::sync::Arc;

use crate::domain::billing::{reasons, BillingError};
use crate::ports::{PaymentProvider, PortalSession, SessionValidator};

use super::customer_provisioner::CustomerProvisioner;
use super::session_context::{authenticate, SessionUrls};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePortalLinkCommand {
    pub token: String,
}

pub struct CreatePortalLinkHandler {
    session_validator: Arc<dyn SessionValidator>,
    provisioner: CustomerProvisioner,
    payment_provider: Arc<dyn PaymentProvider>,
    urls: SessionUrls,
}

impl CreatePortalLinkHandler {
    pub fn new(
        session_validator: Arc<dyn SessionValidator>,
        provisioner: CustomerProvisioner,
        payment_provider: Arc<dyn PaymentProvider>,
        urls: SessionUrls,
    ) -> Self {
        Self {
            session_validator,
            provisioner,
            payment_provider,
            urls,
        }
    }

    /// Creates the customer first if the user has never been billed.
    pub async fn handle(&self, cmd: CreatePortalLinkCommand) -> Result<PortalSession, BillingError> {
        let user = authenticate(self.session_validator.as_ref(), &cmd.token).await?;
        let customer = self.provisioner.resolve_or_create(&user).await?;

        let session = self
            .payment_provider
            .create_portal_session(
                &customer.mapping.stripe_customer_id,
                &self.urls.billing_return_url,
            )
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user.id, error = %e, "Portal session creation failed");
                BillingError::remote(reasons::SESSION_CREATE_FAILED, e)
            })?;

        tracing::info!(user_id = %user.id, session_id = %session.id, "Portal session created");
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::MockSessionValidator;
    use crate::adapters::storage::InMemoryRecordStore;
    use crate::adapters::stripe::MockPaymentProvider;
    use crate::domain::foundation::Collection;
    use crate::ports::PaymentError;

    fn setup() -> (CreatePortalLinkHandler, InMemoryRecordStore, MockPaymentProvider) {
        let store = InMemoryRecordStore::with_all_collections();
        let provider = MockPaymentProvider::new();
        let provisioner =
            CustomerProvisioner::new(Arc::new(store.clone()), Arc::new(provider.clone()));
        let handler = CreatePortalLinkHandler::new(
            Arc::new(MockSessionValidator::new().with_test_user("tok", "u1")),
            provisioner,
            Arc::new(provider.clone()),
            SessionUrls {
                success_url: "https://app.example.com/success".to_string(),
                cancel_url: "https://app.example.com/cancel".to_string(),
                billing_return_url: "https://app.example.com/billing".to_string(),
            },
        );
        (handler, store, provider)
    }

    fn command() -> CreatePortalLinkCommand {
        CreatePortalLinkCommand {
            token: "tok".to_string(),
        }
    }

    #[tokio::test]
    async fn portal_uses_fixed_return_url() {
        let (handler, store, provider) = setup();

        let session = handler.handle(command()).await.unwrap();

        assert_eq!(session.url, "https://example.com/portal");
        assert_eq!(store.count(Collection::Customer).await, 1);
        let call = provider
            .calls()
            .into_iter()
            .find(|c| c.method == "create_portal_session")
            .unwrap();
        assert_eq!(call.args, vec!["cus_mock_1", "https://app.example.com/billing"]);
    }

    #[tokio::test]
    async fn second_portal_link_reuses_customer() {
        let (handler, _, provider) = setup();

        handler.handle(command()).await.unwrap();
        handler.handle(command()).await.unwrap();

        assert_eq!(provider.call_count("create_customer"), 1);
    }

    #[tokio::test]
    async fn remote_failure_is_generic() {
        let (handler, _, provider) = setup();
        provider.set_method_error(
            "create_portal_session",
            PaymentError::authentication("Invalid API key"),
        );

        let err = handler.handle(command()).await.unwrap_err();

        assert_eq!(err.failure_reason(), reasons::SESSION_CREATE_FAILED);
    }
}
