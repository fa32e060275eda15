//! CreateCheckoutSessionHandler - starts a hosted Stripe checkout for a user.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::billing::{reasons, BillingError, CheckoutMode, PriceType};
use crate::ports::{CheckoutSession, CreateCheckoutRequest, PaymentProvider, SessionValidator};

use super::customer_provisioner::{CustomerProvisioner, ProvisionedCustomer};
use super::session_context::{authenticate, SessionUrls};

/// Command to open a checkout session for one price.
///
/// The body has already been validated; `token` is checked here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCheckoutSessionCommand {
    pub token: String,
    pub price_id: String,
    pub price_type: PriceType,
    pub quantity: u64,
}

#[derive(Debug, Clone)]
pub struct CreateCheckoutSessionResult {
    pub session: CheckoutSession,
    pub customer: ProvisionedCustomer,
}

pub struct CreateCheckoutSessionHandler {
    session_validator: Arc<dyn SessionValidator>,
    provisioner: CustomerProvisioner,
    payment_provider: Arc<dyn PaymentProvider>,
    urls: SessionUrls,
}

impl CreateCheckoutSessionHandler {
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

    pub async fn handle(
        &self,
        cmd: CreateCheckoutSessionCommand,
    ) -> Result<CreateCheckoutSessionResult, BillingError> {
        // 1. Identify the caller
        let user = authenticate(self.session_validator.as_ref(), &cmd.token).await?;

        // 2. Find or create their Stripe customer
        let customer = self.provisioner.resolve_or_create(&user).await?;

        // 3. Open the session
        let mode = cmd.price_type.checkout_mode();
        let request = CreateCheckoutRequest {
            customer_id: customer.mapping.stripe_customer_id.clone(),
            price_id: cmd.price_id.clone(),
            quantity: cmd.quantity,
            mode,
            success_url: self.urls.success_url.clone(),
            cancel_url: self.urls.cancel_url.clone(),
            allow_promotion_codes: true,
            collect_billing_address: true,
            subscription_metadata: (mode == CheckoutMode::Subscription).then(BTreeMap::new),
        };

        let session = self
            .payment_provider
            .create_checkout_session(request)
            .await
            .map_err(|e| {
                tracing::error!(
                    user_id = %user.id,
                    price_id = %cmd.price_id,
                    error = %e,
                    "Checkout session creation failed"
                );
                BillingError::remote(reasons::SESSION_CREATE_FAILED, e)
            })?;

        tracing::info!(
            user_id = %user.id,
            session_id = %session.id,
            mode = %mode,
            "Checkout session created"
        );
        Ok(CreateCheckoutSessionResult { session, customer })
    }
}
