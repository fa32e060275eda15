//! Stripe and redirect URL configuration

use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

/// Settings for talking to Stripe and for the URLs its hosted pages
/// redirect back to
#[derive(Clone, Default, Deserialize)]
pub struct PaymentConfig {
    /// Secret API key (`sk_test_...` or `sk_live_...`)
    pub stripe_api_key: String,

    /// Webhook endpoint signing secret (`whsec_...`)
    pub stripe_webhook_secret: String,

    /// Where checkout sends the user after payment
    pub success_url: String,

    /// Where checkout sends the user when they back out
    pub cancel_url: String,

    /// Where the billing portal returns the user
    pub billing_return_url: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Maximum age of a webhook signature timestamp, in seconds
    #[serde(default = "default_webhook_tolerance")]
    pub webhook_tolerance_secs: i64,
}

impl PaymentConfig {
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_test_")
    }

    pub fn validate(&self, environment: Environment) -> Result<(), ValidationError> {
        if self.stripe_api_key.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__STRIPE_API_KEY"));
        }
        if !self.stripe_api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if self.stripe_webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired(
                "PAYMENT__STRIPE_WEBHOOK_SECRET",
            ));
        }
        if !self.stripe_webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }
        if !(1..=3600).contains(&self.webhook_tolerance_secs) {
            return Err(ValidationError::InvalidWebhookTolerance);
        }

        let production = environment == Environment::Production;
        check_url("PAYMENT__SUCCESS_URL", &self.success_url, production)?;
        check_url("PAYMENT__CANCEL_URL", &self.cancel_url, production)?;
        check_url("PAYMENT__BILLING_RETURN_URL", &self.billing_return_url, production)?;
        check_url("PAYMENT__API_BASE_URL", &self.api_base_url, production)
    }
}

fn check_url(name: &'static str, url: &str, production: bool) -> Result<(), ValidationError> {
    if url.is_empty() {
        return Err(ValidationError::MissingRequired(name));
    }
    if production && !url.starts_with("https://") {
        return Err(ValidationError::UrlMustBeHttps(name));
    }
    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(ValidationError::InvalidUrl(name));
    }
    Ok(())
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("stripe_api_key", &"[REDACTED]")
            .field("stripe_webhook_secret", &"[REDACTED]")
            .field("success_url", &self.success_url)
            .field("cancel_url", &self.cancel_url)
            .field("billing_return_url", &self.billing_return_url)
            .field("api_base_url", &self.api_base_url)
            .field("webhook_tolerance_secs", &self.webhook_tolerance_secs)
            .finish()
    }
}

fn default_api_base_url() -> String {
    "https://api.stripe.com".to_string()
}

fn default_webhook_tolerance() -> i64 {
    300
}
