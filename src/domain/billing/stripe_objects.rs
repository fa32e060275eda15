//! Stripe object payloads carried in `data.object`.
//!
//! Only the fields the bridge stores are captured. Stripe may send any
//! reference as either a bare id or the expanded object, see [`Expandable`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::pricing::{CheckoutMode, PriceType};

/// Stripe metadata: flat string to string map.
pub type Metadata = BTreeMap<String, String>;

/// Objects addressable by a Stripe id.
pub trait StripeObject {
    fn id(&self) -> &str;
}

/// A reference that is either an id string or the embedded object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expandable<T> {
    Id(String),
    Object(Box<T>),
}

impl<T: StripeObject> Expandable<T> {
    pub fn id(&self) -> &str {
        match self {
            Expandable::Id(id) => id.as_str(),
            Expandable::Object(obj) => obj.id(),
        }
    }

    /// The embedded object, if Stripe expanded it.
    pub fn as_object(&self) -> Option<&T> {
        match self {
            Expandable::Id(_) => None,
            Expandable::Object(obj) => Some(obj.as_ref()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripeProduct {
    pub id: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripeRecurring {
    pub interval: String,
    #[serde(default)]
    pub interval_count: i64,
    #[serde(default)]
    pub trial_period_days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripePrice {
    pub id: String,
    pub product: Expandable<StripeProduct>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(rename = "type")]
    pub price_type: PriceType,
    #[serde(default)]
    pub unit_amount: Option<i64>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub recurring: Option<StripeRecurring>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripeCustomer {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Address object exactly as Stripe sent it.
    #[serde(default)]
    pub address: Option<Value>,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripePaymentMethod {
    pub id: String,
    #[serde(rename = "type", default)]
    pub method_type: String,
    #[serde(default)]
    pub customer: Option<Expandable<StripeCustomer>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub price: Option<StripePrice>,
    #[serde(default)]
    pub quantity: Option<u64>,
    // Newer API versions report the billing period per item.
    #[serde(default)]
    pub current_period_start: Option<i64>,
    #[serde(default)]
    pub current_period_end: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionItemList {
    #[serde(default)]
    pub data: Vec<SubscriptionItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripeSubscription {
    pub id: String,
    #[serde(default)]
    pub customer: Option<Expandable<StripeCustomer>>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub items: SubscriptionItemList,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    #[serde(default)]
    pub cancel_at: Option<i64>,
    #[serde(default)]
    pub canceled_at: Option<i64>,
    #[serde(default)]
    pub current_period_start: Option<i64>,
    #[serde(default)]
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub ended_at: Option<i64>,
    #[serde(default)]
    pub trial_start: Option<i64>,
    #[serde(default)]
    pub trial_end: Option<i64>,
    #[serde(default)]
    pub default_payment_method: Option<Expandable<StripePaymentMethod>>,
}

impl StripeSubscription {
    pub fn first_item(&self) -> Option<&SubscriptionItem> {
        self.items.data.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: String,
    pub mode: CheckoutMode,
    #[serde(default)]
    pub customer: Option<Expandable<StripeCustomer>>,
    #[serde(default)]
    pub subscription: Option<Expandable<StripeSubscription>>,
}

macro_rules! stripe_object {
    ($($ty:ty),*) => {
        $(impl StripeObject for $ty {
            fn id(&self) -> &str {
                &self.id
            }
        })*
    };
}

stripe_object!(
    StripeProduct,
    StripePrice,
    StripeCustomer,
    StripePaymentMethod,
    StripeSubscription,
    StripeCheckoutSession
);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expandable_accepts_bare_id() {
        let customer: Expandable<StripeCustomer> = serde_json::from_value(json!("cus_1")).unwrap();
        assert_eq!(customer.id(), "cus_1");
        assert!(customer.as_object().is_none());
    }

    #[test]
    fn expandable_accepts_embedded_object() {
        let customer: Expandable<StripeCustomer> = serde_json::from_value(json!({
            "id": "cus_2",
            "address": {"city": "Berlin"}
        }))
        .unwrap();

        assert_eq!(customer.id(), "cus_2");
        let embedded = customer.as_object().unwrap();
        assert_eq!(embedded.address, Some(json!({"city": "Berlin"})));
    }

    #[test]
    fn product_defaults_missing_fields() {
        let product: StripeProduct = serde_json::from_value(json!({"id": "prod_1"})).unwrap();
        assert!(!product.active);
        assert_eq!(product.name, "");
        assert!(product.description.is_none());
        assert!(product.metadata.is_empty());
    }

    #[test]
    fn price_requires_known_type() {
        let result: Result<StripePrice, _> = serde_json::from_value(json!({
            "id": "price_1",
            "product": "prod_1",
            "type": "metered"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn price_parses_recurring_block() {
        let price: StripePrice = serde_json::from_value(json!({
            "id": "price_1",
            "product": {"id": "prod_1", "name": "Pro"},
            "active": true,
            "currency": "usd",
            "type": "recurring",
            "unit_amount": 1500,
            "recurring": {"interval": "month", "interval_count": 1, "trial_period_days": null}
        }))
        .unwrap();

        assert_eq!(price.product.id(), "prod_1");
        let recurring = price.recurring.unwrap();
        assert_eq!(recurring.interval, "month");
        assert_eq!(recurring.trial_period_days, None);
    }

    #[test]
    fn subscription_with_null_customer_parses() {
        let sub: StripeSubscription = serde_json::from_value(json!({
            "id": "sub_1",
            "customer": null,
            "items": {"object": "list", "data": []}
        }))
        .unwrap();

        assert!(sub.customer.is_none());
        assert!(sub.first_item().is_none());
    }

    #[test]
    fn checkout_session_with_expanded_subscription() {
        let session: StripeCheckoutSession = serde_json::from_value(json!({
            "id": "cs_1",
            "mode": "subscription",
            "customer": "cus_1",
            "subscription": {"id": "sub_1", "customer": "cus_1", "status": "active"}
        }))
        .unwrap();

        let sub = session.subscription.unwrap();
        assert_eq!(sub.as_object().unwrap().status, "active");
    }
}
