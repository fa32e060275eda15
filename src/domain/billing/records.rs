//! Field mappings from Stripe payloads onto local records.
//!
//! Each mapping is built from a payload first and only then written onto a
//! record, so a payload that cannot be mapped never leaves a half-written
//! record behind.

use serde_json::{json, Value};

use super::pricing::PriceType;
use super::stripe_objects::{
    Metadata, StripePaymentMethod, StripePrice, StripeProduct, StripeSubscription,
    SubscriptionItem,
};
use crate::domain::foundation::{iso8601_from_unix, Record, UserId, ValidationError};

pub mod customer_fields {
    pub const USER_ID: &str = "user_id";
    pub const STRIPE_CUSTOMER_ID: &str = "stripe_customer_id";
}

pub mod product_fields {
    pub const PRODUCT_ID: &str = "product_id";
    pub const ACTIVE: &str = "active";
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const METADATA: &str = "metadata";
}

pub mod price_fields {
    pub const PRICE_ID: &str = "price_id";
    pub const PRODUCT_ID: &str = "product_id";
    pub const ACTIVE: &str = "active";
    pub const CURRENCY: &str = "currency";
    /// Holds the Stripe nickname.
    pub const DESCRIPTION: &str = "description";
    pub const TYPE: &str = "type";
    pub const UNIT_AMOUNT: &str = "unit_amount";
    pub const METADATA: &str = "metadata";
    pub const INTERVAL: &str = "interval";
    pub const INTERVAL_COUNT: &str = "interval_count";
    pub const TRIAL_PERIOD_DAYS: &str = "trial_period_days";
}

pub mod subscription_fields {
    pub const SUBSCRIPTION_ID: &str = "subscription_id";
    pub const USER_ID: &str = "user_id";
    pub const METADATA: &str = "metadata";
    pub const STATUS: &str = "status";
    pub const PRICE_ID: &str = "price_id";
    pub const QUANTITY: &str = "quantity";
    pub const CANCEL_AT_PERIOD_END: &str = "cancel_at_period_end";
    pub const CANCEL_AT: &str = "cancel_at";
    pub const CANCELED_AT: &str = "canceled_at";
    pub const CURRENT_PERIOD_START: &str = "current_period_start";
    pub const CURRENT_PERIOD_END: &str = "current_period_end";
    pub const CREATED: &str = "created";
    pub const ENDED_AT: &str = "ended_at";
    pub const TRIAL_START: &str = "trial_start";
    pub const TRIAL_END: &str = "trial_end";
}

pub mod user_fields {
    pub const BILLING_ADDRESS: &str = "billing_address";
    pub const PAYMENT_METHOD: &str = "payment_method";
}

/// Link between a local user and their Stripe customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerMapping {
    pub user_id: UserId,
    pub stripe_customer_id: String,
}

impl CustomerMapping {
    pub fn new(user_id: UserId, stripe_customer_id: impl Into<String>) -> Self {
        Self {
            user_id,
            stripe_customer_id: stripe_customer_id.into(),
        }
    }

    /// Reads a mapping back from a `customer` record.
    pub fn from_record(record: &Record) -> Result<Self, ValidationError> {
        let user_id = record
            .get_str(customer_fields::USER_ID)
            .ok_or_else(|| ValidationError::missing_field(customer_fields::USER_ID))?;
        let stripe_customer_id = record
            .get_str(customer_fields::STRIPE_CUSTOMER_ID)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ValidationError::missing_field(customer_fields::STRIPE_CUSTOMER_ID))?;
        Ok(Self::new(UserId::new(user_id)?, stripe_customer_id))
    }

    pub fn apply_to(&self, record: &mut Record) {
        record.set(customer_fields::USER_ID, self.user_id.as_str());
        record.set(customer_fields::STRIPE_CUSTOMER_ID, self.stripe_customer_id.as_str());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductFields {
    pub product_id: String,
    pub active: bool,
    pub name: String,
    pub description: String,
    pub metadata: Metadata,
}

impl ProductFields {
    pub fn from_stripe(product: &StripeProduct) -> Self {
        Self {
            product_id: product.id.clone(),
            active: product.active,
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            metadata: product.metadata.clone(),
        }
    }

    pub fn apply_to(&self, record: &mut Record) {
        record.set(product_fields::PRODUCT_ID, self.product_id.as_str());
        record.set(product_fields::ACTIVE, self.active);
        record.set(product_fields::NAME, self.name.as_str());
        record.set(product_fields::DESCRIPTION, self.description.as_str());
        record.set(product_fields::METADATA, json!(self.metadata));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurringFields {
    pub interval: String,
    pub interval_count: i64,
    pub trial_period_days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceFields {
    pub price_id: String,
    pub product_id: String,
    pub active: bool,
    pub currency: String,
    pub nickname: String,
    pub price_type: PriceType,
    pub unit_amount: Option<i64>,
    pub metadata: Metadata,
    pub recurring: Option<RecurringFields>,
}

impl PriceFields {
    pub fn from_stripe(price: &StripePrice) -> Self {
        Self {
            price_id: price.id.clone(),
            product_id: price.product.id().to_string(),
            active: price.active,
            currency: price.currency.clone(),
            nickname: price.nickname.clone().unwrap_or_default(),
            price_type: price.price_type,
            unit_amount: price.unit_amount,
            metadata: price.metadata.clone(),
            recurring: price.recurring.as_ref().map(|r| RecurringFields {
                interval: r.interval.clone(),
                interval_count: r.interval_count,
                trial_period_days: r.trial_period_days,
            }),
        }
    }

    /// Recurring fields are written only when the payload carried a
    /// recurring block; otherwise whatever the record held stays.
    pub fn apply_to(&self, record: &mut Record) {
        record.set(price_fields::PRICE_ID, self.price_id.as_str());
        record.set(price_fields::PRODUCT_ID, self.product_id.as_str());
        record.set(price_fields::ACTIVE, self.active);
        record.set(price_fields::CURRENCY, self.currency.as_str());
        record.set(price_fields::DESCRIPTION, self.nickname.as_str());
        record.set(price_fields::TYPE, self.price_type.as_str());
        record.set(price_fields::UNIT_AMOUNT, json!(self.unit_amount));
        record.set(price_fields::METADATA, json!(self.metadata));

        if let Some(recurring) = &self.recurring {
            record.set(price_fields::INTERVAL, recurring.interval.as_str());
            record.set(price_fields::INTERVAL_COUNT, recurring.interval_count);
            record.set(price_fields::TRIAL_PERIOD_DAYS, json!(recurring.trial_period_days));
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionFields {
    pub subscription_id: String,
    pub user_id: UserId,
    pub metadata: Metadata,
    pub status: String,
    pub price_id: String,
    pub quantity: u64,
    pub cancel_at_period_end: bool,
    pub cancel_at: String,
    pub canceled_at: String,
    pub current_period_start: String,
    pub current_period_end: String,
    pub created: String,
    pub ended_at: String,
    pub trial_start: String,
    pub trial_end: String,
}

impl SubscriptionFields {
    /// Maps a subscription whose owner and first priced item are already
    /// known. Every timestamp is rendered, absent ones as the epoch.
    pub fn build(
        subscription: &StripeSubscription,
        item: &SubscriptionItem,
        price_id: &str,
        user_id: UserId,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            subscription_id: subscription.id.clone(),
            user_id,
            metadata: subscription.metadata.clone(),
            status: subscription.status.clone(),
            price_id: price_id.to_string(),
            quantity: item.quantity.unwrap_or(0),
            cancel_at_period_end: subscription.cancel_at_period_end,
            cancel_at: iso8601_from_unix(subscription.cancel_at)?,
            canceled_at: iso8601_from_unix(subscription.canceled_at)?,
            current_period_start: iso8601_from_unix(
                subscription.current_period_start.or(item.current_period_start),
            )?,
            current_period_end: iso8601_from_unix(
                subscription.current_period_end.or(item.current_period_end),
            )?,
            created: iso8601_from_unix(item.created)?,
            ended_at: iso8601_from_unix(subscription.ended_at)?,
            trial_start: iso8601_from_unix(subscription.trial_start)?,
            trial_end: iso8601_from_unix(subscription.trial_end)?,
        })
    }

    pub fn apply_to(&self, record: &mut Record) {
        use subscription_fields::*;

        record.set(SUBSCRIPTION_ID, self.subscription_id.as_str());
        record.set(USER_ID, self.user_id.as_str());
        record.set(METADATA, json!(self.metadata));
        record.set(STATUS, self.status.as_str());
        record.set(PRICE_ID, self.price_id.as_str());
        record.set(QUANTITY, self.quantity);
        record.set(CANCEL_AT_PERIOD_END, self.cancel_at_period_end);
        record.set(CANCEL_AT, self.cancel_at.as_str());
        record.set(CANCELED_AT, self.canceled_at.as_str());
        record.set(CURRENT_PERIOD_START, self.current_period_start.as_str());
        record.set(CURRENT_PERIOD_END, self.current_period_end.as_str());
        record.set(CREATED, self.created.as_str());
        record.set(ENDED_AT, self.ended_at.as_str());
        record.set(TRIAL_START, self.trial_start.as_str());
        record.set(TRIAL_END, self.trial_end.as_str());
    }
}

/// Billing details copied onto the user from a default payment method.
#[derive(Debug, Clone, PartialEq)]
pub struct BillingProfileUpdate {
    pub payment_method: String,
    /// `Some` only when the payment method embeds its customer; the inner
    /// value is that customer's address, possibly null.
    pub billing_address: Option<Value>,
}

impl BillingProfileUpdate {
    pub fn from_payment_method(method: &StripePaymentMethod) -> Self {
        let billing_address = method
            .customer
            .as_ref()
            .and_then(|customer| customer.as_object())
            .map(|customer| customer.address.clone().unwrap_or(Value::Null));

        Self {
            payment_method: method.method_type.clone(),
            billing_address,
        }
    }

    pub fn apply_to(&self, record: &mut Record) {
        if let Some(address) = &self.billing_address {
            record.set(user_fields::BILLING_ADDRESS, address.clone());
        }
        record.set(user_fields::PAYMENT_METHOD, self.payment_method.as_str());
    }
}
