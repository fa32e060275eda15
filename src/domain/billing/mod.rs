//! Billing domain: Stripe payloads, verification, classification and the
//! field mappings onto local records.

mod errors;
mod event_kind;
mod pricing;
mod records;
mod stripe_event;
mod stripe_objects;
mod verification;

pub use errors::{reasons, BillingError};
pub use event_kind::{BillingEvent, EventKind, SubscriptionChange};
pub use pricing::{CheckoutMode, PriceType};
pub use records::{
    customer_fields, price_fields, product_fields, subscription_fields, user_fields,
    BillingProfileUpdate, CustomerMapping, PriceFields, ProductFields, RecurringFields,
    SubscriptionFields,
};
pub use stripe_event::{StripeEvent, StripeEventData};
pub use stripe_objects::{
    Expandable, Metadata, StripeCheckoutSession, StripeCustomer, StripeObject,
    StripePaymentMethod, StripePrice, StripeProduct, StripeRecurring, StripeSubscription,
    SubscriptionItem, SubscriptionItemList,
};
pub use verification::{
    generate_signature_header, SignatureHeader, StripeWebhookVerifier, VerificationError,
    DEFAULT_TOLERANCE_SECS,
};

#[cfg(test)]
pub(crate) use stripe_event::StripeEventBuilder;
