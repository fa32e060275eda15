//! Classification of verified Stripe events.

use super::stripe_event::StripeEvent;
use super::stripe_objects::{StripeCheckoutSession, StripePrice, StripeProduct, StripeSubscription};

/// Lifecycle step of a subscription event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionChange {
    Created,
    Updated,
    Deleted,
}

impl SubscriptionChange {
    /// Only a new subscription copies its payment method onto the user.
    pub fn updates_billing_profile(&self) -> bool {
        matches!(self, SubscriptionChange::Created)
    }
}

/// Kind of local entity an event type reconciles into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Product,
    Price,
    Subscription(SubscriptionChange),
    CheckoutCompletion,
    Unhandled,
}

impl EventKind {
    pub fn classify(event_type: &str) -> Self {
        match event_type {
            "product.created" | "product.updated" => EventKind::Product,
            "price.created" | "price.updated" => EventKind::Price,
            "customer.subscription.created" => {
                EventKind::Subscription(SubscriptionChange::Created)
            }
            "customer.subscription.updated" => {
                EventKind::Subscription(SubscriptionChange::Updated)
            }
            "customer.subscription.deleted" => {
                EventKind::Subscription(SubscriptionChange::Deleted)
            }
            "checkout.session.completed" => EventKind::CheckoutCompletion,
            _ => EventKind::Unhandled,
        }
    }
}

/// A classified event with its payload decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum BillingEvent {
    Product(StripeProduct),
    Price(StripePrice),
    Subscription {
        change: SubscriptionChange,
        subscription: StripeSubscription,
    },
    CheckoutCompletion(StripeCheckoutSession),
    Unhandled(String),
}

impl BillingEvent {
    /// Classifies `event` by type and decodes `data.object` for that kind.
    ///
    /// Unhandled types never look at the payload.
    pub fn from_event(event: &StripeEvent) -> Result<Self, serde_json::Error> {
        let parsed = match EventKind::classify(&event.event_type) {
            EventKind::Product => BillingEvent::Product(event.deserialize_object()?),
            EventKind::Price => BillingEvent::Price(event.deserialize_object()?),
            EventKind::Subscription(change) => BillingEvent::Subscription {
                change,
                subscription: event.deserialize_object()?,
            },
            EventKind::CheckoutCompletion => {
                BillingEvent::CheckoutCompletion(event.deserialize_object()?)
            }
            EventKind::Unhandled => BillingEvent::Unhandled(event.event_type.clone()),
        };
        Ok(parsed)
    }

    pub fn kind(&self) -> EventKind {
        match self {
            BillingEvent::Product(_) => EventKind::Product,
            BillingEvent::Price(_) => EventKind::Price,
            BillingEvent::Subscription { change, .. } => EventKind::Subscription(*change),
            BillingEvent::CheckoutCompletion(_) => EventKind::CheckoutCompletion,
            BillingEvent::Unhandled(_) => EventKind::Unhandled,
        }
    }
}
