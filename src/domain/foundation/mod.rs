//! Foundation types shared across the domain.

mod auth;
mod errors;
mod ids;
mod record;
mod timestamp;

pub use auth::{AuthError, AuthenticatedUser};
pub use errors::ValidationError;
pub use ids::{RecordId, UserId};
pub use record::{Collection, CollectionSchema, Record};
pub use timestamp::{iso8601_from_unix, Timestamp};
