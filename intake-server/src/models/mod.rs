//! Domain models with validation at construction
//!
//! Request bodies are sanitized, then validated into a `ContactSubmission`.
//! Invalid input returns `ValidationErrors`, not panic.

pub mod contact;
pub mod sanitize;
pub mod validation;

pub use contact::{Contact, ContactSubmission, NewContact, ServiceKind};
pub use sanitize::{sanitize_fields, strip_markup};
pub use validation::{ValidationError, ValidationErrors};
