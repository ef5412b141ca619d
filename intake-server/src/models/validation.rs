//! Validation error types
//!
//! Messages follow the `"field" ...` form clients of the contact form
//! already parse.

use std::fmt;

/// Single field-level violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required field is absent
    Required { field: &'static str },

    /// Field is present but not a string
    NotString { field: &'static str },

    /// Field is empty when it shouldn't be
    Empty { field: &'static str },

    /// Field is shorter than its minimum length
    TooShort { field: &'static str, min: usize },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// Field is not a syntactically valid email address
    InvalidEmail { field: &'static str },

    /// Value is not one of the allowed variants
    InvalidVariant {
        field: &'static str,
        allowed: &'static [&'static str],
    },

    /// Body carries a key the schema does not know
    NotAllowed { key: String },

    /// Body is not a key/value object
    NotAnObject,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required { field } => write!(f, "\"{}\" is required", field),
            Self::NotString { field } => write!(f, "\"{}\" must be a string", field),
            Self::Empty { field } => write!(f, "\"{}\" is not allowed to be empty", field),
            Self::TooShort { field, min } => write!(
                f,
                "\"{}\" length must be at least {} characters long",
                field, min
            ),
            Self::TooLong { field, max } => write!(
                f,
                "\"{}\" length must be less than or equal to {} characters long",
                field, max
            ),
            Self::InvalidEmail { field } => write!(f, "\"{}\" must be a valid email", field),
            Self::InvalidVariant { field, allowed } => {
                write!(f, "\"{}\" must be one of [{}]", field, allowed.join(", "))
            }
            Self::NotAllowed { key } => write!(f, "\"{}\" is not allowed", key),
            Self::NotAnObject => write!(f, "\"value\" must be of type object"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Every violation found in one submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, err: ValidationError) {
        self.0.push(err);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    /// Human-readable message per violation, in detection order
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(err: ValidationError) -> Self {
        Self(vec![err])
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages().join(". "))
    }
}

impl std::error::Error for ValidationErrors {}
