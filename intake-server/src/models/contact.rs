//! Contact submission schema - the one entity this service stores
//!
//! A submission is validated as a whole: every field is checked and every
//! violation is reported, so the form can show all problems at once.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{ValidationError, ValidationErrors};

const NAME_MIN_LEN: usize = 3;
const NAME_MAX_LEN: usize = 50;
const MESSAGE_MIN_LEN: usize = 10;

/// Keys accepted in a submission body, in reporting order
const KNOWN_FIELDS: &[&str] = &["name", "email", "phone", "service", "message"];

/// local@domain.tld, no whitespace, alphabetic TLD of 2+ chars
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@(?:[^\s@.]+\.)+[A-Za-z]{2,}$").expect("invalid email regex")
});

/// Service categories offered on the contact form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceKind {
    Isolamento,
    IsolamentoMetalico,
    ArCondicionado,
    Dutos,
    Outros,
}

impl ServiceKind {
    /// Wire values, in the order they are presented to users
    pub const VALUES: &'static [&'static str] = &[
        "isolamento",
        "isolamento-metalico",
        "ar-condicionado",
        "dutos",
        "outros",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Isolamento => "isolamento",
            Self::IsolamentoMetalico => "isolamento-metalico",
            Self::ArCondicionado => "ar-condicionado",
            Self::Dutos => "dutos",
            Self::Outros => "outros",
        }
    }
}

impl FromStr for ServiceKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "isolamento" => Ok(Self::Isolamento),
            "isolamento-metalico" => Ok(Self::IsolamentoMetalico),
            "ar-condicionado" => Ok(Self::ArCondicionado),
            "dutos" => Ok(Self::Dutos),
            "outros" => Ok(Self::Outros),
            _ => Err(ValidationError::InvalidVariant {
                field: "service",
                allowed: Self::VALUES,
            }),
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submission that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: String,
    /// Lower-cased
    pub email: String,
    pub phone: Option<String>,
    pub service: ServiceKind,
    pub message: String,
}

impl ContactSubmission {
    /// Validate a (sanitized) request body.
    ///
    /// Returns every violation found, not just the first one.
    ///
    /// # Example
    /// ```
    /// use intake_server::models::ContactSubmission;
    /// use serde_json::json;
    ///
    /// let body = json!({"name": "Al", "email": "bad", "service": "x", "message": "hi"});
    /// let errors = ContactSubmission::validate(body.as_object().unwrap()).unwrap_err();
    /// assert_eq!(errors.len(), 4);
    /// ```
    pub fn validate(body: &Map<String, Value>) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = required_string(body, "name", &mut errors).and_then(|name| {
            check_length(name, "name", Some(NAME_MIN_LEN), Some(NAME_MAX_LEN), &mut errors)
        });

        let email = required_string(body, "email", &mut errors).and_then(|email| {
            if EMAIL_RE.is_match(email) {
                Some(email.to_lowercase())
            } else {
                errors.push(ValidationError::InvalidEmail { field: "email" });
                None
            }
        });

        let phone = match body.get("phone") {
            None => None,
            Some(Value::String(phone)) => Some(phone.clone()),
            Some(_) => {
                errors.push(ValidationError::NotString { field: "phone" });
                None
            }
        };

        let service = required_string(body, "service", &mut errors).and_then(|service| {
            match service.parse::<ServiceKind>() {
                Ok(kind) => Some(kind),
                Err(err) => {
                    errors.push(err);
                    None
                }
            }
        });

        let message = required_string(body, "message", &mut errors).and_then(|message| {
            check_length(message, "message", Some(MESSAGE_MIN_LEN), None, &mut errors)
        });

        for key in body.keys() {
            if !KNOWN_FIELDS.contains(&key.as_str()) {
                errors.push(ValidationError::NotAllowed { key: key.clone() });
            }
        }

        match (name, email, service, message) {
            (Some(name), Some(email), Some(service), Some(message)) if errors.is_empty() => {
                Ok(Self {
                    name,
                    email,
                    phone,
                    service,
                    message,
                })
            }
            _ => Err(errors),
        }
    }

    /// Attach the caller's network address for storage
    pub fn with_ip(self, ip_address: Option<String>) -> NewContact {
        NewContact {
            submission: self,
            ip_address,
        }
    }
}

fn required_string<'a>(
    body: &'a Map<String, Value>,
    field: &'static str,
    errors: &mut ValidationErrors,
) -> Option<&'a str> {
    match body.get(field) {
        None => {
            errors.push(ValidationError::Required { field });
            None
        }
        Some(Value::String(s)) if s.is_empty() => {
            errors.push(ValidationError::Empty { field });
            None
        }
        Some(Value::String(s)) => Some(s.as_str()),
        Some(_) => {
            errors.push(ValidationError::NotString { field });
            None
        }
    }
}

fn check_length(
    value: &str,
    field: &'static str,
    min: Option<usize>,
    max: Option<usize>,
    errors: &mut ValidationErrors,
) -> Option<String> {
    let len = value.chars().count();
    if let Some(min) = min.filter(|min| len < *min) {
        errors.push(ValidationError::TooShort { field, min });
        return None;
    }
    if let Some(max) = max.filter(|max| len > *max) {
        errors.push(ValidationError::TooLong { field, max });
        return None;
    }
    Some(value.to_owned())
}

/// Validated submission plus request metadata, ready to insert
#[derive(Debug, Clone)]
pub struct NewContact {
    pub submission: ContactSubmission,
    pub ip_address: Option<String>,
}

impl NewContact {
    /// Assign identity and timestamps. Both are server-side only.
    pub fn into_contact(self, now: DateTime<Utc>) -> Contact {
        let ContactSubmission {
            name,
            email,
            phone,
            service,
            message,
        } = self.submission;

        Contact {
            id: Uuid::new_v4(),
            name,
            email,
            phone,
            service,
            message,
            ip_address: self.ip_address,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Stored contact record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub service: ServiceKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
