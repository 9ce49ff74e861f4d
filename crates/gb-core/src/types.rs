//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Worked hours must be a positive, finite number.
    #[error("hours must be a positive number, got {value}")]
    InvalidHours { value: f64 },

    /// A money amount was negative, not finite, or too large to represent.
    #[error("invalid amount: {value}")]
    InvalidAmount { value: f64 },
}

/// Generates a validated string newtype with common trait implementations.
macro_rules! define_label {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new value after validation.
            ///
            /// Surrounding whitespace is trimmed; blank input is rejected.
            pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
                let value = value.into();
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                if trimmed.len() == value.len() {
                    Ok(Self(value))
                } else {
                    Ok(Self(trimmed.to_string()))
                }
            }

            /// Returns the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = ValidationError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_label!(
    /// A work category label, e.g. "Taglio erba".
    ///
    /// Labels are compared exactly; "Taglio erba" and "taglio erba" are
    /// different categories.
    WorkType, "work type"
);

define_label!(
    /// The owning party of a millesimi share, e.g. a family name.
    ShareLabel, "share label"
);

define_label!(
    /// A validated record identifier for stored works and expenses.
    RecordId, "record ID"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn work_type_rejects_blank() {
        assert!(WorkType::new("").is_err());
        assert!(WorkType::new("   ").is_err());
        assert!(WorkType::new("Taglio erba").is_ok());
    }

    #[test]
    fn work_type_trims_whitespace() {
        let ty = WorkType::new("  Taglio siepe ").unwrap();
        assert_eq!(ty.as_str(), "Taglio siepe");
    }

    #[test]
    fn work_type_serde_roundtrip() {
        let ty = WorkType::new("Raccolta foglie").unwrap();
        let json = serde_json::to_string(&ty).unwrap();
        assert_eq!(json, "\"Raccolta foglie\"");
        let parsed: WorkType = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ty);
    }

    #[test]
    fn share_label_serde_rejects_empty() {
        let result: Result<ShareLabel, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn record_id_error_names_field() {
        let err = RecordId::new("").unwrap_err();
        assert_eq!(err.to_string(), "record ID cannot be empty");
    }

    #[test]
    fn labels_order_lexicographically() {
        let a = WorkType::new("A").unwrap();
        let b = WorkType::new("B").unwrap();
        assert!(a < b);
    }
}
