//! Strongly-typed identifiers used across the domain.
//!
//! Command identifiers are opaque strings minted by the document store, so
//! unlike locally generated ids they carry no structure we can rely on.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Store-assigned identifier of a persisted command (the document `_id`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(String);

/// Producer-side identifier correlating the commands of one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

/// Producer-side identifier of a single order within a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

macro_rules! impl_string_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Wrap a raw identifier, rejecting empty or blank values.
            pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(DomainError::invalid_id(format!("{}: empty", $name)));
                }
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

impl_string_newtype!(CommandId, "CommandId");
impl_string_newtype!(RequestId, "RequestId");
impl_string_newtype!(OrderId, "OrderId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_identifiers() {
        assert!(matches!(CommandId::new(""), Err(DomainError::InvalidId(_))));
        assert!(matches!("   ".parse::<OrderId>(), Err(DomainError::InvalidId(_))));
    }

    #[test]
    fn serializes_transparently() {
        let id = CommandId::new("pBjePGfvgm").unwrap();
        assert_eq!(serde_json::to_value(&id).unwrap(), serde_json::json!("pBjePGfvgm"));
        assert_eq!(id.to_string(), "pBjePGfvgm");
    }
}
