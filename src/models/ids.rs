//! Strongly-typed ID wrappers for all entity types
//!
//! Ids are the integer keys assigned by the database on insert. Wrapping them
//! keeps a category id from being passed where an expense id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Macro to generate ID newtype wrappers
macro_rules! define_id {
    ($name:ident, $display_prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw database key
            pub const fn from_raw(raw: i64) -> Self {
                Self(raw)
            }

            /// Get the raw database key
            pub const fn raw(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $display_prefix, self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                let s = s.strip_prefix($display_prefix).unwrap_or(s);
                Ok(Self(s.parse()?))
            }
        }
    };
}

define_id!(CategoryId, "cat-");
define_id!(ExpenseId, "exp-");
define_id!(BudgetId, "bud-");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        assert_eq!(CategoryId::from_raw(12).to_string(), "cat-12");
        assert_eq!(ExpenseId::from_raw(3).to_string(), "exp-3");
        assert_eq!(BudgetId::from_raw(1).to_string(), "bud-1");
    }

    #[test]
    fn test_id_parse_with_and_without_prefix() {
        assert_eq!("cat-42".parse::<CategoryId>().unwrap().raw(), 42);
        assert_eq!("42".parse::<CategoryId>().unwrap().raw(), 42);
        assert!("cat-x".parse::<CategoryId>().is_err());
    }

    #[test]
    fn test_id_serialization() {
        let id = ExpenseId::from_raw(9);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "9");
        let deserialized: ExpenseId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
