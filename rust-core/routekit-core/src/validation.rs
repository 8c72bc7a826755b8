//! # Validation Module
//!
//! Structured reasons for a rejected path parameter value.
//!
//! Matching only cares whether a value passed, but the reason is kept so it
//! can be logged and reported by URL generation.

use crate::types::Limit;
use std::fmt;

/// Why a candidate value failed a parameter's constraints
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamRejection {
    /// Value is empty
    Empty,
    /// Value does not parse as the declared type
    InvalidType {
        /// Type name the value was checked against
        expected: &'static str,
    },
    /// String is shorter than the minimum length
    TooShort {
        /// Minimum length
        min: Limit,
    },
    /// String is longer than the maximum length
    TooLong {
        /// Maximum length
        max: Limit,
    },
    /// Number is below the minimum
    TooSmall {
        /// Minimum value
        min: Limit,
    },
    /// Number is above the maximum
    TooLarge {
        /// Maximum value
        max: Limit,
    },
}

impl fmt::Display for ParamRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "value must not be empty"),
            Self::InvalidType { expected } => write!(f, "value must be {expected}"),
            Self::TooShort { min } => write!(f, "value must be at least {min} characters"),
            Self::TooLong { max } => write!(f, "value must be at most {max} characters"),
            Self::TooSmall { min } => write!(f, "value must be at least {min}"),
            Self::TooLarge { max } => write!(f, "value must be at most {max}"),
        }
    }
}

/// Result type for parameter validation
pub type ValidationResult<T> = std::result::Result<T, ParamRejection>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_display() {
        assert_eq!(ParamRejection::Empty.to_string(), "value must not be empty");
        assert_eq!(
            ParamRejection::InvalidType { expected: "int" }.to_string(),
            "value must be int"
        );
        assert_eq!(
            ParamRejection::TooShort { min: Limit::Int(3) }.to_string(),
            "value must be at least 3 characters"
        );
        assert_eq!(
            ParamRejection::TooLarge { max: Limit::Float(1.5) }.to_string(),
            "value must be at most 1.5"
        );
        assert_eq!(
            ParamRejection::TooSmall { min: Limit::Int(i64::MIN) }.to_string(),
            "value must be at least -9223372036854775808"
        );
    }
}
