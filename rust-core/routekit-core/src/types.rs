//! # Type System for Path Parameters
//!
//! Declared parameter types and the typed values they produce.
//!
//! Each `ParamType` variant owns its parsing rule; validation dispatches by
//! pattern matching on the variant, never by inspecting the value.

use crate::validation::{ParamRejection, ValidationResult};
use std::cmp::Ordering;
use std::fmt;

/// Supported path parameter types
///
/// Used during route registration to specify expected types.
/// Default is `String`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParamType {
    /// String type (default) - no conversion
    #[default]
    String,
    /// Integer type - parses to i64
    Int,
    /// Float type - parses to f64
    Float,
    /// Boolean type - true/false, 1/0, yes/no, on/off
    Bool,
}

impl ParamType {
    /// Parse type specifier from route pattern (e.g., "int" from "{id:int}")
    #[must_use]
    pub fn from_specifier(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "int" | "integer" | "i64" => Self::Int,
            "float" | "f64" | "number" => Self::Float,
            "bool" | "boolean" => Self::Bool,
            _ => Self::String,
        }
    }

    /// Get the type name for error messages
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
        }
    }

    /// Parse a raw segment into a typed value
    ///
    /// Only checks the type; range and length limits are applied by
    /// `RouteParameter`.
    ///
    /// # Errors
    ///
    /// Returns `ParamRejection::InvalidType` when the value does not parse.
    pub fn parse(self, raw: &str) -> ValidationResult<ParamValue> {
        let invalid = ParamRejection::InvalidType {
            expected: self.type_name(),
        };

        match self {
            Self::String => Ok(ParamValue::String(raw.to_string())),
            Self::Int if is_decimal_int(raw) => {
                raw.parse::<i64>().map(ParamValue::Int).map_err(|_| invalid)
            }
            Self::Int => Err(invalid),
            Self::Float => match raw.parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(ParamValue::Float(f)),
                _ => Err(invalid),
            },
            Self::Bool => parse_bool(raw).map(ParamValue::Bool).ok_or(invalid),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Converted parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// String value (no conversion performed)
    String(String),
    /// Integer value (i64)
    Int(i64),
    /// Float value (f64)
    Float(f64),
    /// Boolean value
    Bool(bool),
}

impl ParamValue {
    /// Compare against a limit (value for numbers, byte length for strings)
    ///
    /// Integers are compared exactly, never through `f64`. Booleans have no
    /// order and return `None`.
    #[must_use]
    pub fn compare_to(&self, limit: Limit) -> Option<Ordering> {
        match self {
            Self::String(s) => compare_int(i64::try_from(s.len()).unwrap_or(i64::MAX), limit),
            Self::Int(i) => compare_int(*i, limit),
            Self::Float(f) => compare_float(*f, limit),
            Self::Bool(_) => None,
        }
    }

    /// Get as i64 if Int variant
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if Float variant
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as bool if Bool variant
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Bound on a parameter: a value for numbers, a length for strings
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Limit {
    /// Integer bound
    Int(i64),
    /// Fractional bound
    Float(f64),
}

impl Limit {
    /// Order of two limits; `None` only when a `NaN` is involved
    #[must_use]
    pub fn compare(self, other: Self) -> Option<Ordering> {
        match self {
            Self::Int(i) => compare_int(i, other),
            Self::Float(f) => compare_float(f, other),
        }
    }
}

impl From<i64> for Limit {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Limit {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<u32> for Limit {
    fn from(value: u32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for Limit {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
        }
    }
}

fn compare_int(value: i64, limit: Limit) -> Option<Ordering> {
    // 2^63, exactly representable
    const BOUND: f64 = 9_223_372_036_854_775_808.0;

    match limit {
        Limit::Int(l) => Some(value.cmp(&l)),
        Limit::Float(l) if l.is_nan() => None,
        Limit::Float(l) => {
            let floor = l.floor();
            if floor >= BOUND {
                return Some(Ordering::Less);
            }
            if floor < -BOUND {
                return Some(Ordering::Greater);
            }
            #[allow(clippy::cast_possible_truncation)]
            let whole = floor as i64;
            Some(match value.cmp(&whole) {
                Ordering::Equal if l > floor => Ordering::Less,
                other => other,
            })
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn compare_float(value: f64, limit: Limit) -> Option<Ordering> {
    match limit {
        Limit::Int(l) => value.partial_cmp(&(l as f64)),
        Limit::Float(l) => value.partial_cmp(&l),
    }
}

/// Optional sign, then `0` or digits without a leading zero
fn is_decimal_int(raw: &str) -> bool {
    let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    match digits.as_bytes() {
        [] => false,
        [b'0'] => true,
        [b'0', ..] => false,
        bytes => bytes.iter().all(u8::is_ascii_digit),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a path segment pattern to extract name and type
///
/// Examples:
/// - `{id}` -> ("id", ParamType::String)
/// - `{id:int}` -> ("id", ParamType::Int)
/// - `{price:float}` -> ("price", ParamType::Float)
///
/// # Returns
///
/// `Some((name, type))` if pattern is a parameter, `None` if static segment.
#[must_use]
pub fn parse_param_pattern(segment: &str) -> Option<(String, ParamType)> {
    if segment.len() >= 2 && segment.starts_with('{') && segment.ends_with('}') {
        let inner = &segment[1..segment.len() - 1];

        if let Some((name, type_spec)) = inner.split_once(':') {
            Some((name.to_string(), ParamType::from_specifier(type_spec)))
        } else {
            Some((inner.to_string(), ParamType::String))
        }
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_type_from_specifier() {
        assert_eq!(ParamType::from_specifier("int"), ParamType::Int);
        assert_eq!(ParamType::from_specifier("INT"), ParamType::Int);
        assert_eq!(ParamType::from_specifier("integer"), ParamType::Int);
        assert_eq!(ParamType::from_specifier("float"), ParamType::Float);
        assert_eq!(ParamType::from_specifier("bool"), ParamType::Bool);
        assert_eq!(ParamType::from_specifier("unknown"), ParamType::String);
    }

    #[test]
    fn test_parse_string() {
        let result = ParamType::String.parse("hello").unwrap();
        assert_eq!(result, ParamValue::String("hello".to_string()));
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(ParamType::Int.parse("123").unwrap(), ParamValue::Int(123));
        assert_eq!(ParamType::Int.parse("-456").unwrap(), ParamValue::Int(-456));
    }

    #[test]
    fn test_parse_int_invalid() {
        assert_eq!(
            ParamType::Int.parse("abc"),
            Err(ParamRejection::InvalidType { expected: "int" })
        );
        assert!(ParamType::Int.parse("1.5").is_err());
        assert!(ParamType::Int.parse("").is_err());
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(ParamType::Float.parse("3.25").unwrap(), ParamValue::Float(3.25));
        assert_eq!(ParamType::Float.parse("7").unwrap(), ParamValue::Float(7.0));
    }

    #[test]
    fn test_parse_float_rejects_non_finite() {
        assert!(ParamType::Float.parse("inf").is_err());
        assert!(ParamType::Float.parse("NaN").is_err());
        assert!(ParamType::Float.parse("1.2.3").is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(ParamType::Bool.parse("true").unwrap(), ParamValue::Bool(true));
        assert_eq!(ParamType::Bool.parse("FALSE").unwrap(), ParamValue::Bool(false));
        assert_eq!(ParamType::Bool.parse("1").unwrap(), ParamValue::Bool(true));
        assert_eq!(ParamType::Bool.parse("0").unwrap(), ParamValue::Bool(false));
        assert_eq!(ParamType::Bool.parse("Yes").unwrap(), ParamValue::Bool(true));
        assert_eq!(ParamType::Bool.parse("off").unwrap(), ParamValue::Bool(false));
        assert!(ParamType::Bool.parse("maybe").is_err());
    }

    #[test]
    fn test_parse_param_pattern() {
        assert_eq!(
            parse_param_pattern("{id}"),
            Some(("id".to_string(), ParamType::String))
        );
        assert_eq!(
            parse_param_pattern("{id:int}"),
            Some(("id".to_string(), ParamType::Int))
        );
        assert_eq!(
            parse_param_pattern("{price:float}"),
            Some(("price".to_string(), ParamType::Float))
        );
        assert_eq!(parse_param_pattern("static"), None);
        assert_eq!(parse_param_pattern("}"), None);
    }

    #[test]
    fn test_parse_int_grammar() {
        assert_eq!(ParamType::Int.parse("+7").unwrap(), ParamValue::Int(7));
        assert_eq!(ParamType::Int.parse("0").unwrap(), ParamValue::Int(0));
        assert!(ParamType::Int.parse("007").is_err());
        assert!(ParamType::Int.parse("-01").is_err());
        assert!(ParamType::Int.parse("+").is_err());
        assert!(ParamType::Int.parse(" 7").is_err());
    }

    #[test]
    fn test_compare_to() {
        assert_eq!(
            ParamValue::String("abcd".to_string()).compare_to(Limit::Int(4)),
            Some(Ordering::Equal)
        );
        assert_eq!(ParamValue::Int(-3).compare_to(Limit::Float(-2.5)), Some(Ordering::Less));
        assert_eq!(ParamValue::Float(2.5).compare_to(Limit::Int(2)), Some(Ordering::Greater));
        assert_eq!(ParamValue::Bool(true).compare_to(Limit::Int(1)), None);
    }

    #[test]
    fn test_compare_int_is_exact_past_f64_precision() {
        // 2^53 + 1 rounds to 2^53 as f64
        let value = ParamValue::Int(9_007_199_254_740_993);
        assert_eq!(
            value.compare_to(Limit::Float(9_007_199_254_740_992.0)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            value.compare_to(Limit::Int(9_007_199_254_740_992)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            ParamValue::Int(i64::MAX).compare_to(Limit::Float(f64::INFINITY)),
            Some(Ordering::Less)
        );
    }
}
