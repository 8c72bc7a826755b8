//! # Route Parameters
//!
//! One named `{...}` segment of a route pattern together with its
//! constraints: declared type, optional min/max limit and escaping policy.
//!
//! A parameter is configuration only. It never stores a matched value;
//! `accept` hands the validated value back to the caller, who keeps it
//! for the duration of a single request.

use crate::types::{Limit, ParamType, ParamValue};
use std::cmp::Ordering;
use crate::validation::{ParamRejection, ValidationResult};

/// Named path segment and its validation rules
#[derive(Debug, Clone, PartialEq)]
pub struct RouteParameter {
    name: String,
    format_index: usize,
    param_type: ParamType,
    min_limit: Option<Limit>,
    max_limit: Option<Limit>,
    should_escape: bool,
}

impl RouteParameter {
    /// Create an unconstrained string parameter
    ///
    /// `format_index` is the position of the segment in the pattern split by `/`.
    #[must_use]
    pub fn new(name: impl Into<String>, format_index: usize) -> Self {
        Self {
            name: name.into(),
            format_index,
            param_type: ParamType::String,
            min_limit: None,
            max_limit: None,
            should_escape: false,
        }
    }

    /// Parameter name as written in the pattern
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position of the parameter in the slash-split pattern
    #[must_use]
    pub fn format_index(&self) -> usize {
        self.format_index
    }

    /// Declared type
    #[must_use]
    pub fn param_type(&self) -> ParamType {
        self.param_type
    }

    /// Lower bound (value for numbers, length for strings)
    ///
    /// A string bound below 1 reads as 1, whichever order type and limit
    /// were set in.
    #[must_use]
    pub fn min_limit(&self) -> Option<Limit> {
        self.min_limit.map(|limit| self.effective(limit))
    }

    /// Upper bound (value for numbers, length for strings)
    #[must_use]
    pub fn max_limit(&self) -> Option<Limit> {
        self.max_limit.map(|limit| self.effective(limit))
    }

    fn effective(&self, limit: Limit) -> Limit {
        let below_one = limit.compare(Limit::Int(1)) == Some(Ordering::Less);
        if self.param_type == ParamType::String && below_one {
            Limit::Int(1)
        } else {
            limit
        }
    }

    /// Whether accepted values are HTML-escaped
    #[must_use]
    pub fn should_escape(&self) -> bool {
        self.should_escape
    }

    /// Set the type to validate against
    #[must_use]
    pub fn with_type(mut self, param_type: ParamType) -> Self {
        self.param_type = param_type;
        self
    }

    /// Escape accepted values with HTML entities
    #[must_use]
    pub fn with_escape(mut self, should_escape: bool) -> Self {
        self.should_escape = should_escape;
        self
    }

    /// Set both bounds, minimum first; `None` leaves a bound untouched
    #[must_use]
    pub fn with_limit(self, min_limit: Option<Limit>, max_limit: Option<Limit>) -> Self {
        let this = match min_limit {
            Some(min) => self.with_min_limit(min),
            None => self,
        };

        match max_limit {
            Some(max) => this.with_max_limit(max),
            None => this,
        }
    }

    /// Set the lower bound
    ///
    /// If an upper bound is already set and this bound exceeds it, this
    /// bound is clamped down to it.
    #[must_use]
    pub fn with_min_limit(mut self, min_limit: impl Into<Limit>) -> Self {
        let mut min_limit = min_limit.into();

        if let Some(max) = self.max_limit {
            if min_limit.compare(max) == Some(Ordering::Greater) {
                min_limit = max;
            }
        }

        self.min_limit = Some(min_limit);
        self
    }

    /// Set the upper bound
    ///
    /// If a lower bound is already set and this bound is under it, this
    /// bound is raised to it.
    #[must_use]
    pub fn with_max_limit(mut self, max_limit: impl Into<Limit>) -> Self {
        let mut max_limit = max_limit.into();

        if let Some(min) = self.min_limit {
            if max_limit.compare(min) == Some(Ordering::Less) {
                max_limit = min;
            }
        }

        self.max_limit = Some(max_limit);
        self
    }

    /// Check a candidate value against type and limits
    ///
    /// # Errors
    ///
    /// Returns the first constraint the value violates.
    pub fn check(&self, value: &str) -> ValidationResult<ParamValue> {
        let parsed = self.param_type.parse(value)?;
        let is_length = self.param_type == ParamType::String;

        if let Some(min) = self.min_limit() {
            if parsed.compare_to(min) == Some(Ordering::Less) {
                return Err(if is_length {
                    ParamRejection::TooShort { min }
                } else {
                    ParamRejection::TooSmall { min }
                });
            }
        }

        if let Some(max) = self.max_limit() {
            if parsed.compare_to(max) == Some(Ordering::Greater) {
                return Err(if is_length {
                    ParamRejection::TooLong { max }
                } else {
                    ParamRejection::TooLarge { max }
                });
            }
        }

        Ok(parsed)
    }

    /// Whether the value follows every constraint of this parameter
    #[must_use]
    pub fn validate(&self, value: &str) -> bool {
        self.check(value).is_ok()
    }

    /// Validate a value and produce what a handler should see
    ///
    /// Returns the stored string (escaped when `should_escape` is set) and
    /// the typed value parsed from the raw input. Escaping always starts
    /// from the raw input, so accepting the same value twice gives the same
    /// result.
    ///
    /// # Errors
    ///
    /// Returns the rejection from [`RouteParameter::check`].
    pub fn accept(&self, value: &str) -> ValidationResult<(String, ParamValue)> {
        let typed = self.check(value)?;
        let stored = if self.should_escape {
            escape_html(value)
        } else {
            value.to_string()
        };

        Ok((stored, typed))
    }
}

/// Replace HTML special characters with entities
#[must_use]
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());

    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }

    escaped
}
