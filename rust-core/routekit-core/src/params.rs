//! # Parameter Collection
//!
//! Ordered set of a route's parameters keyed by segment index, and the
//! per-request snapshot of matched values.

use crate::parameter::RouteParameter;
use crate::types::ParamValue;
use crate::validation::ParamRejection;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Parameters of one route, ordered by their position in the pattern
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteParameterCollection {
    by_index: BTreeMap<usize, RouteParameter>,
}

impl RouteParameterCollection {
    /// Create an empty collection
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a parameter at its own format index
    pub fn insert(&mut self, parameter: RouteParameter) {
        self.by_index.insert(parameter.format_index(), parameter);
    }

    /// Whether segment `index` of the pattern is a parameter
    #[must_use]
    pub fn is_parameter_at_index(&self, index: usize) -> bool {
        self.by_index.contains_key(&index)
    }

    /// Look a parameter up by name
    #[must_use]
    pub fn get_param_by_name(&self, name: &str) -> Option<&RouteParameter> {
        self.by_index.values().find(|p| p.name() == name)
    }

    /// Replace the parameter named `name` with `f(parameter)`
    ///
    /// Returns `false` if no parameter has that name.
    pub fn configure<F>(&mut self, name: &str, f: F) -> bool
    where
        F: FnOnce(RouteParameter) -> RouteParameter,
    {
        let Some(index) = self
            .by_index
            .values()
            .find(|p| p.name() == name)
            .map(RouteParameter::format_index)
        else {
            return false;
        };

        if let Some(parameter) = self.by_index.remove(&index) {
            self.by_index.insert(index, f(parameter));
        }
        true
    }

    /// Validate request segments against every parameter
    ///
    /// Nothing is committed until every parameter accepted its segment: on
    /// the first empty or invalid segment the whole attempt is discarded.
    ///
    /// # Errors
    ///
    /// Returns the name of the failing parameter and why it failed.
    pub fn resolve_values(
        &self,
        request_segments: &[&str],
    ) -> std::result::Result<PathParams, (String, ParamRejection)> {
        let mut params = PathParams::default();

        for (index, parameter) in &self.by_index {
            let raw = request_segments.get(*index).copied().unwrap_or_default();

            if raw.is_empty() {
                return Err((parameter.name().to_string(), ParamRejection::Empty));
            }

            let (stored, typed) = parameter
                .accept(raw)
                .map_err(|reason| (parameter.name().to_string(), reason))?;
            params.insert(parameter.name(), stored, typed);
        }

        debug!(count = params.len(), "Route parameters resolved");
        Ok(params)
    }

    /// Number of parameters
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_index.len()
    }

    /// Whether the route declares no parameters
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_index.is_empty()
    }

    /// Iterate parameters in pattern order
    pub fn iter(&self) -> impl Iterator<Item = &RouteParameter> {
        self.by_index.values()
    }
}

/// Parameter values captured for a single request
///
/// Handed to middleware and handlers; owned by the call, never by the route.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathParams {
    values: HashMap<String, String>,
    typed: HashMap<String, ParamValue>,
}

impl PathParams {
    fn insert(&mut self, name: &str, stored: String, typed: ParamValue) {
        self.values.insert(name.to_string(), stored);
        self.typed.insert(name.to_string(), typed);
    }

    /// Stored value by name (escaped if the parameter escapes)
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Typed value by name
    #[must_use]
    pub fn get_typed(&self, name: &str) -> Option<&ParamValue> {
        self.typed.get(name)
    }

    /// Get a parameter as i64 (convenience method)
    #[must_use]
    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.typed.get(name).and_then(ParamValue::as_int)
    }

    /// Get a parameter as f64 (convenience method)
    #[must_use]
    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.typed.get(name).and_then(ParamValue::as_float)
    }

    /// Get a parameter as bool (convenience method)
    #[must_use]
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.typed.get(name).and_then(ParamValue::as_bool)
    }

    /// Name to value mapping
    #[must_use]
    pub fn as_map(&self) -> &HashMap<String, String> {
        &self.values
    }

    /// Number of captured values
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing was captured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParamType;

    fn users_posts() -> RouteParameterCollection {
        // "/users/{id}/posts/{post}" split by '/'
        let mut collection = RouteParameterCollection::new();
        collection.insert(RouteParameter::new("id", 2).with_type(ParamType::Int));
        collection.insert(RouteParameter::new("post", 4));
        collection
    }

    #[test]
    fn test_is_parameter_at_index() {
        let c = users_posts();
        assert!(c.is_parameter_at_index(2));
        assert!(c.is_parameter_at_index(4));
        assert!(!c.is_parameter_at_index(1));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_get_param_by_name() {
        let c = users_posts();
        assert_eq!(c.get_param_by_name("post").map(RouteParameter::format_index), Some(4));
        assert!(c.get_param_by_name("missing").is_none());
    }

    #[test]
    fn test_resolve_values() {
        let c = users_posts();
        let params = c.resolve_values(&["", "users", "7", "posts", "hello"]).unwrap();
        assert_eq!(params.get("id"), Some("7"));
        assert_eq!(params.get_int("id"), Some(7));
        assert_eq!(params.get("post"), Some("hello"));
        assert_eq!(params.as_map().len(), 2);
    }

    #[test]
    fn test_resolve_values_empty_segment_fails() {
        let c = users_posts();
        let err = c.resolve_values(&["", "users", "7", "posts", ""]).unwrap_err();
        assert_eq!(err, ("post".to_string(), ParamRejection::Empty));
    }

    #[test]
    fn test_resolve_values_invalid_fails_without_partial_values() {
        let c = users_posts();
        let err = c.resolve_values(&["", "users", "x", "posts", "ok"]).unwrap_err();
        assert_eq!(err.0, "id");
    }

    #[test]
    fn test_configure() {
        let mut c = users_posts();
        assert!(c.configure("post", |p| p.with_escape(true)));
        assert!(c.get_param_by_name("post").unwrap().should_escape());
        assert!(!c.configure("nope", |p| p));
    }
}
