//! # Error Handling
//!
//! Centralized error types for RouteKit core.
//! Uses `thiserror` for ergonomic error definitions.
//!
//! Only setup-time and transport failures live here. A parameter that fails
//! validation is not an error (the router simply keeps scanning), and faults
//! raised by middleware or handlers never leave the dispatcher: they become
//! a 500 response instead.

use crate::router::Method;
use crate::validation::ParamRejection;
use thiserror::Error;

/// Result type alias for RouteKit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the RouteKit runtime
#[derive(Error, Debug)]
pub enum Error {
    /// A route with the same pattern and an overlapping method set is already registered
    #[error(
        "Tried to create route with the request path format ({}). New route: {}, Existing route: {}",
        .pattern,
        describe_methods(.new_methods),
        describe_methods(.existing_methods)
    )]
    RouteAlreadyExists {
        /// The pattern shared by both routes
        pattern: String,
        /// Methods of the route being registered
        new_methods: Vec<Method>,
        /// Methods of the route already in the registry
        existing_methods: Vec<Method>,
    },

    /// A route with the same name is already registered
    #[error("Route name '{name}' is already used by {existing_pattern}")]
    DuplicateRouteName {
        /// The duplicated name
        name: String,
        /// Pattern of the route that owns the name
        existing_pattern: String,
    },

    /// Invalid route pattern provided
    #[error("Invalid route pattern: {pattern}: {reason}")]
    InvalidRoutePattern {
        /// The invalid pattern
        pattern: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Tried to configure a parameter the pattern does not declare
    #[error("Route {pattern} has no parameter named '{name}'")]
    UnknownParameter {
        /// Pattern of the route being configured
        pattern: String,
        /// The missing parameter name
        name: String,
    },

    /// Named controller reference could not be resolved
    #[error("No handler registered under '{name}'")]
    UnknownHandler {
        /// The unresolved `Controller::method` name
        name: String,
    },

    /// URL generation was missing a value for a declared parameter
    #[error("Parameters passed dont contain the following parameter: {name}")]
    MissingUrlParameter {
        /// Name of the missing parameter
        name: String,
    },

    /// URL generation received a value that fails the parameter constraints
    #[error("Value: {value} does not pass the constraints of parameter: {name} ({reason})")]
    InvalidUrlParameter {
        /// Name of the parameter
        name: String,
        /// The rejected value
        value: String,
        /// Why the value was rejected
        reason: ParamRejection,
    },

    /// Reverse lookup by name found nothing
    #[error("No route named '{name}'")]
    RouteNotFound {
        /// The route name that wasn't found
        name: String,
    },

    /// HTTP method outside of the supported set
    #[error("Unsupported request method: {method}")]
    UnsupportedMethod {
        /// The method token as received
        method: String,
    },

    /// Server failed to bind to the specified address
    #[error("Failed to bind server to {address}: {source}")]
    BindError {
        /// The address we tried to bind to
        address: String,
        /// The underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Request payload too large
    #[error("Payload too large: limit={limit} bytes, received={actual} bytes")]
    PayloadTooLarge {
        /// Max allowed size
        limit: usize,
        /// Actual size
        actual: usize,
    },

    /// Configuration file could not be parsed
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// HTTP protocol error
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_methods(methods: &[Method]) -> String {
    let list = methods
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    if methods.len() > 1 {
        format!("request methods: {list}")
    } else {
        format!("request method: {list}")
    }
}
