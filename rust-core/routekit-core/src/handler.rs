//! # Handlers
//!
//! Terminal request handlers and the registry of named controllers.
//!
//! A route target is either a handler value or a `Controller::method`
//! name. Names are looked up in a [`HandlerRegistry`] when the route is
//! registered, so a typo fails at startup instead of on the first request.

use crate::error::{Error, Result};
use crate::params::PathParams;
use crate::request::Request;
use crate::response::Response;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Handler function type
///
/// Receives the request, the response produced by middleware and the
/// matched parameters. An `Err` becomes a 500 response.
pub type Handler =
    Arc<dyn Fn(&Request, &mut Response, &PathParams) -> anyhow::Result<()> + Send + Sync>;

/// Wrap a closure or function as a [`Handler`]
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&Request, &mut Response, &PathParams) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// What a route dispatches to
#[derive(Clone)]
pub enum RouteTarget {
    /// A handler value
    Handler(Handler),
    /// A `Controller::method` name resolved through [`HandlerRegistry`]
    Named(String),
}

impl fmt::Debug for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handler(_) => f.write_str("Handler(..)"),
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
        }
    }
}

impl From<Handler> for RouteTarget {
    fn from(handler: Handler) -> Self {
        Self::Handler(handler)
    }
}

impl From<&str> for RouteTarget {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for RouteTarget {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

/// Named controllers available to routes
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Handler>,
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("names", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl HandlerRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under `name`, replacing any previous one
    pub fn register<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response, &PathParams) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Arc::new(f));
        self
    }

    /// Handler registered under `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Handler> {
        self.handlers.get(name)
    }

    /// Turn a route target into a callable handler
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownHandler` if a named target is not registered.
    pub fn resolve(&self, target: RouteTarget) -> Result<Handler> {
        match target {
            RouteTarget::Handler(handler) => Ok(handler),
            RouteTarget::Named(name) => self
                .handlers
                .get(&name)
                .cloned()
                .ok_or(Error::UnknownHandler { name }),
        }
    }

    /// Number of named handlers
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handler is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
