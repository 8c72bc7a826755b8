//! # Router
//!
//! Ordered registry of routes with first-match-wins lookup.
//!
//! ## Matching
//!
//! - Linear scan in registration order; the first route that matches wins
//! - Register specific routes (`/a/list`) before general ones (`/a/{id}`)
//! - Matching never mutates a route: matched values come back in [`RouteMatch`]
//!
//! ## Registration
//!
//! A route is rejected when an existing route has the same pattern and
//! shares at least one method, or when it reuses a route name.

use crate::error::{Error, Result};
use crate::params::PathParams;
use crate::request::Request;
use crate::route::Route;
use std::str::FromStr;
use tracing::{debug, info};

/// HTTP methods supported by the router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// HTTP GET
    Get,
    /// HTTP HEAD
    Head,
    /// HTTP POST
    Post,
    /// HTTP PUT
    Put,
    /// HTTP DELETE
    Delete,
    /// HTTP OPTIONS
    Options,
    /// HTTP PATCH
    Patch,
}

impl Method {
    /// Every supported method, used by `any` routes
    pub const ALL: [Self; 7] = [
        Self::Get,
        Self::Head,
        Self::Post,
        Self::Put,
        Self::Delete,
        Self::Options,
        Self::Patch,
    ];

    /// Upper-case method token
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Patch => "PATCH",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| Error::UnsupportedMethod {
                method: s.to_string(),
            })
    }
}

impl TryFrom<&hyper::Method> for Method {
    type Error = Error;

    fn try_from(method: &hyper::Method) -> Result<Self> {
        method.as_str().parse()
    }
}

/// A route that matched a request, with the values captured for this call
#[derive(Debug)]
pub struct RouteMatch<'a> {
    /// The matched route
    pub route: &'a Route,
    /// Parameter values extracted from the request path
    pub params: PathParams,
}

/// Registry of routes
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Create a new empty router
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route
    ///
    /// Returns the stored route so middleware can still be appended.
    ///
    /// # Errors
    ///
    /// Returns `Error::RouteAlreadyExists` when a route with the same pattern
    /// shares a method, and `Error::DuplicateRouteName` when the name is taken.
    pub fn add_route(&mut self, route: Route) -> Result<&mut Route> {
        if let Some(conflict) = self.find_conflict(&route) {
            return Err(conflict);
        }

        info!(
            pattern = %route.pattern(),
            methods = ?route.methods(),
            name = ?route.name(),
            "Route registered"
        );

        self.routes.push(route);
        let index = self.routes.len() - 1;
        Ok(&mut self.routes[index])
    }

    /// Describe why `candidate` cannot be registered, if it cannot
    #[must_use]
    pub fn find_conflict(&self, candidate: &Route) -> Option<Error> {
        self.routes.iter().find_map(|existing| {
            if existing.pattern() == candidate.pattern()
                && existing
                    .methods()
                    .iter()
                    .any(|m| candidate.methods().contains(m))
            {
                return Some(Error::RouteAlreadyExists {
                    pattern: candidate.pattern().to_string(),
                    new_methods: candidate.methods().to_vec(),
                    existing_methods: existing.methods().to_vec(),
                });
            }

            match (existing.name(), candidate.name()) {
                (Some(a), Some(b)) if a == b => Some(Error::DuplicateRouteName {
                    name: b.to_string(),
                    existing_pattern: existing.pattern().to_string(),
                }),
                _ => None,
            }
        })
    }

    /// Match a request against registered routes
    ///
    /// Returns the first route, in registration order, whose method, literal
    /// segments and parameter constraints all accept the request.
    pub fn match_route(&self, request: &Request) -> Option<RouteMatch<'_>> {
        let matched = self.routes.iter().find_map(|route| {
            route
                .match_request(request)
                .map(|params| RouteMatch { route, params })
        });

        match &matched {
            Some(m) => debug!(
                method = %request.method,
                path = %request.path,
                route = %m.route.pattern(),
                "Route matched"
            ),
            None => debug!(method = %request.method, path = %request.path, "No route matched"),
        }

        matched
    }

    /// Get a route by name
    #[must_use]
    pub fn get_route(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.name() == Some(name))
    }

    /// Get a route by name for setup-time changes
    pub fn get_route_mut(&mut self, name: &str) -> Option<&mut Route> {
        self.routes.iter_mut().find(|r| r.name() == Some(name))
    }

    /// Routes in registration order
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Number of registered routes
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no route is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
