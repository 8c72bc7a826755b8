//! # Route Matcher
//!
//! Matching logic between one declared route and one incoming request.
//!
//! Patterns and paths are both split on `/`, so a pattern with N segments
//! only matches paths with exactly N segments. There are no wildcards, no
//! optional segments and no backtracking.

use crate::params::{PathParams, RouteParameterCollection};
use crate::request::Request;
use crate::route::Route;
use tracing::debug;

/// Matches a route against a request without touching the route
#[derive(Debug, Clone, Copy)]
pub struct RouteMatcher<'a> {
    route: &'a Route,
    request: &'a Request,
}

impl<'a> RouteMatcher<'a> {
    /// Pair a route with the request being dispatched
    #[must_use]
    pub fn new(route: &'a Route, request: &'a Request) -> Self {
        Self { route, request }
    }

    /// Whether the request method is one of the route's methods
    #[must_use]
    pub fn match_request_method(&self) -> bool {
        self.route.methods().contains(&self.request.method)
    }

    /// Exact comparison for routes without parameters
    #[must_use]
    pub fn match_plain(&self) -> bool {
        !self.route.has_parameters() && self.route.pattern() == self.request.path
    }

    /// Segment-wise comparison for routes with parameters
    ///
    /// Checks the segment count, then every literal segment, then validates
    /// each parameter. Values are returned only if every step passed.
    #[must_use]
    pub fn match_parameters(
        &self,
        route_segments: &[String],
        parameters: &RouteParameterCollection,
    ) -> Option<PathParams> {
        let request_segments = self.request.segments();
        if request_segments.len() != route_segments.len() {
            return None;
        }

        let literals_match = route_segments
            .iter()
            .zip(&request_segments)
            .enumerate()
            .filter(|(index, _)| !parameters.is_parameter_at_index(*index))
            .all(|(_, (expected, actual))| expected == actual);
        if !literals_match {
            return None;
        }

        match parameters.resolve_values(&request_segments) {
            Ok(params) => Some(params),
            Err((name, reason)) => {
                debug!(
                    route = %self.route.pattern(),
                    param = %name,
                    reason = %reason,
                    "Parameter rejected"
                );
                None
            }
        }
    }
}
