//! # Application Dispatcher
//!
//! Owns global middleware, the router and the named-handler registry, and
//! turns one [`Request`] into one finalized [`Response`]:
//!
//! 1. global middleware, stopping at the first non-200 status
//! 2. route lookup, `404 Not Found` when nothing matches
//! 3. route middleware and handler via [`Route::execute`]
//! 4. [`Response::finalize`]
//!
//! Routes are registered during setup through `&mut App`; serving only
//! needs `&App`, so one instance can be shared across threads.

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::fault::{catch_fault, write_fault};
use crate::handler::{handler, HandlerRegistry, RouteTarget};
use crate::middleware::{Middleware, MiddlewareChain, MiddlewareResult, ServerHeaderMiddleware};
use crate::params::PathParams;
use crate::request::Request;
use crate::response::Response;
use crate::route::{Route, RouteBuilder};
use crate::router::{Method, RouteMatch, Router};
use crate::view::View;
use hyper::StatusCode;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Routing application
#[derive(Debug)]
pub struct App {
    config: AppConfig,
    router: Router,
    middleware: MiddlewareChain,
    handlers: HandlerRegistry,
}

impl Default for App {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl App {
    /// Create an application
    ///
    /// Installs the server header middleware first when
    /// `spoof_server_header` is set.
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        let mut middleware = MiddlewareChain::new();
        if config.spoof_server_header {
            middleware.add(ServerHeaderMiddleware::new(config.server_header_value.clone()));
        }

        Self {
            config,
            router: Router::new(),
            middleware,
            handlers: HandlerRegistry::new(),
        }
    }

    /// Application configuration
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Registered routes
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Append a global middleware, run before route matching
    pub fn add_middleware<M: Middleware + 'static>(&mut self, middleware: M) -> &mut Self {
        self.middleware.add(middleware);
        self
    }

    /// Register a named controller for `Controller::method` targets
    pub fn register_handler<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response, &PathParams) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handlers.register(name, f);
        self
    }

    /// Register a configured route
    ///
    /// # Errors
    ///
    /// Returns the build error (pattern, parameter or handler) or the
    /// registration conflict.
    pub fn add_route(&mut self, builder: RouteBuilder) -> Result<&mut Route> {
        let route = builder.build_with(&self.handlers)?;
        self.router.add_route(route)
    }

    /// Register `target` for `pattern` on the given methods
    ///
    /// # Errors
    ///
    /// See [`App::add_route`].
    pub fn route(
        &mut self,
        pattern: &str,
        target: impl Into<RouteTarget>,
        methods: impl IntoIterator<Item = Method>,
        name: Option<&str>,
    ) -> Result<&mut Route> {
        let mut builder = Route::builder(pattern, target).methods(methods);
        if let Some(name) = name {
            builder = builder.name(name);
        }
        self.add_route(builder)
    }

    /// Register a GET route
    ///
    /// # Errors
    ///
    /// See [`App::add_route`].
    pub fn get(&mut self, pattern: &str, target: impl Into<RouteTarget>) -> Result<&mut Route> {
        self.route(pattern, target, [Method::Get], None)
    }

    /// Register a POST route
    ///
    /// # Errors
    ///
    /// See [`App::add_route`].
    pub fn post(&mut self, pattern: &str, target: impl Into<RouteTarget>) -> Result<&mut Route> {
        self.route(pattern, target, [Method::Post], None)
    }

    /// Register a PUT route
    ///
    /// # Errors
    ///
    /// See [`App::add_route`].
    pub fn put(&mut self, pattern: &str, target: impl Into<RouteTarget>) -> Result<&mut Route> {
        self.route(pattern, target, [Method::Put], None)
    }

    /// Register a DELETE route
    ///
    /// # Errors
    ///
    /// See [`App::add_route`].
    pub fn delete(&mut self, pattern: &str, target: impl Into<RouteTarget>) -> Result<&mut Route> {
        self.route(pattern, target, [Method::Delete], None)
    }

    /// Register a PATCH route
    ///
    /// # Errors
    ///
    /// See [`App::add_route`].
    pub fn patch(&mut self, pattern: &str, target: impl Into<RouteTarget>) -> Result<&mut Route> {
        self.route(pattern, target, [Method::Patch], None)
    }

    /// Register an OPTIONS route
    ///
    /// # Errors
    ///
    /// See [`App::add_route`].
    pub fn options(&mut self, pattern: &str, target: impl Into<RouteTarget>) -> Result<&mut Route> {
        self.route(pattern, target, [Method::Options], None)
    }

    /// Register a route for every supported method
    ///
    /// # Errors
    ///
    /// See [`App::add_route`].
    pub fn any(&mut self, pattern: &str, target: impl Into<RouteTarget>) -> Result<&mut Route> {
        self.route(pattern, target, Method::ALL, None)
    }

    /// Register a GET route that only renders `view`
    ///
    /// # Errors
    ///
    /// See [`App::add_route`].
    pub fn view(
        &mut self,
        pattern: &str,
        view: Arc<dyn View>,
        name: Option<&str>,
    ) -> Result<&mut Route> {
        let target = handler(move |_, res, _| {
            res.set_view(Arc::clone(&view));
            Ok(())
        });
        self.route(pattern, target, [Method::Get], name)
    }

    /// Build the URL of the route called `name`
    ///
    /// # Errors
    ///
    /// Returns `Error::RouteNotFound` for an unknown name, otherwise the
    /// errors of [`Route::generate_url`].
    pub fn url_for(&self, name: &str, values: &HashMap<&str, &str>) -> Result<String> {
        self.router
            .get_route(name)
            .ok_or_else(|| Error::RouteNotFound {
                name: name.to_string(),
            })?
            .generate_url(values, true)
    }

    /// Dispatch one request to completion
    ///
    /// Never fails: conflicts are setup-time errors, and runtime faults are
    /// already folded into the returned response.
    #[must_use]
    pub fn handle(&self, mut request: Request) -> Response {
        let is_production = self.config.is_production;
        let mut response = Response::new();
        let no_params = PathParams::default();

        match catch_fault(|| self.middleware.run(&request, &mut response, &no_params)) {
            Ok(MiddlewareResult::Continue) => {}
            Ok(MiddlewareResult::ShortCircuit) => return response.finalize(is_production),
            Err(detail) => {
                write_fault(&mut response, &detail, is_production);
                return response.finalize(is_production);
            }
        }

        let Some(RouteMatch { route, params }) = self.router.match_route(&request) else {
            debug!(method = %request.method, path = %request.path, "Responding 404");
            response.set_status(StatusCode::NOT_FOUND);
            return response.finalize(is_production);
        };

        request.bind_route(route.pattern(), route.name());
        route
            .execute(&request, response, &params, &self.config)
            .finalize(is_production)
    }
}
