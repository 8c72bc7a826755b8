//! # Middleware System
//!
//! Ordered request/response transformers run before the handler.
//!
//! A middleware receives the request, the response built so far and the
//! matched parameters. The chain only looks at the response status: as soon
//! as a middleware leaves it at anything other than `200 OK`, the chain stops
//! and the response is sent as-is.

use crate::params::PathParams;
use crate::request::Request;
use crate::response::Response;
use std::sync::Arc;
use tracing::{debug, info};

/// Middleware trait for request/response interception
pub trait Middleware: Send + Sync {
    /// Transform the response before the handler runs
    ///
    /// Setting a non-200 status short-circuits the rest of the pipeline.
    ///
    /// # Errors
    ///
    /// Any error is turned into a 500 response by the dispatcher.
    fn execute(&self, req: &Request, res: &mut Response, args: &PathParams) -> anyhow::Result<()>;

    /// Middleware name for logging
    fn name(&self) -> &'static str {
        "Unknown"
    }
}

impl<F> Middleware for F
where
    F: Fn(&Request, &mut Response, &PathParams) -> anyhow::Result<()> + Send + Sync,
{
    fn execute(&self, req: &Request, res: &mut Response, args: &PathParams) -> anyhow::Result<()> {
        self(req, res, args)
    }
}

/// Result of middleware execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiddlewareResult {
    /// Continue to next middleware/handler
    Continue,
    /// A middleware set a non-success status; skip everything after it
    ShortCircuit,
}

/// Middleware chain for processing requests
#[derive(Default, Clone)]
pub struct MiddlewareChain {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.middlewares.iter().map(|mw| mw.name()))
            .finish()
    }
}

impl MiddlewareChain {
    /// Create a new empty middleware chain
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a middleware to the chain
    pub fn add<M: Middleware + 'static>(&mut self, middleware: M) {
        self.middlewares.push(Arc::new(middleware));
    }

    /// Add an already shared middleware
    pub fn add_shared(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    /// Run every middleware in order, stopping at the first non-200 status
    ///
    /// # Errors
    ///
    /// Propagates the first middleware error; later middleware do not run.
    pub fn run(
        &self,
        req: &Request,
        res: &mut Response,
        args: &PathParams,
    ) -> anyhow::Result<MiddlewareResult> {
        for mw in &self.middlewares {
            mw.execute(req, res, args)?;

            if !res.is_success() {
                debug!(
                    middleware = mw.name(),
                    status = %res.status(),
                    "Middleware short-circuited"
                );
                return Ok(MiddlewareResult::ShortCircuit);
            }
        }
        Ok(MiddlewareResult::Continue)
    }

    /// Get the number of middlewares
    #[must_use]
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    /// Check if chain is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }
}

/// Logging middleware - logs requests in structured form
#[derive(Default)]
pub struct LoggingMiddleware {
    log_headers: bool,
}

impl LoggingMiddleware {
    /// Create a new logging middleware
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable header logging
    #[must_use]
    pub fn with_headers(mut self) -> Self {
        self.log_headers = true;
        self
    }
}

impl Middleware for LoggingMiddleware {
    fn execute(&self, req: &Request, _res: &mut Response, _args: &PathParams) -> anyhow::Result<()> {
        let request_id = req.header("x-request-id").unwrap_or("-");
        let route = req.route().map_or("-", |r| r.pattern.as_str());
        if self.log_headers {
            info!(
                method = %req.method,
                path = %req.path,
                route = %route,
                request_id = %request_id,
                headers = ?req.headers_map(),
                "Request received"
            );
        } else {
            info!(
                method = %req.method,
                path = %req.path,
                route = %route,
                request_id = %request_id,
                "Request received"
            );
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "LoggingMiddleware"
    }
}

/// Replaces the `Server` header with a fixed value
#[derive(Debug, Clone)]
pub struct ServerHeaderMiddleware {
    value: String,
}

impl ServerHeaderMiddleware {
    /// Announce `value` as the server software
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl Middleware for ServerHeaderMiddleware {
    fn execute(&self, _req: &Request, res: &mut Response, _args: &PathParams) -> anyhow::Result<()> {
        res.set_header("Server", &self.value);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ServerHeaderMiddleware"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::Method;
    use hyper::StatusCode;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn create_test_request() -> Request {
        Request::new(Method::Get, "/", HashMap::new(), None)
    }

    #[test]
    fn test_middleware_chain_empty() {
        let chain = MiddlewareChain::new();
        assert!(chain.is_empty());
        assert_eq!(chain.len(), 0);
    }

    #[test]
    fn test_middleware_chain_add() {
        let mut chain = MiddlewareChain::new();
        chain.add(LoggingMiddleware::new());
        chain.add(ServerHeaderMiddleware::new("openresty"));

        assert!(!chain.is_empty());
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_chain_runs_in_order() {
        let mut chain = MiddlewareChain::new();
        chain.add(|_: &Request, res: &mut Response, _: &PathParams| -> anyhow::Result<()> {
            res.write("1");
            Ok(())
        });
        chain.add(|_: &Request, res: &mut Response, _: &PathParams| -> anyhow::Result<()> {
            res.write("2");
            Ok(())
        });

        let mut res = Response::new();
        let result = chain
            .run(&create_test_request(), &mut res, &PathParams::default())
            .unwrap();
        assert_eq!(result, MiddlewareResult::Continue);
        assert_eq!(res.content(), "12");
    }

    #[test]
    fn test_chain_short_circuits_on_non_ok() {
        let second_ran = Arc::new(AtomicUsize::new(0));
        let counter = second_ran.clone();

        let mut chain = MiddlewareChain::new();
        chain.add(|_: &Request, res: &mut Response, _: &PathParams| -> anyhow::Result<()> {
            res.set_status(StatusCode::FORBIDDEN).write("denied");
            Ok(())
        });
        chain.add(move |_: &Request, _: &mut Response, _: &PathParams| -> anyhow::Result<()> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let mut res = Response::new();
        let result = chain
            .run(&create_test_request(), &mut res, &PathParams::default())
            .unwrap();
        assert_eq!(result, MiddlewareResult::ShortCircuit);
        assert_eq!(second_ran.load(Ordering::SeqCst), 0);
        assert_eq!(res.content(), "denied");
    }

    #[test]
    fn test_chain_propagates_error() {
        let mut chain = MiddlewareChain::new();
        chain.add(|_: &Request, _: &mut Response, _: &PathParams| -> anyhow::Result<()> {
            anyhow::bail!("session store unavailable")
        });

        let mut res = Response::new();
        let err = chain
            .run(&create_test_request(), &mut res, &PathParams::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "session store unavailable");
    }

    #[test]
    fn test_logging_middleware_name() {
        let mw = LoggingMiddleware::new();
        assert_eq!(mw.name(), "LoggingMiddleware");
    }

    #[test]
    fn test_server_header_middleware() {
        let mw = ServerHeaderMiddleware::new("openresty");
        let mut res = Response::new();
        mw.execute(&create_test_request(), &mut res, &PathParams::default())
            .unwrap();
        assert_eq!(res.header("server"), Some("openresty"));
    }
}
