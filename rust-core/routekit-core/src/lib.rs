//! # RouteKit Core
//!
//! Routing and request-dispatch core for the RouteKit framework.
//!
//! ## Architecture
//!
//! A request passes through global middleware, is matched against the
//! router (first registered match wins), runs the matched route's
//! middleware and handler, and leaves as a finalized response. Routes are
//! immutable while serving; matched parameter values belong to the call.
//!
//! ## Modules
//!
//! - `app` - Dispatcher owning global middleware, router and named handlers
//! - `router` - Route registry with conflict detection and first-match lookup
//! - `route` - Route definition, builder, execution and URL generation
//! - `matcher` - Method, plain and segment-wise matching
//! - `parameter` - Path parameter constraints (type, limits, escaping)
//! - `params` - Parameter collection and per-call matched values
//! - `handler` - Handler type and `Controller::method` registry
//! - `middleware` - Middleware trait, chain and built-in middleware
//! - `request` / `response` / `view` - HTTP message abstractions
//! - `server` - Hyper transport with graceful shutdown
//! - `config` - TOML application configuration
//! - `logging` - Tracing subscriber setup
//! - `types` / `validation` - Parameter types and rejection reasons
//! - `error` - Error types and handling

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod app;
pub mod config;
pub mod error;
mod fault;
pub mod handler;
pub mod logging;
pub mod matcher;
pub mod middleware;
pub mod parameter;
pub mod params;
pub mod request;
pub mod response;
pub mod route;
pub mod router;
pub mod server;
pub mod types;
pub mod validation;
pub mod view;

pub use app::App;
pub use config::AppConfig;
pub use error::{Error, Result};
pub use handler::{handler, Handler, HandlerRegistry, RouteTarget};
pub use logging::{init_tracing, LogFormat};
pub use matcher::RouteMatcher;
pub use middleware::{
    LoggingMiddleware, Middleware, MiddlewareChain, MiddlewareResult, ServerHeaderMiddleware,
};
pub use parameter::RouteParameter;
pub use params::{PathParams, RouteParameterCollection};
pub use request::{MatchedRoute, Request};
pub use response::{CookieOptions, Response, SameSite};
pub use route::{Route, RouteBuilder};
pub use router::{Method, RouteMatch, Router};
pub use server::{Server, ServerConfig};
pub use types::{Limit, ParamType, ParamValue};
pub use validation::{ParamRejection, ValidationResult};
pub use view::{StaticView, View};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
