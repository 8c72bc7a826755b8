//! # Routes
//!
//! A registered path pattern with its methods, name, parameters, route
//! middleware and handler.
//!
//! Routes are assembled with [`RouteBuilder`] and are read-only once the
//! application serves traffic: matching hands values back in a fresh
//! [`PathParams`] instead of writing them into the route.

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::fault::{catch_fault, write_fault};
use crate::handler::{Handler, HandlerRegistry, RouteTarget};
use crate::matcher::RouteMatcher;
use crate::middleware::{Middleware, MiddlewareChain, MiddlewareResult};
use crate::parameter::RouteParameter;
use crate::params::{PathParams, RouteParameterCollection};
use crate::request::Request;
use crate::response::Response;
use crate::router::Method;
use crate::types::parse_param_pattern;
use crate::validation::ParamRejection;
use std::collections::{HashMap, HashSet};
use std::fmt;

type ParamConfigurator = Box<dyn FnOnce(RouteParameter) -> RouteParameter + Send>;

/// A path pattern bound to a handler
pub struct Route {
    pattern: String,
    methods: Vec<Method>,
    name: Option<String>,
    segments: Vec<String>,
    parameters: RouteParameterCollection,
    middleware: MiddlewareChain,
    handler: Handler,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern)
            .field("methods", &self.methods)
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("middleware", &self.middleware)
            .finish_non_exhaustive()
    }
}

impl Route {
    /// Start building a route for `pattern`
    ///
    /// `target` is either a [`Handler`] or a `Controller::method` name.
    pub fn builder(pattern: impl Into<String>, target: impl Into<RouteTarget>) -> RouteBuilder {
        RouteBuilder {
            pattern: pattern.into(),
            target: target.into(),
            methods: Vec::new(),
            name: None,
            params: Vec::new(),
            middleware: MiddlewareChain::new(),
        }
    }

    /// Pattern as registered, including any `:type` specifiers
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Allowed methods
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Route name, used for reverse URL generation
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Pattern split on `/`
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Declared parameters
    #[must_use]
    pub fn parameters(&self) -> &RouteParameterCollection {
        &self.parameters
    }

    /// Whether the pattern declares at least one parameter
    #[must_use]
    pub fn has_parameters(&self) -> bool {
        !self.parameters.is_empty()
    }

    /// Route-scoped middleware
    #[must_use]
    pub fn middleware(&self) -> &MiddlewareChain {
        &self.middleware
    }

    /// Append a route-scoped middleware
    pub fn add_middleware<M: Middleware + 'static>(&mut self, middleware: M) -> &mut Self {
        self.middleware.add(middleware);
        self
    }

    /// Reconfigure a declared parameter during setup
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownParameter` if the pattern has no such parameter.
    pub fn where_param<F>(&mut self, name: &str, f: F) -> Result<&mut Self>
    where
        F: FnOnce(RouteParameter) -> RouteParameter,
    {
        if self.parameters.configure(name, f) {
            Ok(self)
        } else {
            Err(Error::UnknownParameter {
                pattern: self.pattern.clone(),
                name: name.to_string(),
            })
        }
    }

    /// Match a request, returning the parameter values for this call
    ///
    /// Checks the method first, then compares the path plainly or
    /// segment by segment depending on whether the route has parameters.
    #[must_use]
    pub fn match_request(&self, request: &Request) -> Option<PathParams> {
        let matcher = RouteMatcher::new(self, request);
        if !matcher.match_request_method() {
            return None;
        }

        if self.has_parameters() {
            matcher.match_parameters(&self.segments, &self.parameters)
        } else {
            matcher.match_plain().then(PathParams::default)
        }
    }

    /// Run route middleware, then the handler
    ///
    /// A middleware that leaves a non-200 status ends the call with that
    /// response. Errors and panics from middleware or the handler become a
    /// 500 whose body depends on `config.is_production`.
    #[must_use]
    pub fn execute(
        &self,
        request: &Request,
        mut response: Response,
        params: &PathParams,
        config: &AppConfig,
    ) -> Response {
        let outcome = catch_fault(|| {
            if self.middleware.run(request, &mut response, params)? == MiddlewareResult::ShortCircuit {
                return Ok(());
            }
            (self.handler)(request, &mut response, params)
        });

        if let Err(detail) = outcome {
            write_fault(&mut response, &detail, config.is_production);
        }
        response
    }

    /// Build a concrete path by substituting `values` into the pattern
    ///
    /// Routes without parameters return their pattern unchanged.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingUrlParameter` when a declared parameter has no
    /// value, and `Error::InvalidUrlParameter` when `validate_values` is set
    /// and a value breaks the parameter's constraints.
    pub fn generate_url(&self, values: &HashMap<&str, &str>, validate_values: bool) -> Result<String> {
        if !self.has_parameters() {
            return Ok(self.pattern.clone());
        }

        let mut segments = self.segments.clone();
        for parameter in self.parameters.iter() {
            let value = values
                .get(parameter.name())
                .ok_or_else(|| Error::MissingUrlParameter {
                    name: parameter.name().to_string(),
                })?;

            if validate_values {
                let verdict = if value.is_empty() {
                    Err(ParamRejection::Empty)
                } else {
                    parameter.check(value).map(|_| ())
                };
                verdict.map_err(|reason| Error::InvalidUrlParameter {
                    name: parameter.name().to_string(),
                    value: (*value).to_string(),
                    reason,
                })?;
            }

            segments[parameter.format_index()] = (*value).to_string();
        }

        Ok(segments.join("/"))
    }
}

/// Configuration assembled before a [`Route`] exists
pub struct RouteBuilder {
    pattern: String,
    target: RouteTarget,
    methods: Vec<Method>,
    name: Option<String>,
    params: Vec<(String, ParamConfigurator)>,
    middleware: MiddlewareChain,
}

impl fmt::Debug for RouteBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteBuilder")
            .field("pattern", &self.pattern)
            .field("target", &self.target)
            .field("methods", &self.methods)
            .field("name", &self.name)
            .field("params", &self.params.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("middleware", &self.middleware)
            .finish()
    }
}

impl RouteBuilder {
    /// Allow one more method
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    /// Allow several methods
    #[must_use]
    pub fn methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods.extend(methods);
        self
    }

    /// Allow every supported method
    #[must_use]
    pub fn any(self) -> Self {
        self.methods(Method::ALL)
    }

    /// Name the route for reverse lookup
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Configure the parameter `name` (type, limits, escaping)
    #[must_use]
    pub fn param<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(RouteParameter) -> RouteParameter + Send + 'static,
    {
        self.params.push((name.into(), Box::new(f)));
        self
    }

    /// Append a route-scoped middleware
    #[must_use]
    pub fn middleware<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middleware.add(middleware);
        self
    }

    /// Build a route whose target is a handler value
    ///
    /// # Errors
    ///
    /// Fails on a malformed pattern, an unknown parameter name, or a named
    /// target (no registry is available to resolve it).
    pub fn build(self) -> Result<Route> {
        self.build_with(&HandlerRegistry::new())
    }

    /// Build a route, resolving a named target through `registry`
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRoutePattern`, `Error::UnknownParameter` or
    /// `Error::UnknownHandler`.
    pub fn build_with(self, registry: &HandlerRegistry) -> Result<Route> {
        let (segments, mut parameters) = parse_pattern(&self.pattern)?;

        for (name, configure) in self.params {
            if !parameters.configure(&name, configure) {
                return Err(Error::UnknownParameter {
                    pattern: self.pattern,
                    name,
                });
            }
        }

        let mut methods: Vec<Method> = Vec::with_capacity(self.methods.len().max(1));
        for method in self.methods {
            if !methods.contains(&method) {
                methods.push(method);
            }
        }
        if methods.is_empty() {
            methods.push(Method::Get);
        }

        let handler = registry.resolve(self.target)?;

        Ok(Route {
            pattern: self.pattern,
            methods,
            name: self.name,
            segments,
            parameters,
            middleware: self.middleware,
            handler,
        })
    }
}

/// Split a pattern on `/` and declare a parameter for every `{...}` segment
fn parse_pattern(pattern: &str) -> Result<(Vec<String>, RouteParameterCollection)> {
    let invalid = |reason: &str| Error::InvalidRoutePattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    if !pattern.starts_with('/') {
        return Err(invalid("pattern must start with '/'"));
    }

    let segments: Vec<String> = pattern.split('/').map(String::from).collect();
    let mut parameters = RouteParameterCollection::new();
    let mut seen = HashSet::new();

    for (index, segment) in segments.iter().enumerate() {
        if !segment.contains(['{', '}']) {
            continue;
        }

        let Some((name, param_type)) = parse_param_pattern(segment) else {
            return Err(invalid("unbalanced braces"));
        };
        if name.contains(['{', '}']) {
            return Err(invalid("unbalanced braces"));
        }
        if name.is_empty() {
            return Err(invalid("empty parameter name"));
        }
        if !seen.insert(name.clone()) {
            return Err(invalid(&format!("duplicate parameter '{name}'")));
        }

        parameters.insert(RouteParameter::new(name, index).with_type(param_type));
    }

    Ok((segments, parameters))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler;
    use crate::types::ParamType;
    use hyper::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn noop(pattern: &str) -> RouteBuilder {
        Route::builder(pattern, handler(|_, _, _| Ok(())))
    }

    fn get(path: &str) -> Request {
        Request::new(Method::Get, path, HashMap::new(), None)
    }

    #[test]
    fn test_parse_pattern_declares_parameters() {
        let route = noop("/users/{user_id:int}/posts/{post_id}").build().unwrap();
        assert_eq!(route.segments(), &["", "users", "{user_id:int}", "posts", "{post_id}"]);

        let user = route.parameters().get_param_by_name("user_id").unwrap();
        assert_eq!(user.format_index(), 2);
        assert_eq!(user.param_type(), ParamType::Int);

        let post = route.parameters().get_param_by_name("post_id").unwrap();
        assert_eq!(post.format_index(), 4);
        assert_eq!(post.param_type(), ParamType::String);
    }

    #[test]
    fn test_invalid_patterns() {
        for pattern in ["users", "/users/{id", "/users/id}", "/users/{}", "/a/{x}/{x}", "/a/{{x}}"] {
            let err = noop(pattern).build().unwrap_err();
            assert!(
                matches!(err, Error::InvalidRoutePattern { .. }),
                "{pattern} should be rejected"
            );
        }
    }

    #[test]
    fn test_unknown_param_configuration() {
        let err = noop("/users/{id}")
            .param("uid", |p| p.with_type(ParamType::Int))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::UnknownParameter { ref name, .. } if name == "uid"));
    }

    #[test]
    fn test_default_and_deduped_methods() {
        assert_eq!(noop("/").build().unwrap().methods(), &[Method::Get]);

        let route = noop("/")
            .method(Method::Post)
            .methods([Method::Post, Method::Put])
            .build()
            .unwrap();
        assert_eq!(route.methods(), &[Method::Post, Method::Put]);
        assert_eq!(noop("/").any().build().unwrap().methods().len(), 7);
    }

    #[test]
    fn test_named_target_needs_registry() {
        let err = Route::builder("/pgp", "Pgp::render").build().unwrap_err();
        assert!(matches!(err, Error::UnknownHandler { .. }));

        let mut registry = HandlerRegistry::new();
        registry.register("Pgp::render", |_, _, _| Ok(()));
        assert!(Route::builder("/pgp", "Pgp::render").build_with(&registry).is_ok());
    }

    #[test]
    fn test_match_request_plain_and_parameterized() {
        let plain = noop("/about").build().unwrap();
        assert_eq!(plain.match_request(&get("/about")), Some(PathParams::default()));
        assert!(plain.match_request(&get("/about/")).is_none());

        let with_id = noop("/users/{id}")
            .param("id", |p| p.with_type(ParamType::Int).with_min_limit(1))
            .build()
            .unwrap();
        assert_eq!(with_id.match_request(&get("/users/42")).unwrap().get("id"), Some("42"));
        assert!(with_id.match_request(&get("/users/abc")).is_none());
        assert!(with_id.match_request(&get("/users/0")).is_none());
    }

    #[test]
    fn test_match_does_not_leak_between_calls() {
        let route = noop("/a/{x}/{y}")
            .param("y", |p| p.with_type(ParamType::Int))
            .build()
            .unwrap();

        let first = route.match_request(&get("/a/one/1")).unwrap();
        assert!(route.match_request(&get("/a/two/oops")).is_none());
        let again = route.match_request(&get("/a/one/1")).unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn test_escaped_parameter() {
        let route = noop("/search/{q}")
            .param("q", |p| p.with_escape(true))
            .build()
            .unwrap();
        let params = route.match_request(&get("/search/<b>")).unwrap();
        assert_eq!(params.get("q"), Some("&lt;b&gt;"));
    }

    #[test]
    fn test_execute_runs_middleware_then_handler() {
        let route = Route::builder(
            "/users/{id}",
            handler(|_, res, args| {
                res.write(&format!("user {}", args.get("id").unwrap_or_default()));
                Ok(())
            }),
        )
        .middleware(|_: &Request, res: &mut Response, _: &PathParams| -> anyhow::Result<()> {
            res.write("[mw]");
            Ok(())
        })
        .build()
        .unwrap();

        let req = get("/users/7");
        let params = route.match_request(&req).unwrap();
        let res = route.execute(&req, Response::new(), &params, &AppConfig::default());
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.content(), "[mw]user 7");
    }

    #[test]
    fn test_execute_short_circuit_skips_rest() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (second, in_handler) = (calls.clone(), calls.clone());

        let route = Route::builder(
            "/admin",
            handler(move |_, _, _| {
                in_handler.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        )
        .middleware(|_: &Request, res: &mut Response, _: &PathParams| -> anyhow::Result<()> {
            res.set_status(StatusCode::FORBIDDEN).write("forbidden");
            Ok(())
        })
        .middleware(move |_: &Request, _: &mut Response, _: &PathParams| -> anyhow::Result<()> {
            second.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .build()
        .unwrap();

        let req = get("/admin");
        let res = route.execute(&req, Response::new(), &PathParams::default(), &AppConfig::default());
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(res.content(), "forbidden");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_execute_fault_modes() {
        let route = noop("/boom").build().unwrap();
        let failing = Route {
            handler: handler(|_, res, _| {
                res.write("partial");
                anyhow::bail!("database unreachable")
            }),
            ..route
        };
        let req = get("/boom");

        let res = failing.execute(&req, Response::new(), &PathParams::default(), &AppConfig::default());
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.content(), format!("{}\n", crate::response::GENERIC_FAULT_MESSAGE));

        let res = failing.execute(&req, Response::new(), &PathParams::default(), &AppConfig::development());
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.content(), "database unreachable\n");
    }

    #[test]
    fn test_execute_catches_panic() {
        let route = Route::builder("/panic", handler(|_, _, _| panic!("handler exploded")))
            .build()
            .unwrap();
        let req = get("/panic");
        let res = route.execute(&req, Response::new(), &PathParams::default(), &AppConfig::development());
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.content(), "handler exploded\n");
    }

    #[test]
    fn test_generate_url() {
        let route = noop("/users/{id}/posts/{slug}")
            .param("id", |p| p.with_type(ParamType::Int).with_min_limit(1))
            .build()
            .unwrap();

        let values = HashMap::from([("id", "42"), ("slug", "hello")]);
        assert_eq!(route.generate_url(&values, true).unwrap(), "/users/42/posts/hello");

        let missing = HashMap::from([("id", "42")]);
        assert!(matches!(
            route.generate_url(&missing, true).unwrap_err(),
            Error::MissingUrlParameter { ref name } if name == "slug"
        ));

        let invalid = HashMap::from([("id", "0"), ("slug", "x")]);
        assert!(matches!(
            route.generate_url(&invalid, true).unwrap_err(),
            Error::InvalidUrlParameter { reason: ParamRejection::TooSmall { .. }, .. }
        ));
        assert_eq!(route.generate_url(&invalid, false).unwrap(), "/users/0/posts/x");
    }

    #[test]
    fn test_generate_url_plain_route() {
        let route = noop("/about/team").build().unwrap();
        assert_eq!(route.generate_url(&HashMap::new(), true).unwrap(), "/about/team");
    }

    #[test]
    fn test_where_param() {
        let mut route = noop("/users/{id}").build().unwrap();
        route
            .where_param("id", |p| p.with_type(ParamType::Int))
            .unwrap();
        assert!(route.match_request(&get("/users/x")).is_none());
        assert!(route.where_param("nope", |p| p).is_err());
    }
}
