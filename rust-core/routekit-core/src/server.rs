//! # HTTP Server
//!
//! HTTP/1 transport for an [`App`], built on Hyper and Tokio.
//!
//! ## Key Features
//!
//! - One task per connection; the synchronous dispatcher runs on the
//!   blocking pool so handlers may block freely
//! - Graceful shutdown on Ctrl-C: idle keep-alive connections are closed,
//!   in-flight requests get a bounded drain period
//! - `x-request-id` generated when absent and echoed on the response
//! - `x-client-ip` set from the peer address

use crate::app::App;
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::request::Request;
use crate::response::{Response, GENERIC_FAULT_MESSAGE};
use crate::router::Method;
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::StatusCode;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpSocket;
use tracing::{error, info, warn};

/// HTTP Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to
    pub address: SocketAddr,
    /// Enable keep-alive connections
    pub keep_alive: bool,
    /// Shutdown timeout for graceful shutdown (default: 30 seconds)
    pub shutdown_timeout: Duration,
    /// Max request body size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ServerConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            address: config.address,
            keep_alive: true,
            shutdown_timeout: Duration::from_secs(config.shutdown_timeout_secs),
            max_body_size: config.max_body_size,
        }
    }
}

/// Serves an [`App`] over HTTP
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    app: Arc<App>,
}

impl Server {
    /// Wrap a fully configured application
    #[must_use]
    pub fn new(app: App) -> Self {
        Self {
            config: ServerConfig::from(app.config()),
            app: Arc::new(app),
        }
    }

    /// Bind the server to an address
    #[must_use]
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.config.address = addr;
        self
    }

    /// Set max request body size
    pub fn set_max_body_size(&mut self, bytes: usize) {
        self.config.max_body_size = bytes;
    }

    /// Transport settings
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The application being served
    #[must_use]
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Start the server, shutting down gracefully on Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns `Error::BindError` if the listener cannot be set up and
    /// `Error::Io` if accepting a connection fails.
    pub async fn serve(&self) -> Result<()> {
        self.serve_with_shutdown(shutdown_signal()).await
    }

    /// Start the server, shutting down gracefully once `signal` completes
    ///
    /// On shutdown the listener is closed, idle keep-alive connections are
    /// told to close and in-flight requests get up to `shutdown_timeout` to
    /// finish.
    ///
    /// # Errors
    ///
    /// Same as [`Server::serve`].
    pub async fn serve_with_shutdown<F>(&self, signal: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let addr = self.config.address;
        let bind_error = |source| Error::BindError {
            address: addr.to_string(),
            source,
        };

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(bind_error)?;
        socket.set_reuseaddr(true).map_err(bind_error)?;
        #[cfg(not(windows))]
        {
            socket.set_reuseport(true).map_err(bind_error)?;
        }
        socket.bind(addr).map_err(bind_error)?;
        let listener = socket.listen(1024).map_err(bind_error)?;

        info!(address = %addr, routes = self.app.router().len(), "Server listening");

        let graceful = GracefulShutdown::new();
        let max_body_size = self.config.max_body_size;
        let keep_alive = self.config.keep_alive;
        tokio::pin!(signal);

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    let (stream, remote_addr) = accept_result?;
                    let io = TokioIo::new(stream);
                    let app = Arc::clone(&self.app);

                    let service = service_fn(move |req| {
                        let app = Arc::clone(&app);
                        async move {
                            let method = req.method().clone();
                            let path = req.uri().path().to_string();
                            let response = handle_request(req, app, remote_addr, max_body_size).await;
                            info!(
                                client = %remote_addr,
                                method = %method,
                                path = %path,
                                status = response.status().as_u16(),
                                "Request completed"
                            );
                            Ok::<_, Infallible>(response)
                        }
                    });

                    let conn = http1::Builder::new()
                        .keep_alive(keep_alive)
                        .serve_connection(io, service);
                    let conn = graceful.watch(conn);

                    tokio::task::spawn(async move {
                        if let Err(err) = conn.await {
                            error!(error = ?err, "Error serving connection");
                        }
                    });
                }
                () = &mut signal => {
                    info!("Shutdown signal received, stopping server");
                    break;
                }
            }
        }

        drop(listener);
        if tokio::time::timeout(self.config.shutdown_timeout, graceful.shutdown())
            .await
            .is_err()
        {
            warn!(
                timeout_secs = self.config.shutdown_timeout.as_secs(),
                "Shutdown timeout elapsed with connections still open"
            );
        }
        info!("Server stopped");
        Ok(())
    }

    /// Execute a test request directly without network stack
    pub async fn test_request(
        &self,
        method: Method,
        path: &str,
        headers: HashMap<String, String>,
        body: Option<Bytes>,
    ) -> Response {
        if let Some(b) = body.as_ref() {
            if b.len() > self.config.max_body_size {
                return Response::text("Payload Too Large").with_status(StatusCode::PAYLOAD_TOO_LARGE);
            }
        }

        let mut request = Request::new(method, path, headers, body);
        request.set_header("x-client-ip", "test");
        dispatch(Arc::clone(&self.app), request).await
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to install Ctrl-C handler; shutdown must be external");
        std::future::pending::<()>().await;
    }
}

/// Run the dispatcher on the blocking pool and tag the response
async fn dispatch(app: Arc<App>, mut request: Request) -> Response {
    let request_id = if let Some(id) = request.header("x-request-id").map(str::to_string) {
        id
    } else {
        let id = generate_request_id();
        request.set_header("x-request-id", &id);
        id
    };

    let response = match tokio::task::spawn_blocking(move || app.handle(request)).await {
        Ok(response) => response,
        Err(e) => {
            error!(request_id = %request_id, error = %e, "Dispatcher task failed");
            Response::text(GENERIC_FAULT_MESSAGE).with_status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    };

    response.with_header("x-request-id", &request_id)
}

async fn handle_request(
    req: hyper::Request<Incoming>,
    app: Arc<App>,
    remote_addr: SocketAddr,
    max_body_size: usize,
) -> hyper::Response<Full<Bytes>> {
    let mut request = match Request::from_hyper_with_limit(req, max_body_size).await {
        Ok(r) => r,
        Err(Error::UnsupportedMethod { method }) => {
            warn!(method = %method, "Rejected unsupported method");
            return Response::text("Not Implemented")
                .with_status(StatusCode::NOT_IMPLEMENTED)
                .into_hyper();
        }
        Err(Error::PayloadTooLarge { limit, actual }) => {
            warn!(limit, actual, "Rejected oversized body");
            return Response::text("Payload Too Large")
                .with_status(StatusCode::PAYLOAD_TOO_LARGE)
                .into_hyper();
        }
        Err(e) => {
            error!(error = %e, "Failed to read request");
            return Response::text("Bad Request")
                .with_status(StatusCode::BAD_REQUEST)
                .into_hyper();
        }
    };

    request.set_header("x-client-ip", &remote_addr.ip().to_string());
    dispatch(app, request).await.into_hyper()
}

static REQUEST_COUNTER: AtomicUsize = AtomicUsize::new(1);

fn generate_request_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let counter = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{:x}-{:x}", now.as_nanos(), counter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler;

    fn test_server() -> Server {
        let mut app = App::new(AppConfig::development());
        app.get(
            "/whoami",
            handler(|req, res, _| {
                res.write(req.header("x-client-ip").unwrap_or("-"));
                Ok(())
            }),
        )
        .unwrap();
        app.post(
            "/echo",
            handler(|req, res, _| {
                res.write(req.body_str().unwrap_or_default());
                Ok(())
            }),
        )
        .unwrap();
        Server::new(app)
    }

    #[test]
    fn test_server_config_from_app_config() {
        let config = ServerConfig::from(&AppConfig {
            shutdown_timeout_secs: 5,
            max_body_size: 10,
            ..AppConfig::default()
        });
        assert_eq!(config.address.port(), 8000);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
        assert_eq!(config.max_body_size, 10);
        assert!(config.keep_alive);
    }

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(generate_request_id(), generate_request_id());
    }

    #[tokio::test]
    async fn test_request_dispatches_through_app() {
        let server = test_server();
        let res = server
            .test_request(Method::Get, "/whoami", HashMap::new(), None)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.content(), "test");
        assert!(res.header("x-request-id").is_some());
    }

    #[test]
    fn test_request_method_mismatch() {
        let server = test_server();
        let res = tokio_test::block_on(server.test_request(
            Method::Delete,
            "/whoami",
            HashMap::new(),
            None,
        ));
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_request_id_is_preserved() {
        let server = test_server();
        let headers = HashMap::from([("X-Request-Id".to_string(), "abc-123".to_string())]);
        let res = server
            .test_request(Method::Get, "/whoami", headers, None)
            .await;
        assert_eq!(res.header("x-request-id"), Some("abc-123"));
    }

    #[tokio::test]
    async fn test_request_not_found() {
        let server = test_server();
        let res = server
            .test_request(Method::Get, "/nope", HashMap::new(), None)
            .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_request_body_limit() {
        let mut server = test_server();
        server.set_max_body_size(4);

        let res = server
            .test_request(Method::Post, "/echo", HashMap::new(), Some(Bytes::from("hi")))
            .await;
        assert_eq!(res.content(), "hi");

        let res = server
            .test_request(Method::Post, "/echo", HashMap::new(), Some(Bytes::from("too long")))
            .await;
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_shutdown_closes_idle_keep_alive_connections() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpStream;

        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let server = test_server().bind(addr);
        assert_eq!(server.config().shutdown_timeout, Duration::from_secs(30));
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

        let client = async move {
            let mut stream = loop {
                match TcpStream::connect(addr).await {
                    Ok(stream) => break stream,
                    Err(_) => tokio::time::sleep(Duration::from_millis(10)).await,
                }
            };
            stream
                .write_all(b"GET /whoami HTTP/1.1\r\nHost: localhost\r\n\r\n")
                .await
                .unwrap();
            let mut buf = vec![0; 1024];
            let n = stream.read(&mut buf).await.unwrap();
            assert!(String::from_utf8_lossy(&buf[..n]).starts_with("HTTP/1.1 200"));

            stop_tx.send(()).unwrap();
            // connection stays open and idle while the server drains
            stream
        };
        let serving = server.serve_with_shutdown(async {
            let _ = stop_rx.await;
        });

        let (result, _idle) = tokio::time::timeout(Duration::from_secs(5), async {
            tokio::join!(serving, client)
        })
        .await
        .expect("server should stop without waiting for idle connections");
        assert!(result.is_ok());
    }
}
