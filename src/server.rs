//! HTTP server and graceful shutdown.
//!
//! On SIGTERM or Ctrl-C the server:
//! 1. Stops accepting new connections immediately.
//! 2. Closes idle keep-alive connections and lets every in-flight request
//!    finish before closing its connection.
//! 3. Returns from [`Server::serve`], which lets `main` exit cleanly.
//!
//! An in-flight quote request waits on the marketplace API with no timeout
//! of its own, so the orchestrator's termination grace period is the upper
//! bound on how long a drain can take.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{self, HeaderValue};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tracing::{Instrument, debug, error, info, info_span};

use crate::error::Error;
use crate::method::Method;
use crate::middleware::Cors;
use crate::request::Request;
use crate::response::{Response, detail};
use crate::router::{Lookup, Router};
use crate::status::Status;

/// The HTTP server.
pub struct Server {
    listener: TcpListener,
}

/// Everything a connection task needs, shared behind one `Arc`.
struct App {
    router: Router,
    cors: Cors,
}

impl Server {
    /// Binds a listener on `addr` right away, so a port conflict surfaces
    /// before the server is considered started.
    ///
    /// ```rust,no_run
    /// # async fn run() -> Result<(), quotegate::Error> {
    /// let server = quotegate::Server::bind("0.0.0.0:8000").await?;
    /// # Ok(()) }
    /// ```
    pub async fn bind(addr: &str) -> Result<Self, Error> {
        let parsed: SocketAddr = addr.parse().map_err(|source| Error::InvalidAddress {
            addr: addr.to_owned(),
            source,
        })?;
        let listener = TcpListener::bind(parsed).await?;
        Ok(Self { listener })
    }

    /// The address actually bound. Useful when binding port 0.
    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves `router` until SIGTERM or Ctrl-C, then drains in-flight
    /// connections.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        self.serve_with_shutdown(router, shutdown_signal()).await
    }

    /// Serves `router` until `signal` resolves, then drains in-flight
    /// connections.
    pub async fn serve_with_shutdown<F>(self, router: Router, signal: F) -> Result<(), Error>
    where
        F: Future<Output = ()> + Send,
    {
        let addr = self.local_addr()?;
        let app = Arc::new(App { router, cors: Cors::permissive() });
        let listener = self.listener;

        info!(addr = %addr, "quotegate listening");

        let builder = ConnBuilder::new(TokioExecutor::new());
        let graceful = GracefulShutdown::new();
        let mut tasks = tokio::task::JoinSet::new();
        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Check shutdown first so a signal stops accepts even when
                // more connections are queued.
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let app = Arc::clone(&app);
                    let io = TokioIo::new(stream);

                    // Called once per request on the connection.
                    let svc = service_fn(move |req| {
                        let app = Arc::clone(&app);
                        async move { Ok::<_, Infallible>(dispatch(&app, req, remote_addr).await) }
                    });

                    // HTTP/1.1 or HTTP/2, whatever the client negotiates. The
                    // watcher lets shutdown close idle keep-alive connections.
                    let conn = graceful.watch(builder.serve_connection(io, svc).into_owned());

                    tasks.spawn(async move {
                        if let Err(e) = conn.await {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished tasks so the set does not grow without bound.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        // Idle connections close now; busy ones after their current response.
        graceful.shutdown().await;
        while tasks.join_next().await.is_some() {}

        info!("quotegate stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Routes one request and produces one response. Every failure becomes a
/// response here, so hyper never sees an error.
async fn dispatch(
    app: &App,
    req: hyper::Request<Incoming>,
    remote_addr: SocketAddr,
) -> http::Response<Full<Bytes>> {
    let span = info_span!("request", method = %req.method(), path = %req.uri().path(), peer = %remote_addr);
    async move {
        let (parts, body) = req.into_parts();
        let request_headers = parts.headers.clone();

        let mut response = match Method::try_from(&parts.method) {
            Err(_) => detail(Status::MethodNotAllowed),
            Ok(method) => match body.collect().await {
                Ok(collected) => {
                    let request = Request::new(parts, method, collected.to_bytes());
                    match app.cors.preflight(&request) {
                        Some(preflight) => preflight,
                        None => route(&app.router, request).await,
                    }
                }
                Err(e) => {
                    error!(error = %e, "failed to read request body");
                    detail(Status::BadRequest)
                }
            },
        };

        app.cors.decorate(&request_headers, &mut response);
        debug!(status = response.status_code().as_u16(), "request completed");
        response.into_inner()
    }
    .instrument(span)
    .await
}

async fn route(router: &Router, request: Request) -> Response {
    match router.lookup(request.method(), request.path()) {
        Lookup::Found(handler) => handler.call(request).await,
        Lookup::MethodNotAllowed(allowed) => {
            let mut res = detail(Status::MethodNotAllowed);
            let allow = allowed.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ");
            if let Ok(value) = HeaderValue::from_str(&allow) {
                res.headers_mut().insert(header::ALLOW, value);
            }
            res
        }
        Lookup::Redirect(path) => {
            let location = match request.query() {
                Some(q) => format!("{path}?{q}"),
                None => path,
            };
            Response::builder()
                .status(Status::TemporaryRedirect)
                .header(header::LOCATION, &location)
                .no_body()
        }
        Lookup::NotFound => detail(Status::NotFound),
    }
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on SIGTERM (Unix) or Ctrl-C. If a handler cannot be installed the
/// corresponding arm never resolves.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => { stream.recv().await; }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}
