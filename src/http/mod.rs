//! HTTP/JSON transport over the engine.
//!
//! | Route                  | Operation                                 |
//! |------------------------|-------------------------------------------|
//! | `POST /{queue}`        | enqueue, `201 {"id": n}`                  |
//! | `GET /{queue}`         | reserve, `200` job or `204` when empty    |
//! | `DELETE /{queue}/{id}` | delete, `204` whether or not it existed   |
//! | `GET /-/health`        | store health check                        |

pub mod error;
pub mod handlers;

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{delete, get, post};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tracing::{info, warn};

use crate::db::JobStore;
use crate::engine::Engine;
use crate::error::Result;

/// Build the router for `engine`.
pub fn router<S: JobStore + 'static>(engine: Arc<Engine<S>>) -> Router {
    Router::new()
        .route("/-/health", get(handlers::health::<S>))
        .route("/:queue", post(handlers::put::<S>).get(handlers::reserve::<S>))
        .route("/:queue/:id", delete(handlers::delete::<S>))
        .layer(ServiceBuilder::new().layer(middleware::from_fn(log_request)))
        .with_state(engine)
}

/// Serve until `shutdown` resolves, then drain in-flight requests.
pub async fn serve<S, F>(listener: TcpListener, engine: Arc<Engine<S>>, shutdown: F) -> Result<()>
where
    S: JobStore + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, router(engine))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("server shut down");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(%error, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                warn!(%error, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "request"
    );
    response
}
