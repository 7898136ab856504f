//! HTTP endpoint: every GET on the bridge path runs one serial exchange.

use std::future::Future;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::bridge::Bridge;
use crate::outcome::{Outcome, INTERNAL_ERROR};

/// Default path served by the bridge endpoint.
pub const DEFAULT_PATH: &str = "/serialToHttp/";

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

#[derive(Clone)]
struct AppState {
    bridge: Arc<Bridge>,
    cancel: CancellationToken,
}

/// Build the router serving `path`.
///
/// `cancel` is handed to every exchange, so cancelling it also aborts
/// reads that are still waiting on the line.
pub fn router(bridge: Arc<Bridge>, cancel: CancellationToken, path: &str) -> Router {
    Router::new()
        .route(path, get(exchange_handler))
        .with_state(AppState { bridge, cancel })
}

/// Serve `router` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "http endpoint listening");
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn exchange_handler(State(state): State<AppState>) -> Response {
    let AppState { bridge, cancel } = state;
    let outcome = match tokio::task::spawn_blocking(move || bridge.exchange(&cancel)).await {
        Ok(result) => Outcome::from_result(&result),
        Err(err) => {
            error!(error = %err, "exchange task failed");
            Outcome::error(INTERNAL_ERROR, format!("exchange task failed: {err}"))
        }
    };
    debug!(status = outcome.status, bytes = outcome.body.len(), "request answered");
    respond(outcome)
}

fn respond(outcome: Outcome) -> Response {
    let status = StatusCode::from_u16(outcome.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, TEXT_PLAIN)], outcome.body).into_response()
}
