//! The one-shot HTTP server completing the Spotify authorization flow.

use std::{
    future::Future,
    sync::{Arc, Mutex, PoisonError},
};

use anyhow::{Context as _, Result};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use serde::Deserialize;
use tokio::{net::TcpListener, sync::oneshot};

const COMPLETED_PAGE: &str =
    "<p>Authorization complete. You can close this window.</p><p>Restart np2bio to start updating your profile.</p>";

struct AuthState {
    authorize_url: String,
    code_sender: Mutex<Option<oneshot::Sender<String>>>,
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    error: Option<String>,
}

/// Routes of the authorization flow.
///
/// The first authorization code received on `/callback` is sent through `code_sender`.
pub fn router(authorize_url: String, code_sender: oneshot::Sender<String>) -> Router {
    let state = Arc::new(AuthState {
        authorize_url,
        code_sender: Mutex::new(Some(code_sender)),
    });
    Router::new()
        .route("/login", get(login))
        .route("/callback", get(callback))
        .with_state(state)
}

/// Serve `router` on `listener` until `shutdown` resolves.
///
/// Requests in flight when `shutdown` resolves are completed first.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "Authorization server listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Authorization server failed")
}

async fn login(State(state): State<Arc<AuthState>>) -> impl IntoResponse {
    (
        StatusCode::FOUND,
        [(header::LOCATION, state.authorize_url.clone())],
    )
}

async fn callback(
    State(state): State<Arc<AuthState>>,
    Query(params): Query<CallbackParams>,
) -> (StatusCode, Html<String>) {
    if let Some(error) = params.error {
        tracing::warn!(%error, "Authorization denied");
        return (
            StatusCode::BAD_REQUEST,
            Html(format!(
                "<p>Authorization failed: {}</p>",
                html_escape::encode_text(&error)
            )),
        );
    }
    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Html("<p>Missing authorization code.</p>".to_string()),
        );
    };

    let sender = state
        .code_sender
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    match sender.map(|s| s.send(code)) {
        Some(Ok(())) => (StatusCode::OK, Html(COMPLETED_PAGE.to_string())),
        _ => {
            tracing::warn!("Ignoring repeated authorization callback");
            (
                StatusCode::CONFLICT,
                Html("<p>Authorization has already been completed.</p>".to_string()),
            )
        }
    }
}
