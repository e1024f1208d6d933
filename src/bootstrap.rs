use std::path::Path;

use anyhow::{Context as _, Result};
use tokio::sync::oneshot;

use crate::{args::Credentials, spotify::TokenManager};

/// Wait for the authorization code, trade it for a refresh token and save it along with the
/// rest of `credentials` into the `.env` file at `env_path`.
///
/// # Errors
///
/// Returns an error if the callback server goes away, the exchange fails or the file cannot
/// be written.
pub async fn bootstrap(
    code_receiver: oneshot::Receiver<String>,
    tokens: &TokenManager,
    credentials: &Credentials,
    env_path: &Path,
) -> Result<()> {
    let code = code_receiver
        .await
        .context("Authorization server stopped before receiving a code")?;
    tracing::info!("Authorization code received");

    let refresh_token = tokens
        .exchange_authorization_code(&code)
        .await
        .context("Failed to exchange the authorization code")?;

    let credentials = Credentials {
        refresh_token: Some(refresh_token),
        ..credentials.clone()
    };
    credentials.save(env_path)?;
    tracing::info!(path = %env_path.display(), "Refresh token saved. Restart np2bio to start updating the profile");
    Ok(())
}
