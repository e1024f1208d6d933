use std::{future::pending, path::Path, time::Duration};

use anyhow::{bail, Context as _, Result};
use args::Args;
use clap::Parser as _;
use event_loop::event_loop;
use profile_sync::ProfileSync;
use spotify::{Endpoints, PlaybackProbe, Spotify, TokenManager};
use tokio::{net::TcpListener, select, sync::oneshot};
use twitter::TwitterClient;

mod args;
mod auth_server;
mod bootstrap;
mod env_file;
mod event_loop;
mod profile_sync;
mod spotify;
mod twitter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Exported before parsing, so clap can pick the values up
    let env_path = Path::new(env_file::ENV_FILE);
    let env_loaded = env_file::load(env_path)?;

    let args = Args::parse();
    args.init_tracing_subscriber();
    tracing::debug!(env_loaded, "Configuration loaded");

    let listener = TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("Failed to listen on {}", args.listen))?;
    run(
        args,
        listener,
        &Endpoints::default(),
        twitter::api::API_URL,
        env_path,
    )
    .await
    .inspect_err(|e| tracing::error!("{e:#}"))
}

/// Serve the authorization flow on `listener`, alongside either the polling loop or, without
/// a refresh token, the bootstrap that saves one to `env_path`.
async fn run(
    args: Args,
    listener: TcpListener,
    endpoints: &Endpoints,
    twitter_api: &str,
    env_path: &Path,
) -> Result<()> {
    let credentials = &args.credentials;
    let http = reqwest::Client::new();
    let tokens = TokenManager::new(
        http.clone(),
        credentials.spotify.clone(),
        credentials.refresh_token().map(ToOwned::to_owned),
        endpoints,
        args.redirect_uri.clone(),
    );
    let authorize_url =
        spotify::authorize_url(endpoints, &credentials.spotify.client_id, &args.redirect_uri)?;

    let (code_sender, code_receiver) = oneshot::channel();
    let (shutdown_sender, shutdown_receiver) = oneshot::channel::<()>();
    let mut server = tokio::spawn(auth_server::serve(
        listener,
        auth_server::router(authorize_url.to_string(), code_sender),
        async {
            _ = shutdown_receiver.await;
        },
    ));

    let polling = async {
        if credentials.refresh_token().is_none() {
            tracing::warn!(
                %authorize_url,
                "SPOTIFY_REFRESH_TOKEN is not set. Open the authorization URL to grant access"
            );
            return pending().await;
        }

        let twitter = TwitterClient::new(
            http.clone(),
            credentials.twitter.clone(),
            twitter_api.to_string(),
        );
        let user = twitter
            .verify_credentials()
            .await
            .context("Failed to log in on Twitter")?;
        tracing::info!("Logged in as {} (@{}) on Twitter", user.name, user.screen_name);

        let spotify = Spotify::new(
            tokens.clone(),
            PlaybackProbe::new(http.clone(), endpoints, args.market.clone()),
        );
        event_loop(
            spotify,
            ProfileSync::new(twitter, credentials.bio_default.clone()),
            Duration::from_secs(args.poll_interval),
        )
        .await
    };

    select! {
        result = &mut server => {
            result.context("Authorization server panicked")??;
            bail!("Authorization server stopped unexpectedly");
        }
        result = polling => result,
        result = bootstrap::bootstrap(code_receiver, &tokens, credentials, env_path) => {
            result?;
            // Let the callback response go out before exiting
            _ = shutdown_sender.send(());
            server.await.context("Authorization server panicked")?
        }
    }
}
