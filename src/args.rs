use std::{fs::File, io, net::SocketAddr, path::Path, sync::Mutex};

use anyhow::Result;
use clap::{builder::NonEmptyStringValueParser, Parser};
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

use crate::env_file;

/// Command line arguments
///
/// Every credential falls back to the environment variable of the same name, which in turn
/// may come from the `.env` file in the working directory.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(flatten)]
    pub credentials: Credentials,
    /// Seconds to wait between two playback polls
    #[clap(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval: u64,
    /// Address the authorization callback server listens on
    #[clap(long, default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,
    /// Redirect URI registered for the Spotify application
    #[clap(long, default_value = "http://localhost:3000/callback")]
    pub redirect_uri: String,
    /// Market used to resolve the currently playing track
    #[clap(long, default_value = "JP")]
    pub market: String,
    /// File to write the log to. If not specified, logs will be written to stderr.
    #[clap(long, short)]
    log_file: Option<String>,
}

/// Credentials and profile settings, persisted in the `.env` file.
#[derive(clap::Args, Debug, Clone)]
pub struct Credentials {
    #[command(flatten)]
    pub twitter: TwitterCredentials,
    #[command(flatten)]
    pub spotify: SpotifyCredentials,
    /// Spotify refresh token. If not specified, the authorization flow is started instead.
    #[clap(long = "spotify-refresh-token", env = "SPOTIFY_REFRESH_TOKEN", hide_env_values = true)]
    pub refresh_token: Option<String>,
    /// Biography shown while nothing is playing
    #[clap(long, env = "BIO_DEFAULT", default_value = "")]
    pub bio_default: String,
}

/// OAuth 1.0a credentials of the Twitter application and account
#[derive(clap::Args, Debug, Clone)]
pub struct TwitterCredentials {
    /// Twitter consumer key
    #[clap(long = "twitter-consumer-key", env = "TWITTER_CK", hide_env_values = true, value_parser = NonEmptyStringValueParser::new())]
    pub consumer_key: String,
    /// Twitter consumer secret
    #[clap(long = "twitter-consumer-secret", env = "TWITTER_CS", hide_env_values = true, value_parser = NonEmptyStringValueParser::new())]
    pub consumer_secret: String,
    /// Twitter access token
    #[clap(long = "twitter-access-token", env = "TWITTER_AT", hide_env_values = true, value_parser = NonEmptyStringValueParser::new())]
    pub access_token: String,
    /// Twitter access token secret
    #[clap(long = "twitter-access-secret", env = "TWITTER_AS", hide_env_values = true, value_parser = NonEmptyStringValueParser::new())]
    pub access_secret: String,
}

/// Client credentials of the Spotify application
#[derive(clap::Args, Debug, Clone)]
pub struct SpotifyCredentials {
    /// Spotify client ID
    #[clap(long = "spotify-client-id", env = "SPOTIFY_CLIENT_ID", hide_env_values = true, value_parser = NonEmptyStringValueParser::new())]
    pub client_id: String,
    /// Spotify client secret
    #[clap(long = "spotify-client-secret", env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true, value_parser = NonEmptyStringValueParser::new())]
    pub client_secret: String,
}

impl Credentials {
    /// The configured refresh token, treating an empty value as absent
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }

    /// Key/value pairs as stored in the `.env` file
    pub fn env_entries(&self) -> Vec<(&'static str, &str)> {
        let mut entries = vec![
            ("TWITTER_CK", self.twitter.consumer_key.as_str()),
            ("TWITTER_CS", self.twitter.consumer_secret.as_str()),
            ("TWITTER_AT", self.twitter.access_token.as_str()),
            ("TWITTER_AS", self.twitter.access_secret.as_str()),
            ("SPOTIFY_CLIENT_ID", self.spotify.client_id.as_str()),
            ("SPOTIFY_CLIENT_SECRET", self.spotify.client_secret.as_str()),
        ];
        if let Some(token) = self.refresh_token() {
            entries.push(("SPOTIFY_REFRESH_TOKEN", token));
        }
        entries.push(("BIO_DEFAULT", self.bio_default.as_str()));
        entries
    }

    /// Rewrite the whole `.env` file at `path` with these credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        env_file::write(path, self.env_entries())
    }
}

impl Args {
    /// Build the tracing subscriber using parameters from the command line arguments
    ///
    /// # Panics
    ///
    /// Panics if the log file cannot be opened.
    pub fn init_tracing_subscriber(&self) {
        let builder = tracing_subscriber::fmt().pretty().with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        );

        match self.log_file.as_ref() {
            None => builder.with_writer(io::stderr).init(),
            Some(f) => builder
                .with_writer(Mutex::new(File::create(f).unwrap()))
                .init(),
        }
    }
}
