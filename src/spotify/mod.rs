mod error;
mod playback;
mod token;
mod types;

use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::Url;

use crate::event_loop::PlaybackSource;

// Re-export main functionality
pub use playback::{PlaybackProbe, PlaybackState};
pub use token::TokenManager;

/// Scopes required to read the currently playing track
const SCOPES: &str = "user-read-currently-playing user-read-playback-state";

/// Base URLs of the Spotify services
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub accounts: String,
    pub api: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            accounts: "https://accounts.spotify.com".to_string(),
            api: "https://api.spotify.com".to_string(),
        }
    }
}

/// URL the user has to visit to grant us access to their playback state
///
/// # Errors
///
/// Returns an error if the accounts endpoint is not a valid URL.
pub fn authorize_url(
    endpoints: &Endpoints,
    client_id: &str,
    redirect_uri: &str,
) -> anyhow::Result<Url> {
    Url::parse_with_params(
        &format!("{}/authorize", endpoints.accounts),
        [
            ("client_id", client_id),
            ("response_type", "code"),
            ("redirect_uri", redirect_uri),
            ("scope", SCOPES),
        ],
    )
    .context("Invalid Spotify authorization URL")
}

/// Spotify as a source of playback state: a fresh access token, then the current playback.
pub struct Spotify {
    tokens: TokenManager,
    probe: PlaybackProbe,
}

impl Spotify {
    pub fn new(tokens: TokenManager, probe: PlaybackProbe) -> Self {
        Self { tokens, probe }
    }
}

#[async_trait]
impl PlaybackSource for Spotify {
    async fn current_playback(&self) -> anyhow::Result<PlaybackState> {
        let access_token = self
            .tokens
            .access_token()
            .await
            .context("Failed to renew the Spotify access token")?;
        let state = self
            .probe
            .fetch_current_playback(&access_token)
            .await
            .context("Failed to fetch the current Spotify playback")?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::SpotifyCredentials;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_authorize_url() {
        let url = authorize_url(
            &Endpoints::default(),
            "my-client",
            "http://localhost:3000/callback",
        )
        .unwrap();
        assert_eq!(url.host_str(), Some("accounts.spotify.com"));
        assert_eq!(url.path(), "/authorize");
        let query: Vec<_> = url.query_pairs().into_owned().collect();
        assert_eq!(
            query,
            [
                ("client_id".to_string(), "my-client".to_string()),
                ("response_type".to_string(), "code".to_string()),
                (
                    "redirect_uri".to_string(),
                    "http://localhost:3000/callback".to_string()
                ),
                ("scope".to_string(), SCOPES.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_token_is_renewed_before_each_poll() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "access_token": "fresh" })),
            )
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/me/player/currently-playing"))
            .and(header("authorization", "Bearer fresh"))
            .respond_with(ResponseTemplate::new(204))
            .expect(2)
            .mount(&server)
            .await;

        let endpoints = Endpoints {
            accounts: server.uri(),
            api: server.uri(),
        };
        let client = reqwest::Client::new();
        let spotify = Spotify::new(
            TokenManager::new(
                client.clone(),
                SpotifyCredentials {
                    client_id: "id".to_string(),
                    client_secret: "secret".to_string(),
                },
                Some("refresh".to_string()),
                &endpoints,
                String::new(),
            ),
            PlaybackProbe::new(client, &endpoints, "JP".to_string()),
        );

        for _ in 0..2 {
            assert!(!spotify.current_playback().await.unwrap().is_playing);
        }
    }

    #[tokio::test]
    async fn test_failed_renewal_skips_playback_query() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        let endpoints = Endpoints {
            accounts: server.uri(),
            api: server.uri(),
        };
        let client = reqwest::Client::new();
        let spotify = Spotify::new(
            TokenManager::new(
                client.clone(),
                SpotifyCredentials {
                    client_id: "id".to_string(),
                    client_secret: "secret".to_string(),
                },
                Some("revoked".to_string()),
                &endpoints,
                String::new(),
            ),
            PlaybackProbe::new(client, &endpoints, "JP".to_string()),
        );

        let err = spotify.current_playback().await.unwrap_err();
        assert!(format!("{err:#}").contains("access_token"), "{err:#}");
    }
}
