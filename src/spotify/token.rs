use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{header::AUTHORIZATION, Client, StatusCode};
use tracing::debug;

use crate::args::SpotifyCredentials;

use super::{
    error::{Error, Result},
    types::TokenResponse,
    Endpoints,
};

/// Trades authorization codes and refresh tokens for Spotify tokens
#[derive(Clone)]
pub struct TokenManager {
    client: Client,
    credentials: SpotifyCredentials,
    refresh_token: Option<String>,
    token_url: String,
    redirect_uri: String,
}

impl TokenManager {
    pub fn new(
        client: Client,
        credentials: SpotifyCredentials,
        refresh_token: Option<String>,
        endpoints: &Endpoints,
        redirect_uri: String,
    ) -> Self {
        Self {
            client,
            credentials,
            refresh_token,
            token_url: format!("{}/api/token", endpoints.accounts),
            redirect_uri,
        }
    }

    /// Exchange the code handed to the redirect URI for a refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, or the response has no `refresh_token`.
    pub async fn exchange_authorization_code(&self, code: &str) -> Result<String> {
        debug!("Exchanging authorization code");
        let (status, body, response) = self
            .request_token(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .await?;
        response
            .refresh_token
            .ok_or_else(|| self.missing_field(status, "refresh_token", body))
    }

    /// Fetch a fresh access token using the configured refresh token.
    ///
    /// Access tokens are not cached: every call hits the token endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if no refresh token is configured, the request fails, or the
    /// response has no `access_token` (e.g. the refresh token has been revoked).
    pub async fn access_token(&self) -> Result<String> {
        let refresh_token = self.refresh_token.as_deref().ok_or(Error::NoRefreshToken)?;
        let (status, body, response) = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .await?;
        debug!(%status, expires_in = ?response.expires_in, scope = ?response.scope, "Access token renewed");
        response
            .access_token
            .ok_or_else(|| self.missing_field(status, "access_token", body))
    }

    fn basic_auth(&self) -> String {
        let credentials = format!(
            "{}:{}",
            self.credentials.client_id, self.credentials.client_secret
        );
        format!("Basic {}", STANDARD.encode(credentials))
    }

    async fn request_token(
        &self,
        form: &[(&str, &str)],
    ) -> Result<(StatusCode, String, TokenResponse)> {
        let response = self
            .client
            .post(&self.token_url)
            .header(AUTHORIZATION, self.basic_auth())
            .form(form)
            .send()
            .await
            .map_err(Error::transport(&self.token_url))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(Error::transport(&self.token_url))?;

        match serde_json::from_str(&body) {
            Ok(token) => Ok((status, body, token)),
            Err(source) => Err(Error::Decode {
                url: self.token_url.clone(),
                body,
                source,
            }),
        }
    }

    fn missing_field(&self, status: StatusCode, field: &'static str, body: String) -> Error {
        Error::MissingField {
            url: self.token_url.clone(),
            status,
            field,
            body,
        }
    }
}
