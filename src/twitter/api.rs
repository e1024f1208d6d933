use anyhow::{anyhow, Context as _, Result};
use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client};
use serde::Deserialize;
use tracing::{debug, error};

use crate::{args::TwitterCredentials, profile_sync::ProfileUpdater};

use super::oauth1::authorization_header;

pub const API_URL: &str = "https://api.twitter.com";

/// The account the credentials belong to
#[derive(Debug, Deserialize)]
pub struct User {
    pub name: String,
    pub screen_name: String,
}

/// Twitter API v1.1 client, authorized with OAuth 1.0a user credentials
pub struct TwitterClient {
    client: Client,
    credentials: TwitterCredentials,
    api_base: String,
}

impl TwitterClient {
    pub fn new(client: Client, credentials: TwitterCredentials, api_base: String) -> Self {
        Self {
            client,
            credentials,
            api_base,
        }
    }

    /// Check the credentials and return the account they belong to
    pub async fn verify_credentials(&self) -> Result<User> {
        let url = format!("{}/1.1/account/verify_credentials.json", self.api_base);
        let params = [("skip_status", "true"), ("include_email", "true")];

        let response = self
            .client
            .get(&url)
            .query(&params)
            .header(
                AUTHORIZATION,
                authorization_header(&self.credentials, "GET", &url, &params),
            )
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Credentials verification failed: {} - {}", status, body);
            return Err(anyhow!("Credentials verification failed: {}", status));
        }

        response
            .json()
            .await
            .context("Failed to decode the verified account")
    }

    /// Replace the profile biography
    pub async fn update_profile(&self, description: &str) -> Result<()> {
        let url = format!("{}/1.1/account/update_profile.json", self.api_base);
        let params = [("description", description)];

        let response = self
            .client
            .post(&url)
            .form(&params)
            .header(
                AUTHORIZATION,
                authorization_header(&self.credentials, "POST", &url, &params),
            )
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Profile update failed: {} - {}", status, body));
        }
        debug!(%status, "Profile updated");
        Ok(())
    }
}

#[async_trait]
impl ProfileUpdater for TwitterClient {
    async fn update_bio(&self, bio: &str) -> Result<()> {
        self.update_profile(bio).await
    }
}
