use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the Spotify Web API clients
#[derive(Error, Debug)]
pub enum Error {
    /// The request could not be sent, or its response could not be read
    #[error("Request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The response body is not the JSON document we expected
    #[error("Failed to decode response from {url}: {body}")]
    Decode {
        url: String,
        body: String,
        #[source]
        source: serde_json::Error,
    },

    /// The response decoded, but a field we rely on is null or absent
    #[error("Response from {url} ({status}) has no `{field}`: {body}")]
    MissingField {
        url: String,
        status: StatusCode,
        field: &'static str,
        body: String,
    },

    #[error("No Spotify refresh token is configured")]
    NoRefreshToken,
}

impl Error {
    pub(crate) fn transport(url: &str) -> impl FnOnce(reqwest::Error) -> Self + '_ {
        move |source| Self::Transport {
            url: url.to_owned(),
            source,
        }
    }
}
