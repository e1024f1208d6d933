#[cfg(test)]
mod tests;

use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use super::{
    error::{Error, Result},
    types::{CurrentlyPlaying, Track},
    Endpoints,
};

/// Snapshot of what the account is playing.
///
/// When `is_playing` is false, every other field is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub title: String,
    /// Names of all contributing artists, joined by `", "`
    pub artist: String,
    pub album: String,
    pub track_url: String,
    pub progress_ms: u64,
}

impl PlaybackState {
    #[must_use]
    pub fn stopped() -> Self {
        Self::default()
    }

    fn from_track(track: Track, progress_ms: u64) -> Self {
        Self {
            is_playing: true,
            artist: track
                .artists
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            title: track.name,
            album: track.album.name,
            track_url: track.external_urls.spotify.unwrap_or_default(),
            progress_ms,
        }
    }
}

/// Queries the "currently playing" endpoint
#[derive(Clone)]
pub struct PlaybackProbe {
    client: Client,
    url: String,
    market: String,
}

impl PlaybackProbe {
    pub fn new(client: Client, endpoints: &Endpoints, market: String) -> Self {
        Self {
            client,
            url: format!("{}/v1/me/player/currently-playing", endpoints.api),
            market,
        }
    }

    /// Fetch the current playback state of the account owning `access_token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed. An empty body
    /// is how the API says nothing is playing, and is not an error.
    pub async fn fetch_current_playback(&self, access_token: &str) -> Result<PlaybackState> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("market", &self.market)])
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(Error::transport(&self.url))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(Error::transport(&self.url))?;
        parse_currently_playing(&self.url, status, body)
    }
}

/// Normalize a "currently playing" response body.
pub(crate) fn parse_currently_playing(
    url: &str,
    status: StatusCode,
    body: String,
) -> Result<PlaybackState> {
    let current: CurrentlyPlaying = match serde_json::from_str(&body) {
        Ok(c) => c,
        Err(e) if e.is_eof() => {
            debug!(%status, "Empty playback response, nothing is playing");
            return Ok(PlaybackState::stopped());
        }
        Err(source) => {
            return Err(Error::Decode {
                url: url.to_owned(),
                body,
                source,
            })
        }
    };

    let Some(is_playing) = current.is_playing else {
        warn!(%status, "Playback response has no `is_playing`");
        return Err(Error::MissingField {
            url: url.to_owned(),
            status,
            field: "is_playing",
            body,
        });
    };
    if !is_playing {
        return Ok(PlaybackState::stopped());
    }

    // Episodes and ads come without an item unless explicitly requested
    let Some(track) = current.item else {
        info!(kind = ?current.currently_playing_type, "Playing something that is not a track");
        return Ok(PlaybackState::stopped());
    };
    Ok(PlaybackState::from_track(
        track,
        current.progress_ms.unwrap_or_default(),
    ))
}
