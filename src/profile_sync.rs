//! Keeping the profile biography in line with the playback state.


use anyhow::Result;
use async_trait::async_trait;

use crate::spotify::PlaybackState;

/// Tracks are only announced once they have played this long, so that the flickering
/// state right after a skip or a seek is ignored.
pub const ANNOUNCE_AFTER_MS: u64 = 5000;

/// Something holding a biography we can rewrite
#[async_trait]
pub trait ProfileUpdater: Send + Sync {
    async fn update_bio(&self, bio: &str) -> Result<()>;
}

/// Change to apply to the profile after a poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BioChange {
    /// Advertise the playing track with the given biography
    Announce(String),
    /// Go back to the default biography
    Revert,
}

/// Biography advertising the playing track
#[must_use]
pub fn now_playing_bio(state: &PlaybackState) -> String {
    format!(
        "🎵 #NowPlaying #np: {} / {} ({})\n{}",
        state.title, state.artist, state.album, state.track_url
    )
}

/// Decide whether the profile has to change, given the last announced title.
///
/// `announced` is [`None`] when the default biography is showing. A track with an empty
/// title still counts as announced once pushed.
#[must_use]
pub fn plan(announced: Option<&str>, current: &PlaybackState) -> Option<BioChange> {
    if current.is_playing {
        let is_new = announced != Some(current.title.as_str());
        (is_new && current.progress_ms > ANNOUNCE_AFTER_MS)
            .then(|| BioChange::Announce(now_playing_bio(current)))
    } else {
        announced.map(|_| BioChange::Revert)
    }
}

pub struct ProfileSync<U> {
    updater: U,
    default_bio: String,
}

impl<U: ProfileUpdater> ProfileSync<U> {
    pub fn new(updater: U, default_bio: String) -> Self {
        Self {
            updater,
            default_bio,
        }
    }

    /// Push whatever change `current` calls for, and return the new announced title.
    ///
    /// A failed push is logged and otherwise treated like a successful one.
    pub async fn reconcile(
        &self,
        announced: Option<String>,
        current: &PlaybackState,
    ) -> Option<String> {
        match plan(announced.as_deref(), current) {
            None => announced,
            Some(BioChange::Announce(bio)) => {
                tracing::info!(title = %current.title, artist = %current.artist, "Announcing track");
                self.push(&bio).await;
                Some(current.title.clone())
            }
            Some(BioChange::Revert) => {
                tracing::info!("Playback stopped, restoring default biography");
                self.push(&self.default_bio).await;
                None
            }
        }
    }

    async fn push(&self, bio: &str) {
        if let Err(e) = self.updater.update_bio(bio).await {
            tracing::warn!(?e, "Failed to update profile biography");
        }
    }
}
