
use std::time::Duration;

use anyhow::{ensure, Result};
use async_trait::async_trait;
use tokio::time::{interval, MissedTickBehavior};

use crate::{
    profile_sync::{ProfileSync, ProfileUpdater},
    spotify::PlaybackState,
};

/// Somewhere to read the current playback state from
#[async_trait]
pub trait PlaybackSource: Send + Sync {
    async fn current_playback(&self) -> Result<PlaybackState>;
}

/// Poll `source` every `poll_interval` and mirror it into the profile, until an error occurs.
///
/// The first poll happens right away instead of one interval after startup. Polls never
/// overlap: a slow poll delays the next one.
///
/// # Errors
///
/// Returns an error if `poll_interval` is zero, or as soon as `source` fails.
pub async fn event_loop<S: PlaybackSource, U: ProfileUpdater>(
    source: S,
    sync: ProfileSync<U>,
    poll_interval: Duration,
) -> Result<()> {
    ensure!(!poll_interval.is_zero(), "Poll interval must not be zero");
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut announced = None;
    loop {
        ticker.tick().await;
        announced = poll(&source, &sync, announced).await?;
    }
}

/// One iteration of the loop: read the playback state, then reconcile the profile with it.
pub async fn poll<S: PlaybackSource, U: ProfileUpdater>(
    source: &S,
    sync: &ProfileSync<U>,
    announced: Option<String>,
) -> Result<Option<String>> {
    let current = source.current_playback().await?;
    tracing::debug!(?current, ?announced, "Playback polled");
    Ok(sync.reconcile(announced, &current).await)
}
