use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::stage::StageHandle;

/// Pages the installation can route between.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Destination {
    Landing,
    Catch,
    Form,
    Stories,
}

impl Destination {
    pub fn page(&self) -> &'static str {
        match self {
            Destination::Landing => "index.html",
            Destination::Catch => "catch.html",
            Destination::Form => "ds160.html",
            Destination::Stories => "stories.html",
        }
    }
}

/// Events reported by the landing-page video player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    /// Enough of the video buffered to start playback.
    Loaded,
    /// Playback ran to the end.
    Ended,
}

#[derive(Debug, Clone)]
pub struct PlayerFlowConfig {
    /// Hide the loading overlay after this long even if the video
    /// never reports readiness.
    pub loading_fallback: Duration,
}

impl Default for PlayerFlowConfig {
    fn default() -> Self {
        Self {
            loading_fallback: Duration::from_secs(3),
        }
    }
}

/// Drives the landing page: hides the loading overlay on readiness (or
/// after the fallback delay) and routes back to the landing page when
/// playback finishes.
pub fn spawn_player_flow(
    stage: StageHandle,
    config: PlayerFlowConfig,
    mut events: mpsc::UnboundedReceiver<PlayerEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let fallback = tokio::time::sleep(config.loading_fallback);
        tokio::pin!(fallback);
        let mut loading_hidden = false;

        loop {
            tokio::select! {
                _ = &mut fallback, if !loading_hidden => {
                    loading_hidden = true;
                    stage.hide_loading();
                }
                event = events.recv() => match event {
                    Some(PlayerEvent::Loaded) => {
                        if !loading_hidden {
                            loading_hidden = true;
                            stage.hide_loading();
                        }
                    }
                    Some(PlayerEvent::Ended) => {
                        stage.navigate(Destination::Landing);
                        break;
                    }
                    None => break,
                },
            }
        }
    })
}
