use anyhow::{anyhow, Result};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use crate::flow::Destination;

/// CSS filter treatments applied to the webcam feed.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Filter {
    /// Dark sepia wash shown when a held job is rejected.
    Rejection,
    /// Blown-out brightness shown when a job is accepted.
    Success,
}

impl Filter {
    pub fn css(&self) -> &'static str {
        match self {
            Filter::Rejection => "brightness(0.1) sepia(100%)",
            Filter::Success => "brightness(5)",
        }
    }
}

/// Overlay slots the stage knows how to show and dismiss.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Overlay {
    Intro,
    Comment,
    SessionTimeout,
    Success,
}

impl Overlay {
    pub fn as_str(&self) -> &'static str {
        match self {
            Overlay::Intro => "intro",
            Overlay::Comment => "comment",
            Overlay::SessionTimeout => "session-timeout",
            Overlay::Success => "success",
        }
    }
}

/// Commands accepted by the rendering collaborator.
///
/// The stage is a write-only sink: apart from `BuildLabel`, which acks
/// once the slow text-geometry build finishes, nothing flows back.
#[derive(Debug)]
pub enum StageCommand {
    SetStatus(String),
    BuildLabel {
        text: String,
        done: oneshot::Sender<()>,
    },
    ApplyFilter(Filter),
    ClearFilter,
    ShowOverlay {
        overlay: Overlay,
        text: String,
    },
    DismissOverlay(Overlay),
    Navigate(Destination),
    HideLoading,
    SetFieldValue {
        field_id: String,
        value: String,
    },
    SetFieldWarning {
        field_id: String,
        active: bool,
    },
    SetStoryBlur {
        card: usize,
        blur: f32,
    },
    /// Color-feedback pulse for the left-hand touch interaction.
    PulseAccent,
}

#[derive(Clone)]
pub struct StageHandle {
    tx: mpsc::UnboundedSender<StageCommand>,
}

impl StageHandle {
    pub fn channel() -> (StageHandle, mpsc::UnboundedReceiver<StageCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (StageHandle { tx }, rx)
    }

    fn send(&self, command: StageCommand) {
        // A disconnected stage is tolerated; commands are fire-and-forget.
        let _ = self.tx.send(command);
    }

    pub fn set_status(&self, text: impl Into<String>) {
        self.send(StageCommand::SetStatus(text.into()));
    }

    /// Queue a label rebuild and return the ack the stage will send
    /// once the slow text-geometry build completes.
    ///
    /// This is the one request/reply operation on the boundary. The
    /// command is enqueued before this returns, so label builds keep
    /// their position relative to other stage commands even when the
    /// caller defers awaiting the ack.
    pub fn request_label(&self, text: impl Into<String>) -> oneshot::Receiver<()> {
        let (done, ack) = oneshot::channel();
        let _ = self.tx.send(StageCommand::BuildLabel {
            text: text.into(),
            done,
        });
        ack
    }

    /// Request a label rebuild and wait for the stage to finish it.
    pub async fn build_label(&self, text: impl Into<String>) -> Result<()> {
        self.request_label(text)
            .await
            .map_err(|_| anyhow!("stage dropped label build before acking"))
    }

    pub fn apply_filter(&self, filter: Filter) {
        self.send(StageCommand::ApplyFilter(filter));
    }

    pub fn clear_filter(&self) {
        self.send(StageCommand::ClearFilter);
    }

    pub fn show_overlay(&self, overlay: Overlay, text: impl Into<String>) {
        self.send(StageCommand::ShowOverlay {
            overlay,
            text: text.into(),
        });
    }

    pub fn dismiss_overlay(&self, overlay: Overlay) {
        self.send(StageCommand::DismissOverlay(overlay));
    }

    pub fn navigate(&self, destination: Destination) {
        self.send(StageCommand::Navigate(destination));
    }

    pub fn hide_loading(&self) {
        self.send(StageCommand::HideLoading);
    }

    pub fn set_field_value(&self, field_id: &str, value: &str) {
        self.send(StageCommand::SetFieldValue {
            field_id: field_id.to_string(),
            value: value.to_string(),
        });
    }

    pub fn set_field_warning(&self, field_id: &str, active: bool) {
        self.send(StageCommand::SetFieldWarning {
            field_id: field_id.to_string(),
            active,
        });
    }

    pub fn set_story_blur(&self, card: usize, blur: f32) {
        self.send(StageCommand::SetStoryBlur { card, blur });
    }

    pub fn pulse_accent(&self) {
        self.send(StageCommand::PulseAccent);
    }
}

/// Demo renderer: drains stage commands into log lines.
///
/// Stands in for the browser page during headless runs; label builds
/// are acked immediately since there is no real font to fetch.
pub async fn run_console_stage(mut rx: mpsc::UnboundedReceiver<StageCommand>) {
    while let Some(command) = rx.recv().await {
        match command {
            StageCommand::SetStatus(text) => log::info!("[stage] status: {text}"),
            StageCommand::BuildLabel { text, done } => {
                log::info!("[stage] label: {text}");
                let _ = done.send(());
            }
            StageCommand::ApplyFilter(filter) => {
                log::info!("[stage] filter: {}", filter.css());
            }
            StageCommand::ClearFilter => log::info!("[stage] filter: none"),
            StageCommand::ShowOverlay { overlay, text } => {
                log::info!("[stage] overlay {} on: {text}", overlay.as_str());
            }
            StageCommand::DismissOverlay(overlay) => {
                log::info!("[stage] overlay {} off", overlay.as_str());
            }
            StageCommand::Navigate(destination) => {
                log::info!("[stage] navigate -> {}", destination.page());
            }
            StageCommand::HideLoading => log::info!("[stage] loading hidden"),
            StageCommand::SetFieldValue { field_id, value } => {
                log::info!("[stage] field {field_id} = {value:?}");
            }
            StageCommand::SetFieldWarning { field_id, active } => {
                log::info!(
                    "[stage] field {field_id} warning {}",
                    if active { "on" } else { "off" }
                );
            }
            StageCommand::SetStoryBlur { card, blur } => {
                log::info!("[stage] story {card} blur {blur:.1}px");
            }
            StageCommand::PulseAccent => log::info!("[stage] accent pulse"),
        }
    }
}
