use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::stage::{Overlay, StageHandle};
use crate::{log_error, log_info, log_warn};

use super::decay::FieldDecayEngine;

const ENABLE_LOGS: bool = true;

/// Persistent overlay text once the session clock runs out.
pub const SESSION_TIMEOUT_MESSAGE: &str = "Session timed out";

/// Instructions shown when the form session begins.
pub const INTRO_MESSAGE: &str = "Fill out the form before your session expires.";

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Hard limit on the whole form session.
    pub session_timeout: Duration,
    /// Spacing between officer comments.
    pub comment_period: Duration,
    /// How long each comment stays up.
    pub comment_linger: Duration,
    /// How long the intro overlay stays up.
    pub intro_linger: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_timeout: Duration::from_secs(60),
            comment_period: Duration::from_secs(10),
            comment_linger: Duration::from_secs(8),
            intro_linger: Duration::from_secs(15),
        }
    }
}

/// Cycles through the officer comments in file order.
#[derive(Debug, Clone, Default)]
pub struct CommentRotation {
    comments: Vec<String>,
    next: usize,
}

impl CommentRotation {
    pub fn new(comments: Vec<String>) -> Self {
        Self { comments, next: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn next_comment(&mut self) -> Option<String> {
        if self.comments.is_empty() {
            return None;
        }
        let comment = self.comments[self.next].clone();
        self.next = (self.next + 1) % self.comments.len();
        Some(comment)
    }
}

/// Owns the form session's clock-driven behaviors: the intro overlay,
/// the rotating officer comments, and the one-shot session timeout.
///
/// The timeout captures a snapshot of the fields and raises a
/// persistent overlay, but deliberately leaves every decay timer
/// armed; the form keeps eating itself behind the overlay.
pub struct FormSessionController {
    config: SessionConfig,
    stage: StageHandle,
    decay: FieldDecayEngine,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl FormSessionController {
    pub fn new(config: SessionConfig, stage: StageHandle, decay: FieldDecayEngine) -> Self {
        Self {
            config,
            stage,
            decay,
            cancel: CancellationToken::new(),
            tasks: Vec::new(),
        }
    }

    pub fn start(&mut self, comments: Vec<String>) {
        if !self.tasks.is_empty() {
            log_warn!("form session already running");
            return;
        }
        self.cancel = CancellationToken::new();
        self.tasks.push(self.spawn_intro());
        self.tasks.push(self.spawn_comments(comments));
        self.tasks.push(self.spawn_timeout());
        log_info!("form session started");
    }

    pub async fn stop(&mut self) {
        self.cancel.cancel();
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
        log_info!("form session stopped");
    }

    fn spawn_intro(&self) -> JoinHandle<()> {
        let stage = self.stage.clone();
        let cancel = self.cancel.clone();
        let linger = self.config.intro_linger;
        tokio::spawn(async move {
            stage.show_overlay(Overlay::Intro, INTRO_MESSAGE);
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(linger) => {}
            }
            stage.dismiss_overlay(Overlay::Intro);
        })
    }

    fn spawn_comments(&self, comments: Vec<String>) -> JoinHandle<()> {
        let stage = self.stage.clone();
        let cancel = self.cancel.clone();
        let period = self.config.comment_period;
        let linger = self.config.comment_linger;
        tokio::spawn(async move {
            let mut rotation = CommentRotation::new(comments);
            if rotation.is_empty() {
                log_warn!("no officer comments loaded; rotation disabled");
                return;
            }
            // The first interval tick completes at once, so the first
            // comment shows as soon as the session starts.
            let mut ticks = tokio::time::interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = ticks.tick() => {}
                }
                let Some(text) = rotation.next_comment() else {
                    return;
                };
                stage.show_overlay(Overlay::Comment, text);
                let dismiss_stage = stage.clone();
                let dismiss_cancel = cancel.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        _ = dismiss_cancel.cancelled() => {}
                        _ = tokio::time::sleep(linger) => {}
                    }
                    dismiss_stage.dismiss_overlay(Overlay::Comment);
                });
            }
        })
    }

    fn spawn_timeout(&self) -> JoinHandle<()> {
        let stage = self.stage.clone();
        let cancel = self.cancel.clone();
        let decay = self.decay.clone();
        let timeout = self.config.session_timeout;
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(timeout) => {}
            }
            if let Err(err) = decay.snapshot_persist().await {
                log_error!("session snapshot failed: {err:#}");
            }
            stage.show_overlay(Overlay::SessionTimeout, SESSION_TIMEOUT_MESSAGE);
            log_info!("session timed out; decay timers stay armed");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::decay::DecayConfig;
    use crate::stage::StageCommand;
    use crate::storage::FormStore;
    use tempfile::TempDir;
    use tokio::sync::mpsc;
    use tokio::time::sleep;

    fn slow_decay() -> DecayConfig {
        DecayConfig {
            erase_timeout: Duration::from_millis(150),
            erase_interval: Duration::from_millis(60),
        }
    }

    async fn fixture(
        session: SessionConfig,
        decay_config: DecayConfig,
    ) -> (
        TempDir,
        FormStore,
        FieldDecayEngine,
        FormSessionController,
        mpsc::UnboundedReceiver<StageCommand>,
    ) {
        let dir = TempDir::new().unwrap();
        let store = FormStore::open(dir.path().join("session.sqlite3")).unwrap();
        let (stage, rx) = StageHandle::channel();
        let decay = FieldDecayEngine::new(decay_config, "ds160", stage.clone(), store.clone());
        decay.register_fields(["surname"]).await;
        let controller = FormSessionController::new(session, stage, decay.clone());
        (dir, store, decay, controller, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<StageCommand>) -> Vec<StageCommand> {
        let mut seen = Vec::new();
        while let Ok(command) = rx.try_recv() {
            seen.push(command);
        }
        seen
    }

    #[test]
    fn comment_rotation_cycles_in_order() {
        let mut rotation = CommentRotation::new(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(rotation.len(), 3);
        let shown: Vec<String> = (0..5).filter_map(|_| rotation.next_comment()).collect();
        assert_eq!(shown, vec!["a", "b", "c", "a", "b"]);

        let mut single = CommentRotation::new(vec!["x".into()]);
        assert_eq!(single.next_comment().as_deref(), Some("x"));
        assert_eq!(single.next_comment().as_deref(), Some("x"));

        let mut empty = CommentRotation::default();
        assert!(empty.is_empty());
        assert_eq!(empty.next_comment(), None);
    }

    #[tokio::test]
    async fn comments_show_in_rotation_and_dismiss() {
        let session = SessionConfig {
            session_timeout: Duration::from_secs(30),
            comment_period: Duration::from_millis(60),
            comment_linger: Duration::from_millis(35),
            intro_linger: Duration::from_secs(30),
        };
        let (_dir, _store, _decay, mut controller, mut rx) =
            fixture(session, slow_decay()).await;

        controller.start(vec!["Hurry up.".into(), "Why the delay?".into()]);
        sleep(Duration::from_millis(160)).await;
        controller.stop().await;
        // Dismissers are their own tasks; give the last one a beat.
        sleep(Duration::from_millis(20)).await;

        let seen = drain(&mut rx);
        let comment_events: Vec<Option<String>> = seen
            .iter()
            .filter_map(|c| match c {
                StageCommand::ShowOverlay {
                    overlay: Overlay::Comment,
                    text,
                } => Some(Some(text.clone())),
                StageCommand::DismissOverlay(Overlay::Comment) => Some(None),
                _ => None,
            })
            .collect();
        assert_eq!(
            comment_events,
            vec![
                Some("Hurry up.".to_string()),
                None,
                Some("Why the delay?".to_string()),
                None,
                Some("Hurry up.".to_string()),
                None,
            ]
        );
    }

    #[tokio::test]
    async fn intro_overlay_dismisses_after_linger() {
        let session = SessionConfig {
            session_timeout: Duration::from_secs(30),
            comment_period: Duration::from_secs(30),
            comment_linger: Duration::from_secs(1),
            intro_linger: Duration::from_millis(40),
        };
        let (_dir, _store, _decay, mut controller, mut rx) =
            fixture(session, slow_decay()).await;

        controller.start(Vec::new());
        sleep(Duration::from_millis(100)).await;
        controller.stop().await;

        let seen = drain(&mut rx);
        let intro_events: Vec<Option<String>> = seen
            .iter()
            .filter_map(|c| match c {
                StageCommand::ShowOverlay {
                    overlay: Overlay::Intro,
                    text,
                } => Some(Some(text.clone())),
                StageCommand::DismissOverlay(Overlay::Intro) => Some(None),
                _ => None,
            })
            .collect();
        assert_eq!(intro_events, vec![Some(INTRO_MESSAGE.to_string()), None]);
    }

    #[tokio::test]
    async fn session_timeout_snapshots_but_keeps_decaying() {
        let session = SessionConfig {
            session_timeout: Duration::from_millis(80),
            comment_period: Duration::from_secs(30),
            comment_linger: Duration::from_secs(1),
            intro_linger: Duration::from_secs(30),
        };
        let (_dir, store, decay, mut controller, mut rx) =
            fixture(session, slow_decay()).await;

        decay.handle_input("surname", "Smith").await;
        controller.start(Vec::new());

        sleep(Duration::from_millis(120)).await;
        // Timeout has fired: snapshot captured, timers untouched.
        let loaded = store.load_fields("ds160").await.unwrap().unwrap();
        assert_eq!(loaded.get("surname").map(String::as_str), Some("Smith"));
        assert!(decay.is_armed("surname").await);

        sleep(Duration::from_millis(240)).await;
        let live = decay.value("surname").await.unwrap();
        assert!(live.len() < 5, "expected decay to continue, got {live:?}");
        // The stored snapshot is from timeout instant, not the decayed view.
        let stored = store.load_fields("ds160").await.unwrap().unwrap();
        assert_eq!(stored.get("surname").map(String::as_str), Some("Smith"));

        controller.stop().await;
        let seen = drain(&mut rx);
        let timeouts = seen
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    StageCommand::ShowOverlay {
                        overlay: Overlay::SessionTimeout,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(timeouts, 1);
        assert!(!seen
            .iter()
            .any(|c| matches!(c, StageCommand::DismissOverlay(Overlay::SessionTimeout))));
    }

    #[tokio::test]
    async fn start_is_guarded_and_restart_works() {
        let session = SessionConfig {
            session_timeout: Duration::from_secs(30),
            comment_period: Duration::from_secs(30),
            comment_linger: Duration::from_secs(1),
            intro_linger: Duration::from_secs(30),
        };
        let (_dir, _store, _decay, mut controller, mut rx) =
            fixture(session, slow_decay()).await;

        controller.start(Vec::new());
        controller.start(Vec::new());
        sleep(Duration::from_millis(30)).await;
        controller.stop().await;

        controller.start(Vec::new());
        sleep(Duration::from_millis(30)).await;
        controller.stop().await;

        let seen = drain(&mut rx);
        let intros = seen
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    StageCommand::ShowOverlay {
                        overlay: Overlay::Intro,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(intros, 2);
    }
}
