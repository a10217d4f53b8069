use std::sync::Arc;

use tokio::sync::Mutex;

use crate::log_debug;
use crate::stage::StageHandle;

const ENABLE_LOGS: bool = false;

/// Label text as rendered: spaces become underscores.
pub fn display_text(text: &str) -> String {
    text.replace(' ', "_")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LabelPhase {
    Idle,
    Updating,
}

/// Serializes label rebuilds.
///
/// The stage takes a while to rebuild text geometry, and gesture frames
/// keep arriving in the meantime. While a build is in flight the gate
/// drops follow-up requests outright instead of queueing them; the
/// label only ever shows a state the player actually produced, never a
/// backlog replaying itself.
#[derive(Clone)]
pub struct LabelGate {
    stage: StageHandle,
    phase: Arc<Mutex<LabelPhase>>,
}

impl LabelGate {
    pub fn new(stage: StageHandle) -> Self {
        Self {
            stage,
            phase: Arc::new(Mutex::new(LabelPhase::Idle)),
        }
    }

    /// Request a label rebuild. Returns false when a build is already
    /// in flight and this request was dropped.
    pub async fn request(&self, text: &str) -> bool {
        {
            let mut phase = self.phase.lock().await;
            if *phase == LabelPhase::Updating {
                log_debug!("label busy, dropped {:?}", text);
                return false;
            }
            *phase = LabelPhase::Updating;
        }

        let ack = self.stage.request_label(display_text(text));
        let phase = Arc::clone(&self.phase);
        tokio::spawn(async move {
            // An err means the stage went away; the gate reopens either way.
            let _ = ack.await;
            *phase.lock().await = LabelPhase::Idle;
        });
        true
    }

    pub async fn is_idle(&self) -> bool {
        *self.phase.lock().await == LabelPhase::Idle
    }
}
