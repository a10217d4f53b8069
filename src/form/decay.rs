use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::log_debug;
use crate::stage::StageHandle;
use crate::storage::FormStore;

const ENABLE_LOGS: bool = false;

#[derive(Debug, Clone)]
pub struct DecayConfig {
    /// Idle time on a field before its warning shows and erasure starts.
    pub erase_timeout: Duration,
    /// Spacing between erased characters.
    pub erase_interval: Duration,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            erase_timeout: Duration::from_millis(2000),
            erase_interval: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Default)]
struct FieldEntry {
    value: String,
    last_input_at: Option<DateTime<Utc>>,
    warning: bool,
    timer: Option<CancellationToken>,
    generation: u64,
}

impl FieldEntry {
    /// A decay task only acts while it is still the entry's current
    /// timer; focus clears the timer, new input bumps the generation.
    fn owned_by(&self, generation: u64) -> bool {
        self.timer.is_some() && self.generation == generation
    }
}

/// Decays idle form fields character by character.
///
/// Every input re-arms a per-field timer. When it fires the field's
/// warning comes up and one trailing character is erased per interval
/// until the field is empty. At most one timer is armed per field at
/// any time.
#[derive(Clone)]
pub struct FieldDecayEngine {
    config: DecayConfig,
    form_id: String,
    stage: StageHandle,
    store: FormStore,
    fields: Arc<Mutex<HashMap<String, FieldEntry>>>,
}

impl FieldDecayEngine {
    pub fn new(
        config: DecayConfig,
        form_id: impl Into<String>,
        stage: StageHandle,
        store: FormStore,
    ) -> Self {
        Self {
            config,
            form_id: form_id.into(),
            stage,
            store,
            fields: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn register_fields<I>(&self, ids: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut fields = self.fields.lock().await;
        for id in ids {
            fields.entry(id.into()).or_default();
        }
    }

    /// Record a keystroke: the field's previous timer is cancelled, its
    /// warning cleared, and a fresh timer armed. Fields the form never
    /// declared are tracked from their first input.
    pub async fn handle_input(&self, field_id: &str, value: &str) {
        let token = CancellationToken::new();
        let generation;
        {
            let mut fields = self.fields.lock().await;
            let entry = fields.entry(field_id.to_string()).or_default();
            if let Some(old) = entry.timer.take() {
                old.cancel();
            }
            if entry.warning {
                entry.warning = false;
                self.stage.set_field_warning(field_id, false);
            }
            entry.value = value.to_string();
            entry.last_input_at = Some(Utc::now());
            entry.generation += 1;
            generation = entry.generation;
            entry.timer = Some(token.clone());
        }
        self.spawn_decay(field_id.to_string(), token, generation);
    }

    /// Focusing a field pauses its decay until the next input.
    pub async fn handle_focus(&self, field_id: &str) {
        let mut fields = self.fields.lock().await;
        if let Some(entry) = fields.get_mut(field_id) {
            if let Some(timer) = entry.timer.take() {
                timer.cancel();
            }
            if entry.warning {
                entry.warning = false;
                self.stage.set_field_warning(field_id, false);
            }
        }
    }

    /// Persist all non-empty values and stand every timer down.
    pub async fn save(&self) -> Result<()> {
        let payload = {
            let mut fields = self.fields.lock().await;
            let mut payload = BTreeMap::new();
            for (id, entry) in fields.iter_mut() {
                if let Some(timer) = entry.timer.take() {
                    timer.cancel();
                }
                if entry.warning {
                    entry.warning = false;
                    self.stage.set_field_warning(id, false);
                }
                if !entry.value.is_empty() {
                    payload.insert(id.clone(), entry.value.clone());
                }
            }
            payload
        };
        self.store.save_fields(&self.form_id, &payload).await
    }

    /// Persist the current non-empty values while leaving all timers
    /// armed; the session-timeout path uses this so fields keep
    /// decaying on screen after their contents were captured.
    pub async fn snapshot_persist(&self) -> Result<()> {
        let payload = {
            let fields = self.fields.lock().await;
            fields
                .iter()
                .filter(|(_, entry)| !entry.value.is_empty())
                .map(|(id, entry)| (id.clone(), entry.value.clone()))
                .collect::<BTreeMap<_, _>>()
        };
        self.store.save_fields(&self.form_id, &payload).await
    }

    /// Fill registered fields from the stored snapshot. Restored values
    /// arrive quietly: no timers arm until the player types again.
    pub async fn restore(&self) -> Result<usize> {
        let Some(saved) = self.store.load_fields(&self.form_id).await? else {
            return Ok(0);
        };
        let mut fields = self.fields.lock().await;
        let mut restored = 0;
        for (id, value) in saved {
            if let Some(entry) = fields.get_mut(&id) {
                entry.value = value;
                self.stage.set_field_value(&id, &entry.value);
                restored += 1;
            }
        }
        Ok(restored)
    }

    pub async fn value(&self, field_id: &str) -> Option<String> {
        self.fields
            .lock()
            .await
            .get(field_id)
            .map(|entry| entry.value.clone())
    }

    pub async fn last_input_at(&self, field_id: &str) -> Option<DateTime<Utc>> {
        self.fields
            .lock()
            .await
            .get(field_id)
            .and_then(|entry| entry.last_input_at)
    }

    pub async fn is_armed(&self, field_id: &str) -> bool {
        self.fields
            .lock()
            .await
            .get(field_id)
            .is_some_and(|entry| entry.timer.is_some())
    }

    pub async fn warning_active(&self, field_id: &str) -> bool {
        self.fields
            .lock()
            .await
            .get(field_id)
            .is_some_and(|entry| entry.warning)
    }

    fn spawn_decay(&self, field_id: String, token: CancellationToken, generation: u64) {
        let engine = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(engine.config.erase_timeout) => {}
            }
            engine.erase_until_empty(field_id, token, generation).await;
        });
    }

    async fn erase_until_empty(&self, field_id: String, token: CancellationToken, generation: u64) {
        {
            let mut fields = self.fields.lock().await;
            let Some(entry) = fields.get_mut(&field_id) else {
                return;
            };
            if !entry.owned_by(generation) {
                return;
            }
            entry.warning = true;
            self.stage.set_field_warning(&field_id, true);
            log_debug!("{field_id} idle since {:?}, erasing", entry.last_input_at);
        }

        let mut ticks = tokio::time::interval(self.config.erase_interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; consume it so erasure
        // starts one full interval after the warning.
        ticks.tick().await;

        loop {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = ticks.tick() => {}
            }
            let mut fields = self.fields.lock().await;
            let Some(entry) = fields.get_mut(&field_id) else {
                return;
            };
            if !entry.owned_by(generation) {
                return;
            }
            if entry.value.is_empty() {
                entry.warning = false;
                entry.timer = None;
                self.stage.set_field_warning(&field_id, false);
                return;
            }
            entry.value.pop();
            self.stage.set_field_value(&field_id, &entry.value);
            log_debug!("erased a character from {field_id}, {} left", entry.value.len());
        }
    }
}
