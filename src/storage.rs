use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rusqlite::Connection;
use tokio::sync::oneshot;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS form_data (
    form_id  TEXT PRIMARY KEY,
    payload  TEXT NOT NULL,
    saved_at TEXT NOT NULL
);
";

enum StoreCommand {
    Execute(Box<dyn FnOnce(&mut Connection) + Send>),
    Shutdown,
}

/// Persisted form snapshots, written and read from async code.
///
/// rusqlite connections are not Send-friendly across await points, so
/// all sqlite work runs on one dedicated worker thread and callers
/// talk to it over a channel. Clones share the same worker; the worker
/// exits when every handle is gone or after an explicit [`close`].
///
/// [`close`]: FormStore::close
#[derive(Clone)]
pub struct FormStore {
    tx: mpsc::Sender<StoreCommand>,
}

impl FormStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<FormStore> {
        let path = path.into();
        let (tx, rx) = mpsc::channel::<StoreCommand>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();

        thread::Builder::new()
            .name("precarity-store".into())
            .spawn(move || {
                let mut conn = match open_connection(&path) {
                    Ok(conn) => {
                        let _ = ready_tx.send(Ok(()));
                        conn
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                while let Ok(command) = rx.recv() {
                    match command {
                        StoreCommand::Execute(job) => job(&mut conn),
                        StoreCommand::Shutdown => break,
                    }
                }
            })
            .context("failed to spawn store worker")?;

        ready_rx
            .recv()
            .context("store worker exited before reporting readiness")??;
        Ok(FormStore { tx })
    }

    async fn execute<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::Execute(Box::new(move |conn| {
                let _ = tx.send(job(conn));
            })))
            .map_err(|_| anyhow!("store worker is gone"))?;
        rx.await.context("store worker dropped the reply")?
    }

    /// Upsert the snapshot for one form.
    ///
    /// Values arrive as a `BTreeMap` so the serialized payload is
    /// byte-stable: saving the same values twice writes the same bytes.
    pub async fn save_fields(
        &self,
        form_id: &str,
        values: &BTreeMap<String, String>,
    ) -> Result<()> {
        let form_id = form_id.to_string();
        let payload = serde_json::to_string(values).context("failed to encode form payload")?;
        self.execute(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO form_data (form_id, payload, saved_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![form_id, payload, Utc::now().to_rfc3339()],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn load_fields(&self, form_id: &str) -> Result<Option<BTreeMap<String, String>>> {
        let form_id = form_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare("SELECT payload FROM form_data WHERE form_id = ?1")?;
            let mut rows = stmt.query([&form_id])?;
            let Some(row) = rows.next()? else {
                return Ok(None);
            };
            let payload: String = row.get(0)?;
            let values = serde_json::from_str(&payload)
                .context("stored form payload is not valid JSON")?;
            Ok(Some(values))
        })
        .await
    }

    /// Ask the worker to finish up and exit. Outstanding commands that
    /// were queued before this are still processed.
    pub fn close(&self) {
        let _ = self.tx.send(StoreCommand::Shutdown);
    }
}

fn open_connection(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("failed to open form store at {}", path.display()))?;
    conn.pragma_update(None, "journal_mode", "WAL")
        .context("failed to enable WAL")?;
    conn.execute_batch(SCHEMA)
        .context("failed to apply form store schema")?;
    Ok(conn)
}
