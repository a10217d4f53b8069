use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;

/// Extra-column value marking a listing the player can actually apply to.
pub const ACCEPTABLE_EXTRA: &str = "Good to apply!";

const TITLE_COLUMN: &str = "title";
const EXTRA_COLUMN: &str = "extra";

/// One listing from the jobs sheet.
///
/// The sheet's columns are free-form; everything it carries survives in
/// `fields`, with the two columns the game reads lifted out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Shown on the label while the job is held.
    pub title: String,
    /// Verdict text; shown on the label when the job is rejected.
    pub extra: String,
    /// Every column of the row, keyed by header.
    pub fields: HashMap<String, String>,
}

impl Job {
    pub fn new(title: impl Into<String>, extra: impl Into<String>) -> Self {
        let title = title.into();
        let extra = extra.into();
        let fields = HashMap::from([
            (TITLE_COLUMN.to_string(), title.clone()),
            (EXTRA_COLUMN.to_string(), extra.clone()),
        ]);
        Self {
            title,
            extra,
            fields,
        }
    }

    pub fn is_acceptable(&self) -> bool {
        self.extra == ACCEPTABLE_EXTRA
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Parse the jobs sheet, tolerantly.
///
/// The sheet is hand-edited, so rows with missing trailing cells and
/// stray whitespace around commas are expected. Cells a row does not
/// have are read as empty, and rows whose cells are all empty are
/// skipped entirely.
pub fn parse_jobs(text: &str) -> Vec<Job> {
    let mut lines = text.trim().lines();
    let Some(header) = lines.next() else {
        return Vec::new();
    };
    let headers: Vec<&str> = header.split(',').map(str::trim).collect();
    let title_at = headers.iter().position(|h| *h == TITLE_COLUMN);
    let extra_at = headers.iter().position(|h| *h == EXTRA_COLUMN);

    let mut jobs = Vec::new();
    for line in lines {
        let values: Vec<&str> = line.split(',').map(str::trim).collect();
        let cell = |at: Option<usize>| -> &str {
            at.and_then(|i| values.get(i).copied()).unwrap_or("")
        };
        let any_filled = (0..headers.len()).any(|i| !cell(Some(i)).is_empty());
        if !any_filled {
            continue;
        }
        let fields = headers
            .iter()
            .enumerate()
            .map(|(i, header)| ((*header).to_string(), cell(Some(i)).to_string()))
            .collect();
        jobs.push(Job {
            title: cell(title_at).to_string(),
            extra: cell(extra_at).to_string(),
            fields,
        });
    }
    jobs
}

pub fn load_jobs(path: &Path) -> Result<Vec<Job>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read jobs sheet at {}", path.display()))?;
    Ok(parse_jobs(&text))
}

/// The listings a session can draw from.
#[derive(Debug, Clone, Default)]
pub struct JobPool {
    jobs: Vec<Job>,
}

impl JobPool {
    pub fn new(jobs: Vec<Job>) -> Self {
        Self { jobs }
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Uniformly pick a listing; `None` when the pool is empty.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Job> {
        self.jobs.choose(rng)
    }
}
