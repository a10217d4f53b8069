use std::env;
use std::path::PathBuf;

/// Overrides the bundled asset directory.
pub const ASSETS_DIR_VAR: &str = "PRECARITY_ASSETS";

/// Overrides where the form store lives.
pub const DATA_DIR_VAR: &str = "PRECARITY_DATA";

pub const JOBS_FILE: &str = "jobs.csv";
pub const FORM_FIELDS_FILE: &str = "ds160-fields.json";
pub const COMMENTS_FILE: &str = "comm160.json";
pub const STORE_FILE: &str = "precarity.sqlite3";

pub fn assets_dir() -> PathBuf {
    env::var_os(ASSETS_DIR_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("assets"))
}

pub fn data_dir() -> PathBuf {
    env::var_os(DATA_DIR_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn jobs_path() -> PathBuf {
    assets_dir().join(JOBS_FILE)
}

pub fn form_fields_path() -> PathBuf {
    assets_dir().join(FORM_FIELDS_FILE)
}

pub fn comments_path() -> PathBuf {
    assets_dir().join(COMMENTS_FILE)
}

pub fn store_path() -> PathBuf {
    data_dir().join(STORE_FILE)
}
