use chrono::{Duration, NaiveDate};
use dirs::data_dir;
use once_cell::sync::Lazy;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::warn;

static DATA_ROOT: Lazy<PathBuf> = Lazy::new(|| {
    let base = data_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    let root = base.join("puroview");
    if let Err(err) = fs::create_dir_all(&root) {
        warn!("failed to create data root {:?}: {err}", root);
    }
    root
});

pub fn data_root() -> PathBuf {
    DATA_ROOT.clone()
}

pub fn database_path() -> PathBuf {
    data_root().join("puroview.sqlite")
}

pub fn config_path() -> PathBuf {
    data_root().join("config.json")
}

pub fn newsletter_dir() -> PathBuf {
    data_root().join("newsletters")
}

pub fn ensure_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(err) = fs::create_dir_all(parent) {
            warn!("failed to create parent {:?}: {err}", parent);
        }
    }
}

/// The seven calendar dates ending on and including `today`, oldest first.
pub fn trailing_week(today: NaiveDate) -> Vec<NaiveDate> {
    (0..7)
        .rev()
        .map(|offset| today - Duration::days(offset))
        .collect()
}

/// Results pages and records use `dd.mm.yyyy`.
pub fn results_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

pub fn schedule_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
