//! Saving and restoring filter state between runs.
//!
//! The pipeline never touches storage itself; callers load a
//! [`FilterState`] here and hand it over, and save it back after changes.

use crate::error::Result;
use crate::filter::FilterState;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Blobs written with any other version are ignored.
pub const STATE_VERSION: &str = "2";
pub const MAX_AGE_DAYS: i64 = 30;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedFilters {
    version: String,
    /// Milliseconds since the Unix epoch.
    timestamp: i64,
    filters: FilterState,
}

#[derive(Debug, Clone)]
pub struct FilterStore {
    path: PathBuf,
}

impl FilterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Option<FilterState> {
        self.load_at(Utc::now())
    }

    /// Restore saved filters, or `None` when there is nothing usable:
    /// no file, unreadable JSON, a different version, or older than
    /// [`MAX_AGE_DAYS`].
    pub fn load_at(&self, now: DateTime<Utc>) -> Option<FilterState> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no saved filters");
                return None;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not read saved filters");
                return None;
            }
        };
        let saved: PersistedFilters = match serde_json::from_str(&content) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "discarding unreadable saved filters");
                return None;
            }
        };
        if saved.version != STATE_VERSION {
            warn!(found = %saved.version, expected = STATE_VERSION, "discarding saved filters from another version");
            return None;
        }
        let age_ms = now.timestamp_millis() - saved.timestamp;
        if age_ms > Duration::days(MAX_AGE_DAYS).num_milliseconds() {
            warn!(age_days = age_ms / Duration::days(1).num_milliseconds(), "discarding stale saved filters");
            return None;
        }
        debug!(path = %self.path.display(), "restored saved filters");
        Some(saved.filters)
    }

    pub fn save(&self, state: &FilterState) -> Result<()> {
        self.save_at(state, Utc::now())
    }

    pub fn save_at(&self, state: &FilterState, now: DateTime<Utc>) -> Result<()> {
        let blob = PersistedFilters {
            version: STATE_VERSION.to_string(),
            timestamp: now.timestamp_millis(),
            filters: state.clone(),
        };
        std::fs::write(&self.path, serde_json::to_string_pretty(&blob)?)?;
        debug!(path = %self.path.display(), "saved filters");
        Ok(())
    }

    /// Forget saved filters. A missing file is not an error.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
