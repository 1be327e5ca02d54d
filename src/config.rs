//! Runtime settings and the reference tables the pipeline is driven by.
//!
//! Everything here has a compiled default; a `timesheet_insights.toml` in
//! the working directory may override any subset of it.

use crate::error::Result;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const CONFIG_FILE: &str = "timesheet_insights.toml";

/// Canonical column names.
pub mod columns {
    pub const MEMBER: &str = "Member";
    pub const DATE: &str = "Date";
    pub const TICKET: &str = "Ticket";
    pub const WORK_ROLE: &str = "Work Role";
    pub const WORK_TYPE: &str = "Work Type";
    pub const COMPANY: &str = "Company";
    pub const HOURS: &str = "Hours";
    pub const PROJECT_TICKET: &str = "Project/Ticket";
    pub const PROJECT_TYPE: &str = "Project Type";
    pub const ROLE: &str = "Role";
    pub const PRODUCTIVITY: &str = "Productivity";

    pub const ALL: [&str; 11] = [
        MEMBER,
        DATE,
        TICKET,
        WORK_ROLE,
        WORK_TYPE,
        COMPANY,
        HOURS,
        PROJECT_TICKET,
        PROJECT_TYPE,
        ROLE,
        PRODUCTIVITY,
    ];
}

static DEFAULT_REFERENCE: Lazy<ReferenceData> = Lazy::new(|| {
    let owned = |s: &str| s.to_string();
    ReferenceData {
        canonical_headers: columns::ALL.iter().copied().map(owned).collect(),
        header_aliases: [
            ("Team", columns::ROLE),
            ("Date  (dd/MM/yyyy)", columns::DATE),
        ]
        .into_iter()
        .map(|(k, v)| (owned(k), owned(v)))
        .collect(),
        dropped_columns: vec![owned("Status")],
        internal_companies: ["OryxAlign", "OryxAlign-Internal c/code"]
            .into_iter()
            .map(owned)
            .collect(),
        internal_project_prefix: owned("Internal"),
        board_work_types: [
            ("Project Installation & Engineering", "Tech Delivery"),
            ("Project Management", "PM Delivery"),
            ("Solutions & Scoping", "Pre-Sales"),
            ("Admin", "Internal Admin"),
            ("Internal Support, Projects & Documents", "Internal Support"),
            ("Internal Support & Projects", "Internal Support"),
        ]
        .into_iter()
        .map(|(k, v)| (owned(k), owned(v)))
        .collect(),
        default_board_work_type: owned("Other"),
    }
});

/// Lookup tables shared by the schema mapper and the row normalizer.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReferenceData {
    pub canonical_headers: Vec<String>,
    /// Legacy header name -> canonical header name.
    pub header_aliases: BTreeMap<String, String>,
    pub dropped_columns: Vec<String>,
    pub internal_companies: BTreeSet<String>,
    pub internal_project_prefix: String,
    /// Raw `Work Type` -> board bucket.
    pub board_work_types: BTreeMap<String, String>,
    pub default_board_work_type: String,
}

impl Default for ReferenceData {
    fn default() -> Self {
        DEFAULT_REFERENCE.clone()
    }
}

impl ReferenceData {
    pub fn board_work_type(&self, work_type: &str) -> &str {
        self.board_work_types
            .get(work_type)
            .map(String::as_str)
            .unwrap_or(&self.default_board_work_type)
    }

    pub fn is_internal(&self, company: &str, project_type: &str) -> bool {
        self.internal_companies.contains(company)
            || project_type.starts_with(self.internal_project_prefix.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub input_path: PathBuf,
    pub filter_state_path: PathBuf,
    pub output_dir: PathBuf,
    pub preview_rows: usize,
    pub reference: ReferenceData,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("timesheet.csv"),
            filter_state_path: PathBuf::from("filter_state.json"),
            output_dir: PathBuf::from("."),
            preview_rows: 5,
            reference: ReferenceData::default(),
        }
    }
}

/// Read settings from `path`, falling back to defaults when the file is absent.
pub fn read_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        debug!("no config at {}, using defaults", path.display());
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(path)?;
    let settings: Settings = toml::from_str(&content)?;
    info!("loaded settings from {}", path.display());
    Ok(settings)
}
