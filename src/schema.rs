//! Header mapping: legacy aliases onto canonical column names.

use crate::config::ReferenceData;
use crate::error::{Error, Result};
use crate::types::RawRecord;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Where each input column ends up, by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMapping {
    /// Target name per input column; `None` for dropped or shadowed columns.
    targets: Vec<Option<String>>,
}

impl HeaderMapping {
    pub fn targets(&self) -> &[Option<String>] {
        &self.targets
    }

    /// Build a canonical record from one line's cells, in header order.
    /// Cells are trimmed; short lines simply lack the trailing columns.
    pub fn record_from_fields<'a, I>(&self, fields: I) -> RawRecord
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.targets
            .iter()
            .zip(fields)
            .filter_map(|(target, value)| {
                target
                    .as_ref()
                    .map(|name| (name.clone(), value.trim().to_string()))
            })
            .collect()
    }
}

pub struct SchemaMapper<'a> {
    reference: &'a ReferenceData,
}

fn clean_header(header: &str) -> &str {
    header.trim_start_matches('\u{feff}').trim()
}

impl<'a> SchemaMapper<'a> {
    pub fn new(reference: &'a ReferenceData) -> Self {
        Self { reference }
    }

    /// Resolve a header row, failing with every canonical column that is
    /// still missing once aliases have been applied.
    ///
    /// A canonical column beats its alias when both are present, and the
    /// first of any duplicated header wins.
    pub fn resolve(&self, headers: &[String]) -> Result<HeaderMapping> {
        let direct: HashSet<&str> = headers.iter().map(|h| clean_header(h)).collect();
        let mut seen: HashSet<String> = HashSet::new();

        let targets = headers
            .iter()
            .map(|raw| {
                let header = clean_header(raw);
                if self.reference.dropped_columns.iter().any(|d| d == header) {
                    debug!(column = header, "dropping column");
                    return None;
                }
                let target = match self.reference.header_aliases.get(header) {
                    Some(canonical) if direct.contains(canonical.as_str()) => {
                        debug!(alias = header, canonical = %canonical, "alias shadowed by canonical column");
                        return None;
                    }
                    Some(canonical) => {
                        debug!(alias = header, canonical = %canonical, "resolved legacy header");
                        canonical.clone()
                    }
                    None => header.to_string(),
                };
                seen.insert(target.clone()).then_some(target)
            })
            .collect();

        let missing: Vec<String> = self
            .reference
            .canonical_headers
            .iter()
            .filter(|c| !seen.contains(c.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            warn!(?missing, "required columns missing");
            return Err(Error::MissingHeaders(missing));
        }
        Ok(HeaderMapping { targets })
    }

    /// Translate records keyed by their original headers onto canonical keys.
    pub fn map(&self, headers: &[String], records: Vec<RawRecord>) -> Result<Vec<RawRecord>> {
        let mapping = self.resolve(headers)?;
        Ok(records
            .into_iter()
            .map(|record| {
                let cells = headers
                    .iter()
                    .map(|h| record.get(h).map(String::as_str).unwrap_or(""));
                mapping.record_from_fields(cells)
            })
            .collect())
    }
}
