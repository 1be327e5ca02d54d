//! Row normalization: defaults, date buckets and classification flags.

use crate::config::{columns, ReferenceData};
use crate::types::{NormalizedRow, RawRecord, TimeBuckets};
use crate::util::{parse_hours, parse_uk_date};
use tracing::debug;

const UNKNOWN: &str = "Unknown";

/// Counters from a normalization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub kept: usize,
    pub dropped: usize,
    /// Kept rows whose date could not be parsed.
    pub undated: usize,
    /// Kept rows with zero hours.
    pub zero_hours: usize,
}

pub struct RowNormalizer<'a> {
    reference: &'a ReferenceData,
}

fn cell<'r>(record: &'r RawRecord, column: &str) -> &'r str {
    record.get(column).map(String::as_str).unwrap_or("")
}

fn cell_or_unknown(record: &RawRecord, column: &str) -> String {
    match cell(record, column) {
        "" => UNKNOWN.to_string(),
        v => v.to_string(),
    }
}

impl<'a> RowNormalizer<'a> {
    pub fn new(reference: &'a ReferenceData) -> Self {
        Self { reference }
    }

    /// Normalize one canonical record.
    ///
    /// Returns `None` for noise rows: no usable date and no hours.
    pub fn normalize(&self, record: &RawRecord) -> Option<NormalizedRow> {
        let date_raw = cell(record, columns::DATE).to_string();
        let buckets = parse_uk_date(&date_raw).map(TimeBuckets::from_date);
        let hours = parse_hours(record.get(columns::HOURS).map(String::as_str));
        if buckets.is_none() && hours == 0.0 {
            return None;
        }

        let company = cell_or_unknown(record, columns::COMPANY);
        let project_type = cell_or_unknown(record, columns::PROJECT_TYPE);
        let productivity = cell(record, columns::PRODUCTIVITY).to_string();
        let work_type = cell(record, columns::WORK_TYPE).to_string();

        Some(NormalizedRow {
            member: cell_or_unknown(record, columns::MEMBER),
            role: cell_or_unknown(record, columns::ROLE),
            ticket: cell(record, columns::TICKET).to_string(),
            project_ticket: cell(record, columns::PROJECT_TICKET).to_string(),
            work_role: cell(record, columns::WORK_ROLE).to_string(),
            is_billable: productivity == "Productive",
            is_internal: self.reference.is_internal(&company, &project_type),
            board_work_type: self.reference.board_work_type(&work_type).to_string(),
            company,
            project_type,
            productivity,
            work_type,
            date_raw,
            hours,
            buckets,
        })
    }

    /// Normalize every record, preserving input order.
    pub fn normalize_all(&self, records: &[RawRecord]) -> (Vec<NormalizedRow>, NormalizeStats) {
        let mut stats = NormalizeStats::default();
        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            match self.normalize(record) {
                Some(row) => {
                    if row.buckets.is_none() {
                        stats.undated += 1;
                    }
                    if row.hours == 0.0 {
                        stats.zero_hours += 1;
                    }
                    rows.push(row);
                }
                None => stats.dropped += 1,
            }
        }
        stats.kept = rows.len();
        debug!(?stats, "normalized records");
        (rows, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(pairs: &[(&str, &str)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn base(date: &str, hours: &str) -> RawRecord {
        record(&[
            ("Member", "Ann"),
            ("Date", date),
            ("Ticket", "T-1"),
            ("Work Role", "Engineer"),
            ("Work Type", "Project Management"),
            ("Company", "Acme"),
            ("Hours", hours),
            ("Project/Ticket", "Rollout"),
            ("Project Type", "Project"),
            ("Role", "Cloud"),
            ("Productivity", "Productive"),
        ])
    }

    #[test]
    fn normalizes_a_complete_row() {
        let reference = ReferenceData::default();
        let row = RowNormalizer::new(&reference)
            .normalize(&base("31/03/2024", "7.5"))
            .unwrap();
        assert_eq!(row.date(), NaiveDate::from_ymd_opt(2024, 3, 31));
        assert_eq!(row.calendar_month(), Some("2024-03"));
        assert_eq!(row.iso_week(), Some("2024-W13"));
        assert_eq!(row.quarter(), Some("2024-Q1"));
        assert_eq!(row.fiscal_year(), Some("FY23"));
        assert_eq!(row.hours, 7.5);
        assert!(row.is_billable);
        assert!(!row.is_internal);
        assert_eq!(row.board_work_type, "PM Delivery");
        assert_eq!(row.date_raw, "31/03/2024");
    }

    #[test]
    fn billable_is_exact_match() {
        let reference = ReferenceData::default();
        let n = RowNormalizer::new(&reference);
        for value in ["productive", "Productive ", "Unproductive", ""] {
            let mut r = base("01/04/2024", "1");
            r.insert("Productivity".into(), value.into());
            assert!(!n.normalize(&r).unwrap().is_billable, "{value:?}");
        }
    }

    #[test]
    fn unknown_work_type_maps_to_other() {
        let reference = ReferenceData::default();
        let mut r = base("01/04/2024", "1");
        r.insert("Work Type".into(), "Travel".into());
        let row = RowNormalizer::new(&reference).normalize(&r).unwrap();
        assert_eq!(row.board_work_type, "Other");
        assert_eq!(row.work_type, "Travel");
    }

    #[test]
    fn internal_from_company_or_project_type() {
        let reference = ReferenceData::default();
        let n = RowNormalizer::new(&reference);

        let mut r = base("01/04/2024", "1");
        r.insert("Company".into(), "OryxAlign".into());
        assert!(n.normalize(&r).unwrap().is_internal);

        let mut r = base("01/04/2024", "1");
        r.insert("Project Type".into(), "Internal - R&D".into());
        assert!(n.normalize(&r).unwrap().is_internal);
    }

    #[test]
    fn missing_fields_get_defaults() {
        let reference = ReferenceData::default();
        let r = record(&[("Date", "02/01/2024"), ("Hours", "")]);
        let row = RowNormalizer::new(&reference).normalize(&r).unwrap();
        assert_eq!(row.role, "Unknown");
        assert_eq!(row.company, "Unknown");
        assert_eq!(row.member, "Unknown");
        assert_eq!(row.hours, 0.0);
        assert_eq!(row.ticket, "");
        assert!(!row.is_billable);
        assert_eq!(row.board_work_type, "Other");
    }

    #[test]
    fn bad_date_with_hours_is_kept_undated() {
        let reference = ReferenceData::default();
        let row = RowNormalizer::new(&reference)
            .normalize(&base("2024-01-10", "3"))
            .unwrap();
        assert!(row.buckets.is_none());
        assert_eq!(row.calendar_month(), None);
        assert_eq!(row.date_raw, "2024-01-10");
    }

    #[test]
    fn bad_date_without_hours_is_dropped() {
        let reference = ReferenceData::default();
        let n = RowNormalizer::new(&reference);
        assert!(n.normalize(&base("", "0")).is_none());
        assert!(n.normalize(&base("not a date", "-4")).is_none());
    }

    #[test]
    fn normalize_all_preserves_order_and_counts() {
        let reference = ReferenceData::default();
        let records = vec![
            base("01/01/2024", "1"),
            base("", ""),
            base("bad", "2"),
            base("03/01/2024", "0"),
        ];
        let (rows, stats) = RowNormalizer::new(&reference).normalize_all(&records);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].date_raw, "01/01/2024");
        assert_eq!(rows[1].date_raw, "bad");
        assert_eq!(rows[2].date_raw, "03/01/2024");
        assert_eq!(
            stats,
            NormalizeStats {
                kept: 3,
                dropped: 1,
                undated: 1,
                zero_hours: 1
            }
        );
    }
}
