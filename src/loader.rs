use crate::config::ReferenceData;
use crate::error::{Error, Result};
use crate::index::build_index;
use crate::normalize::RowNormalizer;
use crate::periods::derive_period_defaults;
use crate::schema::SchemaMapper;
use crate::types::{DistinctValueIndex, NormalizedRow, PeriodDefaults, RawRecord};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    /// Rows with neither a usable date nor any hours.
    pub dropped_rows: usize,
    pub undated_rows: usize,
    pub zero_hour_rows: usize,
    /// Lines the CSV reader itself rejected.
    pub parse_errors: usize,
}

/// Everything derived from one upload.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub rows: Vec<NormalizedRow>,
    pub index: DistinctValueIndex,
    pub period_defaults: Option<PeriodDefaults>,
    pub report: LoadReport,
}

pub fn load_and_clean(path: &Path, reference: &ReferenceData) -> Result<Dataset> {
    let file = File::open(path)?;
    info!(path = %path.display(), "loading timesheet");
    load_from_reader(file, reference)
}

/// Read, map and normalize a whole CSV document.
///
/// Fails only when the header row is missing or lacks required columns;
/// bad lines and bad cells are counted, defaulted or dropped.
pub fn load_from_reader<R: Read>(reader: R, reference: &ReferenceData) -> Result<Dataset> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(Error::EmptyInput);
    }
    let mapping = SchemaMapper::new(reference).resolve(&headers)?;

    let mut total_rows = 0usize;
    let mut parse_errors = 0usize;
    let mut records: Vec<RawRecord> = Vec::new();
    for result in rdr.records() {
        total_rows += 1;
        let line = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "skipping unreadable line");
                parse_errors += 1;
                continue;
            }
        };
        records.push(mapping.record_from_fields(line.iter()));
    }

    let (rows, stats) = RowNormalizer::new(reference).normalize_all(&records);
    let index = build_index(&rows);
    let period_defaults = derive_period_defaults(&index.calendar_months);

    let report = LoadReport {
        total_rows,
        kept_rows: stats.kept,
        dropped_rows: stats.dropped,
        undated_rows: stats.undated,
        zero_hour_rows: stats.zero_hours,
        parse_errors,
    };
    info!(
        total = report.total_rows,
        kept = report.kept_rows,
        dropped = report.dropped_rows,
        undated = report.undated_rows,
        "timesheet normalized"
    );
    Ok(Dataset {
        rows,
        index,
        period_defaults,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "Member,Date,Ticket,Work Role,Work Type,Company,Hours,Project/Ticket,Project Type,Role,Productivity";

    fn load(body: &str) -> Result<Dataset> {
        load_from_reader(body.as_bytes(), &ReferenceData::default())
    }

    #[test]
    fn loads_rows_and_derives_index() {
        let csv = format!(
            "{HEADER}\n\
             Ann,10/01/2024,T1,Eng,Admin,Acme,2.5,P1,Project,Cloud,Productive\n\
             Bob,15/02/2024,T2,Eng,Project Management,Beta,3,P2,Project,Network,Unproductive\n\
             Cat,,T3,Eng,Admin,Acme,0,P3,Project,Cloud,Productive\n"
        );
        let data = load(&csv).unwrap();
        assert_eq!(data.rows.len(), 2);
        assert_eq!(
            data.report,
            LoadReport {
                total_rows: 3,
                kept_rows: 2,
                dropped_rows: 1,
                undated_rows: 0,
                zero_hour_rows: 0,
                parse_errors: 0,
            }
        );
        assert_eq!(data.index.members, vec!["Ann", "Bob"]);
        let defaults = data.period_defaults.unwrap();
        assert_eq!(defaults.month, "2024-02");
        assert_eq!(defaults.fiscal_year, "FY23");
    }

    #[test]
    fn quoted_cells_with_commas_survive() {
        let csv = format!(
            "{HEADER}\n\
             Ann,10/01/2024,T1,Eng,\"Internal Support, Projects & Documents\",Acme,\"1,5\",P1,Project,Cloud,Productive\n"
        );
        let data = load(&csv).unwrap();
        assert_eq!(data.rows[0].board_work_type, "Internal Support");
        // A decimal comma is not a thousands separator.
        assert_eq!(data.rows[0].hours, 0.0);
    }

    #[test]
    fn missing_column_fails_whole_upload() {
        let csv = "Member,Date,Ticket,Work Role,Work Type,Company,Project/Ticket,Project Type,Role,Productivity\n\
                   Ann,10/01/2024,T1,Eng,Admin,Acme,P1,Project,Cloud,Productive\n";
        match load(csv) {
            Err(Error::MissingHeaders(m)) => assert_eq!(m, vec!["Hours".to_string()]),
            other => panic!("expected MissingHeaders, got {other:?}"),
        }
    }

    #[test]
    fn empty_document_is_rejected() {
        assert!(matches!(load(""), Err(Error::EmptyInput)));
    }

    #[test]
    fn short_lines_are_padded_with_defaults() {
        let csv = format!("{HEADER}\nAnn,10/01/2024,T1\n");
        let data = load(&csv).unwrap();
        assert_eq!(data.rows.len(), 1);
        assert_eq!(data.rows[0].role, "Unknown");
        assert_eq!(data.rows[0].hours, 0.0);
        assert_eq!(data.report.zero_hour_rows, 1);
    }
}
