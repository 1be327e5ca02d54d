use crate::util::{fiscal_year_key, iso_week_key, month_key, quarter_key};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;
use tabled::Tabled;

/// One CSV line keyed by header name, as read from the file.
pub type RawRecord = HashMap<String, String>;

/// Calendar keys derived from a single parsed date.
///
/// Built only through [`TimeBuckets::from_date`] so the keys can never
/// disagree with each other or with the row's date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeBuckets {
    pub date: NaiveDate,
    pub iso_week: String,
    pub calendar_month: String,
    pub quarter: String,
    pub fiscal_year: String,
}

impl TimeBuckets {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            date,
            iso_week: iso_week_key(date),
            calendar_month: month_key(date),
            quarter: quarter_key(date.year(), date.month()),
            fiscal_year: fiscal_year_key(date.year(), date.month()),
        }
    }
}

/// A timesheet entry after header mapping, defaulting and classification.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub member: String,
    pub role: String,
    pub company: String,
    pub ticket: String,
    pub project_ticket: String,
    pub project_type: String,
    pub productivity: String,
    pub work_role: String,
    pub work_type: String,
    /// The `Date` cell exactly as it appeared in the file.
    pub date_raw: String,
    pub hours: f64,
    /// `None` when the date cell could not be parsed.
    pub buckets: Option<TimeBuckets>,
    pub is_billable: bool,
    pub is_internal: bool,
    pub board_work_type: String,
}

impl NormalizedRow {
    pub fn date(&self) -> Option<NaiveDate> {
        self.buckets.as_ref().map(|b| b.date)
    }

    pub fn calendar_month(&self) -> Option<&str> {
        self.buckets.as_ref().map(|b| b.calendar_month.as_str())
    }

    pub fn iso_week(&self) -> Option<&str> {
        self.buckets.as_ref().map(|b| b.iso_week.as_str())
    }

    pub fn quarter(&self) -> Option<&str> {
        self.buckets.as_ref().map(|b| b.quarter.as_str())
    }

    pub fn fiscal_year(&self) -> Option<&str> {
        self.buckets.as_ref().map(|b| b.fiscal_year.as_str())
    }
}

/// Sorted option lists for every filterable dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistinctValueIndex {
    pub roles: Vec<String>,
    pub members: Vec<String>,
    pub companies: Vec<String>,
    pub project_types: Vec<String>,
    pub work_types_board: Vec<String>,
    pub calendar_months: Vec<String>,
    pub quarters: Vec<String>,
    pub fiscal_years: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodDefaults {
    pub month: String,
    pub quarter: String,
    pub fiscal_year: String,
}

/// Flat export shape of a row, using the canonical column names.
#[derive(Debug, Serialize)]
pub struct ExportRow<'a> {
    #[serde(rename = "Member")]
    pub member: &'a str,
    #[serde(rename = "Date")]
    pub date: &'a str,
    #[serde(rename = "Ticket")]
    pub ticket: &'a str,
    #[serde(rename = "Work Role")]
    pub work_role: &'a str,
    #[serde(rename = "Work Type")]
    pub work_type: &'a str,
    #[serde(rename = "Company")]
    pub company: &'a str,
    #[serde(rename = "Hours")]
    pub hours: f64,
    #[serde(rename = "Project/Ticket")]
    pub project_ticket: &'a str,
    #[serde(rename = "Project Type")]
    pub project_type: &'a str,
    #[serde(rename = "Role")]
    pub role: &'a str,
    #[serde(rename = "Productivity")]
    pub productivity: &'a str,
    #[serde(rename = "ISO Week")]
    pub iso_week: &'a str,
    #[serde(rename = "Month")]
    pub calendar_month: &'a str,
    #[serde(rename = "Fiscal Year")]
    pub fiscal_year: &'a str,
    #[serde(rename = "Billable")]
    pub is_billable: bool,
    #[serde(rename = "Internal")]
    pub is_internal: bool,
    #[serde(rename = "Board Work Type")]
    pub board_work_type: &'a str,
}

impl<'a> From<&'a NormalizedRow> for ExportRow<'a> {
    fn from(r: &'a NormalizedRow) -> Self {
        Self {
            member: &r.member,
            date: &r.date_raw,
            ticket: &r.ticket,
            work_role: &r.work_role,
            work_type: &r.work_type,
            company: &r.company,
            hours: r.hours,
            project_ticket: &r.project_ticket,
            project_type: &r.project_type,
            role: &r.role,
            productivity: &r.productivity,
            iso_week: r.iso_week().unwrap_or(""),
            calendar_month: r.calendar_month().unwrap_or(""),
            fiscal_year: r.fiscal_year().unwrap_or(""),
            is_billable: r.is_billable,
            is_internal: r.is_internal,
            board_work_type: &r.board_work_type,
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MemberHoursRow {
    #[serde(rename = "Member")]
    #[tabled(rename = "Member")]
    pub member: String,
    #[serde(rename = "Role")]
    #[tabled(rename = "Role")]
    pub role: String,
    #[serde(rename = "TotalHours")]
    #[tabled(rename = "TotalHours")]
    pub total_hours: String,
    #[serde(rename = "BillableHours")]
    #[tabled(rename = "BillableHours")]
    pub billable_hours: String,
    #[serde(rename = "Utilization")]
    #[tabled(rename = "Utilization")]
    pub utilization_pct: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct WorkTypeRow {
    #[serde(rename = "BoardWorkType")]
    #[tabled(rename = "BoardWorkType")]
    pub board_work_type: String,
    #[serde(rename = "Hours")]
    #[tabled(rename = "Hours")]
    pub hours: String,
    #[serde(rename = "Share")]
    #[tabled(rename = "Share")]
    pub share_pct: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct TrendRow {
    #[serde(rename = "Period")]
    #[tabled(rename = "Period")]
    pub period: String,
    #[serde(rename = "TotalHours")]
    #[tabled(rename = "TotalHours")]
    pub total_hours: String,
    #[serde(rename = "BillableHours")]
    #[tabled(rename = "BillableHours")]
    pub billable_hours: String,
    #[serde(rename = "Utilization")]
    #[tabled(rename = "Utilization")]
    pub utilization_pct: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CompanyHoursRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Company")]
    #[tabled(rename = "Company")]
    pub company: String,
    #[serde(rename = "Hours")]
    #[tabled(rename = "Hours")]
    pub hours: String,
    #[serde(rename = "BillableHours")]
    #[tabled(rename = "BillableHours")]
    pub billable_hours: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub total_rows: usize,
    pub total_hours: f64,
    pub billable_hours: f64,
    pub non_billable_hours: f64,
    pub internal_hours: f64,
    pub utilization_pct: f64,
    pub members: usize,
}
