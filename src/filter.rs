//! Filter state and the row predicate every report reads from.
//!
//! [`FilterState`] is the persisted, user-facing shape: three dimensions
//! accept an `"ALL"` sentinel, the others use an empty list for "no
//! restriction". It is converted once into [`FilterCriteria`], where every
//! dimension is either unconstrained or a concrete set, before any row is
//! tested.

use crate::types::{DistinctValueIndex, NormalizedRow, PeriodDefaults};
use crate::util::{parse_iso_date, parse_uk_date, quarter_from_month_key};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashSet;
use std::str::FromStr;
use strum::{Display, EnumString};
use tracing::debug;

pub const ALL_SENTINEL: &str = "ALL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum PeriodKind {
    Month,
    Quarter,
    #[serde(rename = "FY")]
    #[strum(serialize = "FY")]
    FiscalYear,
    Custom,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display, EnumString)]
pub enum ProductivityFilter {
    #[default]
    All,
    Productive,
    Unproductive,
}

/// A dimension that accepts the `"ALL"` sentinel or an explicit list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MultiSelect {
    #[default]
    All,
    Values(Vec<String>),
}

impl Serialize for MultiSelect {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MultiSelect::All => serializer.serialize_str(ALL_SENTINEL),
            MultiSelect::Values(values) => values.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for MultiSelect {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Anything that is not a list, including unknown sentinels, is unconstrained.
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => MultiSelect::Values(string_items(items)),
            _ => MultiSelect::All,
        })
    }
}

fn string_items(items: Vec<Value>) -> Vec<String> {
    items
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s),
            _ => None,
        })
        .collect()
}

fn lenient_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => string_items(items),
        _ => Vec::new(),
    })
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    })
}

fn lenient_parse<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s.parse().ok(),
        _ => None,
    })
}

fn lenient_productivity<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<ProductivityFilter, D::Error> {
    Ok(lenient_parse(deserializer)?.unwrap_or_default())
}

/// User-selected filters, in the shape they are persisted in.
///
/// Deserialization never fails on a bad field: unknown or mistyped values
/// fall back to "no restriction" for that dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterState {
    /// `None` when a stored value is not a recognized period kind.
    #[serde(deserialize_with = "lenient_parse")]
    pub period: Option<PeriodKind>,
    #[serde(deserialize_with = "lenient_text")]
    pub month: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub quarter: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub fy: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub from_date: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub to_date: Option<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub roles: Vec<String>,
    pub members: MultiSelect,
    pub companies: MultiSelect,
    pub project_types: MultiSelect,
    #[serde(deserialize_with = "lenient_list")]
    pub work_types_board: Vec<String>,
    #[serde(deserialize_with = "lenient_productivity")]
    pub productivity: ProductivityFilter,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            period: Some(PeriodKind::Month),
            month: None,
            quarter: None,
            fy: None,
            from_date: None,
            to_date: None,
            roles: Vec::new(),
            members: MultiSelect::All,
            companies: MultiSelect::All,
            project_types: MultiSelect::All,
            work_types_board: Vec::new(),
            productivity: ProductivityFilter::All,
        }
    }
}

impl FilterState {
    /// Default filters with the month, quarter and fiscal year pre-selected.
    pub fn seeded(defaults: Option<&PeriodDefaults>) -> Self {
        let mut state = Self::default();
        if let Some(d) = defaults {
            state.month = Some(d.month.clone());
            state.quarter = Some(d.quarter.clone());
            state.fy = Some(d.fiscal_year.clone());
        }
        state
    }

    /// Whether every selected month, quarter and fiscal year exists in `index`.
    pub fn fits_index(&self, index: &DistinctValueIndex) -> bool {
        let known = |value: &Option<String>, options: &[String]| {
            value.as_ref().map_or(true, |v| options.contains(v))
        };
        known(&self.month, &index.calendar_months)
            && known(&self.quarter, &index.quarters)
            && known(&self.fy, &index.fiscal_years)
    }
}

/// One dimension after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Unconstrained,
    Selected(HashSet<String>),
}

impl Selection {
    fn from_list(values: &[String]) -> Self {
        if values.is_empty() {
            Selection::Unconstrained
        } else {
            Selection::Selected(values.iter().cloned().collect())
        }
    }

    fn from_multi(select: &MultiSelect) -> Self {
        match select {
            MultiSelect::All => Selection::Unconstrained,
            MultiSelect::Values(values) => Self::from_list(values),
        }
    }

    pub fn allows(&self, value: &str) -> bool {
        match self {
            Selection::Unconstrained => true,
            Selection::Selected(set) => set.contains(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodConstraint {
    Any,
    Month(String),
    Quarter(String),
    FiscalYear(String),
    /// Inclusive; at least one bound is set.
    Range {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
}

impl PeriodConstraint {
    fn from_state(state: &FilterState) -> Self {
        let keyed = |value: &Option<String>, make: fn(String) -> Self| {
            match value.as_deref() {
                Some(v) if !v.is_empty() => make(v.to_string()),
                _ => PeriodConstraint::Any,
            }
        };
        match state.period {
            None => PeriodConstraint::Any,
            Some(PeriodKind::Month) => keyed(&state.month, PeriodConstraint::Month),
            Some(PeriodKind::Quarter) => keyed(&state.quarter, PeriodConstraint::Quarter),
            Some(PeriodKind::FiscalYear) => keyed(&state.fy, PeriodConstraint::FiscalYear),
            Some(PeriodKind::Custom) => {
                let from = state.from_date.as_deref().and_then(parse_iso_date);
                let to = state.to_date.as_deref().and_then(parse_iso_date);
                if from.is_none() && to.is_none() {
                    PeriodConstraint::Any
                } else {
                    PeriodConstraint::Range { from, to }
                }
            }
        }
    }

    fn allows(&self, row: &NormalizedRow) -> bool {
        match self {
            PeriodConstraint::Any => true,
            PeriodConstraint::Month(m) => row.calendar_month() == Some(m.as_str()),
            PeriodConstraint::Quarter(q) => row
                .calendar_month()
                .and_then(quarter_from_month_key)
                .is_some_and(|rq| &rq == q),
            PeriodConstraint::FiscalYear(fy) => row.fiscal_year() == Some(fy.as_str()),
            PeriodConstraint::Range { from, to } => match parse_uk_date(&row.date_raw) {
                Some(d) => from.map_or(true, |f| d >= f) && to.map_or(true, |t| d <= t),
                None => false,
            },
        }
    }
}

/// Normalized filter: what the engine actually evaluates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    pub period: PeriodConstraint,
    pub roles: Selection,
    pub members: Selection,
    pub companies: Selection,
    pub project_types: Selection,
    pub work_types_board: Selection,
    pub productivity: ProductivityFilter,
}

impl From<&FilterState> for FilterCriteria {
    fn from(state: &FilterState) -> Self {
        Self {
            period: PeriodConstraint::from_state(state),
            roles: Selection::from_list(&state.roles),
            members: Selection::from_multi(&state.members),
            companies: Selection::from_multi(&state.companies),
            project_types: Selection::from_multi(&state.project_types),
            work_types_board: Selection::from_list(&state.work_types_board),
            productivity: state.productivity,
        }
    }
}

impl FilterCriteria {
    pub fn matches(&self, row: &NormalizedRow) -> bool {
        let productive = match self.productivity {
            ProductivityFilter::All => true,
            ProductivityFilter::Productive => row.is_billable,
            ProductivityFilter::Unproductive => !row.is_billable,
        };
        productive
            && self.period.allows(row)
            && self.roles.allows(&row.role)
            && self.members.allows(&row.member)
            && self.companies.allows(&row.company)
            && self.project_types.allows(&row.project_type)
            && self.work_types_board.allows(&row.board_work_type)
    }
}

/// Rows passing every active dimension, in their original order.
pub fn apply_filters<'a>(rows: &'a [NormalizedRow], state: &FilterState) -> Vec<&'a NormalizedRow> {
    let criteria = FilterCriteria::from(state);
    let filtered: Vec<&NormalizedRow> = rows.iter().filter(|r| criteria.matches(r)).collect();
    debug!(total = rows.len(), kept = filtered.len(), "applied filters");
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReferenceData;
    use crate::normalize::RowNormalizer;
    use crate::types::RawRecord;

    fn row(member: &str, role: &str, company: &str, date: &str, productivity: &str) -> NormalizedRow {
        let work_type = if role == "Cloud" { "Project Management" } else { "Admin" };
        let project_type = if company == "OryxAlign" { "Internal" } else { "Project" };
        let record: RawRecord = [
            ("Member", member),
            ("Role", role),
            ("Company", company),
            ("Date", date),
            ("Hours", "2"),
            ("Productivity", productivity),
            ("Work Type", work_type),
            ("Project Type", project_type),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        RowNormalizer::new(&ReferenceData::default())
            .normalize(&record)
            .unwrap()
    }

    fn fixture() -> Vec<NormalizedRow> {
        vec![
            row("Ann", "Cloud", "Acme", "09/01/2024", "Productive"),
            row("Ann", "Cloud", "Acme", "10/01/2024", "Unproductive"),
            row("Bob", "Network", "Beta", "15/01/2024", "Productive"),
            row("Bob", "Cloud", "Beta", "20/01/2024", "Productive"),
            row("Cat", "Service Desk", "OryxAlign", "21/01/2024", "Unproductive"),
            row("Cat", "Cloud", "Acme", "31/03/2024", "Productive"),
            row("Dan", "Network", "Gamma", "01/04/2024", "Unproductive"),
            row("Dan", "Cloud", "Gamma", "15/05/2024", "Productive"),
            row("Eve", "Service Desk", "Acme", "30/06/2024", "Productive"),
            row("Eve", "Cloud", "OryxAlign", "02/07/2024", "Unproductive"),
            row("Fay", "Cloud", "Beta", "not a date", "Productive"),
        ]
    }

    fn unrestricted() -> FilterState {
        FilterState {
            period: Some(PeriodKind::Custom),
            ..FilterState::default()
        }
    }

    fn dates(rows: &[&NormalizedRow]) -> Vec<String> {
        rows.iter().map(|r| r.date_raw.clone()).collect()
    }

    #[test]
    fn default_state_passes_everything() {
        let rows = fixture();
        assert_eq!(apply_filters(&rows, &FilterState::default()).len(), rows.len());
    }

    #[test]
    fn roles_and_productivity_intersect() {
        let rows = fixture();
        let state = FilterState {
            roles: vec!["Cloud".into()],
            productivity: ProductivityFilter::Productive,
            ..unrestricted()
        };
        let got: Vec<&NormalizedRow> = apply_filters(&rows, &state);
        let expected: Vec<&NormalizedRow> = rows
            .iter()
            .filter(|r| r.role == "Cloud" && r.is_billable)
            .collect();
        assert_eq!(got, expected);
        assert_eq!(got.len(), 5);
    }

    #[test]
    fn unproductive_excludes_billable() {
        let rows = fixture();
        let state = FilterState {
            productivity: ProductivityFilter::Unproductive,
            ..unrestricted()
        };
        let got = apply_filters(&rows, &state);
        assert_eq!(got.len(), 4);
        assert!(got.iter().all(|r| !r.is_billable));
    }

    #[test]
    fn all_sentinel_matches_full_list() {
        let rows = fixture();
        let everyone: Vec<String> = crate::index::build_index(&rows).companies;
        let with_all = FilterState {
            companies: MultiSelect::All,
            ..unrestricted()
        };
        let with_list = FilterState {
            companies: MultiSelect::Values(everyone),
            ..unrestricted()
        };
        assert_eq!(apply_filters(&rows, &with_all), apply_filters(&rows, &with_list));
    }

    #[test]
    fn empty_lists_are_unconstrained() {
        let rows = fixture();
        let state = FilterState {
            members: MultiSelect::Values(vec![]),
            companies: MultiSelect::Values(vec![]),
            project_types: MultiSelect::Values(vec![]),
            roles: vec![],
            work_types_board: vec![],
            ..unrestricted()
        };
        assert_eq!(apply_filters(&rows, &state).len(), rows.len());
    }

    #[test]
    fn member_company_project_type_and_board_filters() {
        let rows = fixture();
        let state = FilterState {
            members: MultiSelect::Values(vec!["Ann".into(), "Cat".into()]),
            ..unrestricted()
        };
        assert_eq!(apply_filters(&rows, &state).len(), 4);

        let state = FilterState {
            project_types: MultiSelect::Values(vec!["Internal".into()]),
            ..unrestricted()
        };
        let got = apply_filters(&rows, &state);
        assert_eq!(got.len(), 2);
        assert!(got.iter().all(|r| r.is_internal));

        let state = FilterState {
            work_types_board: vec!["Internal Admin".into()],
            ..unrestricted()
        };
        assert!(apply_filters(&rows, &state).iter().all(|r| r.role != "Cloud"));
    }

    #[test]
    fn custom_range_is_inclusive() {
        let rows = fixture();
        let state = FilterState {
            from_date: Some("2024-01-10".into()),
            to_date: Some("2024-01-20".into()),
            ..unrestricted()
        };
        assert_eq!(
            dates(&apply_filters(&rows, &state)),
            vec!["10/01/2024", "15/01/2024", "20/01/2024"]
        );
    }

    #[test]
    fn custom_range_with_one_bound_excludes_undated() {
        let rows = fixture();
        let state = FilterState {
            from_date: Some("2024-06-01".into()),
            ..unrestricted()
        };
        assert_eq!(dates(&apply_filters(&rows, &state)), vec!["30/06/2024", "02/07/2024"]);
    }

    #[test]
    fn custom_without_bounds_keeps_undated_rows() {
        let rows = fixture();
        assert_eq!(apply_filters(&rows, &unrestricted()).len(), rows.len());
    }

    #[test]
    fn month_quarter_and_fiscal_year_periods() {
        let rows = fixture();
        let month = FilterState {
            period: Some(PeriodKind::Month),
            month: Some("2024-01".into()),
            ..FilterState::default()
        };
        assert_eq!(apply_filters(&rows, &month).len(), 5);

        let quarter = FilterState {
            period: Some(PeriodKind::Quarter),
            quarter: Some("2024-Q2".into()),
            month: Some("2024-01".into()),
            ..FilterState::default()
        };
        assert_eq!(
            dates(&apply_filters(&rows, &quarter)),
            vec!["01/04/2024", "15/05/2024", "30/06/2024"]
        );

        let fy = FilterState {
            period: Some(PeriodKind::FiscalYear),
            fy: Some("FY23".into()),
            ..FilterState::default()
        };
        assert_eq!(apply_filters(&rows, &fy).len(), 6);
    }

    #[test]
    fn filtering_is_idempotent() {
        let rows = fixture();
        let state = FilterState {
            roles: vec!["Cloud".into(), "Network".into()],
            companies: MultiSelect::Values(vec!["Acme".into(), "Gamma".into()]),
            ..FilterState::seeded(None)
        };
        assert_eq!(apply_filters(&rows, &state), apply_filters(&rows, &state));
    }

    #[test]
    fn seeded_state_selects_defaults() {
        let defaults = PeriodDefaults {
            month: "2024-07".into(),
            quarter: "2024-Q3".into(),
            fiscal_year: "FY24".into(),
        };
        let state = FilterState::seeded(Some(&defaults));
        assert_eq!(state.period, Some(PeriodKind::Month));
        assert_eq!(state.month.as_deref(), Some("2024-07"));
        assert_eq!(state.quarter.as_deref(), Some("2024-Q3"));
        assert_eq!(state.fy.as_deref(), Some("FY24"));
    }

    #[test]
    fn restored_periods_must_exist_in_index() {
        let index = DistinctValueIndex {
            calendar_months: vec!["2024-06".into(), "2024-07".into()],
            quarters: vec!["2024-Q2".into(), "2024-Q3".into()],
            fiscal_years: vec!["FY24".into()],
            ..Default::default()
        };
        let defaults = PeriodDefaults {
            month: "2024-07".into(),
            quarter: "2024-Q3".into(),
            fiscal_year: "FY24".into(),
        };
        assert!(FilterState::seeded(Some(&defaults)).fits_index(&index));
        assert!(FilterState::seeded(None).fits_index(&index));

        let stale_month = FilterState {
            month: Some("2023-01".into()),
            ..FilterState::seeded(Some(&defaults))
        };
        assert!(!stale_month.fits_index(&index));
        let stale_fy = FilterState {
            fy: Some("FY22".into()),
            ..FilterState::seeded(Some(&defaults))
        };
        assert!(!stale_fy.fits_index(&index));
        assert!(!FilterState::seeded(Some(&defaults)).fits_index(&DistinctValueIndex::default()));
    }

    #[test]
    fn period_kind_parses_any_case() {
        assert_eq!("month".parse::<PeriodKind>().unwrap(), PeriodKind::Month);
        assert_eq!("QUARTER".parse::<PeriodKind>().unwrap(), PeriodKind::Quarter);
        assert_eq!("fy".parse::<PeriodKind>().unwrap(), PeriodKind::FiscalYear);
        assert_eq!("Custom".parse::<PeriodKind>().unwrap(), PeriodKind::Custom);
        assert!("year".parse::<PeriodKind>().is_err());
        assert_eq!(PeriodKind::FiscalYear.to_string(), "FY");
    }

    #[test]
    fn deserializes_sentinels_and_lists() {
        let json = r#"{
            "period": "FY",
            "fy": "FY24",
            "members": "ALL",
            "companies": ["Acme"],
            "projectTypes": [],
            "roles": ["Cloud"],
            "workTypesBoard": [],
            "productivity": "Productive"
        }"#;
        let state: FilterState = serde_json::from_str(json).unwrap();
        assert_eq!(state.period, Some(PeriodKind::FiscalYear));
        assert_eq!(state.members, MultiSelect::All);
        assert_eq!(state.companies, MultiSelect::Values(vec!["Acme".into()]));
        assert_eq!(state.project_types, MultiSelect::Values(vec![]));
        assert_eq!(state.productivity, ProductivityFilter::Productive);
    }

    #[test]
    fn malformed_fields_fail_open() {
        let json = r#"{
            "period": "Fortnight",
            "month": 7,
            "members": "EVERYONE",
            "companies": {"a": 1},
            "roles": "Cloud",
            "workTypesBoard": ["Tech Delivery", 3],
            "productivity": "Sometimes",
            "legacyField": true
        }"#;
        let state: FilterState = serde_json::from_str(json).unwrap();
        assert_eq!(state.period, None);
        assert_eq!(state.month, None);
        assert_eq!(state.members, MultiSelect::All);
        assert_eq!(state.companies, MultiSelect::All);
        assert!(state.roles.is_empty());
        assert_eq!(state.work_types_board, vec!["Tech Delivery".to_string()]);
        assert_eq!(state.productivity, ProductivityFilter::All);

        // Only the surviving board work type constrains; nothing in the fixture is Tech Delivery.
        assert!(apply_filters(&fixture(), &state).is_empty());
    }

    #[test]
    fn unparseable_custom_bounds_are_ignored() {
        let rows = fixture();
        let state = FilterState {
            from_date: Some("10/01/2024".into()),
            to_date: Some("soon".into()),
            ..unrestricted()
        };
        assert_eq!(FilterCriteria::from(&state).period, PeriodConstraint::Any);
        assert_eq!(apply_filters(&rows, &state).len(), rows.len());
    }

    #[test]
    fn serializes_in_persisted_shape() {
        let state = FilterState {
            companies: MultiSelect::Values(vec!["Acme".into()]),
            period: Some(PeriodKind::FiscalYear),
            ..FilterState::default()
        };
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["members"], "ALL");
        assert_eq!(value["companies"], serde_json::json!(["Acme"]));
        assert_eq!(value["period"], "FY");
        assert_eq!(value["productivity"], "All");
        assert!(value.get("workTypesBoard").is_some());
        let back: FilterState = serde_json::from_value(value).unwrap();
        assert_eq!(back, state);
    }
}
