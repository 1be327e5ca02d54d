//! Distinct option lists for the filter controls.

use crate::types::{DistinctValueIndex, NormalizedRow};
use crate::util::quarter_from_month_key;
use std::collections::BTreeSet;
use tracing::debug;

fn push(set: &mut BTreeSet<String>, value: &str) {
    if !value.is_empty() {
        set.insert(value.to_string());
    }
}

/// Scan every row once and collect sorted, de-duplicated, non-empty values.
///
/// Quarters come from the distinct months, not from the rows directly.
pub fn build_index(rows: &[NormalizedRow]) -> DistinctValueIndex {
    let mut roles = BTreeSet::new();
    let mut members = BTreeSet::new();
    let mut companies = BTreeSet::new();
    let mut project_types = BTreeSet::new();
    let mut work_types = BTreeSet::new();
    let mut months = BTreeSet::new();
    let mut fiscal_years = BTreeSet::new();

    for r in rows {
        push(&mut roles, &r.role);
        push(&mut members, &r.member);
        push(&mut companies, &r.company);
        push(&mut project_types, &r.project_type);
        push(&mut work_types, &r.board_work_type);
        if let Some(b) = &r.buckets {
            push(&mut months, &b.calendar_month);
            push(&mut fiscal_years, &b.fiscal_year);
        }
    }

    let quarters: BTreeSet<String> = months
        .iter()
        .filter_map(|m| quarter_from_month_key(m))
        .collect();

    let index = DistinctValueIndex {
        roles: roles.into_iter().collect(),
        members: members.into_iter().collect(),
        companies: companies.into_iter().collect(),
        project_types: project_types.into_iter().collect(),
        work_types_board: work_types.into_iter().collect(),
        calendar_months: months.into_iter().collect(),
        quarters: quarters.into_iter().collect(),
        fiscal_years: fiscal_years.into_iter().collect(),
    };
    debug!(
        roles = index.roles.len(),
        members = index.members.len(),
        companies = index.companies.len(),
        months = index.calendar_months.len(),
        "built distinct value index"
    );
    index
}
