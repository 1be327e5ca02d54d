use crate::types::{
    CompanyHoursRow, MemberHoursRow, NormalizedRow, SummaryStats, TrendRow, WorkTypeRow,
};
use crate::util::{format_number, percent};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Default)]
struct HoursAcc {
    total: f64,
    billable: f64,
}

impl HoursAcc {
    fn add(&mut self, r: &NormalizedRow) {
        self.total += r.hours;
        if r.is_billable {
            self.billable += r.hours;
        }
    }
}

fn by_hours_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

pub fn generate_summary(data: &[&NormalizedRow]) -> SummaryStats {
    let mut acc = HoursAcc::default();
    let mut internal_hours = 0.0;
    let mut members: HashSet<&str> = HashSet::new();
    for r in data {
        acc.add(r);
        if r.is_internal {
            internal_hours += r.hours;
        }
        members.insert(r.member.as_str());
    }
    SummaryStats {
        total_rows: data.len(),
        total_hours: acc.total,
        billable_hours: acc.billable,
        non_billable_hours: acc.total - acc.billable,
        internal_hours,
        utilization_pct: percent(acc.billable, acc.total),
        members: members.len(),
    }
}

/// Per-member hours, largest first. A member's role is the one on their
/// first row.
pub fn hours_by_member(data: &[&NormalizedRow]) -> Vec<MemberHoursRow> {
    let mut map: HashMap<&str, (&str, HoursAcc)> = HashMap::new();
    for r in data {
        map.entry(r.member.as_str())
            .or_insert_with(|| (r.role.as_str(), HoursAcc::default()))
            .1
            .add(r);
    }
    let mut tmp: Vec<(&str, &str, HoursAcc)> =
        map.into_iter().map(|(m, (role, acc))| (m, role, acc)).collect();
    tmp.sort_by(|a, b| by_hours_desc(a.2.total, b.2.total).then_with(|| a.0.cmp(b.0)));
    tmp.into_iter()
        .map(|(member, role, acc)| MemberHoursRow {
            member: member.to_string(),
            role: role.to_string(),
            total_hours: format_number(acc.total, 2),
            billable_hours: format_number(acc.billable, 2),
            utilization_pct: format_number(percent(acc.billable, acc.total), 1),
        })
        .collect()
}

pub fn hours_by_work_type(data: &[&NormalizedRow]) -> Vec<WorkTypeRow> {
    let mut map: HashMap<&str, f64> = HashMap::new();
    let mut total = 0.0;
    for r in data {
        *map.entry(r.board_work_type.as_str()).or_default() += r.hours;
        total += r.hours;
    }
    let mut tmp: Vec<(&str, f64)> = map.into_iter().collect();
    tmp.sort_by(|a, b| by_hours_desc(a.1, b.1).then_with(|| a.0.cmp(b.0)));
    tmp.into_iter()
        .map(|(bucket, hours)| WorkTypeRow {
            board_work_type: bucket.to_string(),
            hours: format_number(hours, 2),
            share_pct: format_number(percent(hours, total), 1),
        })
        .collect()
}

fn trend<F>(data: &[&NormalizedRow], key: F) -> Vec<TrendRow>
where
    F: Fn(&NormalizedRow) -> Option<&str>,
{
    // BTreeMap keeps `YYYY-MM` / `YYYY-Www` keys in date order.
    let mut map: BTreeMap<&str, HoursAcc> = BTreeMap::new();
    for r in data {
        if let Some(k) = key(*r) {
            map.entry(k).or_default().add(r);
        }
    }
    map.into_iter()
        .map(|(period, acc)| TrendRow {
            period: period.to_string(),
            total_hours: format_number(acc.total, 2),
            billable_hours: format_number(acc.billable, 2),
            utilization_pct: format_number(percent(acc.billable, acc.total), 1),
        })
        .collect()
}

/// Hours per calendar month, oldest first. Undated rows are left out.
pub fn monthly_trend(data: &[&NormalizedRow]) -> Vec<TrendRow> {
    trend(data, NormalizedRow::calendar_month)
}

/// Hours per ISO week, oldest first. Undated rows are left out.
pub fn weekly_trend(data: &[&NormalizedRow]) -> Vec<TrendRow> {
    trend(data, NormalizedRow::iso_week)
}

/// External companies ranked by hours booked against them.
pub fn top_companies(data: &[&NormalizedRow], limit: usize) -> Vec<CompanyHoursRow> {
    let mut map: HashMap<&str, HoursAcc> = HashMap::new();
    for r in data.iter().filter(|r| !r.is_internal) {
        map.entry(r.company.as_str()).or_default().add(r);
    }
    let mut tmp: Vec<(&str, HoursAcc)> = map.into_iter().collect();
    tmp.sort_by(|a, b| by_hours_desc(a.1.total, b.1.total).then_with(|| a.0.cmp(b.0)));
    tmp.into_iter()
        .take(limit)
        .enumerate()
        .map(|(idx, (company, acc))| CompanyHoursRow {
            rank: idx + 1,
            company: company.to_string(),
            hours: format_number(acc.total, 2),
            billable_hours: format_number(acc.billable, 2),
        })
        .collect()
}
