//! Default period selection from the loaded months.

use crate::types::PeriodDefaults;
use crate::util::{fiscal_year_from_month_key, quarter_from_month_key};

/// Latest month in a sorted `YYYY-MM` list, with its quarter and fiscal year.
///
/// `YYYY-MM` keys sort chronologically as strings, so the last entry is the
/// latest month. Returns `None` for an empty or malformed list.
pub fn derive_period_defaults(calendar_months: &[String]) -> Option<PeriodDefaults> {
    let month = calendar_months.last()?;
    Some(PeriodDefaults {
        quarter: quarter_from_month_key(month)?,
        fiscal_year: fiscal_year_from_month_key(month)?,
        month: month.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn months(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn picks_last_month() {
        let d = derive_period_defaults(&months(&["2023-11", "2024-02", "2024-05"])).unwrap();
        assert_eq!(
            d,
            PeriodDefaults {
                month: "2024-05".into(),
                quarter: "2024-Q2".into(),
                fiscal_year: "FY24".into(),
            }
        );
    }

    #[test]
    fn early_year_month_belongs_to_previous_fiscal_year() {
        let d = derive_period_defaults(&months(&["2024-12", "2025-03"])).unwrap();
        assert_eq!(d.quarter, "2025-Q1");
        assert_eq!(d.fiscal_year, "FY24");
    }

    #[test]
    fn none_without_months() {
        assert_eq!(derive_period_defaults(&[]), None);
        assert_eq!(derive_period_defaults(&months(&["bogus"])), None);
    }
}
