// Entry point and high-level CLI flow.
//
// - Option [1] loads and normalizes the timesheet CSV, printing diagnostics.
// - Option [2] applies the current filters and writes the reports.
// - Option [3] changes the reporting period.
// - Option [4] resets filters to the defaults derived from the data.
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use timesheet_insights::config::{self, Settings, CONFIG_FILE};
use timesheet_insights::filter::{apply_filters, FilterState, PeriodKind};
use timesheet_insights::persistence::FilterStore;
use timesheet_insights::types::NormalizedRow;
use timesheet_insights::{output, reports, util, Dataset, Error};
use tracing::warn;

// Loaded once per upload; reports and filter changes reuse it.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    Mutex::new(AppState {
        data: None,
        filters: FilterState::default(),
    })
});

struct AppState {
    data: Option<Dataset>,
    filters: FilterState,
}

fn app_state() -> MutexGuard<'static, AppState> {
    APP_STATE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn prompt(label: &str) -> String {
    print!("{}", label);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn read_choice() -> String {
    prompt("Enter choice: ")
}

/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        match prompt("Back to menu (Y/N): ").to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn persist(store: &FilterStore, filters: &FilterState) {
    if let Err(e) = store.save(filters) {
        warn!(error = %e, "could not save filters");
    }
}

fn handle_load(settings: &Settings, store: &FilterStore) {
    let data = match timesheet_insights::load_and_clean(&settings.input_path, &settings.reference) {
        Ok(d) => d,
        Err(Error::MissingHeaders(missing)) => {
            eprintln!("Cannot use {}: the file is missing these columns:", settings.input_path.display());
            for column in missing {
                eprintln!("  - {}", column);
            }
            println!();
            return;
        }
        Err(e) => {
            eprintln!("Failed to load file: {}\n", e);
            return;
        }
    };

    let report = &data.report;
    println!(
        "Processing timesheet... ({} rows read, {} kept)",
        util::format_int(report.total_rows),
        util::format_int(report.kept_rows)
    );
    if report.dropped_rows > 0 {
        println!(
            "Note: {} rows skipped (no date and no hours).",
            util::format_int(report.dropped_rows)
        );
    }
    if report.undated_rows > 0 {
        println!(
            "Note: {} rows have an unreadable date and only appear in undated views.",
            util::format_int(report.undated_rows)
        );
    }
    if report.parse_errors > 0 {
        println!(
            "Note: {} malformed lines ignored.",
            util::format_int(report.parse_errors)
        );
    }
    if let Some(d) = &data.period_defaults {
        println!("Latest month: {} ({}, {})", d.month, d.quarter, d.fiscal_year);
    }
    println!();

    let filters = store
        .load()
        .filter(|f| f.fits_index(&data.index))
        .unwrap_or_else(|| FilterState::seeded(data.period_defaults.as_ref()));
    persist(store, &filters);

    let mut state = app_state();
    state.data = Some(data);
    state.filters = filters;
}

fn describe_period(filters: &FilterState) -> String {
    let or_all = |v: &Option<String>| v.clone().unwrap_or_else(|| "all".to_string());
    match filters.period {
        Some(PeriodKind::Month) => format!("Month {}", or_all(&filters.month)),
        Some(PeriodKind::Quarter) => format!("Quarter {}", or_all(&filters.quarter)),
        Some(PeriodKind::FiscalYear) => format!("Fiscal year {}", or_all(&filters.fy)),
        Some(PeriodKind::Custom) => format!(
            "Custom {} to {}",
            filters.from_date.as_deref().unwrap_or("start"),
            filters.to_date.as_deref().unwrap_or("end")
        ),
        None => "All dates".to_string(),
    }
}

fn handle_generate_reports(settings: &Settings) {
    let state = app_state();
    let Some(data) = state.data.as_ref() else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return;
    };

    let rows: Vec<&NormalizedRow> = apply_filters(&data.rows, &state.filters);
    let period = describe_period(&state.filters);
    println!("Generating reports for {} ({} rows)...\n", period, util::format_int(rows.len()));

    let summary = reports::generate_summary(&rows);
    let by_member = reports::hours_by_member(&rows);
    let by_work_type = reports::hours_by_work_type(&rows);
    let monthly = reports::monthly_trend(&rows);
    let weekly = reports::weekly_trend(&rows);
    let companies = reports::top_companies(&rows, 10);

    let n = settings.preview_rows;
    output::preview_table(1, "Hours by Member", Some(period.as_str()), &by_member, n);
    output::preview_table(2, "Hours by Board Work Type", Some(period.as_str()), &by_work_type, n);
    output::preview_table(3, "Monthly Trend", None, &monthly, n);
    output::preview_table(4, "Weekly Trend", None, &weekly, n);
    output::preview_table(5, "Top External Companies", Some("Top 10 by hours"), &companies, n);

    let dir = &settings.output_dir;
    let results = [
        output::write_csv(&dir.join("report_members.csv"), &by_member),
        output::write_csv(&dir.join("report_work_types.csv"), &by_work_type),
        output::write_csv(&dir.join("report_monthly.csv"), &monthly),
        output::write_csv(&dir.join("report_weekly.csv"), &weekly),
        output::write_csv(&dir.join("report_companies.csv"), &companies),
        output::export_rows(&dir.join("filtered_rows.csv"), &rows),
        output::write_json(&dir.join("summary.json"), &summary),
    ];
    for e in results.into_iter().filter_map(|r| r.err()) {
        eprintln!("Write error: {}", e);
    }

    println!("Summary Stats (summary.json):");
    println!(
        "{{\"total_hours\": {}, \"billable_hours\": {}, \"utilization_pct\": {}}}\n",
        util::format_number(summary.total_hours, 2),
        util::format_number(summary.billable_hours, 2),
        util::format_number(summary.utilization_pct, 1)
    );
}

fn pick_value(label: &str, options: &[String]) -> Option<String> {
    if !options.is_empty() {
        println!("Available: {}", options.join(", "));
    }
    let value = prompt(label);
    (!value.is_empty()).then_some(value)
}

fn handle_change_period(store: &FilterStore) {
    let mut state = app_state();
    let Some(index) = state.data.as_ref().map(|d| d.index.clone()) else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return;
    };

    let kind = prompt("Period [Month/Quarter/FY/Custom]: ");
    let filters = &mut state.filters;
    match kind.parse::<PeriodKind>() {
        Ok(PeriodKind::Month) => {
            filters.month = pick_value("Month (YYYY-MM, blank for all): ", &index.calendar_months);
            filters.period = Some(PeriodKind::Month);
        }
        Ok(PeriodKind::Quarter) => {
            filters.quarter = pick_value("Quarter (YYYY-Q#, blank for all): ", &index.quarters);
            filters.period = Some(PeriodKind::Quarter);
        }
        Ok(PeriodKind::FiscalYear) => {
            filters.fy = pick_value("Fiscal year (FYyy, blank for all): ", &index.fiscal_years);
            filters.period = Some(PeriodKind::FiscalYear);
        }
        Ok(PeriodKind::Custom) => {
            filters.from_date = pick_value("From (YYYY-MM-DD, blank for open): ", &[]);
            filters.to_date = pick_value("To (YYYY-MM-DD, blank for open): ", &[]);
            filters.period = Some(PeriodKind::Custom);
        }
        Err(_) => {
            println!("Invalid period. Please enter Month, Quarter, FY or Custom.\n");
            return;
        }
    }
    println!("Period set to {}.\n", describe_period(filters));
    persist(store, filters);
}

fn handle_reset(store: &FilterStore) {
    let mut state = app_state();
    let defaults = state.data.as_ref().and_then(|d| d.period_defaults.clone());
    state.filters = FilterState::seeded(defaults.as_ref());
    persist(store, &state.filters);
    println!("Filters reset.\n");
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("timesheet_insights=info")),
        )
        .init();

    let settings = match config::read_settings(Path::new(CONFIG_FILE)) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read {}: {}", CONFIG_FILE, e);
            return;
        }
    };
    let store = FilterStore::new(settings.filter_state_path.clone());

    loop {
        println!("Timesheet Insights:");
        println!("[1] Load the file");
        println!("[2] Generate Reports");
        println!("[3] Change Period");
        println!("[4] Reset Filters\n");
        match read_choice().as_str() {
            "1" => handle_load(&settings, &store),
            "2" => {
                println!();
                handle_generate_reports(&settings);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "3" => handle_change_period(&store),
            "4" => handle_reset(&store),
            _ => println!("Invalid choice. Please enter 1, 2, 3 or 4.\n"),
        }
    }
}
