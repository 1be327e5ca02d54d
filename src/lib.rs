//! Timesheet analytics: map a timesheet CSV onto a canonical schema,
//! normalize and classify each entry, and slice the result with filters.
//!
//! The pipeline runs synchronously and keeps no state between calls:
//! [`loader::load_from_reader`] produces a [`loader::Dataset`], and
//! [`filter::apply_filters`] selects from its rows for every filter change.

pub mod config;
pub mod error;
pub mod filter;
pub mod index;
pub mod loader;
pub mod normalize;
pub mod output;
pub mod periods;
pub mod persistence;
pub mod reports;
pub mod schema;
pub mod types;
pub mod util;

pub use error::{Error, Result};
pub use filter::{apply_filters, FilterState};
pub use loader::{load_and_clean, load_from_reader, Dataset, LoadReport};
pub use types::{NormalizedRow, TimeBuckets};
