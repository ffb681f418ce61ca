//! Mortality series: the canonical (labels, age, mortality) input schema

mod data;
pub mod loader;

pub use data::{normalize_by, GroupKey, Label, MortalityRow, MortalitySeries};
pub use loader::{load_series, load_series_from_reader};
