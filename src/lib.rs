//! Lifetables - life tables and Arriaga decomposition of life-expectancy gaps
//!
//! This library provides:
//! - Life table construction (l, d, L, T, e) from age-specific mortality rates
//! - Age-level Arriaga decomposition of the gap between two mortality regimes
//! - Cause-of-death level decomposition built on the age-level one
//! - Loaders for canonical CSV series and Human Mortality Database tables

pub mod error;
pub mod series;
pub mod life_table;
pub mod arriaga;
pub mod hmd;
pub mod output;

// Re-export commonly used types
pub use error::{LifeTableError, Result};
pub use series::{GroupKey, Label, MortalityRow, MortalitySeries};
pub use life_table::{LifeTable, LifeTableBuilder, LifeTableConfig, LifeTableRow};
pub use arriaga::{
    ArriagaDecomposer, ArriagaResult, ArriagaRow, CauseArriagaResult, CauseArriagaRow,
};
pub use hmd::{HmdRecord, HmdTable, Sex};
