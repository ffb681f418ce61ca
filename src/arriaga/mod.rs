//! Arriaga decomposition of life-expectancy gaps
//!
//! Attributes the difference e_new(0) - e(0) between two mortality regimes
//! to individual ages (direct and indirect effects), and optionally further
//! to causes of death.
//!
//! # Example
//!
//! ```rust
//! use lifetables::{ArriagaDecomposer, MortalitySeries};
//!
//! let initial = MortalitySeries::from_rates(&[0.01, 1.0]);
//! let new = MortalitySeries::from_rates(&[0.005, 1.0]);
//!
//! let result = ArriagaDecomposer::default().decompose_by_age(&initial, &new, &[])?;
//! assert_eq!(result.rows[0].contribution_proportion, Some(1.0));
//! # Ok::<(), lifetables::LifeTableError>(())
//! ```

mod age;
mod cause;
mod join;

pub use age::{ArriagaResult, ArriagaRow};
pub use cause::{CauseArriagaResult, CauseArriagaRow};

use crate::life_table::{LifeTableBuilder, LifeTableConfig};

/// Decomposes life-expectancy gaps between an initial and a new regime
///
/// Effects are divided by the radix, so contributions are in years per
/// person at birth whatever radix the life tables use.
#[derive(Debug, Clone, Default)]
pub struct ArriagaDecomposer {
    builder: LifeTableBuilder,
}

impl ArriagaDecomposer {
    pub fn new(config: LifeTableConfig) -> Self {
        Self {
            builder: LifeTableBuilder::new(config),
        }
    }
}
