//! Life table construction: survivorship, deaths, person-years and life expectancy

mod builder;
pub mod scan;
mod table;

pub use builder::{LifeTableBuilder, LifeTableConfig};
pub use table::{LifeTable, LifeTableRow};
