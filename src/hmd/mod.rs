//! Human Mortality Database period life tables
//!
//! Reads the `{m,f,b}ltper_1x1.txt` files and turns them into mortality
//! series keyed by `year` and `sex`.

mod loader;

pub use loader::{load_hmd_life_table, parse_hmd_table, DEFAULT_HMD_PATH};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{LifeTableError, Result};
use crate::series::{MortalityRow, MortalitySeries};

/// Sex of an HMD table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
    /// Both sexes combined
    Pooled,
}

impl Sex {
    pub const ALL: [Sex; 3] = [Sex::Male, Sex::Female, Sex::Pooled];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
            Sex::Pooled => "Pooled",
        }
    }

    /// File name of the 1x1 period life table for this sex
    pub fn file_name(&self) -> String {
        let prefix = match self {
            Sex::Male => 'm',
            Sex::Female => 'f',
            Sex::Pooled => 'b',
        };
        format!("{}ltper_1x1.txt", prefix)
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sex {
    type Err = LifeTableError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Male" => Ok(Sex::Male),
            "Female" => Ok(Sex::Female),
            "Pooled" => Ok(Sex::Pooled),
            other => Err(LifeTableError::parse("sex", other)),
        }
    }
}

/// One row of an HMD life table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HmdRecord {
    pub year: i64,
    pub age: u32,
    pub sex: Sex,

    /// Rate columns with the trailing `x` dropped (`m`, `q`, `a`, `l`, `d`, `L`, `T`, `e`)
    pub rates: BTreeMap<String, f64>,
}

/// Records from one or more HMD files
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HmdTable {
    pub records: Vec<HmdRecord>,
}

impl HmdTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn concat(mut self, other: HmdTable) -> Self {
        self.records.extend(other.records);
        self
    }

    /// Mortality series labeled by `year` and `sex`, with `mortality` read
    /// from the given rate column (usually `q`)
    pub fn to_mortality_series(&self, column: &str) -> Result<MortalitySeries> {
        self.records
            .iter()
            .map(|record| {
                let mortality = *record
                    .rates
                    .get(column)
                    .ok_or_else(|| LifeTableError::missing(column, "HMD life table"))?;
                Ok(MortalityRow::new(record.age, mortality)
                    .with_label("year", record.year)
                    .with_label("sex", record.sex.as_str()))
            })
            .collect::<Result<Vec<_>>>()
            .map(MortalitySeries::from_rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        assert_eq!(Sex::Male.file_name(), "mltper_1x1.txt");
        assert_eq!(Sex::Female.file_name(), "fltper_1x1.txt");
        assert_eq!(Sex::Pooled.file_name(), "bltper_1x1.txt");
    }

    #[test]
    fn test_sex_from_str() {
        assert_eq!("Pooled".parse::<Sex>().unwrap(), Sex::Pooled);
        assert!("Both".parse::<Sex>().is_err());
    }

    #[test]
    fn test_to_mortality_series_missing_column() {
        let table = HmdTable {
            records: vec![HmdRecord {
                year: 2000,
                age: 0,
                sex: Sex::Male,
                rates: BTreeMap::from([("q".to_string(), 0.007)]),
            }],
        };
        let series = table.to_mortality_series("q").unwrap();
        assert_eq!(series.len(), 1);
        assert!(table.to_mortality_series("mortality").is_err());
    }
}
