//! Life table output structures

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::series::{GroupKey, Label, MortalityRow, MortalitySeries};

/// A single row of a life table for one group and age
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeTableRow {
    /// Labels carried over from the input row
    pub labels: BTreeMap<String, Label>,

    pub age: u32,

    /// Input mortality, before the terminal-age override
    pub mortality: f64,

    /// Death probability used (1 at the terminal age)
    #[serde(rename = "q")]
    pub death_probability: f64,

    /// Survivors to exact age (l)
    #[serde(rename = "l")]
    pub survivors: f64,

    /// Deaths within the interval (d)
    #[serde(rename = "d")]
    pub deaths: f64,

    /// Person-years lived within the interval (L)
    #[serde(rename = "L")]
    pub person_years: f64,

    /// Person-years remaining from exact age onward (T)
    #[serde(rename = "T")]
    pub person_years_remaining: f64,

    /// Remaining life expectancy (e); NaN when survivors hit zero early
    #[serde(rename = "e")]
    pub life_expectancy: f64,
}

/// Life table for every group of a series
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LifeTable {
    /// Grouping columns, sorted
    pub by: Vec<String>,

    /// Groups in key order, rows in ascending age
    pub groups: Vec<(GroupKey, Vec<LifeTableRow>)>,

    /// Radix the table was built with
    pub radix: f64,
}

impl LifeTable {
    /// Iterate groups as (key, rows)
    pub fn groups(&self) -> impl Iterator<Item = (&GroupKey, &[LifeTableRow])> {
        self.groups.iter().map(|(key, rows)| (key, rows.as_slice()))
    }

    /// Rows for one group
    pub fn group(&self, key: &GroupKey) -> Option<&[LifeTableRow]> {
        self.groups
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, rows)| rows.as_slice())
    }

    /// All rows, group after group
    pub fn rows(&self) -> impl Iterator<Item = &LifeTableRow> {
        self.groups.iter().flat_map(|(_, rows)| rows.iter())
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|(_, rows)| rows.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remaining life expectancy at `age` for one group
    pub fn life_expectancy_at(&self, key: &GroupKey, age: u32) -> Option<f64> {
        self.group(key)?
            .iter()
            .find(|row| row.age == age)
            .map(|row| row.life_expectancy)
    }

    /// Series of the death probabilities actually used (terminal age at 1)
    pub fn to_series(&self) -> MortalitySeries {
        self.rows()
            .map(|row| MortalityRow {
                labels: row.labels.clone(),
                age: row.age,
                mortality: row.death_probability,
            })
            .collect()
    }
}
