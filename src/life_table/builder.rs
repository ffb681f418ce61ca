//! Life table construction from age-specific mortality rates
//!
//! Definitions follow the SSA period life table conventions:
//! - `q`: death probability, forced to 1 at the group's oldest (open) age
//! - `l`: survivors to exact age, a shifted cumulative product of `1 - q`
//! - `d = l * q`
//! - `L = l - s * d`, with `s` the average fraction of the interval lived by
//!   those dying in it (0.14 for infants, 0.5 otherwise)
//! - `T`: reverse cumulative sum of `L`
//! - `e = T / l`

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::scan::{ratio, reverse_cumulative_sum, shifted_cumulative_product};
use super::table::{LifeTable, LifeTableRow};
use crate::error::{LifeTableError, Result};
use crate::series::{normalize_by, GroupKey, MortalityRow, MortalitySeries};

/// Configuration for building life tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifeTableConfig {
    /// Cohort size at exact age 0 (l_0)
    pub radix: f64,

    /// Fraction of the first year lived by infants dying in it
    pub infant_separation: f64,

    /// Fraction of the interval lived by deaths at every other age
    pub default_separation: f64,

    /// Reject duplicate ages and out-of-range mortality instead of
    /// producing a silently wrong table
    pub strict: bool,
}

impl Default for LifeTableConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl LifeTableConfig {
    /// Radix 1, 0.14 infant separation, uniform deaths elsewhere
    pub fn standard() -> Self {
        Self {
            radix: 1.0,
            infant_separation: 0.14,
            default_separation: 0.5,
            strict: false,
        }
    }

    /// Standard config with a different radix (e.g. 100,000)
    pub fn with_radix(radix: f64) -> Self {
        Self {
            radix,
            ..Self::standard()
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Load a config from a JSON file; missing fields take their defaults
    pub fn from_json_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let config: Self = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.radix.is_finite() || self.radix <= 0.0 {
            return Err(LifeTableError::InvalidConfig(format!(
                "radix must be positive and finite, got {}",
                self.radix
            )));
        }
        for (name, value) in [
            ("infant_separation", self.infant_separation),
            ("default_separation", self.default_separation),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(LifeTableError::InvalidConfig(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Separation factor for an age bin
    fn separation(&self, age: u32) -> f64 {
        if age == 0 {
            self.infant_separation
        } else {
            self.default_separation
        }
    }
}

/// Builds life tables per group
#[derive(Debug, Clone, Default)]
pub struct LifeTableBuilder {
    config: LifeTableConfig,
}

impl LifeTableBuilder {
    pub fn new(config: LifeTableConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LifeTableConfig {
        &self.config
    }

    /// Build a life table for each group of `series` defined by the `by` columns
    ///
    /// Rows are sorted by `by + [age]` first. Outside strict mode the caller
    /// must ensure that no (group, age) appears twice and that the oldest age
    /// of each group really is the open interval; violations give a wrong
    /// table rather than an error.
    pub fn build(&self, series: &MortalitySeries, by: &[&str]) -> Result<LifeTable> {
        self.build_with_context(series, by, "mortality series")
    }

    pub(crate) fn build_with_context(
        &self,
        series: &MortalitySeries,
        by: &[&str],
        context: &str,
    ) -> Result<LifeTable> {
        self.config.validate()?;
        let by = normalize_by(by);
        let partitioned = series.partition(&by, context)?;
        log::debug!(
            "building life table for {} rows in {} groups (by {:?})",
            series.len(),
            partitioned.len(),
            by
        );

        let groups = partitioned
            .par_iter()
            .map(|(key, rows)| Ok((key.clone(), self.build_group(key, rows)?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(LifeTable {
            by,
            groups,
            radix: self.config.radix,
        })
    }

    fn build_group(&self, key: &GroupKey, rows: &[&MortalityRow]) -> Result<Vec<LifeTableRow>> {
        let Some(max_age) = rows.iter().map(|row| row.age).max() else {
            return Ok(Vec::new());
        };

        if self.config.strict {
            check_group(key, rows, max_age)?;
        }

        let q: Vec<f64> = rows
            .iter()
            .map(|row| if row.age == max_age { 1.0 } else { row.mortality })
            .collect();
        let p: Vec<f64> = q.iter().map(|q| 1.0 - q).collect();

        let l = shifted_cumulative_product(&p, self.config.radix);
        let d: Vec<f64> = l.iter().zip(&q).map(|(l, q)| l * q).collect();
        let big_l: Vec<f64> = rows
            .iter()
            .zip(l.iter().zip(&d))
            .map(|(row, (l, d))| l - self.config.separation(row.age) * d)
            .collect();
        let big_t = reverse_cumulative_sum(&big_l);

        let mut out = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let e = ratio(big_t[i], l[i]);
            if e.is_nan() {
                log::warn!(
                    "life expectancy undefined at age {} in group {}: no survivors",
                    row.age,
                    key
                );
            }
            out.push(LifeTableRow {
                labels: row.labels.clone(),
                age: row.age,
                mortality: row.mortality,
                death_probability: q[i],
                survivors: l[i],
                deaths: d[i],
                person_years: big_l[i],
                person_years_remaining: big_t[i],
                life_expectancy: e,
            });
        }
        Ok(out)
    }
}

/// Strict-mode checks for one age-sorted group
fn check_group(key: &GroupKey, rows: &[&MortalityRow], max_age: u32) -> Result<()> {
    for pair in rows.windows(2) {
        if pair[0].age == pair[1].age {
            return Err(LifeTableError::DuplicateAge {
                group: key.to_string(),
                age: pair[0].age,
            });
        }
    }
    for row in rows.iter().filter(|row| row.age != max_age) {
        if !(0.0..=1.0).contains(&row.mortality) {
            return Err(LifeTableError::InvalidMortality {
                group: key.to_string(),
                age: row.age,
                value: row.mortality,
            });
        }
    }
    Ok(())
}
