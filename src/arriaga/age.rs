//! Age-level Arriaga decomposition
//!
//! For each age x, with the new regime marked by a prime:
//! - direct:   l_x * (L'_x / l'_x - L_x / l_x)
//! - indirect: T'_{x+1} * (l_x / l'_x - l_{x+1} / l'_{x+1})
//!
//! The indirect effect needs the next age, so it is undefined at the oldest
//! age of each group. Summed over ages, the contributions reproduce
//! e'_0 - e_0.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::join::{index_unique, AgeKey};
use super::ArriagaDecomposer;
use crate::error::Result;
use crate::life_table::scan::{difference_with_next, lead, ratio, sum_defined};
use crate::life_table::{LifeTable, LifeTableRow};
use crate::series::{GroupKey, MortalitySeries};

/// Contribution of one age to one group's life-expectancy gap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArriagaRow {
    pub group: GroupKey,
    pub age: u32,
    pub direct_effect: f64,

    /// `None` at the group's oldest age
    pub indirect_effect: Option<f64>,

    /// Direct plus indirect; `None` when the indirect effect is
    pub contribution_years: Option<f64>,

    /// Share of the group's total gap
    pub contribution_proportion: Option<f64>,
}

/// Age-level decomposition for every group
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArriagaResult {
    /// Grouping columns, sorted
    pub by: Vec<String>,

    /// Rows by group key, then ascending age
    pub rows: Vec<ArriagaRow>,
}

impl ArriagaResult {
    /// Rows of one group
    pub fn group<'a>(&'a self, key: &'a GroupKey) -> impl Iterator<Item = &'a ArriagaRow> + 'a {
        self.rows.iter().filter(move |row| &row.group == key)
    }

    /// Sum of defined contributions for one group
    pub fn total_gap(&self, key: &GroupKey) -> f64 {
        self.group(key).filter_map(|row| row.contribution_years).sum()
    }

    /// Total gap per group, in group order
    pub fn gaps(&self) -> Vec<(GroupKey, f64)> {
        let mut gaps: Vec<(GroupKey, f64)> = Vec::new();
        for row in &self.rows {
            let years = row.contribution_years.unwrap_or(0.0);
            match gaps.last_mut() {
                Some((key, total)) if key == &row.group => *total += years,
                _ => gaps.push((row.group.clone(), years)),
            }
        }
        gaps
    }
}

/// Matched (initial, new) rows for one group, ascending age
type JoinedGroup<'a> = (GroupKey, Vec<(&'a LifeTableRow, &'a LifeTableRow)>);

impl ArriagaDecomposer {
    /// Decompose the gap e_new(0) - e(0) into per-age contributions
    ///
    /// Both series are turned into life tables with the same `by` and joined
    /// on (by, age). Keys present on only one side are dropped; a key present
    /// twice on either side is a `JoinCardinality` error.
    pub fn decompose_by_age(
        &self,
        initial: &MortalitySeries,
        new: &MortalitySeries,
        by: &[&str],
    ) -> Result<ArriagaResult> {
        let initial_table = self.builder.build_with_context(initial, by, "initial series")?;
        let new_table = self.builder.build_with_context(new, by, "new series")?;

        let joined = join_tables(&initial_table, &new_table)?;
        let radix = self.builder.config().radix;

        let rows = joined
            .par_iter()
            .map(|(key, pairs)| group_effects(key, pairs, radix))
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect();

        Ok(ArriagaResult {
            by: initial_table.by.clone(),
            rows,
        })
    }
}

/// Inner join on (group, age), requiring one row per key on each side
fn join_tables<'a>(initial: &'a LifeTable, new: &'a LifeTable) -> Result<Vec<JoinedGroup<'a>>> {
    let keyed = |table: &'a LifeTable| {
        table
            .groups()
            .flat_map(|(key, rows)| {
                rows.iter()
                    .map(move |row| (AgeKey::new(key.clone(), row.age), row))
            })
            .collect::<Vec<_>>()
    };

    // Checked on both sides so a duplicate is reported even when unmatched
    index_unique(keyed(initial), "age")?;
    let new_index = index_unique(keyed(new), "age")?;

    let mut matched = 0;
    let mut joined = Vec::new();
    for (key, rows) in initial.groups() {
        let pairs: Vec<_> = rows
            .iter()
            .filter_map(|row| {
                new_index
                    .get(&AgeKey::new(key.clone(), row.age))
                    .map(|new_row| (row, *new_row))
            })
            .collect();
        matched += pairs.len();
        if !pairs.is_empty() {
            joined.push((key.clone(), pairs));
        }
    }

    if matched < initial.len() || matched < new.len() {
        log::debug!(
            "age join dropped {} initial and {} new rows without a counterpart",
            initial.len() - matched,
            new.len() - matched
        );
    }
    Ok(joined)
}

fn group_effects(
    key: &GroupKey,
    pairs: &[(&LifeTableRow, &LifeTableRow)],
    radix: f64,
) -> Vec<ArriagaRow> {
    let direct: Vec<f64> = pairs
        .iter()
        .map(|(old, new)| {
            old.survivors
                * (ratio(new.person_years, new.survivors) - ratio(old.person_years, old.survivors))
                / radix
        })
        .collect();

    let remaining_new: Vec<f64> = pairs.iter().map(|(_, new)| new.person_years_remaining).collect();
    let survivor_ratio: Vec<f64> = pairs
        .iter()
        .map(|(old, new)| ratio(old.survivors, new.survivors))
        .collect();

    let indirect: Vec<Option<f64>> = lead(&remaining_new)
        .into_iter()
        .zip(difference_with_next(&survivor_ratio))
        .map(|(t_next, diff)| Some(t_next? * diff? / radix))
        .collect();

    let years: Vec<Option<f64>> = direct
        .iter()
        .zip(&indirect)
        .map(|(direct, indirect)| indirect.map(|indirect| direct + indirect))
        .collect();
    let total = sum_defined(&years);

    pairs
        .iter()
        .enumerate()
        .map(|(i, (old, _))| ArriagaRow {
            group: key.clone(),
            age: old.age,
            direct_effect: direct[i],
            indirect_effect: indirect[i],
            contribution_years: years[i],
            contribution_proportion: years[i].map(|y| ratio(y, total)),
        })
        .collect()
}
