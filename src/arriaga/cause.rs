//! Cause-of-death level Arriaga decomposition
//!
//! Each age's total contribution is split across causes in proportion to
//! each cause's share of the change in mortality at that age:
//!
//! share(c) = (m'_c - m_c) / sum over causes of (m'_c - m_c)
//!
//! The age totals come from the all-cause series obtained by summing
//! mortality over causes, so summing cause rows gives back the age row.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::join::{index_unique, AgeKey, CauseKey};
use super::ArriagaDecomposer;
use crate::error::{LifeTableError, Result};
use crate::life_table::scan::ratio;
use crate::series::{normalize_by, GroupKey, Label, MortalityRow, MortalitySeries};

/// Contribution of one cause at one age to one group's gap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CauseArriagaRow {
    pub group: GroupKey,
    pub age: u32,
    pub cause: Label,

    /// Fraction of the age's mortality change due to this cause;
    /// NaN when mortality did not change in total at this age
    pub share_within_age: f64,

    pub direct_effect: f64,
    pub indirect_effect: Option<f64>,
    pub contribution_years: Option<f64>,
    pub contribution_proportion: Option<f64>,
}

/// Cause-level decomposition for every group
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CauseArriagaResult {
    /// Grouping columns, sorted
    pub by: Vec<String>,

    /// Name of the cause column in the inputs
    pub cause_column: String,

    /// Rows by group key, age, then cause
    pub rows: Vec<CauseArriagaRow>,
}

impl CauseArriagaResult {
    /// Sum of defined contributions for one (group, age) over causes
    pub fn age_total(&self, key: &GroupKey, age: u32) -> f64 {
        self.rows
            .iter()
            .filter(|row| &row.group == key && row.age == age)
            .filter_map(|row| row.contribution_years)
            .sum()
    }

    /// Total contribution of each cause for one group, summed over ages
    pub fn cause_totals(&self, key: &GroupKey) -> BTreeMap<Label, f64> {
        let mut totals = BTreeMap::new();
        for row in self.rows.iter().filter(|row| &row.group == key) {
            *totals.entry(row.cause.clone()).or_insert(0.0) +=
                row.contribution_years.unwrap_or(0.0);
        }
        totals
    }
}

impl ArriagaDecomposer {
    /// Decompose each age's contribution further across causes of death
    ///
    /// Both series must label every row with `cause_column`. For a given
    /// (group, age) the cause mortalities are expected to add up to the
    /// all-cause mortality.
    ///
    /// Cause rows present in only one series are dropped from the cause join
    /// but still count towards the all-cause totals, so the age's contribution
    /// is split across the causes present in both series.
    pub fn decompose_by_age_and_cause(
        &self,
        initial: &MortalitySeries,
        new: &MortalitySeries,
        by: &[&str],
        cause_column: &str,
    ) -> Result<CauseArriagaResult> {
        let by_columns = normalize_by(by);
        if by_columns.iter().any(|column| column == cause_column) {
            return Err(LifeTableError::InvalidConfig(format!(
                "cause column `{}` cannot also be a grouping column",
                cause_column
            )));
        }
        initial.require_label(cause_column, "initial series")?;
        new.require_label(cause_column, "new series")?;

        let shares = cause_shares(initial, new, &by_columns, cause_column)?;

        let initial_total = aggregate_causes(initial, &by_columns, "initial series")?;
        let new_total = aggregate_causes(new, &by_columns, "new series")?;
        let by_age = self.decompose_by_age(&initial_total, &new_total, by)?;
        log::debug!(
            "combining {} cause shares with {} age totals",
            shares.len(),
            by_age.rows.len()
        );

        let totals = index_unique(
            by_age
                .rows
                .iter()
                .map(|row| (AgeKey::new(row.group.clone(), row.age), row)),
            "combine",
        )?;

        let rows = shares
            .into_iter()
            .filter_map(|(key, share)| {
                let total = totals.get(&key.age_key)?;
                Some(CauseArriagaRow {
                    group: key.age_key.group,
                    age: key.age_key.age,
                    cause: key.cause,
                    share_within_age: share,
                    direct_effect: total.direct_effect * share,
                    indirect_effect: total.indirect_effect.map(|v| v * share),
                    contribution_years: total.contribution_years.map(|v| v * share),
                    contribution_proportion: total.contribution_proportion.map(|v| v * share),
                })
            })
            .collect();

        Ok(CauseArriagaResult {
            by: by_age.by,
            cause_column: cause_column.to_string(),
            rows,
        })
    }
}

/// Share of each cause in the change of mortality at its (group, age)
fn cause_shares(
    initial: &MortalitySeries,
    new: &MortalitySeries,
    by: &[String],
    cause_column: &str,
) -> Result<Vec<(CauseKey, f64)>> {
    let keyed = |series: &MortalitySeries, context: &str| -> Result<Vec<(CauseKey, f64)>> {
        series
            .iter()
            .map(|row| Ok((cause_key(row, by, cause_column, context)?, row.mortality)))
            .collect()
    };

    let initial_rows = keyed(initial, "initial series")?;
    let new_index = index_unique(keyed(new, "new series")?, "cause")?;
    index_unique(
        initial_rows.iter().map(|(key, m)| (key.clone(), *m)),
        "cause",
    )?;

    let initial_count = initial_rows.len();
    let changes: Vec<(CauseKey, f64)> = initial_rows
        .into_iter()
        .filter_map(|(key, mortality)| {
            let mortality_new = new_index.get(&key)?;
            Some((key, mortality_new - mortality))
        })
        .collect();
    log::debug!(
        "cause join dropped {} initial and {} new rows without a counterpart",
        initial_count - changes.len(),
        new_index.len() - changes.len()
    );

    let mut denominators: HashMap<AgeKey, f64> = HashMap::new();
    for (key, change) in &changes {
        *denominators.entry(key.age_key.clone()).or_insert(0.0) += change;
    }
    for (key, total) in &denominators {
        if *total == 0.0 {
            log::warn!(
                "no net mortality change across causes at {}: cause shares undefined",
                key
            );
        }
    }

    let mut shares: Vec<(CauseKey, f64)> = changes
        .into_iter()
        .map(|(key, change)| {
            let share = ratio(change, denominators[&key.age_key]);
            (key, share)
        })
        .collect();
    shares.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(shares)
}

fn cause_key(
    row: &MortalityRow,
    by: &[String],
    cause_column: &str,
    context: &str,
) -> Result<CauseKey> {
    let cause = row
        .label(cause_column)
        .ok_or_else(|| LifeTableError::missing(cause_column, context))?;
    Ok(CauseKey {
        age_key: AgeKey::new(row.group_key(by, context)?, row.age),
        cause: cause.clone(),
    })
}

/// Collapse a cause-stratified series to all-cause mortality per (group, age)
fn aggregate_causes(
    series: &MortalitySeries,
    by: &[String],
    context: &str,
) -> Result<MortalitySeries> {
    let mut totals: BTreeMap<AgeKey, f64> = BTreeMap::new();
    for row in series.iter() {
        let key = AgeKey::new(row.group_key(by, context)?, row.age);
        *totals.entry(key).or_insert(0.0) += row.mortality;
    }

    Ok(totals
        .into_iter()
        .map(|(key, mortality)| MortalityRow {
            labels: key.group.to_labels(),
            age: key.age,
            mortality,
        })
        .collect())
}
