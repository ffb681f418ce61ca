//! Mortality series data structures in the canonical (labels, age, mortality) form

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{LifeTableError, Result};

/// A categorical column value used for grouping (year, sex, country, cause)
///
/// Integers order numerically and before any text value, so a `year` column
/// read from a file sorts as years rather than strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Int(i64),
    Text(String),
}

impl Label {
    /// Parse a raw cell, preferring an integer reading
    ///
    /// Only cells that print back unchanged become integers; "007" and "+7"
    /// stay text so distinct codes never collapse into one key.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<i64>() {
            Ok(value) if value.to_string() == trimmed => Label::Int(value),
            _ => Label::Text(trimmed.to_string()),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Int(value) => write!(f, "{}", value),
            Label::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for Label {
    fn from(value: i64) -> Self {
        Label::Int(value)
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Label::Text(value.to_string())
    }
}

impl From<String> for Label {
    fn from(value: String) -> Self {
        Label::Text(value)
    }
}

/// Identifies one stratum: the values of the `by` columns, sorted by column name
///
/// An empty key is the implicit single group used when `by` is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey(Vec<(String, Label)>);

impl GroupKey {
    pub fn new(mut parts: Vec<(String, Label)>) -> Self {
        parts.sort_by(|a, b| a.0.cmp(&b.0));
        Self(parts)
    }

    pub fn get(&self, column: &str) -> Option<&Label> {
        self.0
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, label)| label)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Labels of this key as a column map
    pub fn to_labels(&self) -> BTreeMap<String, Label> {
        self.0.iter().cloned().collect()
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, label)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", name, label)?;
        }
        f.write_str("}")
    }
}

/// Normalize a `by` list to set semantics: sorted, without repeats
pub fn normalize_by(by: &[&str]) -> Vec<String> {
    let mut columns: Vec<String> = by.iter().map(|c| c.to_string()).collect();
    columns.sort();
    columns.dedup();
    columns
}

/// One input row: categorical labels plus the age bin and its death probability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortalityRow {
    /// Categorical columns (group keys, cause of death, anything carried along)
    pub labels: BTreeMap<String, Label>,

    /// Start of the age bin
    pub age: u32,

    /// Probability of death within the bin
    pub mortality: f64,
}

impl MortalityRow {
    pub fn new(age: u32, mortality: f64) -> Self {
        Self {
            labels: BTreeMap::new(),
            age,
            mortality,
        }
    }

    /// Attach a label column
    pub fn with_label(mut self, column: &str, value: impl Into<Label>) -> Self {
        self.labels.insert(column.to_string(), value.into());
        self
    }

    pub fn label(&self, column: &str) -> Option<&Label> {
        self.labels.get(column)
    }

    /// Group key for the given (normalized) `by` columns
    pub fn group_key(&self, by: &[String], context: &str) -> Result<GroupKey> {
        let mut parts = Vec::with_capacity(by.len());
        for column in by {
            let label = self
                .labels
                .get(column)
                .ok_or_else(|| LifeTableError::missing(column.as_str(), context))?;
            parts.push((column.clone(), label.clone()));
        }
        Ok(GroupKey::new(parts))
    }
}

/// An age-specific mortality series, possibly spanning several groups
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MortalitySeries {
    rows: Vec<MortalityRow>,
}

impl MortalitySeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<MortalityRow>) -> Self {
        Self { rows }
    }

    /// Single unlabeled group with ages 0, 1, 2, ...
    pub fn from_rates(rates: &[f64]) -> Self {
        let rows = rates
            .iter()
            .enumerate()
            .map(|(age, &q)| MortalityRow::new(age as u32, q))
            .collect();
        Self { rows }
    }

    pub fn push(&mut self, row: MortalityRow) {
        self.rows.push(row);
    }

    /// Set a label column on every row
    pub fn with_label(mut self, column: &str, value: impl Into<Label>) -> Self {
        let value = value.into();
        for row in &mut self.rows {
            row.labels.insert(column.to_string(), value.clone());
        }
        self
    }

    /// Append the rows of another series
    pub fn concat(mut self, other: MortalitySeries) -> Self {
        self.rows.extend(other.rows);
        self
    }

    pub fn rows(&self) -> &[MortalityRow] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &MortalityRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Check that every row carries `column`
    pub fn require_label(&self, column: &str, context: &str) -> Result<()> {
        match self.rows.iter().find(|row| !row.labels.contains_key(column)) {
            Some(_) => Err(LifeTableError::missing(column, context)),
            None => Ok(()),
        }
    }

    /// Partition rows by group key, each group sorted by ascending age
    ///
    /// Groups come back ordered by key. The age sort is stable, so duplicate
    /// ages keep their input order.
    pub fn partition(
        &self,
        by: &[String],
        context: &str,
    ) -> Result<Vec<(GroupKey, Vec<&MortalityRow>)>> {
        let mut groups: BTreeMap<GroupKey, Vec<&MortalityRow>> = BTreeMap::new();
        for row in &self.rows {
            let key = row.group_key(by, context)?;
            groups.entry(key).or_default().push(row);
        }

        Ok(groups
            .into_iter()
            .map(|(key, mut rows)| {
                rows.sort_by_key(|row| row.age);
                (key, rows)
            })
            .collect())
    }
}

impl FromIterator<MortalityRow> for MortalitySeries {
    fn from_iter<I: IntoIterator<Item = MortalityRow>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parse_prefers_integers() {
        assert_eq!(Label::parse("2019"), Label::Int(2019));
        assert_eq!(Label::parse(" Female "), Label::Text("Female".to_string()));
        assert!(Label::Int(9999) < Label::Text("0".to_string()));
        assert!(Label::parse("99") < Label::parse("100"));
    }

    #[test]
    fn test_label_parse_keeps_leading_zero_codes() {
        assert_eq!(Label::parse("007"), Label::Text("007".to_string()));
        assert_eq!(Label::parse("+7"), Label::Text("+7".to_string()));
        assert_eq!(Label::parse("-0"), Label::Text("-0".to_string()));
        assert_eq!(Label::parse("-12"), Label::Int(-12));
        assert_ne!(Label::parse("007"), Label::parse("7"));
    }

    #[test]
    fn test_group_key_is_order_independent() {
        let a = GroupKey::new(vec![
            ("year".into(), Label::Int(2000)),
            ("sex".into(), "Male".into()),
        ]);
        let b = GroupKey::new(vec![
            ("sex".into(), "Male".into()),
            ("year".into(), Label::Int(2000)),
        ]);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "{sex=Male, year=2000}");
        assert_eq!(GroupKey::default().to_string(), "{}");
    }

    #[test]
    fn test_normalize_by_dedups() {
        assert_eq!(normalize_by(&["year", "sex", "year"]), vec!["sex", "year"]);
    }

    #[test]
    fn test_partition_sorts_ages_within_groups() {
        let series = MortalitySeries::from_rows(vec![
            MortalityRow::new(1, 0.2).with_label("sex", "Male"),
            MortalityRow::new(0, 0.1).with_label("sex", "Male"),
            MortalityRow::new(0, 0.3).with_label("sex", "Female"),
        ]);

        let by = normalize_by(&["sex"]);
        let groups = series.partition(&by, "series").unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0.get("sex"), Some(&Label::from("Female")));
        let male_ages: Vec<u32> = groups[1].1.iter().map(|r| r.age).collect();
        assert_eq!(male_ages, vec![0, 1]);
    }

    #[test]
    fn test_partition_without_by_is_single_group() {
        let series = MortalitySeries::from_rates(&[0.1, 0.2, 1.0]);
        let groups = series.partition(&[], "series").unwrap();
        assert_eq!(groups.len(), 1);
        assert!(groups[0].0.is_empty());
        assert_eq!(groups[0].1.len(), 3);
    }

    #[test]
    fn test_partition_missing_by_column() {
        let series = MortalitySeries::from_rates(&[0.1, 1.0]);
        let err = series
            .partition(&normalize_by(&["country"]), "initial series")
            .unwrap_err();
        assert!(matches!(err, LifeTableError::Schema { ref column, .. } if column == "country"));
    }
}
