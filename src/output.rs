//! CSV output for life tables and decomposition results
//!
//! Column names mirror the in-memory schema. Undefined (`None`) cells are
//! written empty; NaN cells are written as `NaN`.

use csv::Writer;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

use crate::arriaga::{ArriagaResult, CauseArriagaResult};
use crate::error::Result;
use crate::life_table::LifeTable;
use crate::series::{GroupKey, Label, MortalitySeries};

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn label_cells(labels: &BTreeMap<String, Label>, columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .map(|c| labels.get(c).map(|l| l.to_string()).unwrap_or_default())
        .collect()
}

fn key_cells(key: &GroupKey, columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .map(|c| key.get(c).map(|l| l.to_string()).unwrap_or_default())
        .collect()
}

fn label_columns<'a>(labels: impl Iterator<Item = &'a BTreeMap<String, Label>>) -> Vec<String> {
    labels
        .flat_map(|labels| labels.keys().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Write a series in the canonical schema: label columns, then `age, mortality`
pub fn write_series<W: Write>(series: &MortalitySeries, writer: W) -> Result<()> {
    let columns = label_columns(series.iter().map(|row| &row.labels));

    let mut out = Writer::from_writer(writer);
    let mut header = columns.clone();
    header.extend(["age", "mortality"].map(String::from));
    out.write_record(&header)?;

    for row in series.iter() {
        let mut record = label_cells(&row.labels, &columns);
        record.extend([row.age.to_string(), row.mortality.to_string()]);
        out.write_record(&record)?;
    }
    out.flush()?;
    Ok(())
}

/// Write a life table with every label column followed by `age, mortality, q, l, d, L, T, e`
pub fn write_life_table<W: Write>(table: &LifeTable, writer: W) -> Result<()> {
    let columns = label_columns(table.rows().map(|row| &row.labels));

    let mut out = Writer::from_writer(writer);
    let mut header = columns.clone();
    header.extend(["age", "mortality", "q", "l", "d", "L", "T", "e"].map(String::from));
    out.write_record(&header)?;

    for row in table.rows() {
        let mut record = label_cells(&row.labels, &columns);
        record.extend([
            row.age.to_string(),
            row.mortality.to_string(),
            row.death_probability.to_string(),
            row.survivors.to_string(),
            row.deaths.to_string(),
            row.person_years.to_string(),
            row.person_years_remaining.to_string(),
            row.life_expectancy.to_string(),
        ]);
        out.write_record(&record)?;
    }
    out.flush()?;
    Ok(())
}

/// Write an age-level decomposition: `by` columns, age, then the four effect columns
pub fn write_arriaga<W: Write>(result: &ArriagaResult, writer: W) -> Result<()> {
    let mut out = Writer::from_writer(writer);
    let mut header = result.by.clone();
    header.extend(
        [
            "age",
            "direct_effect",
            "indirect_effect",
            "contribution_years",
            "contribution_proportion",
        ]
        .map(String::from),
    );
    out.write_record(&header)?;

    for row in &result.rows {
        let mut record = key_cells(&row.group, &result.by);
        record.extend([
            row.age.to_string(),
            row.direct_effect.to_string(),
            optional(row.indirect_effect),
            optional(row.contribution_years),
            optional(row.contribution_proportion),
        ]);
        out.write_record(&record)?;
    }
    out.flush()?;
    Ok(())
}

/// Write a cause-level decomposition, with the cause column and its share after age
pub fn write_cause_arriaga<W: Write>(result: &CauseArriagaResult, writer: W) -> Result<()> {
    let mut out = Writer::from_writer(writer);
    let mut header = result.by.clone();
    header.push("age".to_string());
    header.push(result.cause_column.clone());
    header.extend(
        [
            "share_within_age",
            "direct_effect",
            "indirect_effect",
            "contribution_years",
            "contribution_proportion",
        ]
        .map(String::from),
    );
    out.write_record(&header)?;

    for row in &result.rows {
        let mut record = key_cells(&row.group, &result.by);
        record.extend([
            row.age.to_string(),
            row.cause.to_string(),
            row.share_within_age.to_string(),
            row.direct_effect.to_string(),
            optional(row.indirect_effect),
            optional(row.contribution_years),
            optional(row.contribution_proportion),
        ]);
        out.write_record(&record)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ArriagaDecomposer, LifeTableBuilder, MortalitySeries};

    #[test]
    fn test_write_life_table() {
        let series = MortalitySeries::from_rates(&[0.01, 0.5]).with_label("sex", "Male");
        let table = LifeTableBuilder::default().build(&series, &["sex"]).unwrap();

        let mut buffer = Vec::new();
        write_life_table(&table, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "sex,age,mortality,q,l,d,L,T,e");
        assert!(lines[1].starts_with("Male,0,0.01,0.01,1,0.01,"));
        assert!(lines[2].starts_with("Male,1,0.5,1,"));
    }

    #[test]
    fn test_write_series_reads_back() {
        let series = MortalitySeries::from_rates(&[0.01, 0.02, 1.0])
            .with_label("year", 2000_i64)
            .with_label("sex", "Female");

        let mut buffer = Vec::new();
        write_series(&series, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("sex,year,age,mortality\nFemale,2000,0,0.01\n"));

        let read_back = crate::series::load_series_from_reader(text.as_bytes()).unwrap();
        assert_eq!(read_back, series);
    }

    #[test]
    fn test_write_arriaga_leaves_undefined_empty() {
        let initial = MortalitySeries::from_rates(&[0.01, 1.0]);
        let new = MortalitySeries::from_rates(&[0.005, 1.0]);
        let result = ArriagaDecomposer::default().decompose_by_age(&initial, &new, &[]).unwrap();

        let mut buffer = Vec::new();
        write_arriaga(&result, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "age,direct_effect,indirect_effect,contribution_years,contribution_proportion"
        );
        assert!(lines[1].ends_with(",1"));
        assert!(lines[2].starts_with("1,"));
        assert!(lines[2].ends_with(",,,"));
    }
}
