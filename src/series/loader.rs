//! Load mortality series from CSV in the canonical schema
//!
//! The file must have `age` and `mortality` columns. Every other column is
//! read as a label (group key, cause of death, ...).

use csv::Reader;
use std::collections::BTreeMap;
use std::path::Path;

use super::{Label, MortalityRow, MortalitySeries};
use crate::error::{LifeTableError, Result};

pub const AGE_COLUMN: &str = "age";
pub const MORTALITY_COLUMN: &str = "mortality";

/// Load a series from a CSV file
pub fn load_series<P: AsRef<Path>>(path: P) -> Result<MortalitySeries> {
    let path = path.as_ref();
    log::debug!("loading mortality series from {}", path.display());
    let reader = Reader::from_path(path)?;
    read_series(reader, &path.display().to_string())
}

/// Load a series from any reader (e.g., string buffer, stdin)
pub fn load_series_from_reader<R: std::io::Read>(reader: R) -> Result<MortalitySeries> {
    read_series(Reader::from_reader(reader), "csv input")
}

fn read_series<R: std::io::Read>(
    mut reader: Reader<R>,
    context: &str,
) -> Result<MortalitySeries> {
    let headers = reader.headers()?.clone();

    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| LifeTableError::missing(name, context))
    };
    let age_idx = position(AGE_COLUMN)?;
    let mortality_idx = position(MORTALITY_COLUMN)?;

    let label_columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != age_idx && *i != mortality_idx)
        .map(|(i, h)| (i, h.trim().to_string()))
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;

        let raw_age = &record[age_idx];
        let age: u32 = raw_age
            .trim()
            .parse()
            .map_err(|_| LifeTableError::parse(AGE_COLUMN, raw_age))?;

        let raw_mortality = &record[mortality_idx];
        let mortality: f64 = raw_mortality
            .trim()
            .parse()
            .map_err(|_| LifeTableError::parse(MORTALITY_COLUMN, raw_mortality))?;

        let labels: BTreeMap<String, Label> = label_columns
            .iter()
            .map(|(i, name)| (name.clone(), Label::parse(&record[*i])))
            .collect();

        rows.push(MortalityRow { labels, age, mortality });
    }

    log::debug!("read {} rows from {}", rows.len(), context);
    Ok(MortalitySeries::from_rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_series_with_labels() {
        let data = "year,sex,age,mortality\n2000,Male,0,0.01\n2000,Male,1,1.0\n";
        let series = load_series_from_reader(data.as_bytes()).unwrap();

        assert_eq!(series.len(), 2);
        let first = &series.rows()[0];
        assert_eq!(first.age, 0);
        assert!((first.mortality - 0.01).abs() < 1e-12);
        assert_eq!(first.label("year"), Some(&Label::Int(2000)));
        assert_eq!(first.label("sex"), Some(&Label::from("Male")));
    }

    #[test]
    fn test_leading_zero_codes_stay_distinct() {
        let data = "cause,age,mortality\n007,0,0.01\n7,0,0.02\n";
        let series = load_series_from_reader(data.as_bytes()).unwrap();
        assert_eq!(series.rows()[0].label("cause"), Some(&Label::from("007")));
        assert_eq!(series.rows()[1].label("cause"), Some(&Label::Int(7)));

        let table = crate::LifeTableBuilder::default().build(&series, &["cause"]).unwrap();
        assert_eq!(table.groups().count(), 2);

        let mut buffer = Vec::new();
        crate::output::write_series(&series, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "cause,age,mortality\n007,0,0.01\n7,0,0.02\n");
        assert_eq!(load_series_from_reader(text.as_bytes()).unwrap(), series);
    }

    #[test]
    fn test_missing_mortality_column() {
        let data = "age,rate\n0,0.01\n";
        let err = load_series_from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, LifeTableError::Schema { ref column, .. } if column == "mortality"));
    }

    #[test]
    fn test_bad_age_is_parse_error() {
        let data = "age,mortality\nzero,0.01\n";
        let err = load_series_from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, LifeTableError::Parse { ref field, .. } if field == "age"));
    }
}
