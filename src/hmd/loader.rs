//! Parser for HMD `?ltper_1x1.txt` files
//!
//! Layout: a title line, a note or blank line, a whitespace-separated header
//! (`Year Age mx qx ax lx dx Lx Tx ex`), then one row per year and age.
//! Ages like `110+` keep only their digits.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::{HmdRecord, HmdTable, Sex};
use crate::error::{LifeTableError, Result};

/// Default location of the HMD text files
pub const DEFAULT_HMD_PATH: &str = "data/hmd";

const HEADER_LINE: usize = 2;

/// Load the table for one sex, or all three (Male, Female, Pooled) when `sex` is `None`
pub fn load_hmd_life_table(dir: &Path, sex: Option<Sex>) -> Result<HmdTable> {
    let Some(sex) = sex else {
        let mut table = HmdTable::default();
        for sex in Sex::ALL {
            table = table.concat(load_hmd_life_table(dir, Some(sex))?);
        }
        return Ok(table);
    };

    let path = dir.join(sex.file_name());
    log::debug!("loading HMD life table from {}", path.display());
    let text = fs::read_to_string(&path)?;
    parse_hmd_table(&text, sex)
}

/// Parse the text of one HMD file
pub fn parse_hmd_table(text: &str, sex: Sex) -> Result<HmdTable> {
    let mut lines = text.lines().skip(HEADER_LINE);
    let header: Vec<&str> = lines
        .next()
        .map(|line| line.split_whitespace().collect())
        .unwrap_or_default();

    let column = |name: &str| {
        header
            .iter()
            .position(|h| *h == name)
            .ok_or_else(|| LifeTableError::missing(name, "HMD header"))
    };
    let year_idx = column("Year")?;
    let age_idx = column("Age")?;

    let rate_columns: Vec<(usize, String)> = header
        .iter()
        .enumerate()
        .filter(|(_, name)| name.ends_with('x'))
        .map(|(i, name)| (i, name.trim_matches('x').to_string()))
        .collect();

    let mut records = Vec::new();
    for line in lines {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() != header.len() {
            return Err(LifeTableError::parse("HMD row", line));
        }

        let year = leading_integer(fields[year_idx])
            .ok_or_else(|| LifeTableError::parse("Year", fields[year_idx]))?;
        let age = leading_integer(fields[age_idx])
            .and_then(|age| u32::try_from(age).ok())
            .ok_or_else(|| LifeTableError::parse("Age", fields[age_idx]))?;

        let mut rates = BTreeMap::new();
        for (i, name) in &rate_columns {
            let value: f64 = fields[*i]
                .parse()
                .map_err(|_| LifeTableError::parse(name.as_str(), fields[*i]))?;
            rates.insert(name.clone(), value);
        }

        records.push(HmdRecord { year, age, sex, rates });
    }

    log::debug!("parsed {} {} records", records.len(), sex);
    Ok(HmdTable { records })
}

/// First run of digits in a field (`"110+"` -> 110)
fn leading_integer(field: &str) -> Option<i64> {
    let digits: String = field
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Label;
    use crate::{ArriagaDecomposer, LifeTableBuilder};

    const SAMPLE: &str = "\
Sample, Life tables (period 1x1), Males	Last modified: 01 Jan 2024

   Year          Age             mx       qx    ax      lx      dx      Lx       Tx     ex
   2000           0        0.00700  0.00695  0.14  100000     695   99402   220000   2.20
   2000           1        0.00050  0.00050  0.50   99305      50   99280   120598   1.21
   2000         2+         0.60000  1.00000  0.50   99255   99255   21318    21318   0.21
   2001           0        0.00650  0.00646  0.14  100000     646   99444   221000   2.21
   2001           1        0.00045  0.00045  0.50   99354      45   99332   121556   1.22
   2001         2+         0.60000  1.00000  0.50   99309   99309   22224    22224   0.22

";

    #[test]
    fn test_parse_sample() {
        let table = parse_hmd_table(SAMPLE, Sex::Male).unwrap();
        assert_eq!(table.len(), 6);

        let last = &table.records[2];
        assert_eq!(last.year, 2000);
        assert_eq!(last.age, 2);
        assert_eq!(last.sex, Sex::Male);

        let names: Vec<&str> = last.rates.keys().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["L", "T", "a", "d", "e", "l", "m", "q"]);
        assert_eq!(table.records[0].rates["q"], 0.00695);
    }

    #[test]
    fn test_leading_integer() {
        assert_eq!(leading_integer("110+"), Some(110));
        assert_eq!(leading_integer("2000"), Some(2000));
        assert_eq!(leading_integer("+"), None);
    }

    #[test]
    fn test_missing_header_column() {
        let text = "title\n\nYear mx qx\n2000 0.1 0.1\n";
        let err = parse_hmd_table(text, Sex::Female).unwrap_err();
        assert!(matches!(err, LifeTableError::Schema { ref column, .. } if column == "Age"));
    }

    #[test]
    fn test_ragged_row() {
        let text = "title\n\nYear Age qx\n2000 0\n";
        assert!(matches!(
            parse_hmd_table(text, Sex::Female),
            Err(LifeTableError::Parse { .. })
        ));
    }

    #[test]
    fn test_series_feeds_life_table_by_year() {
        let series = parse_hmd_table(SAMPLE, Sex::Male)
            .unwrap()
            .to_mortality_series("q")
            .unwrap();
        assert_eq!(series.rows()[0].label("year"), Some(&Label::Int(2000)));
        assert_eq!(series.rows()[0].label("sex"), Some(&Label::from("Male")));

        let table = LifeTableBuilder::default().build(&series, &["year", "sex"]).unwrap();
        assert_eq!(table.groups().count(), 2);

        // Compare the two years as two regimes
        let years = |year: i64| -> crate::MortalitySeries {
            series
                .iter()
                .filter(|row| row.label("year") == Some(&Label::Int(year)))
                .map(|row| {
                    let mut row = row.clone();
                    row.labels.remove("year");
                    row
                })
                .collect()
        };
        let result = ArriagaDecomposer::default()
            .decompose_by_age(&years(2000), &years(2001), &["sex"])
            .unwrap();
        assert_eq!(result.gaps().len(), 1);
        assert!(result.gaps()[0].1 > 0.0);
    }

    #[test]
    fn test_load_missing_directory() {
        let err = load_hmd_life_table(Path::new("does/not/exist"), Some(Sex::Male)).unwrap_err();
        assert!(matches!(err, LifeTableError::Io(_)));
    }
}
