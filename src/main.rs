//! Lifetables CLI
//!
//! Builds life tables and Arriaga decompositions from CSV series and writes
//! the results as CSV to stdout.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;

use lifetables::hmd::{load_hmd_life_table, DEFAULT_HMD_PATH};
use lifetables::output::{write_arriaga, write_cause_arriaga, write_life_table, write_series};
use lifetables::series::load_series;
use lifetables::{ArriagaDecomposer, LifeTableBuilder, LifeTableConfig, Sex};

#[derive(Debug, Parser)]
#[command(name = "lifetables", version, about = "Life tables and Arriaga decomposition")]
struct Cli {
    /// JSON file with life table settings (radix, separation factors, strict)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build a life table from a series with `age` and `mortality` columns
    LifeTable {
        series: PathBuf,

        /// Grouping column (repeatable)
        #[arg(long)]
        by: Vec<String>,

        /// Override the configured radix
        #[arg(long)]
        radix: Option<f64>,
    },

    /// Decompose the life-expectancy gap between two series
    Arriaga {
        initial: PathBuf,
        new: PathBuf,

        /// Grouping column (repeatable)
        #[arg(long)]
        by: Vec<String>,

        /// Cause-of-death column; decomposes by age and cause when given
        #[arg(long)]
        cause: Option<String>,
    },

    /// Print an HMD life table as a canonical mortality series
    Hmd {
        #[arg(default_value = DEFAULT_HMD_PATH)]
        dir: PathBuf,

        /// Male, Female or Pooled; all three when omitted
        #[arg(long)]
        sex: Option<Sex>,

        /// Rate column used as mortality
        #[arg(long, default_value = "q")]
        column: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => LifeTableConfig::from_json_path(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => LifeTableConfig::default(),
    };

    let stdout = io::stdout().lock();
    match cli.command {
        Command::LifeTable { series, by, radix } => {
            if let Some(radix) = radix {
                config.radix = radix;
            }
            let series = load_series(&series)
                .with_context(|| format!("reading {}", series.display()))?;
            let by: Vec<&str> = by.iter().map(String::as_str).collect();
            let table = LifeTableBuilder::new(config).build(&series, &by)?;
            log::info!("built life table with {} rows", table.len());
            write_life_table(&table, stdout)?;
        }
        Command::Arriaga { initial, new, by, cause } => {
            let initial_series = load_series(&initial)
                .with_context(|| format!("reading {}", initial.display()))?;
            let new_series = load_series(&new)
                .with_context(|| format!("reading {}", new.display()))?;
            let by: Vec<&str> = by.iter().map(String::as_str).collect();
            let decomposer = ArriagaDecomposer::new(config);

            match cause {
                Some(cause) => {
                    let result = decomposer
                        .decompose_by_age_and_cause(&initial_series, &new_series, &by, &cause)?;
                    write_cause_arriaga(&result, stdout)?;
                }
                None => {
                    let result = decomposer.decompose_by_age(&initial_series, &new_series, &by)?;
                    for (key, gap) in result.gaps() {
                        log::info!("gap for group {}: {:.6} years", key, gap);
                    }
                    write_arriaga(&result, stdout)?;
                }
            }
        }
        Command::Hmd { dir, sex, column } => {
            let table = load_hmd_life_table(&dir, sex)
                .with_context(|| format!("loading HMD tables from {}", dir.display()))?;
            let series = table.to_mortality_series(&column)?;
            log::info!("read {} HMD rows", series.len());
            write_series(&series, stdout)?;
        }
    }

    Ok(())
}
