//! CLI argument parsing for fleetcheck

use crate::report::{DetailFilter, Verbosity};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fleetcheck")]
#[command(version)]
#[command(
    about = "Find configuration and performance outliers across a fleet of identical servers",
    long_about = None
)]
pub struct Cli {
    /// Directory holding one JSON fact file per machine
    #[arg(value_name = "DIR")]
    pub input_dir: PathBuf,

    /// System fact key identifying a machine (falls back to the file name)
    #[arg(short = 'u', long = "unique-id", value_name = "KEY", default_value = "serial")]
    pub unique_id: String,

    /// Report levels to print: INFO, WARNING, ERROR, SUMMARY, DETAIL or ALL,
    /// separated by ',' or '|'
    #[arg(
        short = 'l',
        long = "log-level",
        value_name = "LEVELS",
        default_value = "WARNING,ERROR,SUMMARY"
    )]
    pub log_level: Verbosity,

    /// Group number (or regex) to print raw values for (requires DETAIL)
    #[arg(short = 'g', long = "group", value_name = "GROUP", default_value = "")]
    pub group: String,

    /// Benchmark category (or regex) to print raw values for
    #[arg(short = 'c', long = "category", value_name = "CATEGORY", default_value = "")]
    pub category: String,

    /// Item (or regex) to print raw values for, e.g. logical_0 or sdb
    #[arg(short = 'i', long = "item", value_name = "ITEM", default_value = "")]
    pub item: String,

    /// Load level of this run; with --plot-dir, appends gnuplot samples at this x
    #[arg(short = 'r', long = "rampup", value_name = "VALUE", default_value = "0")]
    pub rampup: f64,

    /// Directory receiving deviance/mean/sum .plot files
    #[arg(short = 'p', long = "plot-dir", value_name = "DIR")]
    pub plot_dir: Option<PathBuf>,

    /// TOML file with tolerance bands and the CPU reference table
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug tracing on stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    pub fn detail_filter(&self) -> DetailFilter {
        DetailFilter::new(&self.group, &self.category, &self.item)
    }

    /// Plot directory, only when a positive ramp-up value is set
    pub fn rampup_target(&self) -> Option<(f64, &PathBuf)> {
        match &self.plot_dir {
            Some(dir) if self.rampup > 0.0 => Some((self.rampup, dir)),
            _ => None,
        }
    }
}
