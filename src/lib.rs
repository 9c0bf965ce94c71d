//! fleetcheck - configuration and performance outlier detection for server fleets
//!
//! Machines of a fleet that are supposed to be identical are partitioned into
//! groups of identical hardware, then each group's benchmark results are
//! classified as consistent, curious (outside mean ± 2σ) or unstable (the
//! group's spread exceeds its tolerance).
//!
//! ```no_run
//! use fleetcheck::checks::Analysis;
//! use fleetcheck::config::AnalysisConfig;
//! use fleetcheck::facts::FactSet;
//! use fleetcheck::report::{Reporter, Verbosity};
//!
//! let facts = FactSet::load_dir("facts/", "serial")?;
//! let config = AnalysisConfig::default();
//! let reporter = Reporter::stdout(Verbosity::default());
//! let outcome = Analysis::new(&config, &reporter).run(&facts)?;
//! println!("{} system groups", outcome.performance.len());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod checks;
pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod facts;
pub mod grouping;
pub mod perf_reference;
pub mod report;
pub mod selector;
pub mod series;

pub use error::FleetError;
