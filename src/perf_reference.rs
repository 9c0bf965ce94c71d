//! Minimum expected CPU performance per processor model
//!
//! The consistent machines of a CPU benchmark are compared with the minimum
//! per-machine total recorded for their processor model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference numbers for one processor model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuReference {
    /// Exact `(cpu, physical_N, product, <model>)` value
    pub model: String,
    /// Minimum summed bogomips per machine
    #[serde(default)]
    pub bogomips: Option<f32>,
    /// Minimum summed loops_per_sec per machine
    #[serde(default)]
    pub loops_per_sec: Option<f32>,
}

/// Outcome of comparing a bin average with the reference table
#[derive(Debug, Clone, PartialEq)]
pub enum PerfStatus {
    Ok,
    Fail { minimum: f32 },
    NoEntry { model: String },
}

impl fmt::Display for PerfStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PerfStatus::Ok => write!(f, "PERF OK"),
            PerfStatus::Fail { minimum } => {
                write!(f, "PERF FAIL as min perf should have been : {}", minimum)
            }
            PerfStatus::NoEntry { model } => write!(f, "NO PERF ENTRY IN DB for {}", model),
        }
    }
}

/// Reference table lookup
#[derive(Debug, Clone, Copy)]
pub struct PerfReference<'a> {
    entries: &'a [CpuReference],
}

impl<'a> PerfReference<'a> {
    pub fn new(entries: &'a [CpuReference]) -> Self {
        Self { entries }
    }

    /// Minimum for a benchmark mode and model; `None` without an entry
    pub fn minimum(&self, mode: &str, model: &str) -> Option<f32> {
        let entry = self.entries.iter().find(|entry| entry.model == model)?;
        match mode {
            "bogomips" => entry.bogomips,
            "loops_per_sec" => entry.loops_per_sec,
            _ => None,
        }
    }

    /// Compare the average of the consistent bin with the model's minimum
    pub fn status(&self, mode: &str, model: &str, average: f32) -> PerfStatus {
        match self.minimum(mode, model) {
            None => PerfStatus::NoEntry {
                model: model.to_string(),
            },
            Some(minimum) if average >= minimum => PerfStatus::Ok,
            Some(minimum) => PerfStatus::Fail { minimum },
        }
    }
}
