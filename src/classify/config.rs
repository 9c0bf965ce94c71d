// Tolerance bands per metric domain
//
// tolerance_min: deviance (in %) under which the spread is too small to look
//                for outliers
// tolerance_max: deviance (in %) over which the group is too noisy to judge
//                individual machines

use crate::error::FleetError;
use serde::{Deserialize, Serialize};

/// `(tolerance_min, tolerance_max)` pair, both in percent of the group mean
///
/// # Example
/// ```
/// use fleetcheck::classify::ToleranceBand;
///
/// let band = ToleranceBand::new(2.0, 15.0);
/// assert!(band.validate("network").is_ok());
/// assert!(ToleranceBand::new(10.0, 5.0).validate("inverted").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceBand {
    pub min: f32,
    pub max: f32,
}

impl ToleranceBand {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Validate a band; `name` identifies it in the error
    pub fn validate(&self, name: &str) -> Result<(), FleetError> {
        let invalid = |reason: String| FleetError::InvalidTolerance {
            name: name.to_string(),
            reason,
        };

        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(invalid(format!(
                "bounds must be finite, got min={} max={}",
                self.min, self.max
            )));
        }
        if self.min < 0.0 {
            return Err(invalid(format!("min must be non-negative, got {}", self.min)));
        }
        if self.min > self.max {
            return Err(invalid(format!(
                "min ({}) must not exceed max ({})",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Tolerance bands for every benchmark domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerances {
    /// bogomips and loops_per_sec, per logical CPU
    pub cpu: ToleranceBand,

    /// Machine-wide loops_per_sec vs. scaled per-core sum
    ///
    /// Efficiency should cluster tightly, hence the narrow band.
    pub cpu_efficiency: ToleranceBand,

    /// Per-core memory bandwidth for one block size
    pub memory: ToleranceBand,

    /// Threaded/forked bandwidth vs. summed per-core bandwidth
    pub memory_efficiency: ToleranceBand,

    /// Sequential disk I/O modes
    pub disk_sequential: ToleranceBand,

    /// Random disk I/O modes
    ///
    /// The access pattern cannot be guaranteed identical between runs,
    /// so the band is wider.
    pub disk_random: ToleranceBand,

    /// Network bandwidth and request rate
    pub network: ToleranceBand,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            cpu: ToleranceBand::new(2.0, 7.0),
            cpu_efficiency: ToleranceBand::new(1.0, 2.0),
            memory: ToleranceBand::new(1.0, 7.0),
            memory_efficiency: ToleranceBand::new(2.0, 10.0),
            disk_sequential: ToleranceBand::new(2.0, 10.0),
            disk_random: ToleranceBand::new(5.0, 15.0),
            network: ToleranceBand::new(2.0, 15.0),
        }
    }
}

impl Tolerances {
    /// Band for a disk benchmark mode (random modes contain "rand")
    pub fn disk(&self, mode: &str) -> ToleranceBand {
        if mode.contains("rand") {
            self.disk_random
        } else {
            self.disk_sequential
        }
    }

    /// Validate every band
    pub fn validate(&self) -> Result<(), FleetError> {
        self.cpu.validate("cpu")?;
        self.cpu_efficiency.validate("cpu_efficiency")?;
        self.memory.validate("memory")?;
        self.memory_efficiency.validate("memory_efficiency")?;
        self.disk_sequential.validate("disk_sequential")?;
        self.disk_random.validate("disk_random")?;
        self.network.validate("network")?;
        Ok(())
    }
}
