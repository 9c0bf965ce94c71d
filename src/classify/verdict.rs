// Per-label classification and bin merging
//
// classify() is a pure function of one label's samples; classify_series()
// maps it over every label of a mode and merges the results into Bins, where
// each machine holds exactly one classification.

use crate::classify::config::ToleranceBand;
use crate::classify::statistics::GroupStatistics;
use crate::facts::MachineId;
use crate::series::{labels_of, SeriesTable};
use std::collections::BTreeMap;
use std::fmt;

/// Classification bin of a machine
///
/// Declaration order is merge precedence: a machine found curious on any
/// label stays curious, an unstable label outranks a consistent one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Classification {
    Consistent,
    Unstable,
    Curious,
}

impl Classification {
    /// Report order
    pub const ALL: [Classification; 3] = [
        Classification::Consistent,
        Classification::Curious,
        Classification::Unstable,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Classification::Consistent => "consistent",
            Classification::Curious => "curious",
            Classification::Unstable => "unstable",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Side of the allowed band a curious machine falls on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Over,
    Under,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outlier {
    pub machine: MachineId,
    pub value: f32,
    pub direction: Direction,
}

/// Verdict on the group as a whole for one label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOutcome {
    Consistent,
    /// At least one machine is outside mean ± 2σ
    Suspicious,
    /// Deviance above tolerance_max
    Unstable,
    /// Deviance cannot be computed (zero mean, non-zero spread)
    Undefined,
}

/// Samples of one label, one per machine holding it
pub type LabelSamples = BTreeMap<MachineId, f32>;

/// Classification of every machine for one label
#[derive(Debug, Clone, PartialEq)]
pub struct LabelVerdict {
    pub label: String,
    pub stats: GroupStatistics,
    pub band: ToleranceBand,
    pub outcome: GroupOutcome,
    pub classes: BTreeMap<MachineId, Classification>,
    pub outliers: Vec<Outlier>,
}

/// Classify the machines of one label against their group statistics
///
/// Statistics are computed once and used for every machine. Returns `None`
/// when no machine holds the label.
pub fn classify(label: &str, samples: &LabelSamples, band: ToleranceBand) -> Option<LabelVerdict> {
    let values: Vec<f32> = samples.values().copied().collect();
    let stats = GroupStatistics::from_samples(&values)?;

    let mut classes = BTreeMap::new();
    let mut outliers = Vec::new();

    let outcome = if stats.deviance.exceeds(band.max) {
        for machine in samples.keys() {
            classes.insert(machine.clone(), Classification::Unstable);
        }
        if stats.deviance.percent().is_some() {
            GroupOutcome::Unstable
        } else {
            GroupOutcome::Undefined
        }
    } else if stats.deviance.exceeds(band.min) {
        let (low, high) = stats.allowed_range();
        for (machine, &value) in samples {
            let direction = if value > high {
                Some(Direction::Over)
            } else if value < low {
                Some(Direction::Under)
            } else {
                None
            };

            match direction {
                Some(direction) => {
                    classes.insert(machine.clone(), Classification::Curious);
                    outliers.push(Outlier {
                        machine: machine.clone(),
                        value,
                        direction,
                    });
                }
                None => {
                    classes.insert(machine.clone(), Classification::Consistent);
                }
            }
        }
        if outliers.is_empty() {
            GroupOutcome::Consistent
        } else {
            GroupOutcome::Suspicious
        }
    } else {
        for machine in samples.keys() {
            classes.insert(machine.clone(), Classification::Consistent);
        }
        GroupOutcome::Consistent
    };

    Some(LabelVerdict {
        label: label.to_string(),
        stats,
        band,
        outcome,
        classes,
        outliers,
    })
}

/// Machines of one mode, each in exactly one bin
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bins {
    placements: BTreeMap<MachineId, Classification>,
}

impl Bins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a machine, keeping the higher-precedence classification
    pub fn place(&mut self, machine: &MachineId, class: Classification) {
        let slot = self.placements.entry(machine.clone()).or_insert(class);
        if class > *slot {
            *slot = class;
        }
    }

    /// Merge every machine of a label verdict
    pub fn absorb(&mut self, verdict: &LabelVerdict) {
        for (machine, class) in &verdict.classes {
            self.place(machine, *class);
        }
    }

    pub fn from_verdicts<'a>(verdicts: impl IntoIterator<Item = &'a LabelVerdict>) -> Self {
        let mut bins = Self::new();
        for verdict in verdicts {
            bins.absorb(verdict);
        }
        bins
    }

    /// Members of one bin, in machine order
    pub fn members(&self, class: Classification) -> Vec<&MachineId> {
        self.placements
            .iter()
            .filter(|(_, placed)| **placed == class)
            .map(|(machine, _)| machine)
            .collect()
    }

    pub fn class_of(&self, machine: &MachineId) -> Option<Classification> {
        self.placements.get(machine).copied()
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}

/// Every label verdict of one mode plus the merged bins
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesVerdict {
    pub verdicts: Vec<LabelVerdict>,
    pub bins: Bins,
}

/// Classify each label of a series table independently
pub fn classify_series(table: &SeriesTable, band: ToleranceBand) -> SeriesVerdict {
    let verdicts: Vec<LabelVerdict> = labels_of(table)
        .iter()
        .filter_map(|label| {
            let samples: LabelSamples = table
                .iter()
                .filter_map(|(machine, series)| series.get(label).map(|v| (machine.clone(), v)))
                .collect();
            classify(label, &samples, band)
        })
        .collect();
    let bins = Bins::from_verdicts(&verdicts);

    SeriesVerdict { verdicts, bins }
}
