//! Metric series extraction from benchmark facts
//!
//! A benchmark mode (disk I/O pattern, CPU benchmark, memory block size) is
//! turned into one labeled series per machine: one sample per sub-instance
//! (logical CPU, disk, interface), or a single synthetic `logical` label when
//! only a machine-wide value exists.

use crate::error::FleetError;
use crate::facts::{FactSet, MachineId};
use crate::selector::{Selection, Selector};
use std::collections::{BTreeMap, BTreeSet};

/// Label used when a machine only reports a machine-wide value
pub const LOGICAL_LABEL: &str = "logical";

/// Labeled numeric samples of one machine for one mode
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSeries {
    samples: BTreeMap<String, f32>,
}

impl MetricSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Series holding one value under the synthetic `logical` label
    pub fn single(value: f32) -> Self {
        Self::labeled(LOGICAL_LABEL, value)
    }

    pub fn labeled(label: &str, value: f32) -> Self {
        let mut series = Self::new();
        series.insert(label, value);
        series
    }

    pub fn insert(&mut self, label: &str, value: f32) {
        self.samples.insert(label.to_string(), value);
    }

    pub fn get(&self, label: &str) -> Option<f32> {
        self.samples.get(label).copied()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.samples.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.samples.iter().map(|(label, value)| (label.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sum over every label
    pub fn total(&self) -> f32 {
        self.samples.values().sum()
    }
}

/// Series of every machine for one mode
pub type SeriesTable = BTreeMap<MachineId, MetricSeries>;

/// Every label present in at least one machine's series, in label order
pub fn labels_of(table: &SeriesTable) -> BTreeSet<String> {
    table
        .values()
        .flat_map(|series| series.labels().map(str::to_string))
        .collect()
}

/// How a raw fact value is coerced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    /// Whole numbers such as disk IOPS
    Integer,
    /// Fractional numbers such as bandwidth or bogomips
    Float,
}

impl NumericKind {
    fn parse(self, raw: &str) -> Option<f32> {
        let raw = raw.trim();
        match self {
            NumericKind::Integer => raw.parse::<i64>().ok().map(|v| v as f32),
            NumericKind::Float => raw.parse::<f32>().ok().filter(|v| v.is_finite()),
        }
    }
}

/// What to extract for one mode
#[derive(Debug, Clone, Copy)]
pub struct SeriesSpec<'a> {
    /// Key the facts must carry
    pub mode: &'a str,
    /// True when an instance is a sub-instance (own label)
    pub per_instance: fn(&str) -> bool,
    pub kind: NumericKind,
    /// Use the machine-wide value as the `logical` label when no sub-instance exists
    pub aggregate_fallback: bool,
}

/// Result of building the series for one mode
#[derive(Debug, Default)]
pub struct SeriesBuild {
    pub series: SeriesTable,
    /// Machine-wide values (facts on non sub-instances)
    pub aggregates: BTreeMap<MachineId, f32>,
    /// Non-numeric values; the machine is absent from `series`
    pub faults: Vec<FleetError>,
    /// Machines with a non-numeric value for this mode
    pub dropped: BTreeSet<MachineId>,
}

impl SeriesBuild {
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Build the series of one mode from an existing selection
pub fn build_from(selection: &Selection, spec: &SeriesSpec<'_>) -> SeriesBuild {
    let mut build = SeriesBuild::default();

    'machines: for (machine, tuples) in selection {
        let mut series = MetricSeries::new();
        let mut aggregate = None;

        for tuple in tuples.iter().filter(|t| t.key == spec.mode) {
            let Some(value) = spec.kind.parse(&tuple.value) else {
                tracing::warn!(
                    machine = %machine,
                    mode = spec.mode,
                    instance = %tuple.instance,
                    value = %tuple.value,
                    "non-numeric benchmark value, dropping machine from series"
                );
                build.faults.push(FleetError::NonNumeric {
                    machine: machine.to_string(),
                    label: format!("{} {}", spec.mode, tuple.instance),
                    value: tuple.value.clone(),
                });
                build.dropped.insert(machine.clone());
                continue 'machines;
            };

            if (spec.per_instance)(&tuple.instance) {
                series.insert(&tuple.instance, value);
            } else {
                aggregate = Some(value);
            }
        }

        if let Some(value) = aggregate {
            build.aggregates.insert(machine.clone(), value);
            if series.is_empty() && spec.aggregate_fallback {
                series = MetricSeries::single(value);
            }
        }

        if !series.is_empty() {
            build.series.insert(machine.clone(), series);
        }
    }

    build
}

/// Build the series of one mode for a category of the fleet
///
/// `discriminator` decides which instances are sub-instances; any other
/// instance carries the machine-wide value, used as the `logical` label
/// when no sub-instance sample exists.
pub fn build(
    facts: &FactSet,
    category: &str,
    mode: &str,
    discriminator: fn(&str) -> bool,
    kind: NumericKind,
) -> Result<SeriesBuild, FleetError> {
    let selection = Selector::new(category, ".*")?.select(facts);
    Ok(build_from(
        &selection,
        &SeriesSpec {
            mode,
            per_instance: discriminator,
            kind,
            aggregate_fallback: true,
        },
    ))
}

/// Distinct benchmark keys present in a selection, in key order
pub fn modes_of(selection: &Selection) -> BTreeSet<String> {
    selection
        .values()
        .flat_map(|tuples| tuples.iter().map(|t| t.key.clone()))
        .collect()
}

/// Per-core CPU samples plus the machine-wide `loops_per_sec` values
///
/// Per-core facts live on instances such as `logical_3`; the machine-wide
/// run is reported on the bare `logical` instance.
pub fn cpu_series(selection: &Selection, mode: &str) -> SeriesBuild {
    build_from(
        selection,
        &SeriesSpec {
            mode,
            per_instance: |instance| instance.contains('_'),
            kind: NumericKind::Float,
            aggregate_fallback: mode == "loops_per_sec",
        },
    )
}

/// Memory bandwidth of one block size
#[derive(Debug, Default)]
pub struct MemorySeries {
    pub build: SeriesBuild,
    pub threaded: BTreeMap<MachineId, f32>,
    pub forked: BTreeMap<MachineId, f32>,
}

/// Per-core bandwidth for a block size plus threaded/forked machine-wide runs
///
/// A machine without per-core samples gets its threaded (else forked) value
/// under the `logical` label.
pub fn memory_series(selection: &Selection, block_size: &str) -> MemorySeries {
    let per_core = format!("bandwidth_{}", block_size);
    let threaded_key = format!("threaded_bandwidth_{}", block_size);
    let forked_key = format!("forked_bandwidth_{}", block_size);

    let mut build = build_from(
        selection,
        &SeriesSpec {
            mode: &per_core,
            per_instance: |instance| instance.contains("logical_"),
            kind: NumericKind::Float,
            aggregate_fallback: false,
        },
    );
    let machine_wide = |mode: &str| {
        build_from(
            selection,
            &SeriesSpec {
                mode,
                per_instance: |_| false,
                kind: NumericKind::Float,
                aggregate_fallback: false,
            },
        )
    };
    let mut threaded = machine_wide(threaded_key.as_str());
    let mut forked = machine_wide(forked_key.as_str());

    build.faults.append(&mut threaded.faults);
    build.faults.append(&mut forked.faults);
    build.dropped.append(&mut threaded.dropped);
    build.dropped.append(&mut forked.dropped);

    // a bad value in any run of this block size drops the machine everywhere
    let dropped = &build.dropped;
    build.series.retain(|machine, _| !dropped.contains(machine));
    threaded.aggregates.retain(|machine, _| !dropped.contains(machine));
    forked.aggregates.retain(|machine, _| !dropped.contains(machine));

    for (machine, value) in threaded.aggregates.iter().chain(forked.aggregates.iter()) {
        build
            .series
            .entry(machine.clone())
            .or_insert_with(|| MetricSeries::single(*value));
    }

    MemorySeries {
        build,
        threaded: threaded.aggregates,
        forked: forked.aggregates,
    }
}
