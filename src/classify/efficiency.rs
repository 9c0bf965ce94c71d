// Derived efficiency ratios
//
// Each ratio becomes a one-label series per machine, classified like any
// other metric. A machine missing an input, or with a zero input, is left out
// of the ratio series.

use crate::facts::MachineId;
use crate::selector::Selection;
use crate::series::{MetricSeries, SeriesTable};
use std::collections::BTreeMap;

pub const CPU_EFFICIENCY_LABEL: &str = "CPU Effi.";
pub const THREAD_EFFICIENCY_LABEL: &str = "Thread effi.";
pub const FORKED_EFFICIENCY_LABEL: &str = "Forked Effi.";

/// Logical CPU count per machine, from `(cpu, logical, number, N)`
pub fn core_counts(selection: &Selection) -> BTreeMap<MachineId, u32> {
    selection
        .iter()
        .filter_map(|(machine, tuples)| {
            tuples
                .iter()
                .find(|t| t.category == "cpu" && t.instance == "logical" && t.key == "number")
                .and_then(|t| t.value.trim().parse::<u32>().ok())
                .filter(|count| *count > 0)
                .map(|count| (machine.clone(), count))
        })
        .collect()
}

/// Machine-wide loops_per_sec as a percentage of the per-core sum scaled to
/// the machine's core count
///
/// `efficiency = global / (sum(per_core) * cores / samples) * 100`. Without a
/// core count the sample count is used (no scaling).
pub fn cpu_efficiency(
    per_core: &SeriesTable,
    global: &BTreeMap<MachineId, f32>,
    cores: &BTreeMap<MachineId, u32>,
) -> SeriesTable {
    per_core
        .iter()
        .filter_map(|(machine, series)| {
            let global = *global.get(machine)?;
            let samples = series.len() as f32;
            let cores = cores.get(machine).map_or(samples, |c| *c as f32);
            let host_perf = series.total() * cores / samples;
            ratio(global, host_perf)
                .map(|ratio| (machine.clone(), MetricSeries::labeled(CPU_EFFICIENCY_LABEL, ratio)))
        })
        .collect()
}

/// Machine-wide bandwidth as a percentage of the summed per-core bandwidth
pub fn bandwidth_efficiency(
    per_core: &SeriesTable,
    machine_wide: &BTreeMap<MachineId, f32>,
    label: &str,
) -> SeriesTable {
    per_core
        .iter()
        .filter_map(|(machine, series)| {
            let machine_wide = *machine_wide.get(machine)?;
            ratio(machine_wide, series.total())
                .map(|ratio| (machine.clone(), MetricSeries::labeled(label, ratio)))
        })
        .collect()
}

fn ratio(numerator: f32, denominator: f32) -> Option<f32> {
    if numerator <= 0.0 || denominator <= 0.0 {
        return None;
    }
    let ratio = numerator / denominator * 100.0;
    ratio.is_finite().then_some(ratio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::AttributeTuple;
    use crate::series::LOGICAL_LABEL;

    fn per_core(entries: &[(&str, &[f32])]) -> SeriesTable {
        entries
            .iter()
            .map(|(id, values)| {
                let mut series = MetricSeries::new();
                for (core, value) in values.iter().enumerate() {
                    series.insert(&format!("logical_{}", core), *value);
                }
                (MachineId::from(*id), series)
            })
            .collect()
    }

    #[test]
    fn test_cpu_efficiency_scales_by_core_count() {
        // 2 sampled cores of a 4-core machine: host_perf = 200 * 4 / 2 = 400
        let table = per_core(&[("a", &[100.0, 100.0])]);
        let global = BTreeMap::from([(MachineId::from("a"), 380.0)]);
        let cores = BTreeMap::from([(MachineId::from("a"), 4)]);

        let efficiency = cpu_efficiency(&table, &global, &cores);
        let value = efficiency[&MachineId::from("a")]
            .get(CPU_EFFICIENCY_LABEL)
            .unwrap();
        assert!((value - 95.0).abs() < 1e-4);
    }

    #[test]
    fn test_cpu_efficiency_without_core_count_uses_samples() {
        let table = per_core(&[("a", &[50.0, 50.0])]);
        let global = BTreeMap::from([(MachineId::from("a"), 100.0)]);

        let efficiency = cpu_efficiency(&table, &global, &BTreeMap::new());
        assert_eq!(
            efficiency[&MachineId::from("a")].get(CPU_EFFICIENCY_LABEL),
            Some(100.0)
        );
    }

    #[test]
    fn test_zero_throughput_is_excluded() {
        let table = per_core(&[("a", &[0.0, 0.0]), ("b", &[100.0])]);
        let global = BTreeMap::from([(MachineId::from("a"), 100.0), (MachineId::from("b"), 0.0)]);

        let efficiency = cpu_efficiency(&table, &global, &BTreeMap::new());
        assert!(efficiency.is_empty());
    }

    #[test]
    fn test_missing_global_is_excluded() {
        let table = per_core(&[("a", &[100.0])]);
        assert!(cpu_efficiency(&table, &BTreeMap::new(), &BTreeMap::new()).is_empty());
    }

    #[test]
    fn test_bandwidth_efficiency() {
        let table = per_core(&[("a", &[5000.0, 5000.0]), ("b", &[5000.0])]);
        let threaded = BTreeMap::from([(MachineId::from("a"), 9000.0)]);

        let efficiency = bandwidth_efficiency(&table, &threaded, THREAD_EFFICIENCY_LABEL);
        assert_eq!(efficiency.len(), 1);
        let value = efficiency[&MachineId::from("a")]
            .get(THREAD_EFFICIENCY_LABEL)
            .unwrap();
        assert!((value - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_bandwidth_efficiency_of_logical_fallback() {
        let mut table = SeriesTable::new();
        table.insert("a".into(), MetricSeries::single(8000.0));
        let forked = BTreeMap::from([(MachineId::from("a"), 8000.0)]);

        let efficiency = bandwidth_efficiency(&table, &forked, FORKED_EFFICIENCY_LABEL);
        assert_eq!(
            efficiency[&MachineId::from("a")].get(FORKED_EFFICIENCY_LABEL),
            Some(100.0)
        );
        assert!(table[&MachineId::from("a")].get(LOGICAL_LABEL).is_some());
    }

    #[test]
    fn test_core_counts_reads_logical_number() {
        let selection: Selection = [
            (
                MachineId::from("a"),
                [AttributeTuple::new("cpu", "logical", "number", "16")].into(),
            ),
            (
                MachineId::from("b"),
                [AttributeTuple::new("cpu", "logical", "number", "zero")].into(),
            ),
        ]
        .into();

        let counts = core_counts(&selection);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[&MachineId::from("a")], 16);
    }
}
