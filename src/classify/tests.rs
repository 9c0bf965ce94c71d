// Classification scenarios on realistic fleet numbers
//
// Each scenario builds the samples of one label the way the performance
// checks do and asserts the resulting bins.

use super::*;
use crate::facts::MachineId;
use crate::series::{MetricSeries, SeriesTable};

fn samples(entries: &[(&str, f32)]) -> LabelSamples {
    entries
        .iter()
        .map(|(id, value)| (MachineId::from(*id), *value))
        .collect()
}

/// Fleet of `size` machines at `base` plus one machine `odd` at `value`
fn fleet_with_outlier(size: usize, base: f32, value: f32) -> LabelSamples {
    let mut samples: LabelSamples = (0..size)
        .map(|i| (MachineId::new(format!("node-{:02}", i)), base))
        .collect();
    samples.insert(MachineId::from("odd"), value);
    samples
}

fn members(verdict: &LabelVerdict, class: Classification) -> Vec<String> {
    verdict
        .classes
        .iter()
        .filter(|(_, c)| **c == class)
        .map(|(m, _)| m.to_string())
        .collect()
}

#[test]
fn test_identical_values_are_consistent() {
    let verdict = classify(
        "logical_0",
        &samples(&[("a", 10.0), ("b", 10.0), ("c", 10.0)]),
        ToleranceBand::new(0.0, 15.0),
    )
    .unwrap();

    assert_eq!(verdict.stats.deviance, Deviance::Percent(0.0));
    assert_eq!(verdict.outcome, GroupOutcome::Consistent);
    assert_eq!(members(&verdict, Classification::Consistent).len(), 3);
}

#[test]
fn test_deviance_equal_to_max_is_not_unstable() {
    // stddev 15, mean 100: exactly 15%
    let verdict = classify(
        "eth0",
        &samples(&[("a", 85.0), ("b", 115.0)]),
        ToleranceBand::new(2.0, 15.0),
    )
    .unwrap();

    assert_ne!(verdict.outcome, GroupOutcome::Unstable);
    assert!(members(&verdict, Classification::Unstable).is_empty());
    assert_eq!(members(&verdict, Classification::Consistent).len(), 2);
}

#[test]
fn test_rounded_deviance_at_max_is_not_unstable() {
    // 15% in exact arithmetic, slightly above in f32
    let verdict = classify(
        "eth0",
        &samples(&[("a", 0.85), ("b", 1.15)]),
        ToleranceBand::new(2.0, 15.0),
    )
    .unwrap();

    assert_ne!(verdict.outcome, GroupOutcome::Unstable);
    assert!(members(&verdict, Classification::Unstable).is_empty());
}

#[test]
fn test_deviance_above_max_marks_every_machine_unstable() {
    let verdict = classify(
        "sda",
        &samples(&[("a", 50.0), ("b", 150.0), ("c", 100.0)]),
        ToleranceBand::new(2.0, 10.0),
    )
    .unwrap();

    assert_eq!(verdict.outcome, GroupOutcome::Unstable);
    assert_eq!(members(&verdict, Classification::Unstable).len(), 3);
    assert!(verdict.outliers.is_empty());
}

#[test]
fn test_over_performer_is_curious() {
    // 20 machines at 100 and one at 130: deviance ~6.3%, band ~[88.6, 114.2]
    let verdict = classify(
        "logical_0",
        &fleet_with_outlier(20, 100.0, 130.0),
        ToleranceBand::new(2.0, 50.0),
    )
    .unwrap();

    assert_eq!(verdict.outcome, GroupOutcome::Suspicious);
    assert_eq!(members(&verdict, Classification::Curious), vec!["odd"]);
    assert_eq!(members(&verdict, Classification::Consistent).len(), 20);
    assert_eq!(verdict.outliers.len(), 1);
    assert_eq!(verdict.outliers[0].direction, Direction::Over);
    assert_eq!(verdict.outliers[0].value, 130.0);
}

#[test]
fn test_under_performer_is_curious() {
    let verdict = classify(
        "logical_0",
        &fleet_with_outlier(20, 100.0, 70.0),
        ToleranceBand::new(2.0, 50.0),
    )
    .unwrap();

    assert_eq!(verdict.outliers.len(), 1);
    assert_eq!(verdict.outliers[0].direction, Direction::Under);
    assert_eq!(
        verdict.classes[&MachineId::from("odd")],
        Classification::Curious
    );
}

#[test]
fn test_small_spread_skips_outlier_search() {
    // deviance ~1.7% stays under tolerance_min = 2
    let verdict = classify(
        "sda",
        &samples(&[("a", 100.0), ("b", 100.0), ("c", 100.0), ("d", 104.0)]),
        ToleranceBand::new(2.0, 10.0),
    )
    .unwrap();

    assert_eq!(verdict.outcome, GroupOutcome::Consistent);
    assert!(verdict.outliers.is_empty());
    assert_eq!(members(&verdict, Classification::Consistent).len(), 4);
}

#[test]
fn test_small_fleet_cannot_exceed_two_sigma() {
    // With n samples the largest z-score is (n-1)/sqrt(n); for n=4 that is 1.5,
    // so a lone outlier among four machines never leaves mean ± 2σ.
    let verdict = classify(
        "logical_0",
        &samples(&[("a", 100.0), ("b", 100.0), ("c", 100.0), ("d", 300.0)]),
        ToleranceBand::new(2.0, 60.0),
    )
    .unwrap();

    assert!(verdict.stats.deviance.exceeds(2.0));
    assert!(verdict.outliers.is_empty());
}

#[test]
fn test_undefined_deviance_is_reported_unstable() {
    let verdict = classify(
        "eth0",
        &samples(&[("a", -10.0), ("b", 10.0)]),
        ToleranceBand::new(2.0, 15.0),
    )
    .unwrap();

    assert_eq!(verdict.outcome, GroupOutcome::Undefined);
    assert_eq!(members(&verdict, Classification::Unstable).len(), 2);
}

#[test]
fn test_single_machine_is_consistent() {
    let verdict = classify("sda", &samples(&[("a", 123.0)]), ToleranceBand::new(0.0, 0.0)).unwrap();
    assert_eq!(verdict.outcome, GroupOutcome::Consistent);
    assert_eq!(verdict.stats.count, 1);
}

#[test]
fn test_empty_label_has_no_verdict() {
    assert!(classify("sda", &LabelSamples::new(), ToleranceBand::new(2.0, 10.0)).is_none());
}

#[test]
fn test_classification_is_idempotent() {
    let input = fleet_with_outlier(10, 50.0, 80.0);
    let band = ToleranceBand::new(2.0, 50.0);
    assert_eq!(classify("x", &input, band), classify("x", &input, band));
}

#[test]
fn test_curious_label_outranks_consistent_label() {
    let mut table = SeriesTable::new();
    for i in 0..20 {
        let mut series = MetricSeries::new();
        series.insert("logical_0", 100.0);
        series.insert("logical_1", 100.0);
        table.insert(MachineId::new(format!("node-{:02}", i)), series);
    }
    // consistent on logical_0, curious on logical_1
    let mut odd = MetricSeries::new();
    odd.insert("logical_0", 100.0);
    odd.insert("logical_1", 140.0);
    table.insert("odd".into(), odd);

    let result = classify_series(&table, ToleranceBand::new(2.0, 50.0));
    assert_eq!(result.verdicts.len(), 2);
    assert_eq!(result.bins.class_of(&"odd".into()), Some(Classification::Curious));
    assert_eq!(result.bins.members(Classification::Curious).len(), 1);
    assert_eq!(result.bins.members(Classification::Consistent).len(), 20);
    assert_eq!(result.bins.len(), 21);
}

#[test]
fn test_bins_precedence() {
    let machine = MachineId::from("a");
    let mut bins = Bins::new();

    bins.place(&machine, Classification::Curious);
    bins.place(&machine, Classification::Consistent);
    assert_eq!(bins.class_of(&machine), Some(Classification::Curious));

    let other = MachineId::from("b");
    bins.place(&other, Classification::Consistent);
    bins.place(&other, Classification::Unstable);
    assert_eq!(bins.class_of(&other), Some(Classification::Unstable));

    bins.place(&other, Classification::Curious);
    assert_eq!(bins.class_of(&other), Some(Classification::Curious));
}

#[test]
fn test_every_machine_in_exactly_one_bin() {
    let mut table = SeriesTable::new();
    for (i, value) in [100.0, 101.0, 99.0, 250.0, 100.0].iter().enumerate() {
        let mut series = MetricSeries::new();
        series.insert("sda", *value);
        series.insert("sdb", 100.0);
        table.insert(MachineId::new(format!("m{}", i)), series);
    }

    let result = classify_series(&table, ToleranceBand::new(2.0, 10.0));
    let total: usize = Classification::ALL
        .iter()
        .map(|class| result.bins.members(*class).len())
        .sum();
    assert_eq!(total, table.len());
}

#[test]
fn test_efficiency_pass_uses_same_classifier() {
    let per_core: SeriesTable = (0..10)
        .map(|i| {
            let mut series = MetricSeries::new();
            series.insert("logical_0", 100.0);
            series.insert("logical_1", 100.0);
            (MachineId::new(format!("m{}", i)), series)
        })
        .collect();
    let global = (0..10)
        .map(|i| (MachineId::new(format!("m{}", i)), 200.0))
        .collect();

    let efficiency = cpu_efficiency(&per_core, &global, &Default::default());
    let result = classify_series(&efficiency, ToleranceBand::new(1.0, 2.0));

    assert_eq!(result.verdicts.len(), 1);
    assert_eq!(result.verdicts[0].label, CPU_EFFICIENCY_LABEL);
    assert_eq!(result.verdicts[0].stats.mean, 100.0);
    assert_eq!(result.bins.members(Classification::Consistent).len(), 10);
}
