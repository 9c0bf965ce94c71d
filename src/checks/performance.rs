// Benchmark consistency checks for one equivalence group
//
// Every domain builds one series table per benchmark mode, classifies each
// label against the domain's tolerance band, prints the per-label verdicts,
// the optional detail table and one summary line per bin.
//
// Efficiency passes (CPU, threaded/forked memory) reuse the same classifier
// on the synthetic one-label tables from classify::efficiency.

use crate::classify::{
    bandwidth_efficiency, classify_series, core_counts, cpu_efficiency, Bins, Classification,
    GroupStatistics, SeriesVerdict, ToleranceBand, Tolerances, FORKED_EFFICIENCY_LABEL,
    THREAD_EFFICIENCY_LABEL,
};
use crate::error::FleetError;
use crate::facts::FactSet;
use crate::perf_reference::{PerfReference, PerfStatus};
use crate::report::{DetailFilter, Level, PlotSink, Reporter};
use crate::selector::{Field, Selection, Selector};
use crate::series::{
    build_from, cpu_series, memory_series, modes_of, NumericKind, SeriesBuild, SeriesSpec,
    SeriesTable, LOGICAL_LABEL,
};
use std::cell::Cell;

/// CPU benchmark modes
pub const CPU_MODES: [&str; 2] = ["bogomips", "loops_per_sec"];

/// Memory benchmark block sizes
pub const MEMORY_BLOCK_SIZES: [&str; 8] = ["1K", "4K", "1M", "16M", "128M", "256M", "1G", "2G"];

/// Network benchmark modes and their units
pub const NETWORK_MODES: [(&str, &str); 2] =
    [("bandwidth", "MB/sec"), ("requests_per_sec", "RRQ/sec")];

/// Load level of a ramp-up run and where its plot samples go
#[derive(Clone, Copy)]
pub struct RampUp<'a> {
    pub value: f64,
    pub sink: &'a dyn PlotSink,
}

impl std::fmt::Debug for RampUp<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RampUp").field("value", &self.value).finish_non_exhaustive()
    }
}

/// Classified benchmark mode
#[derive(Debug, Clone, PartialEq)]
pub struct ModeReport {
    pub mode: String,
    pub unit: &'static str,
    pub table: SeriesTable,
    pub verdict: SeriesVerdict,
}

impl ModeReport {
    pub fn bins(&self) -> &Bins {
        &self.verdict.bins
    }

    /// Average per-machine total of one bin
    pub fn bin_average(&self, class: Classification) -> Option<f32> {
        let totals: Vec<f32> = self
            .bins()
            .members(class)
            .into_iter()
            .filter_map(|machine| self.table.get(machine).map(|series| series.total()))
            .collect();
        GroupStatistics::from_samples(&totals).map(|stats| stats.mean)
    }
}

/// Everything a group's perf checks need
#[derive(Debug)]
pub struct PerfContext<'a> {
    pub group_number: usize,
    pub reporter: &'a Reporter,
    pub tolerances: &'a Tolerances,
    pub cpu_reference: PerfReference<'a>,
    pub detail: &'a DetailFilter,
    pub rampup: Option<RampUp<'a>>,
}

/// Printed once per domain, before the first verdict
struct Section<'a> {
    text: String,
    reporter: &'a Reporter,
    shown: Cell<bool>,
}

impl<'a> Section<'a> {
    fn new(ctx: &PerfContext<'a>, domain: &str) -> Self {
        Self {
            text: format!("Group {} : Checking {} perf", ctx.group_number, domain),
            reporter: ctx.reporter,
            shown: Cell::new(false),
        }
    }

    fn open(&self) {
        if !self.shown.replace(true) {
            self.reporter.heading(&self.text);
        }
    }
}

impl<'a> PerfContext<'a> {
    /// Classify one table and print the per-label verdicts
    fn evaluate(
        &self,
        name: &str,
        print_mode: &str,
        table: SeriesTable,
        band: ToleranceBand,
        unit: &'static str,
        plot: bool,
    ) -> ModeReport {
        let verdict = classify_series(&table, band);
        for label in &verdict.verdicts {
            self.reporter.performance(print_mode, label, unit);
            if plot {
                self.plot(&label.stats);
            }
        }
        ModeReport {
            mode: name.to_string(),
            unit,
            table,
            verdict,
        }
    }

    /// Detail table and bin summary of a classified mode
    fn conclude(&self, report: &ModeReport, category: &str, status: Option<&PerfStatus>) {
        self.reporter.detail(
            self.detail,
            self.group_number,
            category,
            report.bins(),
            &report.table,
        );
        self.reporter
            .summarize(&report.mode, report.bins(), report.unit, &report.table, status);
    }

    fn plot(&self, stats: &GroupStatistics) {
        let Some(rampup) = self.rampup.filter(|r| r.value > 0.0) else {
            return;
        };
        let mut streams = vec![
            ("deviance", stats.stddev),
            ("mean", stats.mean),
            ("sum", stats.sum),
        ];
        if let Some(percent) = stats.deviance.percent() {
            streams.push(("deviance_percentage", percent));
        }
        for (stream, y) in streams {
            if let Err(err) = rampup.sink.emit_sample(stream, rampup.value, f64::from(y)) {
                tracing::warn!(stream, error = %err, "failed to write plot sample");
            }
        }
    }

    fn faults(&self, mode: &str, build: &SeriesBuild) {
        if !build.faults.is_empty() {
            self.reporter.faults(mode, &build.faults);
        }
    }
}

/// Per-disk IOPS / bandwidth for every disk benchmark mode
pub fn logical_disks_perf(
    ctx: &PerfContext<'_>,
    facts: &FactSet,
) -> Result<Vec<ModeReport>, FleetError> {
    let selection = Selector::new("disk", r"[a-z]d\S+")?
        .match_on(Field::Instance)
        .filter_on(Field::Key)
        .include(&["simultaneous", "standalone"])
        .select(facts);
    let section = Section::new(ctx, "logical disks");
    let mut reports = Vec::new();

    for mode in modes_of(&selection) {
        let build = per_instance_series(&selection, &mode, NumericKind::Integer);
        ctx.faults(&mode, &build);
        if build.is_empty() {
            continue;
        }
        section.open();

        let unit = if mode.ends_with("KBps") { "KB/s" } else { "IOps" };
        let band = ctx.tolerances.disk(&mode);
        let report = ctx.evaluate(&mode, &mode, build.series, band, unit, true);
        ctx.conclude(&report, &mode, None);
        reports.push(report);
    }

    Ok(reports)
}

/// Per-interface bandwidth and request rate
pub fn network_perf(ctx: &PerfContext<'_>, facts: &FactSet) -> Result<Vec<ModeReport>, FleetError> {
    let modes: Vec<&str> = NETWORK_MODES.iter().map(|(mode, _)| *mode).collect();
    let selection = Selector::new("network", ".*")?
        .match_on(Field::Instance)
        .filter_on(Field::Key)
        .include(&modes)
        .select(facts);
    let section = Section::new(ctx, "network");
    let mut reports = Vec::new();

    for (mode, unit) in NETWORK_MODES {
        let build = per_instance_series(&selection, mode, NumericKind::Float);
        ctx.faults(mode, &build);
        if build.is_empty() {
            continue;
        }
        section.open();

        let report = ctx.evaluate(mode, mode, build.series, ctx.tolerances.network, unit, true);
        ctx.conclude(&report, mode, None);
        reports.push(report);
    }

    Ok(reports)
}

/// Per-core bogomips / loops_per_sec plus the CPU efficiency pass
pub fn cpu_perf(ctx: &PerfContext<'_>, facts: &FactSet) -> Result<Vec<ModeReport>, FleetError> {
    let selection = Selector::new("cpu", ".*")?.match_on(Field::Instance).select(facts);
    let model = cpu_model(&selection);
    let section = Section::new(ctx, "CPU");
    let mut reports = Vec::new();

    for mode in CPU_MODES {
        let build = cpu_series(&selection, mode);
        ctx.faults(mode, &build);
        if build.is_empty() {
            continue;
        }
        section.open();

        let report = ctx.evaluate(mode, mode, build.series, ctx.tolerances.cpu, "", true);
        let status = match (&model, report.bin_average(Classification::Consistent)) {
            (Some(model), Some(average)) => Some(ctx.cpu_reference.status(mode, model, average)),
            _ => None,
        };
        ctx.conclude(&report, mode, status.as_ref());

        if mode == "loops_per_sec" {
            let efficiency = cpu_efficiency(
                &per_core_only(&report.table),
                &build.aggregates,
                &core_counts(&selection),
            );
            reports.push(report);
            if efficiency.is_empty() {
                tracing::debug!(
                    group = ctx.group_number,
                    "no machine-wide loops_per_sec, skipping CPU efficiency"
                );
                continue;
            }
            let efficiency = ctx.evaluate(
                "CPU Efficiency",
                mode,
                efficiency,
                ctx.tolerances.cpu_efficiency,
                "%",
                false,
            );
            ctx.conclude(&efficiency, mode, None);
            reports.push(efficiency);
        } else {
            reports.push(report);
        }
    }

    Ok(reports)
}

/// Per-core memory bandwidth per block size plus threaded/forked efficiency
pub fn memory_perf(ctx: &PerfContext<'_>, facts: &FactSet) -> Result<Vec<ModeReport>, FleetError> {
    let selection = Selector::new("cpu", ".*")?
        .match_on(Field::Instance)
        .filter_on(Field::Key)
        .include(&["bandwidth_"])
        .select(facts);
    let section = Section::new(ctx, "Memory");
    let mut reports = Vec::new();

    for block_size in MEMORY_BLOCK_SIZES {
        let memory = memory_series(&selection, block_size);
        ctx.faults(block_size, &memory.build);
        if memory.build.is_empty() {
            continue;
        }
        section.open();

        let print_mode = format!("Memory benchmark {}", block_size);
        let report = ctx.evaluate(
            block_size,
            &print_mode,
            memory.build.series,
            ctx.tolerances.memory,
            "MB/s",
            true,
        );
        ctx.conclude(&report, block_size, None);

        let per_core = per_core_only(&report.table);
        let mut passes = Vec::new();
        for (label, machine_wide) in [
            (THREAD_EFFICIENCY_LABEL, &memory.threaded),
            (FORKED_EFFICIENCY_LABEL, &memory.forked),
        ] {
            let efficiency = bandwidth_efficiency(&per_core, machine_wide, label);
            if efficiency.is_empty() {
                ctx.reporter.print(
                    &print_mode,
                    Level::Warning,
                    format!("{:<12} : Benchmark not run on this group", label),
                );
                continue;
            }
            let pass = ctx.evaluate(
                &format!("{} {}", block_size, label),
                &print_mode,
                efficiency,
                ctx.tolerances.memory_efficiency,
                "%",
                false,
            );
            ctx.conclude(&pass, block_size, None);
            passes.push(pass);
        }
        reports.push(report);
        reports.extend(passes);
    }

    Ok(reports)
}

/// Every perf check of one group, in report order
pub fn run_all(ctx: &PerfContext<'_>, facts: &FactSet) -> Result<Vec<ModeReport>, FleetError> {
    let mut reports = logical_disks_perf(ctx, facts)?;
    reports.extend(network_perf(ctx, facts)?);
    reports.extend(cpu_perf(ctx, facts)?);
    reports.extend(memory_perf(ctx, facts)?);
    Ok(reports)
}

fn per_instance_series(selection: &Selection, mode: &str, kind: NumericKind) -> SeriesBuild {
    build_from(
        selection,
        &SeriesSpec {
            mode,
            per_instance: |_| true,
            kind,
            aggregate_fallback: false,
        },
    )
}

/// Processor model from `(cpu, physical_N, product, <model>)`
fn cpu_model(selection: &Selection) -> Option<String> {
    selection
        .values()
        .flatten()
        .find(|t| t.instance.starts_with("physical") && t.key == "product")
        .map(|t| t.value.clone())
}

/// Machines measured per core, without the machine-wide `logical` fallback
fn per_core_only(table: &SeriesTable) -> SeriesTable {
    table
        .iter()
        .filter(|(_, series)| series.get(LOGICAL_LABEL).is_none())
        .map(|(machine, series)| (machine.clone(), series.clone()))
        .collect()
}
