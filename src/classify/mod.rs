// Deviation classification of benchmark results across a peer group
//
// For each metric label the group statistics of every machine's sample are
// computed once, then each machine is binned:
// - deviance above tolerance_max: the whole group is unstable
// - deviance above tolerance_min: machines outside mean ± 2σ are curious
// - otherwise: consistent
//
// Deviance percentage = stddev / mean * 100 (population stddev, 0 for a
// single sample, undefined for a zero mean with non-zero spread).
//
// Efficiency ratios (CPU single-core vs. machine-wide throughput, memory
// threaded/forked vs. per-core bandwidth) are classified as a second pass
// over synthetic one-label series.

mod config;
mod efficiency;
mod statistics;
mod verdict;

pub use config::{ToleranceBand, Tolerances};
pub use efficiency::{
    bandwidth_efficiency, core_counts, cpu_efficiency, CPU_EFFICIENCY_LABEL,
    FORKED_EFFICIENCY_LABEL, THREAD_EFFICIENCY_LABEL,
};
pub use statistics::{Deviance, GroupStatistics};
pub use verdict::{
    classify, classify_series, Bins, Classification, Direction, GroupOutcome, LabelSamples,
    LabelVerdict, Outlier, SeriesVerdict,
};

#[cfg(test)]
mod tests;
