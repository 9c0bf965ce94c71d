//! Verbosity-gated report rendering
//!
//! The reporter formats grouping and classification results. Every line is
//! tagged with a level and only written when the configured verbosity mask
//! contains that level. Writes go through a mutex so concurrent callers never
//! interleave lines.

mod detail;
mod plot;

pub use detail::{DetailFilter, DetailMatch, DetailPattern, MatchKind};
pub use plot::{GnuplotDir, MemorySink, PlotSink};

use crate::classify::{
    Bins, Classification, Direction, GroupOutcome, GroupStatistics, LabelVerdict,
};
use crate::error::FleetError;
use crate::facts::MachineId;
use crate::grouping::EquivalenceGroup;
use crate::perf_reference::PerfStatus;
use crate::series::SeriesTable;
use std::fmt;
use std::io::{self, Write};
use std::ops::BitOr;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// Report line level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
    Summary,
    Detail,
}

impl Level {
    pub const ALL: [Level; 5] = [
        Level::Info,
        Level::Warning,
        Level::Error,
        Level::Summary,
        Level::Detail,
    ];

    const fn bit(self) -> u8 {
        match self {
            Level::Info => 1,
            Level::Warning => 1 << 1,
            Level::Error => 1 << 2,
            Level::Summary => 1 << 3,
            Level::Detail => 1 << 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Summary => "SUMMARY",
            Level::Detail => "DETAIL",
        }
    }
}

/// Combination of report levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verbosity(u8);

impl Verbosity {
    pub const NONE: Verbosity = Verbosity(0);
    pub const ALL: Verbosity = Verbosity(0b1_1111);

    pub const fn contains(self, level: Level) -> bool {
        self.0 & level.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::NONE | Level::Warning | Level::Error | Level::Summary
    }
}

impl From<Level> for Verbosity {
    fn from(level: Level) -> Self {
        Verbosity(level.bit())
    }
}

impl BitOr<Level> for Verbosity {
    type Output = Verbosity;

    fn bitor(self, level: Level) -> Verbosity {
        Verbosity(self.0 | level.bit())
    }
}

impl BitOr for Level {
    type Output = Verbosity;

    fn bitor(self, other: Level) -> Verbosity {
        Verbosity::from(self) | other
    }
}

impl FromStr for Verbosity {
    type Err = FleetError;

    /// Parse `INFO,WARNING`, `SUMMARY|DETAIL` or `ALL` (case-insensitive)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut verbosity = Verbosity::NONE;
        for part in s.split([',', '|']).map(str::trim).filter(|p| !p.is_empty()) {
            if part.eq_ignore_ascii_case("ALL") {
                verbosity = Verbosity::ALL;
                continue;
            }
            let level = Level::ALL
                .into_iter()
                .find(|level| level.name().eq_ignore_ascii_case(part))
                .ok_or_else(|| FleetError::UnknownLevel(part.to_string()))?;
            verbosity = verbosity | level;
        }
        Ok(verbosity)
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Level::ALL
            .into_iter()
            .filter(|level| self.contains(*level))
            .map(Level::name)
            .collect();
        f.write_str(&names.join(","))
    }
}

/// Thread-safe in-memory writer, for callers that want the report as text
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        self.0
            .lock()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut bytes = self
            .0
            .lock()
            .map_err(|_| io::Error::other("report buffer poisoned"))?;
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Renders report lines for the configured verbosity
pub struct Reporter {
    verbosity: Verbosity,
    out: Mutex<Box<dyn Write + Send>>,
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("verbosity", &self.verbosity)
            .finish_non_exhaustive()
    }
}

impl Reporter {
    /// Reporter writing to stdout
    pub fn stdout(verbosity: Verbosity) -> Self {
        Self::with_writer(verbosity, io::stdout())
    }

    pub fn with_writer<W: Write + Send + 'static>(verbosity: Verbosity, writer: W) -> Self {
        Self {
            verbosity,
            out: Mutex::new(Box::new(writer)),
        }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn enabled(&self, level: Level) -> bool {
        self.verbosity.contains(level)
    }

    fn write_line(&self, line: &str) {
        let result = match self.out.lock() {
            Ok(mut out) => writeln!(out, "{}", line),
            Err(_) => Err(io::Error::other("report writer poisoned")),
        };
        if let Err(err) = result {
            tracing::warn!(error = %err, "failed to write report line");
        }
    }

    /// Emit `<mode>: <LEVEL>: <message>` when `level` is enabled
    pub fn print(&self, mode: &str, level: Level, message: impl fmt::Display) {
        if self.enabled(level) {
            self.write_line(&format!("{:<34}: {:<8}: {}", mode, level.name(), message));
        }
    }

    /// Section heading, written whenever any level is enabled
    pub fn heading(&self, text: &str) {
        if !self.verbosity.is_empty() {
            self.write_line("");
            self.write_line(text);
        }
    }

    /// Report the equivalence groups of one hardware comparison
    ///
    /// The largest group (lowest number on ties) is the expected configuration;
    /// every other group is reported as a deviation.
    pub fn groups(&self, title: &str, groups: &[EquivalenceGroup]) {
        self.heading(&format!("##### {} #####", title));

        let Some(majority) = largest_group(groups) else {
            return;
        };
        if groups.len() == 1 {
            self.print(
                title,
                Level::Summary,
                format!("All {} systems are identical", majority.len()),
            );
        }

        for group in groups {
            let members = join_members(group.members.iter());
            if group.number == majority.number {
                self.print(
                    title,
                    Level::Summary,
                    format!(
                        "Group {} : {} identical systems : {}",
                        group.number,
                        group.len(),
                        members
                    ),
                );
            } else {
                self.print(
                    title,
                    Level::Warning,
                    format!(
                        "Group {} : {} systems differ from group {} : {}",
                        group.number,
                        group.len(),
                        majority.number,
                        members
                    ),
                );
            }

            if self.enabled(Level::Detail) {
                if group.attributes.is_empty() {
                    let line = format!("Group {} : no matching data", group.number);
                    self.print(title, Level::Detail, line);
                }
                for tuple in &group.attributes {
                    self.print(title, Level::Detail, format!("Group {} : {}", group.number, tuple));
                }
            }
        }
    }

    /// Report the group statistics and outliers of one label
    pub fn performance(&self, mode: &str, verdict: &LabelVerdict, unit: &str) {
        let title = verdict.label.as_str();
        let stats = &verdict.stats;
        let (low, high) = stats.allowed_range();

        self.print(
            mode,
            Level::Info,
            format!(
                "{:<12} : Group performance : min={:8.2}, mean={:8.2}, max={:8.2}, stddev={:8.2}",
                title, stats.min, stats.mean, stats.max, stats.stddev
            ),
        );

        match verdict.outcome {
            GroupOutcome::Unstable => {
                let deviance = stats.deviance.percent().unwrap_or_default();
                self.print(
                    mode,
                    Level::Error,
                    format!(
                        "{:<12} : Group's variance is too important : {:7.2}% of {:7.2} whereas limit is set to {:3.2}%",
                        title, deviance, stats.mean, verdict.band.max
                    ),
                );
                let line = format!("{:<12} : Group performance : UNSTABLE", title);
                self.print(mode, Level::Error, line);
            }
            GroupOutcome::Undefined => {
                self.print(
                    mode,
                    Level::Error,
                    format!(
                        "{:<12} : Group's variance is undefined : stddev {:7.2} around a zero mean",
                        title, stats.stddev
                    ),
                );
                let line = format!("{:<12} : Group performance : UNSTABLE", title);
                self.print(mode, Level::Error, line);
            }
            GroupOutcome::Consistent | GroupOutcome::Suspicious => {
                for outlier in &verdict.outliers {
                    let kind = match outlier.direction {
                        Direction::Over => "overperformance ",
                        Direction::Under => "underperformance",
                    };
                    self.print(
                        mode,
                        Level::Warning,
                        format!(
                            "{:<12} : {} : Curious {} {:7.2} : min_allow_group = {:.2}, mean_group = {:.2} max_allow_group = {:.2}",
                            title, outlier.machine, kind, outlier.value, low, stats.mean, high
                        ),
                    );
                }
                if verdict.outcome == GroupOutcome::Consistent {
                    self.print(
                        mode,
                        Level::Info,
                        format!(
                            "{:<12} : Group performance = {:7.2} {} : CONSISTENT",
                            title, stats.mean, unit
                        ),
                    );
                } else {
                    self.print(
                        mode,
                        Level::Warning,
                        format!(
                            "{:<12} : Group performance = {:7.2} {} : SUSPICIOUS",
                            title, stats.mean, unit
                        ),
                    );
                }
            }
        }
    }

    /// One SUMMARY line per non-empty bin
    ///
    /// The average and standard deviation are taken over each member's total
    /// across every label of `table`. `perf_status` is appended to the
    /// consistent line when given.
    pub fn summarize(
        &self,
        label: &str,
        bins: &Bins,
        unit: &str,
        table: &SeriesTable,
        perf_status: Option<&PerfStatus>,
    ) {
        for class in Classification::ALL {
            let totals: Vec<f32> = bins
                .members(class)
                .into_iter()
                .filter_map(|machine| table.get(machine).map(|series| series.total()))
                .collect();
            let Some(stats) = GroupStatistics::from_samples(&totals) else {
                continue;
            };

            let status = match (class, perf_status) {
                (Classification::Consistent, Some(status)) => format!(" : {}", status),
                _ => String::new(),
            };
            self.print(
                label,
                Level::Summary,
                format!(
                    "{:3} {:<10} hosts with {:8.2} {:<4} as average value and {:8.2} standard deviation{}",
                    stats.count,
                    class.name(),
                    stats.mean,
                    unit,
                    stats.stddev,
                    status
                ),
            );
        }
    }

    /// Raw rows of the items selected by a detail filter
    ///
    /// Prints nothing unless DETAIL is enabled and at least one label of
    /// `table` matches the filter for this group and category.
    pub fn detail(
        &self,
        filter: &DetailFilter,
        group_number: usize,
        category: &str,
        bins: &Bins,
        table: &SeriesTable,
    ) {
        if !self.enabled(Level::Detail) {
            return;
        }

        let mut heading = None;
        let mut items = Vec::new();
        for label in crate::series::labels_of(table) {
            if let Some(matched) = filter.matches(group_number, category, &label) {
                heading.get_or_insert(matched.category);
                items.push(label);
            }
        }
        let Some(heading) = heading else {
            return;
        };

        self.write_line("");
        self.write_line(&format!(
            "{:<34}: {:<8}: {}",
            heading,
            Level::Detail.name(),
            filter.item_pattern()
        ));

        let machines: Vec<&MachineId> = table.keys().collect();
        let mut header = format!("{:<14}", "");
        let mut classes = format!("{:<14}", "");
        for machine in &machines {
            header.push_str(&format!(" {:>14}", machine.as_str()));
            let class = bins.class_of(machine).map_or("-", Classification::name);
            classes.push_str(&format!(" {:>14}", class));
        }
        self.write_line(&header);
        self.write_line(&classes);

        for item in &items {
            let mut row = format!("{:<14}", item);
            for machine in &machines {
                match table[*machine].get(item) {
                    Some(value) => row.push_str(&format!(" {:>14.2}", value)),
                    None => row.push_str(&format!(" {:>14}", "-")),
                }
            }
            self.write_line(&row);
        }
    }

    /// Surface data-integrity faults of a series build
    pub fn faults(&self, mode: &str, faults: &[FleetError]) {
        for fault in faults {
            self.print(mode, Level::Warning, format!("{} : machine dropped from series", fault));
        }
    }
}

/// Largest group; the lowest group number wins a tie
pub fn largest_group(groups: &[EquivalenceGroup]) -> Option<&EquivalenceGroup> {
    groups
        .iter()
        .max_by(|a, b| a.len().cmp(&b.len()).then(b.number.cmp(&a.number)))
}

fn join_members<'a>(members: impl Iterator<Item = &'a MachineId>) -> String {
    members.map(MachineId::as_str).collect::<Vec<_>>().join(", ")
}
