// Fleet analysis pipeline
//
// Hardware comparisons run over the whole fleet. The groups of the System
// comparison then split the fleet: each group's benchmark results are only
// compared among machines of the same system model.
//
// Flow: facts → HardwareCheck::run (×9) → per System group:
//       disks → network → CPU (+ efficiency) → memory (+ efficiency)

mod hardware;
mod performance;

pub use hardware::HardwareCheck;
pub use performance::{
    cpu_perf, logical_disks_perf, memory_perf, network_perf, run_all, ModeReport, PerfContext,
    RampUp, CPU_MODES, MEMORY_BLOCK_SIZES, NETWORK_MODES,
};

use crate::config::AnalysisConfig;
use crate::error::FleetError;
use crate::facts::{FactSet, MachineId};
use crate::grouping::EquivalenceGroup;
use crate::report::{DetailFilter, Reporter};
use std::collections::BTreeSet;

/// Groups found by one hardware comparison
#[derive(Debug, Clone, PartialEq)]
pub struct HardwareOutcome {
    pub check: HardwareCheck,
    pub groups: Vec<EquivalenceGroup>,
}

/// Perf results of one System group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupPerformance {
    pub group: usize,
    pub members: BTreeSet<MachineId>,
    pub modes: Vec<ModeReport>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisOutcome {
    pub hardware: Vec<HardwareOutcome>,
    pub performance: Vec<GroupPerformance>,
}

impl AnalysisOutcome {
    pub fn groups_of(&self, check: HardwareCheck) -> Option<&[EquivalenceGroup]> {
        self.hardware
            .iter()
            .find(|outcome| outcome.check == check)
            .map(|outcome| outcome.groups.as_slice())
    }
}

/// One analysis run over a fleet
#[derive(Debug)]
pub struct Analysis<'a> {
    config: &'a AnalysisConfig,
    reporter: &'a Reporter,
    detail: DetailFilter,
    rampup: Option<RampUp<'a>>,
}

impl<'a> Analysis<'a> {
    pub fn new(config: &'a AnalysisConfig, reporter: &'a Reporter) -> Self {
        Self {
            config,
            reporter,
            detail: DetailFilter::default(),
            rampup: None,
        }
    }

    pub fn with_detail(mut self, detail: DetailFilter) -> Self {
        self.detail = detail;
        self
    }

    pub fn with_rampup(mut self, rampup: RampUp<'a>) -> Self {
        self.rampup = Some(rampup);
        self
    }

    /// Run every hardware comparison, then the perf checks of each System group
    pub fn run(&self, facts: &FactSet) -> Result<AnalysisOutcome, FleetError> {
        let mut outcome = AnalysisOutcome::default();

        for check in HardwareCheck::ALL {
            let groups = check.run(facts, self.reporter)?;
            outcome.hardware.push(HardwareOutcome { check, groups });
        }

        let system_groups = outcome
            .groups_of(HardwareCheck::System)
            .map(<[EquivalenceGroup]>::to_vec)
            .unwrap_or_default();

        for group in system_groups {
            let ctx = PerfContext {
                group_number: group.number,
                reporter: self.reporter,
                tolerances: &self.config.tolerances,
                cpu_reference: self.config.perf_reference(),
                detail: &self.detail,
                rampup: self.rampup,
            };
            let modes = run_all(&ctx, &facts.subset(&group.members))?;
            tracing::debug!(group = group.number, modes = modes.len(), "perf checks done");
            outcome.performance.push(GroupPerformance {
                group: group.number,
                members: group.members,
                modes,
            });
        }

        Ok(outcome)
    }
}
