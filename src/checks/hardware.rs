// Hardware configuration comparisons
//
// Each check selects one slice of the inventory, partitions the fleet into
// groups of identical machines and reports the groups. Identifiers that are
// unique per machine (serial numbers, uuids, addresses, temperatures) are
// excluded so they never split a group.

use crate::error::FleetError;
use crate::facts::FactSet;
use crate::grouping::{compare, EquivalenceGroup};
use crate::report::Reporter;
use crate::selector::{Field, Selector};

/// Named inventory comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareCheck {
    System,
    Firmware,
    MemoryTiming,
    MemoryBanks,
    NetworkInterfaces,
    Processors,
    PhysicalDisks,
    LogicalDisks,
    HpaController,
}

struct Rule {
    category: &'static str,
    instance: &'static str,
    exclude: &'static [&'static str],
}

impl HardwareCheck {
    /// Report order
    pub const ALL: [HardwareCheck; 9] = [
        HardwareCheck::PhysicalDisks,
        HardwareCheck::LogicalDisks,
        HardwareCheck::HpaController,
        HardwareCheck::System,
        HardwareCheck::Firmware,
        HardwareCheck::MemoryTiming,
        HardwareCheck::MemoryBanks,
        HardwareCheck::NetworkInterfaces,
        HardwareCheck::Processors,
    ];

    pub fn title(self) -> &'static str {
        match self {
            HardwareCheck::System => "System",
            HardwareCheck::Firmware => "Firmware",
            HardwareCheck::MemoryTiming => "Memory Timing(RAM)",
            HardwareCheck::MemoryBanks => "Memory Banks(RAM)",
            HardwareCheck::NetworkInterfaces => "Network Interfaces",
            HardwareCheck::Processors => "Processors",
            HardwareCheck::PhysicalDisks => "Physical Disks (HP Controllers)",
            HardwareCheck::LogicalDisks => "Logical Disks",
            HardwareCheck::HpaController => "HPA Controller",
        }
    }

    fn rule(self) -> Rule {
        const fn rule(
            category: &'static str,
            instance: &'static str,
            exclude: &'static [&'static str],
        ) -> Rule {
            Rule {
                category,
                instance,
                exclude,
            }
        }

        match self {
            HardwareCheck::System => rule("system", "(.*)", &["serial", "uuid"]),
            HardwareCheck::Firmware => rule("firmware", "(.*)", &[]),
            HardwareCheck::MemoryTiming => rule("memory", "DDR(.*)", &[]),
            HardwareCheck::MemoryBanks => rule("memory", "bank(.*)", &["serial"]),
            HardwareCheck::NetworkInterfaces => rule("network", "(.*)", &["serial", "ipv4"]),
            HardwareCheck::Processors => rule(
                "cpu",
                "(.*)",
                &["bogomips", "loops_per_sec", "bandwidth", "cache_size", "/temperature"],
            ),
            HardwareCheck::PhysicalDisks => rule(
                "disk",
                r"(\d+)I:(\d+):(\d+)",
                &[
                    "current_temperature_(c)",
                    "maximum_temperature_(c)",
                    "serial_number",
                ],
            ),
            HardwareCheck::LogicalDisks => {
                rule("disk", r"[a-z]d(\S+)", &["simultaneous", "standalone", "id"])
            }
            HardwareCheck::HpaController => {
                rule("hpa", "(.*)", &["cache_serial_number", "serial_number"])
            }
        }
    }

    /// Selector matching the instance field and excluding on the key field
    pub fn selector(self) -> Result<Selector, FleetError> {
        let rule = self.rule();
        Ok(Selector::new(rule.category, rule.instance)?
            .match_on(Field::Instance)
            .filter_on(Field::Key)
            .exclude(rule.exclude))
    }

    /// Group the fleet and report the groups
    pub fn run(
        self,
        facts: &FactSet,
        reporter: &Reporter,
    ) -> Result<Vec<EquivalenceGroup>, FleetError> {
        let groups = compare(&self.selector()?.select(facts));
        tracing::debug!(check = self.title(), groups = groups.len(), "hardware comparison");
        reporter.groups(self.title(), &groups);
        Ok(groups)
    }
}
