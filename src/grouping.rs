//! Equivalence grouping of machines
//!
//! Machines whose filtered attribute sets are equal land in the same group.
//! Groups are numbered from 1 in first-seen order while walking machines in
//! lexicographic id order, so numbering is reproducible across runs.

use crate::facts::MachineId;
use crate::selector::{FilteredAttributeSet, Selection};
use std::collections::{BTreeMap, BTreeSet};

/// Machines sharing one identical attribute set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquivalenceGroup {
    /// 1-based group number
    pub number: usize,
    pub members: BTreeSet<MachineId>,
    /// The shared attribute set (may be empty: "no matching data")
    pub attributes: FilteredAttributeSet,
}

impl EquivalenceGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, machine: &MachineId) -> bool {
        self.members.contains(machine)
    }
}

/// Partition machines by set equality of their selections
pub fn compare(sets: &Selection) -> Vec<EquivalenceGroup> {
    let mut groups: Vec<EquivalenceGroup> = Vec::new();
    let mut index: BTreeMap<&FilteredAttributeSet, usize> = BTreeMap::new();

    for (machine, set) in sets {
        match index.get(set) {
            Some(&position) => {
                groups[position].members.insert(machine.clone());
            }
            None => {
                index.insert(set, groups.len());
                groups.push(EquivalenceGroup {
                    number: groups.len() + 1,
                    members: BTreeSet::from([machine.clone()]),
                    attributes: set.clone(),
                });
            }
        }
    }

    groups
}

/// Find the group a machine belongs to
pub fn group_of<'a>(
    groups: &'a [EquivalenceGroup],
    machine: &MachineId,
) -> Option<&'a EquivalenceGroup> {
    groups.iter().find(|group| group.contains(machine))
}
