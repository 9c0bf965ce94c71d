//! Per-machine fact store
//!
//! Every machine in the fleet reports a flat list of
//! `(category, instance, key, value)` tuples. The collector that produces them
//! is external; this module only holds and loads them.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;

/// One hardware or benchmark fact about a machine
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttributeTuple {
    pub category: String,
    pub instance: String,
    pub key: String,
    pub value: String,
}

impl AttributeTuple {
    pub fn new(
        category: impl Into<String>,
        instance: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            instance: instance.into(),
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for AttributeTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.category, self.instance, self.key, self.value
        )
    }
}

/// Opaque machine identifier, ordered lexicographically
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MachineId(String);

impl MachineId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MachineId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for MachineId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Scalar value as it appears in a fact file
#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
}

impl RawValue {
    fn into_string(self) -> String {
        match self {
            RawValue::Text(text) => text,
            RawValue::Number(number) => number.to_string(),
            RawValue::Flag(flag) => flag.to_string(),
        }
    }
}

/// Facts for every machine of one analysis run
#[derive(Debug, Clone, Default)]
pub struct FactSet {
    machines: BTreeMap<MachineId, Vec<AttributeTuple>>,
}

impl FactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a machine; returns false (and keeps the existing facts) if the id is taken
    pub fn insert(&mut self, machine: MachineId, facts: Vec<AttributeTuple>) -> bool {
        if self.machines.contains_key(&machine) {
            return false;
        }
        self.machines.insert(machine, facts);
        true
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    /// Machines in canonical (lexicographic) order
    pub fn machines(&self) -> impl Iterator<Item = &MachineId> {
        self.machines.keys()
    }

    pub fn facts(&self, machine: &MachineId) -> Option<&[AttributeTuple]> {
        self.machines.get(machine).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MachineId, &[AttributeTuple])> {
        self.machines
            .iter()
            .map(|(machine, facts)| (machine, facts.as_slice()))
    }

    /// Restrict the fleet to the given members (unknown ids are ignored)
    pub fn subset(&self, members: &BTreeSet<MachineId>) -> FactSet {
        let machines = self
            .machines
            .iter()
            .filter(|(machine, _)| members.contains(*machine))
            .map(|(machine, facts)| (machine.clone(), facts.clone()))
            .collect();
        FactSet { machines }
    }

    /// Parse one machine's fact file
    ///
    /// The file is a JSON array of `[category, instance, key, value]` arrays.
    /// Numeric and boolean values are stringified.
    pub fn parse_machine(content: &str) -> Result<Vec<AttributeTuple>> {
        let rows: Vec<(String, String, String, RawValue)> =
            serde_json::from_str(content).context("Failed to parse fact list")?;
        Ok(rows
            .into_iter()
            .map(|(category, instance, key, value)| AttributeTuple {
                category,
                instance,
                key,
                value: value.into_string(),
            })
            .collect())
    }

    /// Load every `*.json` file of a directory, one machine per file
    ///
    /// The machine id is the value of the first `system` fact whose key is
    /// `unique_id`; a machine without it is named after its file stem.
    /// A second machine reporting an already-seen id is skipped with a warning.
    pub fn load_dir<P: AsRef<Path>>(dir: P, unique_id: &str) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths: Vec<_> = fs::read_dir(dir)
            .with_context(|| format!("Failed to read fact directory: {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        if paths.is_empty() {
            bail!("No fact files (*.json) found in {}", dir.display());
        }

        let mut fleet = FactSet::new();
        for path in paths {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read fact file: {}", path.display()))?;
            let facts = Self::parse_machine(&content)
                .with_context(|| format!("Invalid fact file: {}", path.display()))?;

            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let machine = match machine_id_of(&facts, unique_id) {
                Some(id) => id,
                None => {
                    tracing::warn!(
                        file = %path.display(),
                        unique_id,
                        "no system fact carries the id field, using file name"
                    );
                    MachineId::new(stem)
                }
            };

            tracing::debug!(machine = %machine, facts = facts.len(), "loaded machine");
            if !fleet.insert(machine.clone(), facts) {
                tracing::warn!(
                    machine = %machine,
                    file = %path.display(),
                    "duplicate machine id, skipping file"
                );
            }
        }

        Ok(fleet)
    }
}

impl FromIterator<(MachineId, Vec<AttributeTuple>)> for FactSet {
    fn from_iter<I: IntoIterator<Item = (MachineId, Vec<AttributeTuple>)>>(iter: I) -> Self {
        let mut fleet = FactSet::new();
        for (machine, facts) in iter {
            fleet.insert(machine, facts);
        }
        fleet
    }
}

fn machine_id_of(facts: &[AttributeTuple], unique_id: &str) -> Option<MachineId> {
    facts
        .iter()
        .find(|fact| fact.category == "system" && fact.key == unique_id)
        .map(|fact| MachineId::new(fact.value.clone()))
}
