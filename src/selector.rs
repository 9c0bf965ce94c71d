//! Attribute selection for comparisons
//!
//! A selector keeps the facts of one category whose pattern field matches a
//! start-anchored regular expression, then applies substring include/exclude
//! lists to a second field. Exclusion always wins over inclusion.

use crate::error::FleetError;
use crate::facts::{AttributeTuple, FactSet, MachineId};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

/// Set of matching facts for one machine (duplicates collapse, ordered)
pub type FilteredAttributeSet = BTreeSet<AttributeTuple>;

/// Selection result: every machine of the fleet, possibly with an empty set
pub type Selection = BTreeMap<MachineId, FilteredAttributeSet>;

/// Which field of an attribute tuple a test applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Category,
    Instance,
    Key,
    Value,
}

impl Field {
    fn of(self, tuple: &AttributeTuple) -> &str {
        match self {
            Field::Category => &tuple.category,
            Field::Instance => &tuple.instance,
            Field::Key => &tuple.key,
            Field::Value => &tuple.value,
        }
    }
}

/// Compiled selection rule
#[derive(Debug, Clone)]
pub struct Selector {
    category: String,
    pattern: Regex,
    match_on: Field,
    filter_on: Field,
    exclude: Vec<String>,
    include: Vec<String>,
}

impl Selector {
    /// Build a selector for `category` whose `pattern` must match a prefix of the key
    pub fn new(category: &str, pattern: &str) -> Result<Self, FleetError> {
        let anchored = format!("^(?:{})", pattern);
        let pattern = Regex::new(&anchored).map_err(|source| FleetError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self {
            category: category.to_string(),
            pattern,
            match_on: Field::Key,
            filter_on: Field::Value,
            exclude: Vec::new(),
            include: Vec::new(),
        })
    }

    /// Field the pattern is matched against (default: key)
    pub fn match_on(mut self, field: Field) -> Self {
        self.match_on = field;
        self
    }

    /// Field the include/exclude substrings are tested against (default: value)
    pub fn filter_on(mut self, field: Field) -> Self {
        self.filter_on = field;
        self
    }

    pub fn exclude<S: AsRef<str>>(mut self, substrings: &[S]) -> Self {
        self.exclude
            .extend(substrings.iter().map(|s| s.as_ref().to_string()));
        self
    }

    pub fn include<S: AsRef<str>>(mut self, substrings: &[S]) -> Self {
        self.include
            .extend(substrings.iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// Check a single tuple against every rule of the selector
    pub fn accepts(&self, tuple: &AttributeTuple) -> bool {
        if tuple.category != self.category || !self.pattern.is_match(self.match_on.of(tuple)) {
            return false;
        }

        let filtered = self.filter_on.of(tuple);
        if self.exclude.iter().any(|s| filtered.contains(s.as_str())) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|s| filtered.contains(s.as_str()))
    }

    /// Apply the selector to every machine of the fleet
    pub fn select(&self, facts: &FactSet) -> Selection {
        facts
            .iter()
            .map(|(machine, tuples)| {
                let set = tuples
                    .iter()
                    .filter(|tuple| self.accepts(tuple))
                    .cloned()
                    .collect();
                (machine.clone(), set)
            })
            .collect()
    }
}

/// Select facts matching `category` and a key prefix pattern, with value filters
pub fn select<S: AsRef<str>>(
    facts: &FactSet,
    category: &str,
    value_pattern: &str,
    exclude: &[S],
    include: &[S],
) -> Result<Selection, FleetError> {
    Ok(Selector::new(category, value_pattern)?
        .exclude(exclude)
        .include(include)
        .select(facts))
}
