//! Detail selection for raw per-machine rows
//!
//! A detail filter is a (group, category, item) triple. Each field is tried
//! first as a literal, then as a regular expression; the literal match wins.

use regex::Regex;

/// How a detail pattern matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Literal,
    Regex,
}

/// One field of a detail filter
#[derive(Debug, Clone, Default)]
pub struct DetailPattern {
    literal: String,
    regex: Option<Regex>,
}

impl DetailPattern {
    /// Build a pattern; text that is not a valid regex only matches literally
    pub fn new(text: &str) -> Self {
        let regex = match Regex::new(text) {
            Ok(regex) => Some(regex),
            Err(err) => {
                tracing::warn!(
                    pattern = text,
                    error = %err,
                    "detail pattern is not a valid regex, matching literally"
                );
                None
            }
        };
        Self {
            literal: text.to_string(),
            regex,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.literal
    }

    /// Matched text of `candidate`, if any
    ///
    /// The literal test is equality, or containment when `containment` is set;
    /// a literal hit yields the whole candidate. Otherwise the first regex match
    /// is returned. Empty matches do not count.
    pub fn find(&self, candidate: &str, containment: bool) -> Option<(String, MatchKind)> {
        let literal_hit = if containment {
            candidate.contains(self.literal.as_str())
        } else {
            candidate == self.literal
        };
        if literal_hit && !candidate.is_empty() {
            return Some((candidate.to_string(), MatchKind::Literal));
        }

        self.regex
            .as_ref()?
            .find(candidate)
            .map(|m| m.as_str())
            .filter(|matched| !matched.is_empty())
            .map(|matched| (matched.to_string(), MatchKind::Regex))
    }
}

/// What a detail filter matched for one (group, category, item)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailMatch {
    pub category: String,
    pub item: String,
    pub item_kind: MatchKind,
}

/// (group, category, item) selection of raw rows
#[derive(Debug, Clone, Default)]
pub struct DetailFilter {
    group: DetailPattern,
    category: DetailPattern,
    item: DetailPattern,
}

impl DetailFilter {
    pub fn new(group: &str, category: &str, item: &str) -> Self {
        Self {
            group: DetailPattern::new(group),
            category: DetailPattern::new(category),
            item: DetailPattern::new(item),
        }
    }

    pub fn item_pattern(&self) -> &str {
        self.item.as_str()
    }

    /// Match all three fields; the group is compared by equality, category
    /// and item by containment
    pub fn matches(&self, group_number: usize, category: &str, item: &str) -> Option<DetailMatch> {
        self.group.find(&group_number.to_string(), false)?;
        let (category, _) = self.category.find(category, true)?;
        let (item, item_kind) = self.item.find(item, true)?;
        Some(DetailMatch {
            category,
            item,
            item_kind,
        })
    }
}
