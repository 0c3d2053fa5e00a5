//! Client-side collation of per-server piece reports.
//!
//! LIST and GET aggregate every server's report into an ordered sequence of
//! `(basename, present[4])`; completeness of an entry decides whether the
//! file can be rebuilt from the fleet.

use dfp_core::PIECE_COUNT;
use serde::Serialize;

/// Which distinct-piece count qualifies a file as reconstructable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletenessRule {
    /// At least 3 distinct piece ids: the minimum the 2-of-4 placement
    /// actually guarantees reconstruction from.
    #[default]
    Strict,
    /// At least 2 distinct piece ids: the historical behaviour, kept for
    /// bug compatibility.
    Legacy,
}

impl CompletenessRule {
    /// Distinct piece ids required to call a file complete.
    #[must_use]
    pub const fn required(self) -> usize {
        match self {
            Self::Strict => 3,
            Self::Legacy => 2,
        }
    }
}

/// One collated file: its basename and which piece ids are present
/// somewhere on the fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollationEntry {
    pub name: String,
    pub present: [bool; PIECE_COUNT],
}

impl CollationEntry {
    /// Distinct piece ids observed for this file.
    #[must_use]
    pub fn distinct_pieces(&self) -> usize {
        self.present.iter().filter(|&&p| p).count()
    }

    /// Whether the file qualifies as reconstructable under `rule`.
    #[must_use]
    pub fn is_complete(&self, rule: CompletenessRule) -> bool {
        self.distinct_pieces() >= rule.required()
    }
}

/// Union of every server's piece reports, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct Collation {
    entries: Vec<CollationEntry>,
}

impl Collation {
    /// Record piece ids observed for `name`; out-of-range ids are ignored.
    pub fn record(&mut self, name: &str, ids: &[u8]) {
        let index = match self.entries.iter().position(|e| e.name == name) {
            Some(index) => index,
            None => {
                self.entries.push(CollationEntry {
                    name: name.to_string(),
                    present: [false; PIECE_COUNT],
                });
                self.entries.len() - 1
            }
        };
        let entry = &mut self.entries[index];
        for &id in ids {
            if (1..=PIECE_COUNT as u8).contains(&id) {
                entry.present[(id - 1) as usize] = true;
            }
        }
    }

    /// All collated entries in first-seen order.
    #[must_use]
    pub fn entries(&self) -> &[CollationEntry] {
        &self.entries
    }

    /// Look up one file by basename.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CollationEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
