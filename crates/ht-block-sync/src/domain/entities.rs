//! # Domain Entities
//!
//! Core entities for the Block Sync engine: the block record, the bounded
//! block store and the rule book.

use super::errors::SyncError;
use super::invariants::invariant_rule_book_non_empty;
use super::value_objects::{BlockType, MergeOutcome, SamplingRule, SizeType};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Normalized block record produced by a chain source.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlockRecord {
    /// Block height, unique within a store.
    pub height: u64,
    /// Block hash (opaque).
    pub hash: String,
    /// Numeric result derived from the hash.
    pub result_value: u64,
    /// Parity of `result_value`.
    #[serde(rename = "type")]
    pub block_type: BlockType,
    /// Size class of `result_value`.
    pub size_type: SizeType,
    /// Production time, unix milliseconds.
    pub timestamp: u64,
}

impl BlockRecord {
    /// Create a record, deriving both classifications from `result_value`.
    pub fn new(height: u64, hash: impl Into<String>, result_value: u64, timestamp: u64) -> Self {
        Self {
            height,
            hash: hash.into(),
            result_value,
            block_type: BlockType::from_value(result_value),
            size_type: SizeType::from_value(result_value),
            timestamp,
        }
    }
}

/// Deduplicated, capacity-bounded block collection ordered by height.
///
/// Every method takes `&self`; merges are serialized by the inner lock so the
/// backfill loader and the poller can share one store.
#[derive(Debug)]
pub struct BlockStore {
    /// Maximum records kept (CAP).
    capacity: usize,
    /// Records keyed by height.
    blocks: RwLock<BTreeMap<u64, BlockRecord>>,
}

impl BlockStore {
    /// Create an empty store. A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            blocks: RwLock::new(BTreeMap::new()),
        }
    }

    /// Merge records, keeping the `capacity` highest heights.
    ///
    /// An existing record wins over an incoming one with the same height.
    /// Merging the same records again changes nothing.
    pub fn merge<I>(&self, incoming: I) -> MergeOutcome
    where
        I: IntoIterator<Item = BlockRecord>,
    {
        let mut blocks = self.blocks.write();
        let mut outcome = MergeOutcome::default();

        for record in incoming {
            match blocks.entry(record.height) {
                Entry::Occupied(_) => outcome.duplicates += 1,
                Entry::Vacant(slot) => {
                    slot.insert(record);
                    outcome.inserted += 1;
                }
            }
        }

        while blocks.len() > self.capacity {
            if blocks.pop_first().is_none() {
                break;
            }
            outcome.evicted += 1;
        }

        outcome
    }

    /// All records, descending by height.
    pub fn snapshot(&self) -> Vec<BlockRecord> {
        self.blocks.read().values().rev().cloned().collect()
    }

    /// Heights held, descending.
    pub fn heights(&self) -> Vec<u64> {
        self.blocks.read().keys().rev().copied().collect()
    }

    /// Highest height, 0 if empty.
    pub fn max_height(&self) -> u64 {
        self.blocks
            .read()
            .last_key_value()
            .map(|(height, _)| *height)
            .unwrap_or(0)
    }

    /// Lowest height, if any.
    pub fn min_height(&self) -> Option<u64> {
        self.blocks.read().first_key_value().map(|(height, _)| *height)
    }

    /// Whether a record exists at `height`.
    pub fn contains(&self, height: u64) -> bool {
        self.blocks.read().contains_key(&height)
    }

    /// Record at `height`.
    pub fn get(&self, height: u64) -> Option<BlockRecord> {
        self.blocks.read().get(&height).cloned()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.blocks.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blocks.read().is_empty()
    }

    /// Whether the store is at capacity.
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every record.
    pub fn clear(&self) {
        self.blocks.write().clear();
    }
}

/// Rule collection with one active rule. Never empty.
///
/// Deserialization goes through [`RuleBook::new`] and [`RuleBook::activate`],
/// so a persisted book is validated like a constructed one.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", try_from = "RuleBookRepr")]
pub struct RuleBook {
    rules: Vec<SamplingRule>,
    active_id: String,
}

/// Wire form of a [`RuleBook`] before validation.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RuleBookRepr {
    rules: Vec<SamplingRule>,
    #[serde(default)]
    active_id: Option<String>,
}

impl TryFrom<RuleBookRepr> for RuleBook {
    type Error = SyncError;

    fn try_from(repr: RuleBookRepr) -> Result<Self, Self::Error> {
        let mut book = Self::new(repr.rules)?;
        if let Some(id) = repr.active_id {
            book.activate(&id)?;
        }
        Ok(book)
    }
}

impl RuleBook {
    /// Create a rule book; the first rule becomes active.
    ///
    /// # Errors
    /// - `InvalidRule` if `rules` is empty or any rule has stride < 1
    pub fn new(rules: Vec<SamplingRule>) -> Result<Self, SyncError> {
        invariant_rule_book_non_empty(rules.len())?;
        for rule in &rules {
            rule.validate()?;
        }
        let active_id = rules[0].id.clone();
        Ok(Self { rules, active_id })
    }

    /// Built-in rules: every block, and strides 20, 60, 100.
    pub fn default_rules() -> Vec<SamplingRule> {
        [(1, "Single block"), (20, "20 blocks"), (60, "60 blocks"), (100, "100 blocks")]
            .into_iter()
            .map(|(stride, label)| SamplingRule {
                id: stride.to_string(),
                label: label.to_string(),
                stride,
                anchor_height: 0,
            })
            .collect()
    }

    /// Rule book holding [`RuleBook::default_rules`].
    pub fn with_defaults() -> Self {
        let rules = Self::default_rules();
        let active_id = rules[0].id.clone();
        Self { rules, active_id }
    }

    /// All rules in display order.
    pub fn rules(&self) -> &[SamplingRule] {
        &self.rules
    }

    /// Look up a rule.
    pub fn get(&self, id: &str) -> Option<&SamplingRule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    /// Currently active rule. Every constructor and deserialization keeps at least one rule.
    pub fn active(&self) -> &SamplingRule {
        self.get(&self.active_id).unwrap_or(&self.rules[0])
    }

    /// Make `id` the active rule.
    pub fn activate(&mut self, id: &str) -> Result<&SamplingRule, SyncError> {
        if self.get(id).is_none() {
            return Err(SyncError::UnknownRule(id.to_string()));
        }
        self.active_id = id.to_string();
        Ok(self.active())
    }

    /// Replace the rule with the same id, or append a new one.
    pub fn upsert(&mut self, rule: SamplingRule) -> Result<(), SyncError> {
        rule.validate()?;
        match self.rules.iter_mut().find(|existing| existing.id == rule.id) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
        Ok(())
    }

    /// Remove a rule. The first remaining rule becomes active if needed.
    ///
    /// # Errors
    /// - `InvalidRule` if it is the only rule
    /// - `UnknownRule` if no rule has this id
    pub fn delete(&mut self, id: &str) -> Result<SamplingRule, SyncError> {
        let index = self
            .rules
            .iter()
            .position(|rule| rule.id == id)
            .ok_or_else(|| SyncError::UnknownRule(id.to_string()))?;
        invariant_rule_book_non_empty(self.rules.len() - 1)?;

        let removed = self.rules.remove(index);
        if self.active_id == removed.id {
            self.active_id = self.rules[0].id.clone();
        }
        Ok(removed)
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleBook {
    fn default() -> Self {
        Self::with_defaults()
    }
}
