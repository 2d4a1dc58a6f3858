//! Classify two snapshots into new, discontinued and price-changed parts.
//!
//! # Algorithm
//!
//! ```text
//! old records ──▶ PartIndex (part → record, last write wins)
//!                     │
//! new records ────────┼──▶ absent  → added
//!                     └──▶ present, price/cost differs → changed
//!
//! PartIndex values ──▶ part not among new parts → discontinued
//! ```
//!
//! One pass over each side with hashed lookups; no nested scans.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::models::{PriceChange, ProductRecord};

/// Lookup of old records by part number.
///
/// A repeated part number replaces the earlier record but keeps the
/// earlier position, so iteration follows first-occurrence order.
#[derive(Debug, Default)]
pub struct PartIndex<'a> {
    positions: HashMap<&'a str, usize>,
    entries: Vec<&'a ProductRecord>,
    overwritten: usize,
}

impl<'a> PartIndex<'a> {
    pub fn build(records: &'a [ProductRecord]) -> Self {
        let mut index = PartIndex {
            positions: HashMap::with_capacity(records.len()),
            entries: Vec::with_capacity(records.len()),
            overwritten: 0,
        };

        for record in records {
            match index.positions.get(record.part_number.as_str()) {
                Some(&pos) => {
                    index.entries[pos] = record;
                    index.overwritten += 1;
                }
                None => {
                    index.positions.insert(&record.part_number, index.entries.len());
                    index.entries.push(record);
                }
            }
        }

        index
    }

    pub fn get(&self, part_number: &str) -> Option<&'a ProductRecord> {
        self.positions.get(part_number).map(|&pos| self.entries[pos])
    }

    pub fn contains(&self, part_number: &str) -> bool {
        self.positions.contains_key(part_number)
    }

    /// Indexed records in first-occurrence order.
    pub fn values(&self) -> impl Iterator<Item = &'a ProductRecord> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records replaced by a later duplicate.
    pub fn overwritten(&self) -> usize {
        self.overwritten
    }
}

/// Counts describing one comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSummary {
    pub old_records: usize,
    pub new_records: usize,
    pub old_rejected: usize,
    pub new_rejected: usize,
    pub old_duplicates: usize,
    pub retained: usize,
    pub added: usize,
    pub discontinued: usize,
    pub changed: usize,
}

/// The three result sets of a comparison.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub added: Vec<ProductRecord>,
    pub discontinued: Vec<ProductRecord>,
    pub changed: Vec<PriceChange>,
    pub summary: ComparisonSummary,
}

/// Reconcile two normalized snapshots.
///
/// `added` and `changed` follow `new` order; `discontinued` follows the
/// old index order. Prices are compared exactly.
pub fn reconcile(old: &[ProductRecord], new: &[ProductRecord]) -> Reconciliation {
    let index = PartIndex::build(old);

    let mut added = Vec::new();
    let mut changed = Vec::new();
    let mut retained: HashSet<&str> = HashSet::new();

    for record in new {
        match index.get(&record.part_number) {
            None => added.push(record.clone()),
            Some(previous) => {
                retained.insert(&record.part_number);
                if let Some(change) = PriceChange::between(previous, record) {
                    changed.push(change);
                }
            }
        }
    }

    let new_parts: HashSet<&str> = new.iter().map(|r| r.part_number.as_str()).collect();
    let discontinued: Vec<ProductRecord> = index
        .values()
        .filter(|r| !new_parts.contains(r.part_number.as_str()))
        .cloned()
        .collect();

    let summary = ComparisonSummary {
        old_records: old.len(),
        new_records: new.len(),
        old_rejected: 0,
        new_rejected: 0,
        old_duplicates: index.overwritten(),
        retained: retained.len(),
        added: added.len(),
        discontinued: discontinued.len(),
        changed: changed.len(),
    };

    Reconciliation {
        added,
        discontinued,
        changed,
        summary,
    }
}
