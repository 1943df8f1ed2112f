use std::collections::BTreeMap;

use medrec_types::ReconciliationStatus;
use serde::{Deserialize, Serialize};

/// One reconciliation decision. Never mutated after it is appended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Position in the ledger (1-based, monotonic).
    pub seq: u64,
    /// The source medication's `raw_input`: the join key.
    pub input_medication: String,
    pub reconciliation_status: ReconciliationStatus,
    /// Resulting medication description; empty when the medication stops.
    pub output_medication: String,
    pub notes: String,
}

/// A reference medication accounted for by a matching baseline entry.
///
/// Matched reference medications get no entry of their own; the join links
/// them to the entry that carries their status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRecord {
    pub reference_input: String,
    pub entry_seq: u64,
}

/// Entry counts per status, every status present, in vocabulary order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StatusSummary(BTreeMap<ReconciliationStatus, usize>);

impl StatusSummary {
    pub(crate) fn tally<'a>(entries: impl Iterator<Item = &'a LedgerEntry>) -> Self {
        let mut counts: BTreeMap<ReconciliationStatus, usize> = ReconciliationStatus::ALL
            .iter()
            .map(|s| (*s, 0))
            .collect();
        for entry in entries {
            *counts.entry(entry.reconciliation_status).or_default() += 1;
        }
        Self(counts)
    }

    pub fn get(&self, status: ReconciliationStatus) -> usize {
        self.0.get(&status).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ReconciliationStatus, usize)> + '_ {
        self.0.iter().map(|(s, n)| (*s, *n))
    }
}
