use std::collections::BTreeMap;

use medrec_types::Medication;
use serde::Serialize;

use crate::entry::{JoinRecord, LedgerEntry};

/// Result of checking a ledger against the medications it was built from.
///
/// Inputs and ledger join keys are compared as multisets of `raw_input`
/// strings: every input must be accounted for by exactly one entry or join,
/// and nothing else may be in the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CompletenessReport {
    pub is_complete: bool,
    pub input_count: usize,
    /// Number of ledger entries.
    pub ledger_count: usize,
    /// Entries plus joins.
    pub accounted_count: usize,
    pub missing_count: usize,
    /// Inputs with no entry or join, sorted.
    pub missing_medications: Vec<String>,
    /// Ledger join keys that match no input, sorted.
    pub unexpected_entries: Vec<String>,
}

impl CompletenessReport {
    pub(crate) fn compare(
        inputs: &[Medication],
        entries: &[LedgerEntry],
        joins: &[JoinRecord],
    ) -> Self {
        let mut balance: BTreeMap<&str, i64> = BTreeMap::new();
        for med in inputs {
            *balance.entry(med.raw_input.as_str()).or_default() += 1;
        }
        let accounted = entries
            .iter()
            .map(|e| e.input_medication.as_str())
            .chain(joins.iter().map(|j| j.reference_input.as_str()));
        for key in accounted {
            *balance.entry(key).or_default() -= 1;
        }

        let mut missing_medications = Vec::new();
        let mut unexpected_entries = Vec::new();
        for (key, count) in balance {
            let target = if count > 0 {
                &mut missing_medications
            } else {
                &mut unexpected_entries
            };
            for _ in 0..count.unsigned_abs() {
                target.push(key.to_string());
            }
        }

        Self {
            is_complete: missing_medications.is_empty() && unexpected_entries.is_empty(),
            input_count: inputs.len(),
            ledger_count: entries.len(),
            accounted_count: entries.len() + joins.len(),
            missing_count: missing_medications.len(),
            missing_medications,
            unexpected_entries,
        }
    }
}
