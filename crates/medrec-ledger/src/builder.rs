use std::collections::{BTreeMap, HashMap};

use medrec_normalize::Normalizer;
use medrec_types::{Medication, ReconciliationStatus};
use serde::Serialize;
use tracing::debug;

use crate::error::LedgerError;
use crate::ledger::Ledger;

pub const NOT_CONTINUED_NOTE: &str = "Not continued from previous list";
const UNPARSEABLE_NOTE: &str = "Could not identify the drug; verify manually";

/// Generic names an accepted review suggestion marked as ambiguous, with
/// the reviewer-facing note for each.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReviewFlags(BTreeMap<String, String>);

impl ReviewFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag `generic_name`. A later flag for the same name replaces the note.
    pub fn flag(&mut self, generic_name: impl Into<String>, note: impl Into<String>) {
        self.0.insert(generic_name.into(), note.into());
    }

    pub fn get(&self, generic_name: &str) -> Option<&str> {
        self.0.get(generic_name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(g, n)| (g.as_str(), n.as_str()))
    }
}

/// Matches baseline against reference medications and records one status
/// per input medication.
///
/// Ordering contract: baseline entries first, in baseline order; then
/// entries for reference medications with no baseline counterpart, in
/// reference order. Matched reference medications are recorded as joins to
/// the baseline entry that carries their status.
pub struct LedgerBuilder<'a> {
    normalizer: &'a Normalizer,
    review_flags: ReviewFlags,
}

impl<'a> LedgerBuilder<'a> {
    pub fn new(normalizer: &'a Normalizer) -> Self {
        Self {
            normalizer,
            review_flags: ReviewFlags::new(),
        }
    }

    /// Medications whose generic name is flagged get `Unmatched—Verify`
    /// instead of their deterministic status.
    pub fn with_review_flags(mut self, flags: ReviewFlags) -> Self {
        self.review_flags = flags;
        self
    }

    pub fn build(
        &self,
        baseline: &[Medication],
        reference: &[Medication],
    ) -> Result<Ledger, LedgerError> {
        // Last write wins when a generic name repeats within one list.
        let reference_by_generic: HashMap<&str, &Medication> = reference
            .iter()
            .filter(|m| m.is_matchable())
            .map(|m| (m.generic_name.as_str(), m))
            .collect();

        let mut ledger = Ledger::new();
        let mut baseline_seq: HashMap<&str, u64> = HashMap::new();

        for med in baseline {
            let (status, notes) = if !med.is_matchable() {
                (ReconciliationStatus::New, UNPARSEABLE_NOTE.to_string())
            } else {
                let status = match reference_by_generic.get(med.generic_name.as_str()) {
                    Some(prior) if self.normalizer.check_equivalence(med, prior) => {
                        ReconciliationStatus::ContinuedNoChange
                    }
                    Some(_) => ReconciliationStatus::Changed,
                    None => ReconciliationStatus::New,
                };
                self.apply_flags(med, status, String::new())
            };
            let seq = ledger.add_entry(med, status, med.raw_input.clone(), notes)?;
            if med.is_matchable() {
                baseline_seq.insert(med.generic_name.as_str(), seq);
            }
        }

        for med in reference {
            if med.is_matchable() {
                if let Some(&seq) = baseline_seq.get(med.generic_name.as_str()) {
                    ledger.record_join(med, seq)?;
                    continue;
                }
            }
            let (status, notes) = if med.is_matchable() {
                self.apply_flags(
                    med,
                    ReconciliationStatus::NotContinued,
                    NOT_CONTINUED_NOTE.to_string(),
                )
            } else {
                (
                    ReconciliationStatus::NotContinued,
                    format!("{NOT_CONTINUED_NOTE}. {UNPARSEABLE_NOTE}"),
                )
            };
            ledger.add_entry(med, status, "", notes)?;
        }

        debug!(
            baseline = baseline.len(),
            reference = reference.len(),
            entries = ledger.len(),
            joins = ledger.joins().len(),
            "ledger built"
        );
        Ok(ledger)
    }

    fn apply_flags(
        &self,
        med: &Medication,
        status: ReconciliationStatus,
        notes: String,
    ) -> (ReconciliationStatus, String) {
        match self.review_flags.get(&med.generic_name) {
            Some(note) => {
                debug!(generic = %med.generic_name, deterministic = %status, "flagged for review");
                (
                    ReconciliationStatus::UnmatchedVerify,
                    format!("Flagged for review: {note}"),
                )
            }
            None => (status, notes),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use medrec_rules::RuleTables;

    use super::*;

    fn normalizer() -> Normalizer {
        Normalizer::new(Arc::new(RuleTables::default())).unwrap()
    }

    fn build(baseline: &[&str], reference: &[&str]) -> (Ledger, Vec<Medication>) {
        let n = normalizer();
        let base = n.normalize_batch(baseline);
        let prior = n.normalize_batch(reference);
        let ledger = LedgerBuilder::new(&n).build(&base, &prior).unwrap();
        let inputs = base.into_iter().chain(prior).collect();
        (ledger, inputs)
    }

    fn statuses(ledger: &Ledger) -> Vec<ReconciliationStatus> {
        ledger
            .entries()
            .iter()
            .map(|e| e.reconciliation_status)
            .collect()
    }

    #[test]
    fn identical_lists_continue_unchanged() {
        let (mut ledger, inputs) = build(&["Metformin 500mg PO BID"], &["Metformin 500mg PO BID"]);
        assert_eq!(statuses(&ledger), vec![ReconciliationStatus::ContinuedNoChange]);
        let entry = &ledger.entries()[0];
        assert_eq!(entry.input_medication, "Metformin 500mg PO BID");
        assert_eq!(entry.output_medication, "Metformin 500mg PO BID");
        assert_eq!(entry.notes, "");
        assert!(ledger.validate_completeness(&inputs).is_complete);
    }

    #[test]
    fn dose_change_is_changed() {
        let (ledger, _) = build(&["Lisinopril 20mg PO daily"], &["Lisinopril 10mg PO daily"]);
        assert_eq!(statuses(&ledger), vec![ReconciliationStatus::Changed]);
    }

    #[test]
    fn route_change_is_changed() {
        let (ledger, _) = build(&["Furosemide 40mg IV"], &["Lasix 40mg PO"]);
        assert_eq!(statuses(&ledger), vec![ReconciliationStatus::Changed]);
    }

    #[test]
    fn frequency_change_alone_is_unchanged() {
        let (ledger, _) = build(&["Metformin 500mg PO daily"], &["Metformin 500mg PO BID"]);
        assert_eq!(statuses(&ledger), vec![ReconciliationStatus::ContinuedNoChange]);
    }

    #[test]
    fn reference_only_is_not_continued() {
        let (mut ledger, inputs) = build(&[], &["Aspirin 81mg PO daily"]);
        assert_eq!(statuses(&ledger), vec![ReconciliationStatus::NotContinued]);
        let entry = &ledger.entries()[0];
        assert_eq!(entry.output_medication, "");
        assert_eq!(entry.notes, NOT_CONTINUED_NOTE);
        assert!(ledger.validate_completeness(&inputs).is_complete);
    }

    #[test]
    fn baseline_first_then_unmatched_reference() {
        let (mut ledger, inputs) = build(
            &["Metformin 500mg PO BID", "Apixaban 5mg PO BID", "Lipitor 40mg PO qhs"],
            &[
                "Aspirin 81mg PO daily",
                "Atorvastatin 20mg PO qhs",
                "Warfarin 5mg PO daily",
            ],
        );
        let order: Vec<&str> = ledger
            .entries()
            .iter()
            .map(|e| e.input_medication.as_str())
            .collect();
        assert_eq!(
            order,
            vec![
                "Metformin 500mg PO BID",
                "Apixaban 5mg PO BID",
                "Lipitor 40mg PO qhs",
                "Aspirin 81mg PO daily",
                "Warfarin 5mg PO daily",
            ]
        );
        assert_eq!(
            statuses(&ledger),
            vec![
                ReconciliationStatus::New,
                ReconciliationStatus::New,
                ReconciliationStatus::Changed,
                ReconciliationStatus::NotContinued,
                ReconciliationStatus::NotContinued,
            ]
        );
        assert_eq!(ledger.joins()[0].reference_input, "Atorvastatin 20mg PO qhs");
        assert_eq!(ledger.joins()[0].entry_seq, 3);
        assert!(ledger.validate_completeness(&inputs).is_complete);
    }

    #[test]
    fn repeated_generic_uses_last_reference() {
        let (ledger, _) = build(
            &["Metformin 500mg PO BID"],
            &["Metformin 500mg PO BID", "Metformin 1000mg PO BID"],
        );
        assert_eq!(statuses(&ledger), vec![ReconciliationStatus::Changed]);
        assert_eq!(ledger.joins().len(), 2);
    }

    #[test]
    fn repeated_baseline_generic_gets_one_entry_each() {
        let (mut ledger, inputs) = build(
            &["Metformin 500mg PO BID", "Metformin 1000mg PO BID"],
            &["Metformin 1000mg PO BID"],
        );
        assert_eq!(
            statuses(&ledger),
            vec![
                ReconciliationStatus::Changed,
                ReconciliationStatus::ContinuedNoChange,
            ]
        );
        assert_eq!(ledger.joins()[0].entry_seq, 2);
        assert!(ledger.validate_completeness(&inputs).is_complete);
    }

    #[test]
    fn unparseable_medications_are_never_matched() {
        let (mut ledger, inputs) = build(&["   "], &[""]);
        assert_eq!(
            statuses(&ledger),
            vec![ReconciliationStatus::New, ReconciliationStatus::NotContinued]
        );
        assert!(ledger.entries()[0].notes.contains("verify manually"));
        assert!(ledger.joins().is_empty());
        assert!(ledger.validate_completeness(&inputs).is_complete);
    }

    #[test]
    fn review_flags_override_status() {
        let n = normalizer();
        let base = n.normalize_batch(&["Metformin 500mg PO BID", "Lisinopril 10mg PO daily"]);
        let prior = n.normalize_batch(&["Metformin 500mg PO BID", "Aspirin 81mg PO daily"]);
        let mut flags = ReviewFlags::new();
        flags.flag("metformin", "dose timing unclear");
        flags.flag("aspirin", "possibly held for surgery");

        let ledger = LedgerBuilder::new(&n)
            .with_review_flags(flags)
            .build(&base, &prior)
            .unwrap();
        assert_eq!(
            statuses(&ledger),
            vec![
                ReconciliationStatus::UnmatchedVerify,
                ReconciliationStatus::New,
                ReconciliationStatus::UnmatchedVerify,
            ]
        );
        assert_eq!(ledger.entries()[0].notes, "Flagged for review: dose timing unclear");
        assert_eq!(ledger.entries_for_review().count(), 2);
    }

    mod properties {
        use std::collections::HashSet;

        use proptest::prelude::*;

        use super::*;

        const LINES: &[&str] = &[
            "Metformin 500mg PO BID",
            "Metformin 1000mg PO BID",
            "Glucophage 500mg PO",
            "Lisinopril 10mg PO daily",
            "Lisinopril 20mg PO daily",
            "Aspirin 81mg PO daily",
            "Warfarin ½ 10mg PO daily",
            "Warfarin 5mg PO daily",
            "???",
            "",
        ];

        fn list() -> impl Strategy<Value = Vec<&'static str>> {
            prop::collection::vec(prop::sample::select(LINES), 0..8)
        }

        proptest! {
            #[test]
            fn every_input_is_accounted_for(baseline in list(), reference in list()) {
                let (mut ledger, inputs) = build(&baseline, &reference);
                let report = ledger.validate_completeness(&inputs);
                prop_assert!(report.is_complete);
                prop_assert_eq!(report.accounted_count, baseline.len() + reference.len());
            }

            #[test]
            fn entry_count_matches_unmatched_reference(baseline in list(), reference in list()) {
                let n = normalizer();
                let base = n.normalize_batch(&baseline);
                let prior = n.normalize_batch(&reference);
                let ledger = LedgerBuilder::new(&n).build(&base, &prior).unwrap();

                let base_generics: HashSet<&str> = base
                    .iter()
                    .filter(|m| m.is_matchable())
                    .map(|m| m.generic_name.as_str())
                    .collect();
                let unmatched = prior
                    .iter()
                    .filter(|m| !m.is_matchable() || !base_generics.contains(m.generic_name.as_str()))
                    .count();
                prop_assert_eq!(ledger.len(), base.len() + unmatched);
            }

            #[test]
            fn statuses_are_total_and_deterministic(baseline in list(), reference in list()) {
                let (ledger, _) = build(&baseline, &reference);
                prop_assert_eq!(ledger.summary().total(), ledger.len());
                prop_assert_eq!(ledger.entries_for_review().count(), 0);
                for entry in ledger.entries() {
                    prop_assert!(ReconciliationStatus::ALL.contains(&entry.reconciliation_status));
                }
                let (again, _) = build(&baseline, &reference);
                prop_assert_eq!(again.entries(), ledger.entries());
            }
        }
    }
}
