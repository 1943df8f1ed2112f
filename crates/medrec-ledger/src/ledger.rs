use medrec_types::{Medication, ReconciliationStatus};
use serde::Serialize;
use tracing::{debug, warn};

use crate::completeness::CompletenessReport;
use crate::entry::{JoinRecord, LedgerEntry, StatusSummary};
use crate::error::LedgerError;

const DIGEST_DOMAIN: &str = "medrec-ledger-v1";

/// The per-run audit record.
///
/// Append-only while the run builds it; frozen by
/// [`Ledger::validate_completeness`]. Owned by exactly one run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
    joins: Vec<JoinRecord>,
    frozen: bool,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry for `medication`. Returns the new entry's seq.
    pub fn add_entry(
        &mut self,
        medication: &Medication,
        status: ReconciliationStatus,
        output_medication: impl Into<String>,
        notes: impl Into<String>,
    ) -> Result<u64, LedgerError> {
        if self.frozen {
            return Err(LedgerError::Frozen);
        }
        let seq = self.entries.len() as u64 + 1;
        let entry = LedgerEntry {
            seq,
            input_medication: medication.raw_input.clone(),
            reconciliation_status: status,
            output_medication: output_medication.into(),
            notes: notes.into(),
        };
        debug!(
            seq,
            input = %entry.input_medication,
            status = %status,
            "ledger entry appended"
        );
        self.entries.push(entry);
        Ok(seq)
    }

    /// Append an entry whose status arrives as a label from an untrusted
    /// source. Unknown labels are rejected and nothing is appended.
    pub fn add_entry_labeled(
        &mut self,
        medication: &Medication,
        status: &str,
        output_medication: impl Into<String>,
        notes: impl Into<String>,
    ) -> Result<u64, LedgerError> {
        let status: ReconciliationStatus =
            status.parse().map_err(|_| LedgerError::InvalidStatus {
                value: status.to_string(),
                allowed: ReconciliationStatus::ALL
                    .iter()
                    .map(|s| s.label())
                    .collect::<Vec<_>>()
                    .join(", "),
            })?;
        self.add_entry(medication, status, output_medication, notes)
    }

    /// Record that `reference` is accounted for by entry `entry_seq`.
    pub fn record_join(&mut self, reference: &Medication, entry_seq: u64) -> Result<(), LedgerError> {
        if self.frozen {
            return Err(LedgerError::Frozen);
        }
        if self.entry(entry_seq).is_none() {
            return Err(LedgerError::UnknownEntry(entry_seq));
        }
        self.joins.push(JoinRecord {
            reference_input: reference.raw_input.clone(),
            entry_seq,
        });
        Ok(())
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn joins(&self) -> &[JoinRecord] {
        &self.joins
    }

    pub fn entry(&self, seq: u64) -> Option<&LedgerEntry> {
        let index = usize::try_from(seq.checked_sub(1)?).ok()?;
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn summary(&self) -> StatusSummary {
        StatusSummary::tally(self.entries.iter())
    }

    /// Entries a clinician must verify.
    pub fn entries_for_review(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries
            .iter()
            .filter(|e| e.reconciliation_status.requires_review())
    }

    /// Check that every medication in `inputs` is accounted for, then
    /// freeze the ledger.
    ///
    /// A mismatch is reported, never repaired.
    pub fn validate_completeness(&mut self, inputs: &[Medication]) -> CompletenessReport {
        self.frozen = true;
        let report = CompletenessReport::compare(inputs, &self.entries, &self.joins);
        if report.is_complete {
            debug!(
                inputs = report.input_count,
                entries = report.ledger_count,
                "ledger complete"
            );
        } else {
            warn!(
                inputs = report.input_count,
                accounted = report.accounted_count,
                missing = ?report.missing_medications,
                unexpected = ?report.unexpected_entries,
                "ledger completeness check failed"
            );
        }
        report
    }

    /// Hex BLAKE3 digest over the entries and joins, domain-separated.
    pub fn digest(&self) -> Result<String, LedgerError> {
        let data = serde_json::to_vec(&(&self.entries, &self.joins))
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(DIGEST_DOMAIN.as_bytes());
        hasher.update(b":");
        hasher.update(&data);
        Ok(hex::encode(hasher.finalize().as_bytes()))
    }

    pub fn verify_digest(&self, expected: &str) -> Result<bool, LedgerError> {
        Ok(self.digest()? == expected.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use medrec_types::ParseConfidence;

    use super::*;

    fn med(raw: &str) -> Medication {
        let mut med = Medication::unparseable(raw);
        med.name = raw.to_lowercase();
        med.generic_name = raw.to_lowercase();
        med.confidence = ParseConfidence::Partial;
        med
    }

    #[test]
    fn entries_get_monotonic_seq() {
        let mut ledger = Ledger::new();
        let a = ledger.add_entry(&med("A"), ReconciliationStatus::New, "A", "").unwrap();
        let b = ledger
            .add_entry(&med("B"), ReconciliationStatus::NotContinued, "", "gone")
            .unwrap();
        assert_eq!((a, b), (1, 2));
        assert_eq!(ledger.entry(2).unwrap().input_medication, "B");
        assert!(ledger.entry(0).is_none());
        assert!(ledger.entry(3).is_none());
    }

    #[test]
    fn labeled_status_is_validated() {
        let mut ledger = Ledger::new();
        ledger
            .add_entry_labeled(&med("A"), "Continued—No Change", "A", "")
            .unwrap();
        let err = ledger
            .add_entry_labeled(&med("B"), "Stopped", "", "")
            .unwrap_err();
        match err {
            LedgerError::InvalidStatus { value, allowed } => {
                assert_eq!(value, "Stopped");
                assert!(allowed.contains("Unmatched—Verify"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn join_requires_existing_entry() {
        let mut ledger = Ledger::new();
        assert_eq!(
            ledger.record_join(&med("A"), 1),
            Err(LedgerError::UnknownEntry(1))
        );
        ledger.add_entry(&med("A"), ReconciliationStatus::Changed, "A", "").unwrap();
        ledger.record_join(&med("a prior"), 1).unwrap();
        assert_eq!(ledger.joins()[0].entry_seq, 1);
    }

    #[test]
    fn validation_freezes_ledger() {
        let mut ledger = Ledger::new();
        let a = med("A");
        ledger.add_entry(&a, ReconciliationStatus::New, "A", "").unwrap();
        let report = ledger.validate_completeness(&[a.clone()]);
        assert!(report.is_complete);
        assert!(ledger.is_frozen());
        assert_eq!(
            ledger.add_entry(&a, ReconciliationStatus::New, "A", ""),
            Err(LedgerError::Frozen)
        );
        assert_eq!(ledger.record_join(&a, 1), Err(LedgerError::Frozen));
    }

    #[test]
    fn completeness_reports_missing_and_unexpected() {
        let mut ledger = Ledger::new();
        ledger.add_entry(&med("A"), ReconciliationStatus::New, "A", "").unwrap();
        ledger.add_entry(&med("X"), ReconciliationStatus::New, "X", "").unwrap();
        let report = ledger.validate_completeness(&[med("A"), med("C"), med("B")]);
        assert!(!report.is_complete);
        assert_eq!(report.input_count, 3);
        assert_eq!(report.ledger_count, 2);
        assert_eq!(report.missing_count, 2);
        assert_eq!(report.missing_medications, vec!["B", "C"]);
        assert_eq!(report.unexpected_entries, vec!["X"]);
    }

    #[test]
    fn completeness_counts_repeated_inputs() {
        let mut ledger = Ledger::new();
        ledger.add_entry(&med("A"), ReconciliationStatus::New, "A", "").unwrap();
        let report = ledger.validate_completeness(&[med("A"), med("A")]);
        assert!(!report.is_complete);
        assert_eq!(report.missing_medications, vec!["A"]);
    }

    #[test]
    fn joins_account_for_inputs() {
        let mut ledger = Ledger::new();
        ledger
            .add_entry(&med("A now"), ReconciliationStatus::ContinuedNoChange, "A now", "")
            .unwrap();
        ledger.record_join(&med("A then"), 1).unwrap();
        let report = ledger.validate_completeness(&[med("A now"), med("A then")]);
        assert!(report.is_complete);
        assert_eq!(report.accounted_count, 2);
    }

    #[test]
    fn review_entries_are_filtered() {
        let mut ledger = Ledger::new();
        ledger.add_entry(&med("A"), ReconciliationStatus::New, "A", "").unwrap();
        ledger
            .add_entry(&med("B"), ReconciliationStatus::UnmatchedVerify, "B", "check")
            .unwrap();
        let review: Vec<&str> = ledger
            .entries_for_review()
            .map(|e| e.input_medication.as_str())
            .collect();
        assert_eq!(review, vec!["B"]);
    }

    #[test]
    fn digest_detects_changes() {
        let mut ledger = Ledger::new();
        ledger.add_entry(&med("A"), ReconciliationStatus::New, "A", "").unwrap();
        let digest = ledger.digest().unwrap();
        assert_eq!(digest.len(), 64);
        assert!(ledger.verify_digest(&digest).unwrap());
        assert!(ledger.verify_digest(&digest.to_uppercase()).unwrap());

        let mut tampered = ledger.clone();
        tampered.entries[0].reconciliation_status = ReconciliationStatus::Changed;
        assert!(!tampered.verify_digest(&digest).unwrap());
    }

    #[test]
    fn digest_is_domain_separated() {
        let ledger = Ledger::new();
        let plain = hex::encode(blake3::hash(b"[[],[]]").as_bytes());
        assert_ne!(ledger.digest().unwrap(), plain);
    }
}
