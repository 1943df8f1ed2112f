use crate::vocab::vocabulary;

vocabulary! {
    /// Reconciliation status assigned to every input medication.
    ///
    /// The five labels and their order are a persisted contract with report
    /// consumers and must not change.
    ReconciliationStatus ("reconciliation status") {
        /// Present in the baseline list only.
        New => "New",
        /// Present in the reference list only.
        NotContinued => "Not Continued",
        /// Same generic drug in both lists, with a different route or dose.
        Changed => "Changed",
        /// Equivalent medication in both lists.
        ContinuedNoChange => "Continued—No Change",
        /// Ambiguous case surfaced for human review.
        UnmatchedVerify => "Unmatched—Verify",
    }
}

impl ReconciliationStatus {
    /// Whether an entry with this status needs clinician verification.
    pub fn requires_review(&self) -> bool {
        matches!(self, Self::UnmatchedVerify)
    }
}
