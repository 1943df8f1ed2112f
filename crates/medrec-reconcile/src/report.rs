use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use medrec_ledger::{CompletenessReport, Ledger, StatusSummary};
use medrec_types::{Medication, SafetyIssue, Severity};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{ReconcileError, ReconcileResult};
use crate::opinion::RejectedSuggestion;
use crate::reconciler::ListLabels;

/// Identity of one reconciliation run.
#[derive(Clone, Debug, Serialize)]
pub struct RunMeta {
    pub run_id: Uuid,
    pub engine_version: String,
    pub run_at: DateTime<Utc>,
    pub labels: ListLabels,
}

impl RunMeta {
    pub(crate) fn start(labels: ListLabels) -> Self {
        Self {
            run_id: Uuid::now_v7(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: Utc::now(),
            labels,
        }
    }
}

/// Everything a report collaborator needs to render one run.
///
/// Plain data: safety and completeness findings are reported here, never
/// raised as errors.
#[derive(Clone, Debug, Serialize)]
pub struct ReconciliationReport {
    pub meta: RunMeta,
    pub normalized_baseline: Vec<Medication>,
    pub normalized_reference: Vec<Medication>,
    pub safety_issues: Vec<SafetyIssue>,
    pub issue_counts: BTreeMap<Severity, usize>,
    /// Frozen ledger.
    pub ledger: Ledger,
    pub ledger_summary: StatusSummary,
    /// Hex BLAKE3 digest of `ledger`.
    pub ledger_digest: String,
    pub completeness: CompletenessReport,
    pub rejected_suggestions: Vec<RejectedSuggestion>,
    /// Non-fatal problems, such as an unreadable reasoning opinion.
    pub warnings: Vec<String>,
}

impl ReconciliationReport {
    /// Whether a clinician must look at this run before it is acted on.
    pub fn requires_review(&self) -> bool {
        !self.completeness.is_complete
            || self.ledger.entries_for_review().next().is_some()
            || self
                .safety_issues
                .iter()
                .any(|issue| issue.severity() == Severity::High)
    }

    /// Check the embedded ledger against the recorded digest.
    pub fn verify_ledger(&self) -> ReconcileResult<bool> {
        Ok(self.ledger.verify_digest(&self.ledger_digest)?)
    }

    pub fn to_json_pretty(&self) -> ReconcileResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ReconcileError::Serialization(e.to_string()))
    }
}
