//! Medication reconciliation orchestrator.
//!
//! This is the main entry point for services embedding medrec. A
//! [`Reconciler`] runs one reconciliation per request:
//!
//! ```text
//! normalize -> tag directionality -> safety checks -> review flags
//!           -> build ledger -> completeness -> report
//! ```
//!
//! # Key Types
//!
//! - [`Reconciler`] — owns the normalizer and safety pipeline for one rule-table set
//! - [`ReconcileRequest`] / [`MentionRequest`] — free-text or structured inputs
//! - [`ReconciliationReport`] — everything a report collaborator renders
//! - [`ReasoningOpinion`] — untrusted suggestions, validated before they touch the ledger

pub mod error;
pub mod opinion;
pub mod reconciler;
pub mod report;

pub use error::{ReconcileError, ReconcileResult};
pub use opinion::{Ambiguity, OpinionItem, OpinionReview, OpinionSummary, ReasoningOpinion, RejectedSuggestion};
pub use reconciler::{ListLabels, MentionRequest, ReconcileRequest, Reconciler};
pub use report::{ReconciliationReport, RunMeta};

// Re-export key types
pub use medrec_ledger::{CompletenessReport, Ledger, LedgerEntry, StatusSummary};
pub use medrec_rules::RuleTables;
pub use medrec_safety::SafetyOptions;
pub use medrec_types::{LabValues, Medication, MedicationMention, ReconciliationStatus, SafetyIssue};
