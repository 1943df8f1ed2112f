//! Foundation types for medication reconciliation.
//!
//! Every other `medrec-*` crate depends on `medrec-types`. The types here are
//! plain data: no rule tables, no matching logic.
//!
//! # Key Types
//!
//! - [`Medication`] — Canonical medication record produced by the normalizer
//! - [`MedicationMention`] — Structured record from the extraction collaborator
//! - [`ReconciliationStatus`] — Closed ledger status vocabulary
//! - [`SafetyIssue`] — Immutable safety finding with [`Severity`] and [`IssueCategory`]
//! - [`LabValues`] — Optional lab context (eGFR and friends)
//! - [`Route`], [`Frequency`], [`DosageForm`], [`DoseUnit`] — Canonical vocabularies

pub mod error;
pub mod vocab;

pub mod labs;
pub mod medication;
pub mod safety;
pub mod status;

pub use error::TypeError;
pub use labs::LabValues;
pub use medication::{ListSource, Medication, MedicationMention, ParseConfidence};
pub use safety::{IssueCategory, SafetyIssue, Severity};
pub use status::ReconciliationStatus;
pub use vocab::{DosageForm, DoseUnit, Frequency, Route};
