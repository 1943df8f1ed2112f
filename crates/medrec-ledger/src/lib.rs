//! Append-only reconciliation ledger.
//!
//! This crate is the heart of reconciliation. It provides:
//! - [`LedgerEntry`] records with a closed [`ReconciliationStatus`](medrec_types::ReconciliationStatus)
//! - [`Ledger`], append-only during a run and frozen by completeness validation
//! - [`LedgerBuilder`], the deterministic baseline-vs-reference matcher
//! - [`CompletenessReport`], proof that no input medication was dropped
//! - A BLAKE3 digest over the frozen ledger for tamper checks

pub mod builder;
pub mod completeness;
pub mod entry;
pub mod error;
pub mod ledger;

pub use builder::{LedgerBuilder, ReviewFlags};
pub use completeness::CompletenessReport;
pub use entry::{JoinRecord, LedgerEntry, StatusSummary};
pub use error::LedgerError;
pub use ledger::Ledger;
