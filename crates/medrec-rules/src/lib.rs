//! Rule tables for medication reconciliation.
//!
//! A [`RuleTables`] value is pure data: brand→generic mappings, synonym
//! tables for routes, frequencies, forms and dose units, therapeutic-class
//! membership, interaction pairs and renal thresholds. It is built once,
//! wrapped in an `Arc`, and injected into the normalizer and the safety
//! validator. Several table versions can coexist in one process.
//!
//! [`RuleTables::default`] holds the built-in clinical tables. Operators can
//! override any subset of them from TOML; tables absent from the file keep
//! their built-in contents.

pub mod defaults;
pub mod error;
pub mod tables;

pub use error::RulesError;
pub use tables::{InteractionRule, RenalRule, RuleTables, Synonym, TherapeuticClass};
