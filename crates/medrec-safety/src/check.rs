use medrec_rules::RuleTables;
use medrec_types::{LabValues, Medication, SafetyIssue};
use serde::{Deserialize, Serialize};

use crate::error::SafetyError;

// ---------------------------------------------------------------------------
// SafetyOptions
// ---------------------------------------------------------------------------

/// Switches for the built-in checks.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyOptions {
    /// When `true`, an interaction token naming a therapeutic class (such as
    /// `nsaid`) also matches every member of that class. By default tokens
    /// only match generic names that contain them.
    pub expand_class_tokens: bool,
}

// ---------------------------------------------------------------------------
// CheckContext
// ---------------------------------------------------------------------------

/// Everything a check may look at.
pub struct CheckContext<'a> {
    /// Medications to check, in input order. Unparseable records are
    /// already filtered out.
    pub medications: &'a [&'a Medication],
    /// Lab values, when the caller has them.
    pub labs: Option<&'a LabValues>,
    pub tables: &'a RuleTables,
    pub options: &'a SafetyOptions,
}

// ---------------------------------------------------------------------------
// SafetyCheck trait
// ---------------------------------------------------------------------------

/// A single check in the safety pipeline.
///
/// The trait is object-safe and `Send + Sync` so checks can be stored in a
/// `Vec<Box<dyn SafetyCheck>>` shared across runs.
pub trait SafetyCheck: Send + Sync {
    /// Short name of the check (e.g. "renal").
    fn name(&self) -> &str;

    /// Issues found in `context`, in a deterministic order.
    fn run(&self, context: &CheckContext<'_>) -> Result<Vec<SafetyIssue>, SafetyError>;
}
