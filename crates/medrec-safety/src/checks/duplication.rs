use std::collections::HashSet;

use medrec_types::{IssueCategory, SafetyIssue, Severity};
use tracing::debug;

use crate::check::{CheckContext, SafetyCheck};
use crate::error::SafetyError;

/// Flags every repeat of an already-seen generic name.
///
/// Scans the combined list, so a drug present once in each input list is
/// reported once.
pub struct ExactDuplicationCheck;

impl SafetyCheck for ExactDuplicationCheck {
    fn name(&self) -> &str {
        "exact-duplication"
    }

    fn run(&self, context: &CheckContext<'_>) -> Result<Vec<SafetyIssue>, SafetyError> {
        let mut seen = HashSet::new();
        let mut issues = Vec::new();
        for med in context.medications {
            let generic = med.generic_name.as_str();
            if !seen.insert(generic) {
                debug!(generic, "duplicate generic name");
                issues.push(SafetyIssue::for_medication(
                    Severity::Moderate,
                    IssueCategory::Duplication,
                    format!("Duplicate medication: {generic} appears multiple times"),
                    generic,
                ));
            }
        }
        Ok(issues)
    }
}

/// Flags two or more distinct drugs from the same therapeutic class.
pub struct ClassDuplicationCheck;

impl SafetyCheck for ClassDuplicationCheck {
    fn name(&self) -> &str {
        "class-duplication"
    }

    fn run(&self, context: &CheckContext<'_>) -> Result<Vec<SafetyIssue>, SafetyError> {
        let mut issues = Vec::new();
        for class in &context.tables.therapeutic_classes {
            let mut found: Vec<String> = Vec::new();
            for med in context.medications {
                if class.contains(&med.generic_name) && !found.contains(&med.generic_name) {
                    found.push(med.generic_name.clone());
                }
            }
            if found.len() > 1 {
                let description = format!("Multiple {} drugs: {}", class.name, found.join(", "));
                issues.push(SafetyIssue::new(
                    Severity::Moderate,
                    IssueCategory::Duplication,
                    description,
                    found,
                )?);
            }
        }
        Ok(issues)
    }
}
