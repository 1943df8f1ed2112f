use serde::Serialize;

use crate::error::TypeError;
use crate::vocab::vocabulary;

vocabulary! {
    /// Severity of a safety finding.
    Severity ("severity") {
        High => "high",
        Moderate => "moderate",
        Low => "low",
    }
}

vocabulary! {
    /// Category of a safety finding.
    IssueCategory ("issue category") {
        Duplication => "duplication",
        Interaction => "interaction",
        Renal => "renal",
        Hepatic => "hepatic",
    }
}

/// A safety concern identified during validation.
///
/// Fields are private: an issue is immutable once created and always names
/// at least one affected medication (by generic name).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SafetyIssue {
    severity: Severity,
    category: IssueCategory,
    description: String,
    affected_meds: Vec<String>,
}

impl SafetyIssue {
    /// Create an issue. Fails when `affected_meds` is empty.
    pub fn new(
        severity: Severity,
        category: IssueCategory,
        description: impl Into<String>,
        affected_meds: Vec<String>,
    ) -> Result<Self, TypeError> {
        if affected_meds.is_empty() {
            return Err(TypeError::NoAffectedMedications);
        }
        Ok(Self {
            severity,
            category,
            description: description.into(),
            affected_meds,
        })
    }

    /// Create an issue about a single medication.
    pub fn for_medication(
        severity: Severity,
        category: IssueCategory,
        description: impl Into<String>,
        generic_name: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            description: description.into(),
            affected_meds: vec![generic_name.into()],
        }
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn category(&self) -> IssueCategory {
        self.category
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Affected generic names, in the order the check reported them.
    pub fn affected_meds(&self) -> &[String] {
        &self.affected_meds
    }
}
