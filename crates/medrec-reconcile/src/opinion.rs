//! Suggestions from an external reasoning collaborator.
//!
//! The collaborator's answer is untrusted text. Only its ambiguities can
//! influence the ledger, and only after each one names a drug present in
//! the inputs and carries no status other than `Unmatched—Verify`.

use std::sync::LazyLock;

use medrec_ledger::ReviewFlags;
use medrec_normalize::Normalizer;
use medrec_types::{Medication, ReconciliationStatus};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{ReconcileError, ReconcileResult};

static FENCED_JSON: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").ok());

/// One matched, discrepant, added or discontinued drug as the collaborator
/// describes it. Informational only.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpinionItem {
    pub drug_name: String,
    pub notes: String,
    /// Any other fields the collaborator sent.
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// A drug the collaborator thinks needs a human decision.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ambiguity {
    pub drug_name: String,
    /// Machine-ish issue tag such as `uncertain_status`.
    pub issue: String,
    pub notes: String,
    pub requires_review: bool,
    /// Optional status label. Only `Unmatched—Verify` is accepted.
    pub status: Option<String>,
}

impl Default for Ambiguity {
    fn default() -> Self {
        Self {
            drug_name: String::new(),
            issue: String::new(),
            notes: String::new(),
            requires_review: true,
            status: None,
        }
    }
}

impl Ambiguity {
    fn review_note(&self) -> String {
        let notes = self.notes.trim();
        if !notes.is_empty() {
            return notes.to_string();
        }
        let issue = self.issue.trim().replace('_', " ");
        if issue.is_empty() {
            "ambiguous".to_string()
        } else {
            issue
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpinionSummary {
    pub clinical_notes: String,
    #[serde(flatten)]
    pub counts: Map<String, Value>,
}

/// The collaborator's full answer. Every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningOpinion {
    pub matched: Vec<OpinionItem>,
    pub discrepancies: Vec<OpinionItem>,
    pub additions: Vec<OpinionItem>,
    pub discontinuations: Vec<OpinionItem>,
    pub ambiguities: Vec<Ambiguity>,
    pub summary: OpinionSummary,
}

/// A suggestion that was not merged, and why.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedSuggestion {
    pub drug_name: String,
    pub reason: String,
}

/// Outcome of validating an opinion against the run's inputs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OpinionReview {
    pub flags: ReviewFlags,
    pub rejected: Vec<RejectedSuggestion>,
}

impl ReasoningOpinion {
    /// Parse a free-text response.
    ///
    /// Looks for a fenced ```` ```json ```` block first, then falls back to
    /// the span from the first `{` to the last `}`.
    pub fn from_response(text: &str) -> ReconcileResult<Self> {
        let fenced = FENCED_JSON
            .as_ref()
            .and_then(|re| re.captures(text))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str());

        let candidate = match fenced {
            Some(json) => json,
            None => match (text.find('{'), text.rfind('}')) {
                (Some(start), Some(end)) if start < end => &text[start..=end],
                _ => return Err(ReconcileError::Opinion("no JSON object found".into())),
            },
        };

        serde_json::from_str(candidate).map_err(|e| ReconcileError::Opinion(e.to_string()))
    }

    /// Turn accepted ambiguities into review flags.
    ///
    /// Drug names go through the normalizer's brand→generic resolution and
    /// must match a parseable medication in `inputs`. Ambiguities with
    /// `requires_review: false` are ignored.
    pub fn review(&self, normalizer: &Normalizer, inputs: &[Medication]) -> OpinionReview {
        let mut review = OpinionReview::default();

        for ambiguity in &self.ambiguities {
            if !ambiguity.requires_review {
                debug!(drug = %ambiguity.drug_name, "ambiguity does not require review");
                continue;
            }
            match Self::accept(ambiguity, normalizer, inputs) {
                Ok(generic) => review.flags.flag(generic, ambiguity.review_note()),
                Err(reason) => {
                    warn!(drug = %ambiguity.drug_name, reason = %reason, "suggestion rejected");
                    review.rejected.push(RejectedSuggestion {
                        drug_name: ambiguity.drug_name.clone(),
                        reason,
                    });
                }
            }
        }
        review
    }

    fn accept(
        ambiguity: &Ambiguity,
        normalizer: &Normalizer,
        inputs: &[Medication],
    ) -> Result<String, String> {
        if let Some(label) = &ambiguity.status {
            let status: ReconciliationStatus = label.parse().map_err(|e| format!("{e}"))?;
            if status != ReconciliationStatus::UnmatchedVerify {
                return Err(format!("status '{status}' cannot be assigned by a suggestion"));
            }
        }

        let generic = normalizer.resolve_generic(&ambiguity.drug_name);
        if generic.is_empty() {
            return Err("no drug name".to_string());
        }
        let known = inputs
            .iter()
            .any(|m| m.is_matchable() && m.generic_name == generic);
        if !known {
            return Err(format!("'{generic}' does not match any input medication"));
        }
        Ok(generic)
    }
}
