use std::sync::Arc;

use medrec_ledger::LedgerBuilder;
use medrec_normalize::{tag_directionality, Normalizer};
use medrec_rules::RuleTables;
use medrec_safety::{issue_counts, SafetyCheck, SafetyOptions, SafetyValidator};
use medrec_types::{LabValues, Medication, MedicationMention};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ReconcileResult;
use crate::opinion::{OpinionReview, ReasoningOpinion};
use crate::report::{ReconciliationReport, RunMeta};

/// Display names for the two input lists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListLabels {
    pub baseline: String,
    pub reference: String,
}

impl Default for ListLabels {
    fn default() -> Self {
        Self {
            baseline: "Current (Now)".to_string(),
            reference: "Previous (Then)".to_string(),
        }
    }
}

/// A reconciliation over free-text medication lines.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileRequest {
    pub baseline: Vec<String>,
    pub reference: Vec<String>,
    pub labs: Option<LabValues>,
    /// Raw response text from a reasoning collaborator.
    pub opinion: Option<String>,
    pub labels: ListLabels,
}

impl ReconcileRequest {
    pub fn new<S: Into<String>>(
        baseline: impl IntoIterator<Item = S>,
        reference: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            baseline: baseline.into_iter().map(Into::into).collect(),
            reference: reference.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_labs(mut self, labs: LabValues) -> Self {
        self.labs = Some(labs);
        self
    }

    pub fn with_opinion(mut self, opinion: impl Into<String>) -> Self {
        self.opinion = Some(opinion.into());
        self
    }

    pub fn with_labels(mut self, labels: ListLabels) -> Self {
        self.labels = labels;
        self
    }
}

/// A reconciliation over structured extraction records.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MentionRequest {
    pub baseline: Vec<MedicationMention>,
    pub reference: Vec<MedicationMention>,
    pub labs: Option<LabValues>,
    pub opinion: Option<String>,
    pub labels: ListLabels,
}

/// Runs reconciliations for one rule-table set.
///
/// Holds no per-run state; every call builds its own ledger, so one
/// reconciler can serve concurrent requests.
pub struct Reconciler {
    normalizer: Normalizer,
    validator: SafetyValidator,
}

impl Reconciler {
    pub fn new(tables: Arc<RuleTables>, options: SafetyOptions) -> ReconcileResult<Self> {
        let normalizer = Normalizer::new(Arc::clone(&tables))?;
        let validator = SafetyValidator::with_options(tables, options);
        Ok(Self {
            normalizer,
            validator,
        })
    }

    /// A reconciler over the built-in tables with default options.
    pub fn with_defaults() -> ReconcileResult<Self> {
        Self::new(Arc::new(RuleTables::default()), SafetyOptions::default())
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn validator(&self) -> &SafetyValidator {
        &self.validator
    }

    /// Append a custom check to the safety pipeline.
    pub fn add_check(&mut self, check: Box<dyn SafetyCheck>) {
        self.validator.add_check(check);
    }

    pub fn reconcile(&self, request: &ReconcileRequest) -> ReconcileResult<ReconciliationReport> {
        let baseline = self.normalizer.normalize_batch(&request.baseline);
        let reference = self.normalizer.normalize_batch(&request.reference);
        self.run(
            baseline,
            reference,
            request.labs.as_ref(),
            request.opinion.as_deref(),
            &request.labels,
        )
    }

    pub fn reconcile_mentions(
        &self,
        request: &MentionRequest,
    ) -> ReconcileResult<ReconciliationReport> {
        let normalize = |mentions: &[MedicationMention]| -> Vec<Medication> {
            mentions
                .iter()
                .map(|m| self.normalizer.normalize_mention(m))
                .collect()
        };
        self.run(
            normalize(&request.baseline),
            normalize(&request.reference),
            request.labs.as_ref(),
            request.opinion.as_deref(),
            &request.labels,
        )
    }

    fn run(
        &self,
        mut baseline: Vec<Medication>,
        mut reference: Vec<Medication>,
        labs: Option<&LabValues>,
        opinion: Option<&str>,
        labels: &ListLabels,
    ) -> ReconcileResult<ReconciliationReport> {
        let meta = RunMeta::start(labels.clone());
        info!(
            run_id = %meta.run_id,
            baseline = baseline.len(),
            reference = reference.len(),
            "reconciliation started"
        );

        tag_directionality(&mut baseline, &mut reference);
        let inputs: Vec<Medication> = baseline.iter().chain(&reference).cloned().collect();

        // 1. Safety over what the patient is actually taking
        let active: Vec<Medication> = inputs.iter().filter(|m| m.is_active).cloned().collect();
        let safety = self.validator.evaluate(&active, labs)?;

        // 2. Untrusted suggestions
        let mut warnings = Vec::new();
        let review = match opinion {
            Some(text) => match ReasoningOpinion::from_response(text) {
                Ok(opinion) => opinion.review(&self.normalizer, &inputs),
                Err(e) => {
                    warn!(run_id = %meta.run_id, error = %e, "reasoning opinion ignored");
                    warnings.push(e.to_string());
                    OpinionReview::default()
                }
            },
            None => OpinionReview::default(),
        };

        // 3. Ledger and completeness
        let mut ledger = LedgerBuilder::new(&self.normalizer)
            .with_review_flags(review.flags)
            .build(&baseline, &reference)?;
        let completeness = ledger.validate_completeness(&inputs);
        let ledger_digest = ledger.digest()?;

        info!(
            run_id = %meta.run_id,
            entries = ledger.len(),
            issues = safety.issues.len(),
            complete = completeness.is_complete,
            "reconciliation finished"
        );

        Ok(ReconciliationReport {
            meta,
            normalized_baseline: baseline,
            normalized_reference: reference,
            issue_counts: issue_counts(&safety.issues),
            safety_issues: safety.issues,
            ledger_summary: ledger.summary(),
            ledger,
            ledger_digest,
            completeness,
            rejected_suggestions: review.rejected,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use medrec_types::{ListSource, ReconciliationStatus};

    use super::*;

    fn reconciler() -> Reconciler {
        Reconciler::with_defaults().unwrap()
    }

    #[test]
    fn default_labels() {
        let labels = ListLabels::default();
        assert_eq!(labels.baseline, "Current (Now)");
        assert_eq!(labels.reference, "Previous (Then)");
    }

    #[test]
    fn tags_both_lists() {
        let report = reconciler()
            .reconcile(&ReconcileRequest::new(["Metformin 500mg PO BID"], ["Aspirin 81mg PO"]))
            .unwrap();
        assert_eq!(report.normalized_baseline[0].status, Some(ListSource::Baseline));
        assert_eq!(report.normalized_reference[0].status, Some(ListSource::Reference));
        assert!(report.ledger.is_frozen());
        assert!(report.completeness.is_complete);
    }

    #[test]
    fn unreadable_opinion_is_a_warning() {
        let request = ReconcileRequest::new(["Metformin 500mg PO BID"], ["Metformin 500mg PO BID"])
            .with_opinion("I could not decide.");
        let report = reconciler().reconcile(&request).unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert!(report.rejected_suggestions.is_empty());
        assert_eq!(
            report.ledger.entries()[0].reconciliation_status,
            ReconciliationStatus::ContinuedNoChange
        );
    }

    #[test]
    fn inactive_mentions_skip_safety_but_stay_in_ledger() {
        let mut negated = MedicationMention::new("ibuprofen");
        negated.is_negated = true;
        let request = MentionRequest {
            baseline: vec![MedicationMention::new("naproxen"), negated],
            ..MentionRequest::default()
        };
        let report = reconciler().reconcile_mentions(&request).unwrap();
        assert!(report.safety_issues.is_empty());
        assert_eq!(report.ledger.len(), 2);
        assert!(report.completeness.is_complete);
    }

    #[test]
    fn request_deserializes_with_defaults() {
        let request: ReconcileRequest =
            serde_json::from_str(r#"{"baseline": ["Metformin 500mg PO BID"], "labs": {"eGFR": 25}}"#)
                .unwrap();
        assert!(request.reference.is_empty());
        assert_eq!(request.labs.unwrap().egfr(), Some(25.0));
        assert_eq!(request.labels, ListLabels::default());
    }
}
