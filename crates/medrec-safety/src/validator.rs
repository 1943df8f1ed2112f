use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use medrec_rules::RuleTables;
use medrec_types::{LabValues, Medication, SafetyIssue, Severity};
use tracing::debug;

use crate::check::{CheckContext, SafetyCheck, SafetyOptions};
use crate::checks::{ClassDuplicationCheck, ExactDuplicationCheck, InteractionCheck, RenalCheck};
use crate::error::SafetyError;

// ---------------------------------------------------------------------------
// SafetyReport
// ---------------------------------------------------------------------------

/// Recorded result from one check.
#[derive(Clone, Debug)]
pub struct CheckResult {
    pub check_name: String,
    pub issue_count: usize,
    pub elapsed: Duration,
}

/// All issues from one validation, plus per-check results in pipeline order.
#[derive(Clone, Debug, Default)]
pub struct SafetyReport {
    pub issues: Vec<SafetyIssue>,
    pub check_results: Vec<CheckResult>,
}

// ---------------------------------------------------------------------------
// SafetyValidator
// ---------------------------------------------------------------------------

/// An ordered pipeline of safety checks over injected rule tables.
///
/// Holds no per-run state: `validate_all` is a pure function of its
/// arguments, so one validator can be shared across concurrent runs.
pub struct SafetyValidator {
    checks: Vec<Box<dyn SafetyCheck>>,
    tables: Arc<RuleTables>,
    options: SafetyOptions,
}

impl SafetyValidator {
    /// A validator with the built-in pipeline and default options.
    pub fn new(tables: Arc<RuleTables>) -> Self {
        Self::with_options(tables, SafetyOptions::default())
    }

    /// A validator with the built-in pipeline:
    /// exact duplication -> class duplication -> interaction -> renal
    pub fn with_options(tables: Arc<RuleTables>, options: SafetyOptions) -> Self {
        let mut validator = Self::empty(tables, options);
        validator.add_check(Box::new(ExactDuplicationCheck));
        validator.add_check(Box::new(ClassDuplicationCheck));
        validator.add_check(Box::new(InteractionCheck));
        validator.add_check(Box::new(RenalCheck));
        validator
    }

    /// A validator with no checks. Use [`Self::add_check`] to build a
    /// custom pipeline.
    pub fn empty(tables: Arc<RuleTables>, options: SafetyOptions) -> Self {
        Self {
            checks: Vec::new(),
            tables,
            options,
        }
    }

    /// Append a check to the end of the pipeline.
    pub fn add_check(&mut self, check: Box<dyn SafetyCheck>) {
        self.checks.push(check);
    }

    pub fn check_count(&self) -> usize {
        self.checks.len()
    }

    pub fn options(&self) -> &SafetyOptions {
        &self.options
    }

    /// Run every check and return the issues in pipeline order.
    pub fn validate_all(
        &self,
        medications: &[Medication],
        labs: Option<&LabValues>,
    ) -> Result<Vec<SafetyIssue>, SafetyError> {
        Ok(self.evaluate(medications, labs)?.issues)
    }

    /// Run every check, recording per-check results.
    ///
    /// Medications with an empty generic name are not checked.
    pub fn evaluate(
        &self,
        medications: &[Medication],
        labs: Option<&LabValues>,
    ) -> Result<SafetyReport, SafetyError> {
        let checked: Vec<&Medication> = medications.iter().filter(|m| m.is_matchable()).collect();
        let context = CheckContext {
            medications: &checked,
            labs,
            tables: &self.tables,
            options: &self.options,
        };

        let mut report = SafetyReport::default();
        for check in &self.checks {
            let start = Instant::now();
            let issues = check.run(&context)?;
            let elapsed = start.elapsed();
            debug!(check = check.name(), issues = issues.len(), "safety check complete");

            report.check_results.push(CheckResult {
                check_name: check.name().to_string(),
                issue_count: issues.len(),
                elapsed,
            });
            report.issues.extend(issues);
        }
        Ok(report)
    }
}

/// Issue totals per severity, every severity present.
pub fn issue_counts(issues: &[SafetyIssue]) -> BTreeMap<Severity, usize> {
    let mut counts: BTreeMap<Severity, usize> = Severity::ALL.iter().map(|s| (*s, 0)).collect();
    for issue in issues {
        *counts.entry(issue.severity()).or_default() += 1;
    }
    counts
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use medrec_types::IssueCategory;

    use super::*;
    use crate::checks::testing::meds;

    fn validator() -> SafetyValidator {
        SafetyValidator::new(Arc::new(RuleTables::default()))
    }

    struct AlwaysHepatic;

    impl SafetyCheck for AlwaysHepatic {
        fn name(&self) -> &str {
            "hepatic"
        }

        fn run(&self, context: &CheckContext<'_>) -> Result<Vec<SafetyIssue>, SafetyError> {
            context
                .medications
                .iter()
                .filter(|m| m.generic_name == "acetaminophen")
                .map(|m| {
                    SafetyIssue::new(
                        Severity::Low,
                        IssueCategory::Hepatic,
                        "Hepatic dosing review",
                        vec![m.generic_name.clone()],
                    )
                    .map_err(SafetyError::from)
                })
                .collect()
        }
    }

    struct Broken;

    impl SafetyCheck for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn run(&self, _context: &CheckContext<'_>) -> Result<Vec<SafetyIssue>, SafetyError> {
            Err(SafetyError::check("broken", "rule source unavailable"))
        }
    }

    #[test]
    fn default_pipeline_has_four_checks() {
        assert_eq!(validator().check_count(), 4);
    }

    #[test]
    fn issues_come_in_pipeline_order() {
        let list = meds(&[
            "Metformin 500mg PO BID",
            "Ibuprofen 400mg PO",
            "Naproxen 250mg PO",
            "Metformin 500mg PO BID",
        ]);
        let labs = LabValues::with_egfr(25.0);
        let issues = validator().validate_all(&list, Some(&labs)).unwrap();
        let categories: Vec<IssueCategory> = issues.iter().map(|i| i.category()).collect();
        assert_eq!(
            categories,
            vec![
                IssueCategory::Duplication,
                IssueCategory::Duplication,
                IssueCategory::Renal,
                IssueCategory::Renal,
                IssueCategory::Renal,
                IssueCategory::Renal,
            ]
        );
        assert!(issues[0].description().starts_with("Duplicate medication"));
        assert!(issues[1].description().starts_with("Multiple nsaid"));
    }

    #[test]
    fn unparseable_medications_are_ignored() {
        let list = meds(&["", "   ", "Metformin 500mg"]);
        let issues = validator().validate_all(&list, None).unwrap();
        assert!(issues.is_empty());
    }

    #[test]
    fn report_records_each_check() {
        let list = meds(&["Metformin 500mg", "Metformin 500mg"]);
        let report = validator().evaluate(&list, None).unwrap();
        let names: Vec<&str> = report
            .check_results
            .iter()
            .map(|r| r.check_name.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["exact-duplication", "class-duplication", "interaction", "renal"]
        );
        assert_eq!(report.check_results[0].issue_count, 1);
        assert_eq!(report.issues.len(), 1);
    }

    #[test]
    fn custom_checks_extend_pipeline() {
        let mut validator = validator();
        validator.add_check(Box::new(AlwaysHepatic));
        let list = meds(&["Tylenol 500mg PO q6h"]);
        let issues = validator.validate_all(&list, None).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].category(), IssueCategory::Hepatic);
    }

    #[test]
    fn check_errors_propagate() {
        let mut validator = SafetyValidator::empty(
            Arc::new(RuleTables::default()),
            SafetyOptions::default(),
        );
        validator.add_check(Box::new(Broken));
        let err = validator.validate_all(&[], None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "check error in 'broken': rule source unavailable"
        );
    }

    #[test]
    fn counts_include_every_severity() {
        let list = meds(&["Metformin 500mg", "Metformin 500mg"]);
        let issues = validator().validate_all(&list, None).unwrap();
        let counts = issue_counts(&issues);
        assert_eq!(counts[&Severity::High], 0);
        assert_eq!(counts[&Severity::Moderate], 1);
        assert_eq!(counts[&Severity::Low], 0);
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        const LINES: &[&str] = &[
            "Metformin 500mg PO BID",
            "Lisinopril 10mg PO daily",
            "Ibuprofen 400mg PO",
            "Sertraline 50mg PO daily",
            "Warfarin 5mg PO daily",
            "Atorvastatin 20mg PO qhs",
        ];

        fn duplication_count(list: &[Medication]) -> usize {
            validator()
                .validate_all(list, None)
                .unwrap()
                .iter()
                .filter(|i| i.category() == IssueCategory::Duplication)
                .count()
        }

        proptest! {
            #[test]
            fn repeating_a_generic_adds_one_duplication(
                picks in prop::collection::vec(prop::sample::select(LINES), 1..6),
                index in any::<prop::sample::Index>(),
            ) {
                let list = meds(&picks);
                let before = duplication_count(&list);
                let mut extended = list.clone();
                extended.push(index.get(&list).clone());
                prop_assert_eq!(duplication_count(&extended), before + 1);
            }
        }
    }
}
