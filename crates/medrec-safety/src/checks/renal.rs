use medrec_types::{IssueCategory, SafetyIssue, Severity};
use tracing::debug;

use super::interaction::title_case;
use crate::check::{CheckContext, SafetyCheck};
use crate::error::SafetyError;

/// Flags drugs contraindicated at the patient's eGFR.
///
/// A rule keyed by a generic name applies to that drug; a rule keyed by a
/// therapeutic class applies to every member. Skipped entirely when no eGFR
/// is available.
pub struct RenalCheck;

impl SafetyCheck for RenalCheck {
    fn name(&self) -> &str {
        "renal"
    }

    fn run(&self, context: &CheckContext<'_>) -> Result<Vec<SafetyIssue>, SafetyError> {
        let Some(egfr) = context.labs.and_then(|labs| labs.egfr()) else {
            debug!("no egfr available, renal checks skipped");
            return Ok(Vec::new());
        };

        let tables = context.tables;
        let mut issues = Vec::new();
        for med in context.medications {
            let generic = med.generic_name.as_str();

            for rule in tables.renal_contraindications.iter().filter(|r| r.drug == generic) {
                if egfr < rule.egfr_threshold {
                    issues.push(SafetyIssue::for_medication(
                        Severity::High,
                        IssueCategory::Renal,
                        format!(
                            "{} contraindicated with eGFR {egfr} (threshold: {}). Reason: {}",
                            title_case(generic),
                            rule.egfr_threshold,
                            rule.reason
                        ),
                        generic,
                    ));
                }
            }

            for rule in &tables.renal_contraindications {
                let in_class = tables
                    .therapeutic_class(&rule.drug)
                    .is_some_and(|class| class.contains(generic));
                if in_class && egfr < rule.egfr_threshold {
                    issues.push(SafetyIssue::for_medication(
                        Severity::High,
                        IssueCategory::Renal,
                        format!(
                            "{} ({}) contraindicated with eGFR {egfr}. Reason: {}",
                            title_case(generic),
                            rule.drug.to_uppercase(),
                            rule.reason
                        ),
                        generic,
                    ));
                }
            }
        }
        debug!(egfr, issues = issues.len(), "renal checks complete");
        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use medrec_rules::RuleTables;
    use medrec_types::{LabValues, Medication};

    use super::*;
    use crate::check::SafetyOptions;
    use crate::checks::testing::meds;

    fn run(list: &[Medication], labs: Option<&LabValues>) -> Vec<SafetyIssue> {
        let tables = RuleTables::default();
        let options = SafetyOptions::default();
        let refs: Vec<&Medication> = list.iter().collect();
        let context = CheckContext {
            medications: &refs,
            labs,
            tables: &tables,
            options: &options,
        };
        RenalCheck.run(&context).unwrap()
    }

    #[test]
    fn exact_drug_below_threshold() {
        let labs = LabValues::with_egfr(25.0);
        let issues = run(&meds(&["Metformin 500mg PO BID"]), Some(&labs));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity(), Severity::High);
        assert_eq!(issues[0].category(), IssueCategory::Renal);
        assert_eq!(issues[0].affected_meds(), ["metformin"]);
        assert_eq!(
            issues[0].description(),
            "Metformin contraindicated with eGFR 25 (threshold: 30). Reason: Lactic acidosis risk"
        );
    }

    #[test]
    fn class_rule_applies_to_members() {
        let labs = LabValues::with_egfr(20.0);
        let issues = run(&meds(&["Naproxen 250mg PO"]), Some(&labs));
        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues[0].description(),
            "Naproxen (NSAID) contraindicated with eGFR 20. Reason: Acute kidney injury risk"
        );
    }

    #[test]
    fn threshold_is_strict() {
        let labs = LabValues::with_egfr(30.0);
        assert!(run(&meds(&["Metformin 500mg"]), Some(&labs)).is_empty());
    }

    #[test]
    fn missing_labs_skip_checks() {
        let list = meds(&["Metformin 500mg", "Ibuprofen 400mg"]);
        assert!(run(&list, None).is_empty());
        assert!(run(&list, Some(&LabValues::new())).is_empty());
    }

    #[test]
    fn issues_follow_medication_order() {
        let labs = LabValues::with_egfr(15.0);
        let issues = run(&meds(&["Ibuprofen 400mg", "Metformin 500mg"]), Some(&labs));
        let affected: Vec<&str> = issues.iter().map(|i| i.affected_meds()[0].as_str()).collect();
        assert_eq!(affected, vec!["ibuprofen", "metformin"]);
    }
}
