use medrec_types::{IssueCategory, SafetyIssue, Severity};
use tracing::debug;

use crate::check::{CheckContext, SafetyCheck};
use crate::error::SafetyError;

/// Flags configured high-severity drug pairs.
///
/// A token is present when some generic name contains it as a substring.
/// With [`SafetyOptions::expand_class_tokens`](crate::SafetyOptions) a token
/// naming a therapeutic class also matches that class's members.
pub struct InteractionCheck;

impl InteractionCheck {
    fn matches<'m>(context: &CheckContext<'m>, token: &str) -> Vec<&'m str> {
        let class = if context.options.expand_class_tokens {
            context.tables.therapeutic_class(token)
        } else {
            None
        };
        let mut matched: Vec<&'m str> = Vec::new();
        for med in context.medications.iter().copied() {
            let generic = med.generic_name.as_str();
            let hit = generic.contains(token) || class.is_some_and(|c| c.contains(generic));
            if hit && !matched.contains(&generic) {
                matched.push(generic);
            }
        }
        matched
    }
}

impl SafetyCheck for InteractionCheck {
    fn name(&self) -> &str {
        "interaction"
    }

    fn run(&self, context: &CheckContext<'_>) -> Result<Vec<SafetyIssue>, SafetyError> {
        let mut issues = Vec::new();
        for rule in &context.tables.interactions {
            let first = Self::matches(context, &rule.drug1);
            let second = Self::matches(context, &rule.drug2);
            if first.is_empty() || second.is_empty() {
                continue;
            }

            let mut affected: Vec<String> = Vec::new();
            for generic in first.into_iter().chain(second) {
                if !affected.iter().any(|a| a == generic) {
                    affected.push(generic.to_string());
                }
            }
            debug!(
                drug1 = %rule.drug1,
                drug2 = %rule.drug2,
                affected = ?affected,
                "interaction triggered"
            );
            issues.push(SafetyIssue::new(
                Severity::High,
                IssueCategory::Interaction,
                format!(
                    "{} + {}: {}",
                    title_case(&rule.drug1),
                    title_case(&rule.drug2),
                    rule.risk
                ),
                affected,
            )?);
        }
        Ok(issues)
    }
}

pub(crate) fn title_case(input: &str) -> String {
    input
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
