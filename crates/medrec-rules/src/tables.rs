use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use medrec_types::{DosageForm, DoseUnit, Frequency, Route};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::defaults;
use crate::error::RulesError;

// ---------------------------------------------------------------------------
// Table rows
// ---------------------------------------------------------------------------

/// A free-text phrase that canonicalizes to a vocabulary member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synonym<T> {
    pub phrase: String,
    pub canonical: T,
}

/// A named group of pharmacologically interchangeable drugs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TherapeuticClass {
    pub name: String,
    pub members: Vec<String>,
}

impl TherapeuticClass {
    pub fn new(name: &str, members: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            members: members.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn contains(&self, generic: &str) -> bool {
        self.members.iter().any(|m| m == generic)
    }
}

/// A high-severity drug pair. Either side may name a drug or a class token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRule {
    pub drug1: String,
    pub drug2: String,
    pub risk: String,
}

impl InteractionRule {
    pub fn new(drug1: &str, drug2: &str, risk: &str) -> Self {
        Self {
            drug1: drug1.to_string(),
            drug2: drug2.to_string(),
            risk: risk.to_string(),
        }
    }
}

/// eGFR threshold below which a drug (or every member of a class) is
/// contraindicated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenalRule {
    pub drug: String,
    pub egfr_threshold: f64,
    pub reason: String,
}

impl RenalRule {
    pub fn new(drug: &str, egfr_threshold: f64, reason: &str) -> Self {
        Self {
            drug: drug.to_string(),
            egfr_threshold,
            reason: reason.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Rule tables
// ---------------------------------------------------------------------------

/// The complete, immutable rule-table set for one reconciliation context.
///
/// All keys are lower-case. Table order is significant: safety checks emit
/// issues in the order rows appear here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleTables {
    pub brand_to_generic: BTreeMap<String, String>,
    pub route_synonyms: Vec<Synonym<Route>>,
    pub frequency_synonyms: Vec<Synonym<Frequency>>,
    pub form_synonyms: Vec<Synonym<DosageForm>>,
    pub dose_unit_synonyms: Vec<Synonym<DoseUnit>>,
    pub therapeutic_classes: Vec<TherapeuticClass>,
    pub interactions: Vec<InteractionRule>,
    pub renal_contraindications: Vec<RenalRule>,
}

impl Default for RuleTables {
    fn default() -> Self {
        Self {
            brand_to_generic: defaults::brand_to_generic(),
            route_synonyms: defaults::route_synonyms(),
            frequency_synonyms: defaults::frequency_synonyms(),
            form_synonyms: defaults::form_synonyms(),
            dose_unit_synonyms: defaults::dose_unit_synonyms(),
            therapeutic_classes: defaults::therapeutic_classes(),
            interactions: defaults::interactions(),
            renal_contraindications: defaults::renal_contraindications(),
        }
    }
}

impl RuleTables {
    /// Parse tables from TOML and validate them. Tables the document omits
    /// keep their built-in contents.
    pub fn from_toml(input: &str) -> Result<Self, RulesError> {
        let tables: RuleTables =
            toml::from_str(input).map_err(|e| RulesError::Parse(e.to_string()))?;
        tables.validate()?;
        debug!(
            brands = tables.brand_to_generic.len(),
            classes = tables.therapeutic_classes.len(),
            interactions = tables.interactions.len(),
            renal = tables.renal_contraindications.len(),
            "rule tables parsed"
        );
        Ok(tables)
    }

    /// Read and parse a TOML rule file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RulesError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|e| RulesError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml(&input)
    }

    /// Render the tables as TOML.
    pub fn to_toml(&self) -> Result<String, RulesError> {
        toml::to_string(self).map_err(|e| RulesError::Serialize(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), RulesError> {
        for (brand, generic) in &self.brand_to_generic {
            check_key("brand", brand)?;
            check_key("generic", generic)?;
        }

        check_phrases("route synonym", self.route_synonyms.iter().map(|s| &s.phrase))?;
        check_phrases(
            "frequency synonym",
            self.frequency_synonyms.iter().map(|s| &s.phrase),
        )?;
        check_phrases("form synonym", self.form_synonyms.iter().map(|s| &s.phrase))?;
        check_phrases(
            "dose unit synonym",
            self.dose_unit_synonyms.iter().map(|s| &s.phrase),
        )?;

        let mut class_names = HashSet::new();
        for class in &self.therapeutic_classes {
            check_key("therapeutic class", &class.name)?;
            if !class_names.insert(class.name.as_str()) {
                return Err(RulesError::Validation(format!(
                    "therapeutic class '{}' is defined more than once",
                    class.name
                )));
            }
            if class.members.is_empty() {
                return Err(RulesError::Validation(format!(
                    "therapeutic class '{}' has no members",
                    class.name
                )));
            }
            for member in &class.members {
                check_key("class member", member)?;
            }
        }

        for rule in &self.interactions {
            check_key("interaction drug", &rule.drug1)?;
            check_key("interaction drug", &rule.drug2)?;
            if rule.risk.trim().is_empty() {
                return Err(RulesError::Validation(format!(
                    "interaction '{} + {}' has no risk text",
                    rule.drug1, rule.drug2
                )));
            }
        }

        for rule in &self.renal_contraindications {
            check_key("renal drug", &rule.drug)?;
            if !rule.egfr_threshold.is_finite() || rule.egfr_threshold <= 0.0 {
                return Err(RulesError::Validation(format!(
                    "renal threshold for '{}' must be a positive number, got {}",
                    rule.drug, rule.egfr_threshold
                )));
            }
            if rule.reason.trim().is_empty() {
                return Err(RulesError::Validation(format!(
                    "renal rule for '{}' has no reason",
                    rule.drug
                )));
            }
        }

        Ok(())
    }

    /// Resolve a brand name to its generic. Case-insensitive.
    pub fn generic_for(&self, name: &str) -> Option<&str> {
        self.brand_to_generic
            .get(&name.to_lowercase())
            .map(String::as_str)
    }

    /// Look up a therapeutic class by name. Case-insensitive.
    pub fn therapeutic_class(&self, name: &str) -> Option<&TherapeuticClass> {
        let name = name.to_lowercase();
        self.therapeutic_classes.iter().find(|c| c.name == name)
    }

    /// Classes that list `generic` as a member, in table order.
    pub fn classes_of<'a>(
        &'a self,
        generic: &'a str,
    ) -> impl Iterator<Item = &'a TherapeuticClass> + 'a {
        self.therapeutic_classes
            .iter()
            .filter(move |c| c.contains(generic))
    }
}

fn check_key(what: &str, key: &str) -> Result<(), RulesError> {
    if key.trim().is_empty() {
        return Err(RulesError::Validation(format!("{what} must not be empty")));
    }
    if key != key.trim() || key.chars().any(char::is_uppercase) {
        return Err(RulesError::Validation(format!(
            "{what} '{key}' must be trimmed lower-case"
        )));
    }
    Ok(())
}

fn check_phrases<'a>(
    what: &str,
    phrases: impl Iterator<Item = &'a String>,
) -> Result<(), RulesError> {
    let mut seen = HashSet::new();
    for phrase in phrases {
        check_key(what, phrase)?;
        if !seen.insert(phrase.as_str()) {
            return Err(RulesError::Validation(format!(
                "{what} '{phrase}' is listed more than once"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
