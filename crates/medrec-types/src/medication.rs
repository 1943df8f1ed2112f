use std::fmt;

use serde::{Deserialize, Serialize};

use crate::vocab::{DosageForm, Frequency, Route};

/// Which input list a medication came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListSource {
    /// The current list ("now").
    #[serde(alias = "current")]
    Baseline,
    /// The prior list ("then").
    #[serde(alias = "prior")]
    Reference,
}

impl fmt::Display for ListSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Baseline => write!(f, "baseline"),
            Self::Reference => write!(f, "reference"),
        }
    }
}

/// How much of a medication line the normalizer understood.
///
/// Downstream code branches on this instead of assuming a parse succeeded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseConfidence {
    /// Drug name and strength were both recovered.
    Full,
    /// Drug name only, or the source flagged the mention as uncertain.
    Partial,
    /// No drug name could be recovered. Never matched on its empty key.
    Unparseable,
}

/// A canonical medication record.
///
/// `raw_input` is the caller's string verbatim and serves as the ledger
/// join key. `generic_name` is the equivalence key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub raw_input: String,
    pub name: String,
    pub generic_name: String,
    #[serde(default)]
    pub strength: Option<String>,
    #[serde(default)]
    pub normalized_dose: Option<String>,
    #[serde(default)]
    pub form: Option<DosageForm>,
    #[serde(default)]
    pub route: Option<Route>,
    #[serde(default)]
    pub frequency: Option<Frequency>,
    #[serde(default)]
    pub status: Option<ListSource>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub confidence: ParseConfidence,
}

fn default_active() -> bool {
    true
}

impl Medication {
    /// An unparsed record: only the raw input is known.
    pub fn unparseable(raw_input: impl Into<String>) -> Self {
        Self {
            raw_input: raw_input.into(),
            name: String::new(),
            generic_name: String::new(),
            strength: None,
            normalized_dose: None,
            form: None,
            route: None,
            frequency: None,
            status: None,
            is_active: true,
            confidence: ParseConfidence::Unparseable,
        }
    }

    /// Whether the record may take part in matching and safety checks.
    pub fn is_matchable(&self) -> bool {
        !self.generic_name.is_empty()
    }

    /// Set the directionality tag.
    pub fn with_source(mut self, source: ListSource) -> Self {
        self.status = Some(source);
        self
    }
}

impl fmt::Display for Medication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_matchable() {
            return write!(f, "<unparseable: {}>", self.raw_input);
        }
        write!(f, "{}", self.generic_name)?;
        if let Some(dose) = &self.normalized_dose {
            write!(f, " {dose}")?;
        }
        if let Some(form) = &self.form {
            write!(f, " {form}")?;
        }
        if let Some(route) = &self.route {
            write!(f, " {route}")?;
        }
        if let Some(freq) = &self.frequency {
            write!(f, " {freq}")?;
        }
        Ok(())
    }
}

/// A structured medication mention from the extraction collaborator.
///
/// Every field except `drug_name` is optional on the wire. Free-text fields
/// (`dose_unit`, `route`, `frequency`, `form`) are canonicalized by the
/// normalizer through the same synonym tables as raw lines.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicationMention {
    pub drug_name: String,
    #[serde(default)]
    pub dose_strength: Option<f64>,
    #[serde(default)]
    pub dose_unit: Option<String>,
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub form: Option<String>,
    #[serde(default)]
    pub is_negated: bool,
    #[serde(default)]
    pub is_historical: bool,
    #[serde(default)]
    pub is_family_history: bool,
    #[serde(default)]
    pub is_uncertain: bool,
    #[serde(default)]
    pub raw_text_snippet: String,
    #[serde(default)]
    pub list_source: Option<ListSource>,
}

impl MedicationMention {
    pub fn new(drug_name: impl Into<String>) -> Self {
        Self {
            drug_name: drug_name.into(),
            ..Self::default()
        }
    }

    /// Negated, historical and family-history mentions describe drugs the
    /// patient is not currently taking.
    pub fn is_current(&self) -> bool {
        !(self.is_negated || self.is_historical || self.is_family_history)
    }
}
