use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lab values supplied by the lab/context collaborator.
///
/// Keys are lower-case lab names; `egfr` is in mL/min/1.73m². Non-numeric
/// entries in a parsed lab map are skipped.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Value>")]
pub struct LabValues(BTreeMap<String, f64>);

impl From<BTreeMap<String, Value>> for LabValues {
    fn from(values: BTreeMap<String, Value>) -> Self {
        let mut labs = Self::new();
        for (name, value) in values {
            if let Some(number) = value.as_f64() {
                labs.insert(name, number);
            }
        }
        labs
    }
}

impl LabValues {
    pub const EGFR: &'static str = "egfr";

    pub fn new() -> Self {
        Self::default()
    }

    /// Lab context holding only an eGFR value.
    pub fn with_egfr(egfr: f64) -> Self {
        let mut labs = Self::new();
        labs.insert(Self::EGFR, egfr);
        labs
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into().to_lowercase(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(&name.to_lowercase()).copied()
    }

    pub fn egfr(&self) -> Option<f64> {
        self.get(Self::EGFR)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_map() {
        let labs: LabValues = serde_json::from_str(r#"{"egfr": 25, "alt": 40.5}"#).unwrap();
        assert_eq!(labs.egfr(), Some(25.0));
        assert_eq!(labs.get("ALT"), Some(40.5));
    }

    #[test]
    fn non_numeric_entries_are_skipped() {
        let labs: LabValues =
            serde_json::from_str(r#"{"egfr": 25, "note": "fasting", "k": null, "flags": [1]}"#)
                .unwrap();
        assert_eq!(labs.egfr(), Some(25.0));
        assert_eq!(labs.get("note"), None);
        assert_eq!(labs.get("k"), None);
        assert_eq!(serde_json::to_string(&labs).unwrap(), r#"{"egfr":25.0}"#);
    }

    #[test]
    fn missing_egfr_is_none() {
        assert_eq!(LabValues::new().egfr(), None);
        assert!(LabValues::new().is_empty());
    }

    #[test]
    fn names_are_case_insensitive() {
        let mut labs = LabValues::new();
        labs.insert("eGFR", 55.0);
        assert_eq!(labs.egfr(), Some(55.0));

        let parsed: LabValues = serde_json::from_str(r#"{"eGFR": 25}"#).unwrap();
        assert_eq!(parsed.egfr(), Some(25.0));
        assert_eq!(serde_json::to_string(&parsed).unwrap(), r#"{"egfr":25.0}"#);
    }
}
