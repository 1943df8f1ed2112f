use std::collections::HashMap;
use std::sync::Arc;

use medrec_rules::{RuleTables, Synonym};
use medrec_types::{
    DosageForm, DoseUnit, Frequency, ListSource, Medication, MedicationMention, ParseConfidence,
    Route,
};
use regex::Regex;
use tracing::{debug, warn};

use crate::dose::DoseQuantity;
use crate::error::NormalizeError;
use crate::similarity::name_similarity;
use crate::text;

// ---------------------------------------------------------------------------
// Phrase tables
// ---------------------------------------------------------------------------

/// Synonym phrases in table order, then direct vocabulary labels with the
/// longest phrase first so "twice daily" wins over "daily".
#[derive(Clone, Debug)]
struct PhraseTable<T> {
    entries: Vec<(Vec<String>, T)>,
}

impl<T: Copy> PhraseTable<T> {
    fn build(
        synonyms: &[Synonym<T>],
        vocabulary: &[T],
        label: impl Fn(&T) -> &'static str,
    ) -> Self {
        let mut entries: Vec<(Vec<String>, T)> = synonyms
            .iter()
            .map(|s| (text::phrase_words(&s.phrase), s.canonical))
            .filter(|(words, _)| !words.is_empty())
            .collect();

        let mut direct: Vec<(Vec<String>, T)> = vocabulary
            .iter()
            .map(|v| (text::phrase_words(label(v)), *v))
            .filter(|(words, _)| !words.is_empty())
            .collect();
        direct.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        entries.extend(direct);

        Self { entries }
    }

    fn find(&self, words: &[&str]) -> Option<T> {
        self.entries
            .iter()
            .find(|(phrase, _)| text::contains_phrase(words, phrase))
            .map(|(_, value)| *value)
    }

    fn starts_at(&self, words: &[&str], at: usize) -> bool {
        self.entries
            .iter()
            .any(|(phrase, _)| text::phrase_at(words, at, phrase))
    }

    fn find_in(&self, input: &str) -> Option<T> {
        let lowered = input.to_lowercase();
        self.find(&text::words(&lowered))
    }
}

// ---------------------------------------------------------------------------
// Strength extraction
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct StrengthPattern {
    regex: Regex,
    fraction: bool,
}

struct ExtractedDose {
    strength: String,
    normalized: String,
}

const NUMBER: &str = r"([0-9]+(?:\.[0-9]+)?)";

/// Regex alternation for the given unit spellings, longest first. Units
/// ending in a letter must end on a word boundary.
fn unit_alternation(spellings: &mut Vec<String>) -> String {
    spellings.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    spellings.dedup();
    let alternatives: Vec<String> = spellings
        .iter()
        .map(|s| {
            let boundary = match s.chars().last() {
                Some(c) if c.is_alphanumeric() => r"\b",
                _ => "",
            };
            format!("{}{boundary}", regex::escape(s))
        })
        .collect();
    format!("({})", alternatives.join("|"))
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Canonicalizes medication lines and extraction records.
///
/// Built once from an immutable [`RuleTables`]; holds no per-run state, so
/// one instance can serve any number of reconciliation runs concurrently.
#[derive(Clone, Debug)]
pub struct Normalizer {
    tables: Arc<RuleTables>,
    forms: PhraseTable<DosageForm>,
    routes: PhraseTable<Route>,
    frequencies: PhraseTable<Frequency>,
    units: HashMap<String, DoseUnit>,
    strength_patterns: Vec<StrengthPattern>,
}

impl Normalizer {
    pub fn new(tables: Arc<RuleTables>) -> Result<Self, NormalizeError> {
        let forms = PhraseTable::build(&tables.form_synonyms, DosageForm::ALL, DosageForm::label);
        let routes = PhraseTable::build(&tables.route_synonyms, Route::ALL, Route::label);
        let frequencies =
            PhraseTable::build(&tables.frequency_synonyms, Frequency::ALL, Frequency::label);

        let mut units: HashMap<String, DoseUnit> = DoseUnit::ALL
            .iter()
            .map(|u| (u.label().to_string(), *u))
            .collect();
        for synonym in &tables.dose_unit_synonyms {
            units.insert(synonym.phrase.to_lowercase(), synonym.canonical);
        }

        let spellings_of = |pred: &dyn Fn(DoseUnit) -> bool| -> Vec<String> {
            units
                .iter()
                .filter(|(_, unit)| pred(**unit))
                .map(|(spelling, _)| spelling.clone())
                .collect()
        };

        let mut strength_patterns = Vec::with_capacity(DoseUnit::ALL.len() + 1);
        let fraction_units =
            unit_alternation(&mut spellings_of(&|u: DoseUnit| u.supports_fraction()));
        strength_patterns.push(StrengthPattern {
            regex: Regex::new(&format!(r"½\s*{NUMBER}\s*{fraction_units}"))?,
            fraction: true,
        });
        for unit in DoseUnit::ALL {
            let alternation = unit_alternation(&mut spellings_of(&|u: DoseUnit| u == *unit));
            strength_patterns.push(StrengthPattern {
                regex: Regex::new(&format!(r"{NUMBER}\s*{alternation}"))?,
                fraction: false,
            });
        }

        debug!(
            patterns = strength_patterns.len(),
            unit_spellings = units.len(),
            "normalizer built"
        );

        Ok(Self {
            tables,
            forms,
            routes,
            frequencies,
            units,
            strength_patterns,
        })
    }

    /// A normalizer over the built-in rule tables.
    pub fn with_defaults() -> Result<Self, NormalizeError> {
        Self::new(Arc::new(RuleTables::default()))
    }

    pub fn tables(&self) -> &Arc<RuleTables> {
        &self.tables
    }

    /// Parse a free-form medication line. Never fails.
    ///
    /// `raw_input` keeps `raw` verbatim; extraction works on a lower-cased,
    /// whitespace-collapsed copy.
    pub fn normalize(&self, raw: &str) -> Medication {
        let working = text::collapse_whitespace(raw);
        let words = text::words(&working);

        let name = self.extract_name(&working);
        let generic_name = self.resolve_generic(&name);
        let (strength, normalized_dose) = match self.extract_strength(&working) {
            Some(dose) => (Some(dose.strength), Some(dose.normalized)),
            None => (None, None),
        };
        let confidence = confidence_for(&generic_name, strength.is_some(), false);

        let med = Medication {
            raw_input: raw.to_string(),
            name,
            generic_name,
            strength,
            normalized_dose,
            form: self.forms.find(&words),
            route: self.routes.find(&words),
            frequency: self.frequencies.find(&words),
            status: None,
            is_active: true,
            confidence,
        };
        log_normalized(&med);
        med
    }

    pub fn normalize_batch<S: AsRef<str>>(&self, raws: &[S]) -> Vec<Medication> {
        raws.iter().map(|raw| self.normalize(raw.as_ref())).collect()
    }

    /// Canonicalize a structured extraction record.
    ///
    /// A mention without a drug name falls back to parsing its source
    /// snippet. Negated, historical and family-history mentions come out
    /// inactive; uncertain ones never get [`ParseConfidence::Full`].
    pub fn normalize_mention(&self, mention: &MedicationMention) -> Medication {
        let snippet = mention.raw_text_snippet.trim();
        let drug = text::collapse_whitespace(&mention.drug_name);

        let mut med = if drug.is_empty() {
            self.normalize(snippet)
        } else {
            let unit_text = mention
                .dose_unit
                .as_deref()
                .map(text::collapse_whitespace)
                .filter(|u| !u.is_empty());
            let unit = unit_text.as_deref().and_then(|u| self.units.get(u).copied());

            let (strength, normalized_dose) =
                match mention.dose_strength.filter(|v| v.is_finite() && *v >= 0.0) {
                    Some(value) => {
                        let amount = format_amount(value);
                        let strength = match &unit_text {
                            Some(u) => format!("{amount} {u}"),
                            None => amount.clone(),
                        };
                        let normalized = match (unit, &unit_text) {
                            (Some(u), _) => format!("{amount}{}", u.label()),
                            (None, Some(t)) => format!("{amount}{t}"),
                            (None, None) => amount,
                        };
                        (Some(strength), Some(normalized))
                    }
                    None => (None, None),
                };

            let raw_input = if snippet.is_empty() {
                compose_line(mention, strength.as_deref())
            } else {
                snippet.to_string()
            };

            Medication {
                raw_input,
                generic_name: self.resolve_generic(&drug),
                name: drug,
                strength,
                normalized_dose,
                form: mention.form.as_deref().and_then(|f| self.forms.find_in(f)),
                route: mention.route.as_deref().and_then(|r| self.routes.find_in(r)),
                frequency: mention
                    .frequency
                    .as_deref()
                    .and_then(|f| self.frequencies.find_in(f)),
                status: None,
                is_active: true,
                confidence: ParseConfidence::Unparseable,
            }
        };

        med.status = mention.list_source;
        med.is_active = mention.is_current();
        med.confidence = confidence_for(
            &med.generic_name,
            med.strength.is_some(),
            mention.is_uncertain,
        );
        if !med.is_active {
            debug!(generic = %med.generic_name, "mention is not a current medication");
        }
        log_normalized(&med);
        med
    }

    /// Brand→generic resolution. Total: unmapped names pass through
    /// lower-cased and whitespace-collapsed.
    pub fn resolve_generic(&self, name: &str) -> String {
        let name = text::collapse_whitespace(name);
        match self.tables.generic_for(&name) {
            Some(generic) => generic.to_string(),
            None => name,
        }
    }

    /// Equivalent iff generic name, route and normalized dose are all equal.
    /// Frequency is not compared.
    pub fn check_equivalence(&self, a: &Medication, b: &Medication) -> bool {
        a.generic_name == b.generic_name
            && a.route == b.route
            && a.normalized_dose == b.normalized_dose
    }

    /// Diagnostic similarity of two drug names after generic resolution.
    pub fn equivalence_score(&self, a: &str, b: &str) -> f64 {
        name_similarity(&self.resolve_generic(a), &self.resolve_generic(b))
    }

    /// Leading words up to the first dose, form, route or frequency.
    fn extract_name(&self, working: &str) -> String {
        let tokens: Vec<&str> = working.split(' ').filter(|t| !t.is_empty()).collect();
        let cleaned: Vec<&str> = tokens.iter().map(|t| text::trim_punctuation(t)).collect();

        let mut end = cleaned.len();
        for (i, token) in cleaned.iter().enumerate() {
            let numeric = token.starts_with(|c: char| c.is_ascii_digit() || c == '½');
            if numeric
                || self.forms.starts_at(&cleaned, i)
                || self.routes.starts_at(&cleaned, i)
                || self.frequencies.starts_at(&cleaned, i)
            {
                end = i;
                break;
            }
        }

        let candidate = tokens[..end].join(" ");
        let plain = candidate
            .chars()
            .all(|c| c.is_alphabetic() || c == '-' || c == ' ');
        if !candidate.is_empty() && plain {
            return candidate;
        }
        // A token made only of punctuation is kept as written so that
        // non-blank input never yields an empty generic name.
        tokens
            .first()
            .map(|t| match text::trim_punctuation(t) {
                "" => t.to_string(),
                trimmed => trimmed.to_string(),
            })
            .unwrap_or_default()
    }

    fn extract_strength(&self, working: &str) -> Option<ExtractedDose> {
        self.strength_patterns.iter().find_map(|pattern| {
            let caps = pattern.regex.captures(working)?;
            let strength = caps.get(0)?.as_str().trim().to_string();
            let value = caps.get(1)?.as_str();
            let unit_text = caps.get(2)?.as_str();
            self.units.get(unit_text)?;

            // Only fraction doses are rewritten; the unit stays as written.
            let normalized = if pattern.fraction {
                DoseQuantity::parse(value)
                    .and_then(DoseQuantity::halve)
                    .map(|half| format!("{half}{unit_text}"))
                    .unwrap_or_else(|| strength.clone())
            } else {
                strength.clone()
            };
            Some(ExtractedDose {
                strength,
                normalized,
            })
        })
    }
}

/// Tag every medication with the list it came from.
pub fn tag_directionality(baseline: &mut [Medication], reference: &mut [Medication]) {
    for med in baseline.iter_mut() {
        med.status = Some(ListSource::Baseline);
    }
    for med in reference.iter_mut() {
        med.status = Some(ListSource::Reference);
    }
}

fn confidence_for(generic_name: &str, has_strength: bool, uncertain: bool) -> ParseConfidence {
    if generic_name.is_empty() {
        ParseConfidence::Unparseable
    } else if has_strength && !uncertain {
        ParseConfidence::Full
    } else {
        ParseConfidence::Partial
    }
}

fn format_amount(value: f64) -> String {
    let written = format!("{value}");
    DoseQuantity::parse(&written)
        .map(|q| q.to_compact_string())
        .unwrap_or(written)
}

fn compose_line(mention: &MedicationMention, strength: Option<&str>) -> String {
    let mut parts = vec![mention.drug_name.trim().to_string()];
    parts.extend(strength.map(str::to_string));
    parts.extend(mention.route.iter().map(|r| r.trim().to_string()));
    parts.extend(mention.frequency.iter().map(|f| f.trim().to_string()));
    parts.retain(|p| !p.is_empty());
    parts.join(" ")
}

fn log_normalized(med: &Medication) {
    if med.is_matchable() {
        debug!(
            raw = %med.raw_input,
            generic = %med.generic_name,
            dose = ?med.normalized_dose,
            route = ?med.route,
            frequency = ?med.frequency,
            "normalized medication"
        );
    } else {
        warn!(raw = %med.raw_input, "medication could not be parsed");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
