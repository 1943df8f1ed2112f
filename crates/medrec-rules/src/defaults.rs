//! Built-in clinical tables.

use std::collections::BTreeMap;

use medrec_types::{DosageForm, DoseUnit, Frequency, Route};

use crate::tables::{InteractionRule, RenalRule, Synonym, TherapeuticClass};

pub fn brand_to_generic() -> BTreeMap<String, String> {
    [
        ("tylenol", "acetaminophen"),
        ("motrin", "ibuprofen"),
        ("advil", "ibuprofen"),
        ("lasix", "furosemide"),
        ("glucophage", "metformin"),
        ("lipitor", "atorvastatin"),
        ("zocor", "simvastatin"),
        ("norvasc", "amlodipine"),
        ("prilosec", "omeprazole"),
        ("nexium", "esomeprazole"),
        ("prozac", "fluoxetine"),
        ("zoloft", "sertraline"),
        ("synthroid", "levothyroxine"),
        ("coumadin", "warfarin"),
        ("plavix", "clopidogrel"),
    ]
    .into_iter()
    .map(|(brand, generic)| (brand.to_string(), generic.to_string()))
    .collect()
}

pub fn route_synonyms() -> Vec<Synonym<Route>> {
    synonyms(&[
        ("by mouth", Route::Po),
        ("oral", Route::Po),
        ("orally", Route::Po),
        ("intravenous", Route::Iv),
        ("intramuscular", Route::Im),
        ("subcutaneous", Route::Sq),
        ("subq", Route::Sq),
        ("sublingual", Route::Sl),
        ("rectal", Route::Pr),
        ("inhalation", Route::Inhaled),
    ])
}

pub fn frequency_synonyms() -> Vec<Synonym<Frequency>> {
    synonyms(&[
        ("once daily", Frequency::Daily),
        ("once a day", Frequency::Daily),
        ("qd", Frequency::Daily),
        ("bid", Frequency::TwiceDaily),
        ("twice a day", Frequency::TwiceDaily),
        ("tid", Frequency::ThreeTimesDaily),
        ("qid", Frequency::FourTimesDaily),
        ("qhs", Frequency::AtBedtime),
        ("qam", Frequency::EveryMorning),
        ("prn", Frequency::AsNeeded),
        ("q4h", Frequency::Every4Hours),
        ("q6h", Frequency::Every6Hours),
        ("q8h", Frequency::Every8Hours),
        ("q12h", Frequency::Every12Hours),
    ])
}

pub fn form_synonyms() -> Vec<Synonym<DosageForm>> {
    synonyms(&[
        ("tab", DosageForm::Tablet),
        ("tabs", DosageForm::Tablet),
        ("tablets", DosageForm::Tablet),
        ("cap", DosageForm::Capsule),
        ("caps", DosageForm::Capsule),
        ("capsules", DosageForm::Capsule),
    ])
}

pub fn dose_unit_synonyms() -> Vec<Synonym<DoseUnit>> {
    synonyms(&[
        ("milligrams", DoseUnit::Mg),
        ("milligram", DoseUnit::Mg),
        ("micrograms", DoseUnit::Mcg),
        ("microgram", DoseUnit::Mcg),
        ("ug", DoseUnit::Mcg),
        ("µg", DoseUnit::Mcg),
        ("milliliters", DoseUnit::Ml),
        ("milliliter", DoseUnit::Ml),
        ("unit", DoseUnit::Units),
        ("iu", DoseUnit::Units),
    ])
}

pub fn therapeutic_classes() -> Vec<TherapeuticClass> {
    vec![
        TherapeuticClass::new("nsaid", &["ibuprofen", "naproxen", "ketorolac", "diclofenac"]),
        TherapeuticClass::new("ssri", &["fluoxetine", "sertraline", "citalopram", "escitalopram"]),
        TherapeuticClass::new(
            "statin",
            &["atorvastatin", "simvastatin", "rosuvastatin", "pravastatin"],
        ),
        TherapeuticClass::new(
            "ppi",
            &["omeprazole", "pantoprazole", "esomeprazole", "lansoprazole"],
        ),
    ]
}

pub fn interactions() -> Vec<InteractionRule> {
    vec![
        InteractionRule::new("warfarin", "nsaid", "Major bleeding"),
        InteractionRule::new("methotrexate", "nsaid", "Methotrexate toxicity"),
        InteractionRule::new("ssri", "maoi", "Serotonin syndrome"),
    ]
}

pub fn renal_contraindications() -> Vec<RenalRule> {
    vec![
        RenalRule::new("metformin", 30.0, "Lactic acidosis risk"),
        RenalRule::new("nsaid", 30.0, "Acute kidney injury risk"),
        RenalRule::new("dabigatran", 30.0, "Increased bleeding risk"),
    ]
}

fn synonyms<T: Copy>(pairs: &[(&str, T)]) -> Vec<Synonym<T>> {
    pairs
        .iter()
        .map(|(phrase, canonical)| Synonym {
            phrase: phrase.to_string(),
            canonical: *canonical,
        })
        .collect()
}
