//! Closed vocabularies shared across the workspace.
//!
//! Each vocabulary is a fieldless enum whose serialized form, `Display`
//! output and `FromStr` input are the same canonical label.

/// Declares a closed vocabulary enum with `label()`, `ALL`, `Display` and
/// `FromStr` derived from a single label table.
macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $label)] $variant, )+
        }

        impl $name {
            /// Every member, in vocabulary order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Canonical label.
            pub fn label(&self) -> &'static str {
                match self {
                    $( Self::$variant => $label, )+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.label())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::error::TypeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label() == s)
                    .ok_or_else(|| $crate::error::TypeError::UnknownLabel {
                        vocabulary: $kind,
                        value: s.to_string(),
                        allowed: Self::ALL
                            .iter()
                            .map(|v| v.label())
                            .collect::<Vec<_>>()
                            .join(", "),
                    })
            }
        }
    };
}

pub(crate) use vocabulary;

vocabulary! {
    /// Canonical route of administration.
    Route ("route") {
        Po => "po",
        Iv => "iv",
        Im => "im",
        Sq => "sq",
        Sl => "sl",
        Pr => "pr",
        Topical => "topical",
        Inhaled => "inhaled",
    }
}

vocabulary! {
    /// Canonical administration frequency.
    Frequency ("frequency") {
        Daily => "daily",
        TwiceDaily => "twice daily",
        ThreeTimesDaily => "three times daily",
        FourTimesDaily => "four times daily",
        AtBedtime => "at bedtime",
        EveryMorning => "every morning",
        AsNeeded => "as needed",
        Every4Hours => "every 4 hours",
        Every6Hours => "every 6 hours",
        Every8Hours => "every 8 hours",
        Every12Hours => "every 12 hours",
    }
}

vocabulary! {
    /// Dosage form.
    DosageForm ("dosage form") {
        Tablet => "tablet",
        Capsule => "capsule",
        Injection => "injection",
        Solution => "solution",
        Cream => "cream",
        Ointment => "ointment",
        Gel => "gel",
        Patch => "patch",
        Inhaler => "inhaler",
        Drops => "drops",
    }
}

vocabulary! {
    /// Dose unit recognized in strength expressions.
    DoseUnit ("dose unit") {
        Mg => "mg",
        Mcg => "mcg",
        Ml => "ml",
        Percent => "%",
        Units => "units",
    }
}

impl DoseUnit {
    /// Whether the unit may follow the half-dose marker (`½ 10mg`).
    pub fn supports_fraction(&self) -> bool {
        matches!(self, Self::Mg | Self::Mcg | Self::Ml)
    }
}
