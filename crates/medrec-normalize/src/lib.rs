//! Medication normalization.
//!
//! [`Normalizer`] turns free-form medication lines ("Lipitor 20mg tab PO
//! qhs") and structured extraction records into canonical
//! [`Medication`](medrec_types::Medication) values that can be compared with
//! [`Normalizer::check_equivalence`].
//!
//! Parsing never fails. Fields that cannot be recovered are `None`, and the
//! record's [`ParseConfidence`](medrec_types::ParseConfidence) says how much
//! was understood.

pub mod dose;
pub mod error;
pub mod normalizer;
pub mod similarity;
pub mod text;

pub use dose::DoseQuantity;
pub use error::NormalizeError;
pub use normalizer::{tag_directionality, Normalizer};
