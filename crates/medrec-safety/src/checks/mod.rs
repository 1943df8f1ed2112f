//! Built-in safety checks.

pub mod duplication;
pub mod interaction;
pub mod renal;

pub use duplication::{ClassDuplicationCheck, ExactDuplicationCheck};
pub use interaction::InteractionCheck;
pub use renal::RenalCheck;
