//! Patch representation and structural application.

mod applier;
mod model;
mod printer;

pub use applier::PatchApplier;
pub use model::{EditOp, Patch};
pub use printer::{EditDescription, PatchPrinter};
