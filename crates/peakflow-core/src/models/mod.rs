//! Domain models for peak flow follow-up.

mod checklist;
mod patient;
mod visit;

pub use checklist::*;
pub use patient::*;
pub use visit::*;
