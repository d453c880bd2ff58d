//! Domain types: caregiver logs, lexicon terms, clinical events.

mod clinical;
mod lexicon;
mod log;

pub use clinical::*;
pub use lexicon::*;
pub use log::*;
