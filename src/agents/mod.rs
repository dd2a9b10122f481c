//! Specialist agents

pub mod specialist;

pub use specialist::{InvokeOutcome, Specialist, SpecialistBuilder};
