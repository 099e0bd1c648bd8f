//! Pipeline stages.

pub mod concepts;
pub mod entities;
pub mod gatekeeper;
pub mod observations;
pub mod supplementary;
pub mod version_gate;
