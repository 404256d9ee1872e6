//! shadowtape: bar-by-bar market replay with indicator overlays, simulated
//! entries and a trade-reasoning quiz.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
