//! Core domain types and logic.

pub mod bar;
pub mod config_validation;
pub mod error;
pub mod indicator;
pub mod position;
pub mod quiz;
pub mod replay;
pub mod studies;
