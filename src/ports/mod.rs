//! Port traits at the edges of the replay engine.

pub mod bar_port;
pub mod config_port;
pub mod quiz_port;
pub mod render_port;
