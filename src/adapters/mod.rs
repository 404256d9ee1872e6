//! Concrete adapter implementations for ports, plus the interactive session
//! that wires them to the engine.

#[cfg(feature = "http")]
pub mod chat_quiz_adapter;
pub mod console_sink;
pub mod csv_adapter;
pub mod disabled_quiz_adapter;
pub mod file_config_adapter;
pub mod json_bar_adapter;
pub mod json_frame_sink;
#[cfg(feature = "http")]
pub mod quiz_service_adapter;
pub mod session;
pub mod ticker;
