//! Embedded HTTP bridge in front of the UCI analysis engine.
//!
//! Two listeners (primary on all interfaces, mirror on loopback) share one
//! [`routes::Handler`]; analysis requests go through a deadline-bounded
//! [`analysis_engine::ExecutionBridge`].

pub mod config;
pub mod error;
pub mod http;
pub mod listener;
pub mod log_sink;
pub mod plugin;
pub mod routes;
pub mod static_files;

pub use config::Config;
pub use error::{PluginError, ServerError};
pub use log_sink::LogSink;
pub use plugin::AnalysisPlugin;
