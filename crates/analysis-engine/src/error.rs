//! Engine error types

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to start engine process: {0}")]
    ProcessStart(#[source] io::Error),

    /// The engine closed its output before acknowledging a handshake step.
    #[error("{0}")]
    Handshake(&'static str),

    #[error("Engine I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Provisioning error: {0}")]
    Provisioning(String),

    #[error("engine timeout")]
    Timeout,
}
