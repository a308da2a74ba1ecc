use std::io;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("port {port} unavailable: {source}")]
    PortUnavailable {
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed request: {0}")]
    Malformed(&'static str),
}

/// Errors reported to the host runtime through the plugin call surface
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("start failed: {0}")]
    StartFailed(String),

    #[error("engine copy failed: {0}")]
    EngineCopy(String),

    #[error("engine error: {0}")]
    Engine(String),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(&'static str),
}
