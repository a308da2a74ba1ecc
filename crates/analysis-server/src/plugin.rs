//! Host-facing component: owns the engine, both listeners and the log.

use std::net::SocketAddr;
use std::sync::Arc;

use analysis_engine::analysis::DEFAULT_LIMIT;
use analysis_engine::{AnalysisRequest, AnalysisResult, DirAssetStore, Engine, ExecutionBridge};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::config::Config;
use crate::error::{PluginError, ServerError};
use crate::listener::ServerInstance;
use crate::log_sink::LogSink;
use crate::routes::Handler;
use crate::static_files::StaticAssets;

/// The primary and mirror listeners
struct Listeners {
    primary: ServerInstance,
    mirror: ServerInstance,
}

pub struct AnalysisPlugin {
    config: Config,
    engine: Engine,
    handler: Arc<Handler>,
    listeners: Mutex<Option<Listeners>>,
    last_start_error: std::sync::Mutex<Option<String>>,
}

impl AnalysisPlugin {
    pub fn new(config: Config, log: Arc<LogSink>) -> Self {
        let store = Arc::new(DirAssetStore::new(&config.asset_root));
        let engine = Engine::new(config.engine.clone(), store.clone());
        let handler = Handler::new(
            ExecutionBridge::new(Arc::new(engine.clone())),
            StaticAssets::new(store),
            log,
            config.selftest_timeout,
            config.analyze_timeout,
        );
        Self {
            config,
            engine,
            handler: Arc::new(handler),
            listeners: Mutex::new(None),
            last_start_error: std::sync::Mutex::new(None),
        }
    }

    /// Prepare the private directory, then start serving.
    pub async fn initialize(&self) -> Result<(), PluginError> {
        let dir = self.config.engine.private_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| PluginError::StartFailed(format!("{}: {e}", dir.display())))?;
        self.start().await
    }

    /// Bind both listeners. Calling this while already running is a no-op.
    pub async fn start(&self) -> Result<(), PluginError> {
        let mut listeners = self.listeners.lock().await;
        if listeners.is_some() {
            return Ok(());
        }

        info!("Starting HTTP servers");
        match self.bind_listeners().await {
            Ok(bound) => {
                *listeners = Some(bound);
                self.set_last_start_error(None);
                info!("Servers started");
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                error!(error = %message, "Server start failed");
                self.set_last_start_error(Some(message.clone()));
                Err(PluginError::StartFailed(message))
            }
        }
    }

    async fn bind_listeners(&self) -> Result<Listeners, ServerError> {
        let config = &self.config;

        // Probe the primary port before committing to anything
        let probe = TcpListener::bind((config.host.as_str(), config.port))
            .await
            .map_err(|source| ServerError::PortUnavailable {
                port: config.port,
                source,
            })?;
        drop(probe);

        let primary = ServerInstance::bind(
            &config.host,
            config.port,
            self.handler.clone(),
            config.read_timeout,
        )
        .await?;
        let mirror = match ServerInstance::bind(
            &config.mirror_host,
            config.mirror_port,
            self.handler.clone(),
            config.read_timeout,
        )
        .await
        {
            Ok(mirror) => mirror,
            Err(e) => {
                primary.stop().await;
                return Err(e);
            }
        };

        Ok(Listeners { primary, mirror })
    }

    /// Stop both listeners; a later `start` binds again.
    pub async fn stop(&self) {
        if let Some(Listeners { primary, mirror }) = self.listeners.lock().await.take() {
            primary.stop().await;
            mirror.stop().await;
        }
    }

    pub async fn is_running(&self) -> bool {
        match self.listeners.lock().await.as_ref() {
            Some(l) => l.primary.is_running() && l.mirror.is_running(),
            None => false,
        }
    }

    /// Bound `(primary, mirror)` addresses while running
    pub async fn local_addrs(&self) -> Option<(SocketAddr, SocketAddr)> {
        self.listeners
            .lock()
            .await
            .as_ref()
            .map(|l| (l.primary.local_addr(), l.mirror.local_addr()))
    }

    pub fn last_start_error(&self) -> Option<String> {
        self.last_start_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set_last_start_error(&self, message: Option<String>) {
        *self
            .last_start_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = message;
    }

    /// Run one analysis off the caller's task.
    pub async fn analyze(&self, fen: &str, limit: i64) -> Result<AnalysisResult, PluginError> {
        self.engine
            .ensure_binary()
            .await
            .map_err(|e| PluginError::EngineCopy(e.to_string()))?;

        let engine = self.engine.clone();
        let request = AnalysisRequest::new(fen, limit);
        tokio::spawn(async move { engine.run(&request).await })
            .await
            .map_err(|e| PluginError::Engine(e.to_string()))?
            .map_err(|e| PluginError::Engine(e.to_string()))
    }

    /// Host dispatch by action name.
    pub async fn execute(&self, action: &str, args: &[Value]) -> Result<Value, PluginError> {
        info!(action, "execute");
        match action {
            "start" => {
                self.start().await?;
                Ok(Value::from("started"))
            }
            "analyze" => {
                let fen = args
                    .first()
                    .and_then(Value::as_str)
                    .ok_or(PluginError::InvalidArguments("analyze expects a FEN string"))?;
                let limit = args
                    .get(1)
                    .and_then(Value::as_i64)
                    .unwrap_or(DEFAULT_LIMIT as i64);
                let result = self.analyze(fen, limit).await?;
                serde_json::to_value(result).map_err(|e| PluginError::Engine(e.to_string()))
            }
            other => Err(PluginError::UnknownAction(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &std::path::Path) -> Config {
        let mut config = Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            mirror_port: 0,
            asset_root: dir.join("www"),
            ..Config::default()
        };
        config.engine.data_dir = dir.join("data");
        config
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let plugin = AnalysisPlugin::new(config(dir.path()), LogSink::in_memory());

        plugin.start().await.unwrap();
        let first = plugin.local_addrs().await.unwrap();
        plugin.start().await.unwrap();
        assert_eq!(plugin.local_addrs().await.unwrap(), first);
        assert!(plugin.is_running().await);
        assert!(plugin.last_start_error().is_none());

        plugin.stop().await;
        assert!(!plugin.is_running().await);
        assert!(plugin.local_addrs().await.is_none());
    }

    #[tokio::test]
    async fn test_busy_port_records_start_error() {
        let dir = tempfile::tempdir().unwrap();
        let squatter = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let mut config = config(dir.path());
        config.port = squatter.local_addr().unwrap().port();

        let plugin = AnalysisPlugin::new(config, LogSink::in_memory());
        let err = plugin.start().await.unwrap_err();
        assert!(err.to_string().starts_with("start failed: port"));
        assert!(plugin.last_start_error().is_some());
        assert!(!plugin.is_running().await);
    }

    #[tokio::test]
    async fn test_unknown_action() {
        let dir = tempfile::tempdir().unwrap();
        let plugin = AnalysisPlugin::new(config(dir.path()), LogSink::in_memory());
        let err = plugin.execute("explode", &[]).await.unwrap_err();
        assert_eq!(err.to_string(), "unknown action: explode");
    }

    #[tokio::test]
    async fn test_analyze_without_engine_is_copy_failure() {
        let dir = tempfile::tempdir().unwrap();
        let plugin = AnalysisPlugin::new(config(dir.path()), LogSink::in_memory());
        let err = plugin
            .execute("analyze", &[Value::from("8/8/8/8/8/8/8/K6k w - - 0 1")])
            .await
            .unwrap_err();
        assert!(matches!(err, PluginError::EngineCopy(_)));
    }

    #[tokio::test]
    async fn test_analyze_requires_fen() {
        let dir = tempfile::tempdir().unwrap();
        let plugin = AnalysisPlugin::new(config(dir.path()), LogSink::in_memory());
        let err = plugin.execute("analyze", &[Value::from(3)]).await.unwrap_err();
        assert!(matches!(err, PluginError::InvalidArguments(_)));
    }
}
