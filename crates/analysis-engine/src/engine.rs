//! The analysis handler: provision the binary, then drive one session

use std::path::PathBuf;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::info;

use crate::analysis::{AnalysisRequest, AnalysisResult};
use crate::assets::AssetStore;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::provision::Provisioner;
use crate::session;

/// Something that can analyze a position. Implementations hold no per-call
/// state, so one value is shared by every listener.
pub trait AnalysisHandler: Send + Sync + 'static {
    fn analyze(&self, request: AnalysisRequest) -> BoxFuture<'static, Result<AnalysisResult, EngineError>>;
}

/// UCI engine handler; each call owns a fresh child process.
#[derive(Clone)]
pub struct Engine {
    config: Arc<EngineConfig>,
    provisioner: Arc<Provisioner>,
}

impl Engine {
    pub fn new(config: EngineConfig, assets: Arc<dyn AssetStore>) -> Self {
        let provisioner = Provisioner::new(&config, assets);
        Self {
            config: Arc::new(config),
            provisioner: Arc::new(provisioner),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn ensure_binary(&self) -> Result<PathBuf, EngineError> {
        self.provisioner.ensure_binary().await
    }

    pub async fn run(&self, request: &AnalysisRequest) -> Result<AnalysisResult, EngineError> {
        let binary = self.ensure_binary().await?;
        info!(fen = %request.fen, limit = request.limit, "Running engine");
        session::run_analysis(&binary, &self.config, request).await
    }
}

impl AnalysisHandler for Engine {
    fn analyze(&self, request: AnalysisRequest) -> BoxFuture<'static, Result<AnalysisResult, EngineError>> {
        let engine = self.clone();
        async move { engine.run(&request).await }.boxed()
    }
}
