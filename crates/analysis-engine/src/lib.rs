//! UCI engine driver for position analysis.
//!
//! Spawns one engine process per request, runs a timed MultiPV search, and
//! ranks the reported lines into a quality-tagged move list.

pub mod analysis;
pub mod assets;
pub mod bridge;
pub mod config;
pub mod engine;
pub mod error;
pub mod provision;
pub mod ranking;
pub mod session;
pub mod uci;

pub use analysis::{AnalysisRequest, AnalysisResult, Quality, RankedMove};
pub use assets::{AssetStore, DirAssetStore};
pub use bridge::ExecutionBridge;
pub use config::EngineConfig;
pub use engine::{AnalysisHandler, Engine};
pub use error::EngineError;
