use std::env;
use std::path::PathBuf;
use std::time::Duration;

use analysis_engine::bridge::{ANALYZE_DEADLINE, SELFTEST_DEADLINE};
use analysis_engine::config::env_or;
use analysis_engine::EngineConfig;

#[derive(Clone, Debug)]
pub struct Config {
    /// Primary listener, all interfaces by default
    pub host: String,
    pub port: u16,
    /// Mirror listener, loopback only by default
    pub mirror_host: String,
    pub mirror_port: u16,
    /// Root of the bundled asset tree (`www/`)
    pub asset_root: PathBuf,
    pub selftest_timeout: Duration,
    pub analyze_timeout: Duration,
    /// Upper bound on reading one request
    pub read_timeout: Duration,
    pub engine: EngineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3667,
            mirror_host: "127.0.0.1".to_string(),
            mirror_port: 3669,
            asset_root: PathBuf::from("./www"),
            selftest_timeout: SELFTEST_DEADLINE,
            analyze_timeout: ANALYZE_DEADLINE,
            read_timeout: Duration::from_secs(10),
            engine: EngineConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env_or("PORT", defaults.port),
            mirror_host: env::var("MIRROR_HOST").unwrap_or(defaults.mirror_host),
            mirror_port: env_or("MIRROR_PORT", defaults.mirror_port),
            asset_root: env::var("ASSET_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.asset_root),
            selftest_timeout: Duration::from_millis(env_or(
                "SELFTEST_TIMEOUT_MS",
                defaults.selftest_timeout.as_millis() as u64,
            )),
            analyze_timeout: Duration::from_millis(env_or(
                "ANALYZE_TIMEOUT_MS",
                defaults.analyze_timeout.as_millis() as u64,
            )),
            read_timeout: Duration::from_secs(env_or(
                "READ_TIMEOUT_SECS",
                defaults.read_timeout.as_secs(),
            )),
            engine: EngineConfig::from_env(),
        }
    }
}
