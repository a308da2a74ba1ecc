//! Engine configuration from environment variables

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Base name of the engine binary (bundled asset name and native library stem)
    pub engine_name: String,

    /// Host-provided directory holding a pre-mounted executable, if any
    pub native_lib_dir: Option<PathBuf>,

    /// Private writable directory for the provisioned copy and the log file
    pub data_dir: PathBuf,

    /// `Threads` option; defaults to detected parallelism
    pub threads: usize,

    /// `Hash` option in MB
    pub hash_mb: u32,

    pub contempt: i32,

    pub aggressiveness: i32,

    /// MultiPV used whenever the caller asks for more than one move
    pub wide_multipv: usize,

    /// Engine-side search budget (`go movetime`)
    pub move_time: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            engine_name: "shashchess40".to_string(),
            native_lib_dir: None,
            data_dir: PathBuf::from("./data"),
            threads: num_cpus::get(),
            hash_mb: 128,
            contempt: 20,
            aggressiveness: 200,
            wide_multipv: 8,
            move_time: Duration::from_millis(900),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            engine_name: env::var("ENGINE_NAME").unwrap_or(defaults.engine_name),
            native_lib_dir: env::var("ENGINE_NATIVE_LIB_DIR").ok().map(PathBuf::from),
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            threads: env_or("ENGINE_THREADS", defaults.threads),
            hash_mb: env_or("ENGINE_HASH_MB", defaults.hash_mb),
            contempt: env_or("ENGINE_CONTEMPT", defaults.contempt),
            aggressiveness: env_or("ENGINE_AGGRESSIVENESS", defaults.aggressiveness),
            wide_multipv: env_or("ENGINE_WIDE_MULTIPV", defaults.wide_multipv),
            move_time: Duration::from_millis(env_or(
                "ENGINE_MOVE_TIME_MS",
                defaults.move_time.as_millis() as u64,
            )),
        }
    }

    /// Directory owned by this component under `data_dir`.
    pub fn private_dir(&self) -> PathBuf {
        self.data_dir.join("shashchess")
    }

    /// MultiPV for a caller limit: a single line for exactly one move,
    /// otherwise the wide search so the quality filter has enough to choose from.
    pub fn multipv_for(&self, limit: usize) -> usize {
        if limit == 1 {
            1
        } else {
            self.wide_multipv
        }
    }
}

/// Parse an environment variable, falling back to `default` when unset or malformed.
pub fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
