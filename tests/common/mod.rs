#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use analysis_server::{AnalysisPlugin, Config, LogSink};
use reqwest::Client;
use tempfile::TempDir;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Fake UCI engine. Reports five lines when MultiPV > 1, one otherwise.
pub const FAKE_ENGINE: &str = r#"#!/bin/sh
mpv=1
while IFS= read -r line; do
  case "$line" in
    uci) echo "id name FakeFish"; echo "uciok" ;;
    isready) echo "readyok" ;;
    "setoption name MultiPV value "*) mpv="${line##* }" ;;
    go*)
      echo "info depth 12 seldepth 16 multipv 1 score cp 18 nodes 9000 pv e2e4 e7e5 g1f3"
      if [ "$mpv" -gt 1 ]; then
        echo "info depth 12 seldepth 15 multipv 2 score cp 15 nodes 9000 pv d2d4 d7d5"
        echo "info depth 12 seldepth 14 multipv 3 score cp -2 nodes 9000 pv g1f3 d7d5"
        echo "info depth 12 seldepth 14 multipv 4 score cp -20 nodes 9000 pv c2c4 e7e5"
        echo "info depth 12 seldepth 13 multipv 5 score cp -60 nodes 9000 pv a2a3 e7e5"
      fi
      echo "bestmove e2e4 ponder e7e5" ;;
    quit) exit 0 ;;
  esac
done
"#;

/// Engine that stalls on `go`; creates `marker` only if it is never killed.
pub fn slow_engine(marker: &Path) -> String {
    FAKE_ENGINE.replace(
        "    go*)\n",
        &format!("    go*)\n      sleep 2; touch '{}'\n", marker.display()),
    )
}

/// Engine that never completes the handshake.
pub const MUTE_ENGINE: &str = "#!/bin/sh\nread line\necho 'id name Mute'\n";

pub struct TestServer {
    pub plugin: AnalysisPlugin,
    pub log: Arc<LogSink>,
    pub primary: String,
    pub mirror: String,
    pub dir: TempDir,
}

impl TestServer {
    /// Build a URL on the primary listener.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.primary, path)
    }

    pub fn mirror_url(&self, path: &str) -> String {
        format!("{}{}", self.mirror, path)
    }

    pub fn www(&self) -> std::path::PathBuf {
        self.dir.path().join("www")
    }
}

/// Write a file under `root`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, body).unwrap();
}

#[cfg(unix)]
fn install_engine(native_dir: &Path, script: &str) {
    use std::os::unix::fs::PermissionsExt;

    std::fs::create_dir_all(native_dir).unwrap();
    let path = native_dir.join("libshashchess40.so");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

#[cfg(not(unix))]
fn install_engine(native_dir: &Path, script: &str) {
    std::fs::create_dir_all(native_dir).unwrap();
    std::fs::write(native_dir.join("libshashchess40.so"), script).unwrap();
}

/// Start a server on ephemeral loopback ports with an optional fake engine.
pub async fn start_server(engine: Option<&str>, tweak: impl FnOnce(&mut Config)) -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("www")).unwrap();

    let mut config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        mirror_host: "127.0.0.1".to_string(),
        mirror_port: 0,
        asset_root: dir.path().join("www"),
        ..Config::default()
    };
    config.engine.data_dir = dir.path().join("data");
    config.engine.native_lib_dir = Some(dir.path().join("native"));
    config.engine.threads = 1;
    config.engine.move_time = Duration::from_millis(50);

    if let Some(script) = engine {
        install_engine(&dir.path().join("native"), script);
    }

    tweak(&mut config);

    let log = LogSink::open(&config.engine.private_dir());
    let plugin = AnalysisPlugin::new(config, log.clone());
    plugin.initialize().await.expect("server failed to start");
    let (primary, mirror) = plugin.local_addrs().await.unwrap();

    TestServer {
        plugin,
        log,
        primary: format!("http://{primary}"),
        mirror: format!("http://{mirror}"),
        dir,
    }
}

/// Build a reqwest client for tests.
pub fn client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(15))
        .build()
        .unwrap()
}
