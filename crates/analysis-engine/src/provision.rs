//! Locate or install an executable engine binary

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::assets::AssetStore;
use crate::config::EngineConfig;
use crate::error::EngineError;

/// Resolves the engine executable, provisioning it from the bundle on first use.
///
/// Lookup order:
/// 1. `lib<name>.so` in the host's native library dir (mounted executable)
/// 2. a previously provisioned copy in the private dir
/// 3. a fresh copy out of the asset store
pub struct Provisioner {
    engine_name: String,
    native_lib_dir: Option<PathBuf>,
    private_dir: PathBuf,
    assets: Arc<dyn AssetStore>,
    lock: Mutex<()>,
}

impl Provisioner {
    pub fn new(config: &EngineConfig, assets: Arc<dyn AssetStore>) -> Self {
        Self {
            engine_name: config.engine_name.clone(),
            native_lib_dir: config.native_lib_dir.clone(),
            private_dir: config.private_dir(),
            assets,
            lock: Mutex::new(()),
        }
    }

    /// Bundle path of the engine binary
    pub fn asset_path(&self) -> String {
        format!("engine/shashchess/{}", self.engine_name)
    }

    pub async fn ensure_binary(&self) -> Result<PathBuf, EngineError> {
        let _guard = self.lock.lock().await;

        if let Some(dir) = &self.native_lib_dir {
            let native = dir.join(format!("lib{}.so", self.engine_name));
            if tokio::fs::try_exists(&native).await.unwrap_or(false) {
                // The mount may be read-only; only the re-check below matters.
                let _ = mark_executable(&native).await;
                if is_executable(&native).await {
                    debug!(path = %native.display(), "Using native engine binary");
                    return Ok(native);
                }
            }
        }

        let target = self.private_dir.join(&self.engine_name);
        if is_executable(&target).await {
            return Ok(target);
        }

        tokio::fs::create_dir_all(&self.private_dir)
            .await
            .map_err(|e| provisioning("create private dir", &self.private_dir, e))?;

        let asset_path = self.asset_path();
        let data = self
            .assets
            .read(&asset_path)
            .await
            .map_err(|e| EngineError::Provisioning(format!("Failed to read asset {asset_path}: {e}")))?;

        // Write beside the target and rename so nobody ever runs a partial copy.
        let partial = self.private_dir.join(format!(".{}.partial", self.engine_name));
        tokio::fs::write(&partial, &data)
            .await
            .map_err(|e| provisioning("write", &partial, e))?;
        mark_executable(&partial)
            .await
            .map_err(|e| provisioning("chmod", &partial, e))?;
        tokio::fs::rename(&partial, &target)
            .await
            .map_err(|e| provisioning("install", &target, e))?;

        info!(path = %target.display(), bytes = data.len(), "Provisioned engine binary");
        Ok(target)
    }
}

fn provisioning(action: &str, path: &Path, e: io::Error) -> EngineError {
    EngineError::Provisioning(format!("Failed to {action} {}: {e}", path.display()))
}

#[cfg(unix)]
async fn mark_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path).await?.permissions();
    if perms.mode() & 0o111 != 0o111 {
        perms.set_mode(perms.mode() | 0o755);
        tokio::fs::set_permissions(path, perms).await?;
    }
    Ok(())
}

#[cfg(not(unix))]
async fn mark_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
async fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    match tokio::fs::metadata(path).await {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
async fn is_executable(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}
