//! Read-only bundled asset store

use std::io;
use std::path::{Component, Path, PathBuf};

use futures::future::BoxFuture;
use futures::FutureExt;

/// Source of bundled files (engine binary, web client).
///
/// Paths are `/`-separated and relative to the bundle root.
pub trait AssetStore: Send + Sync {
    fn read<'a>(&'a self, path: &'a str) -> BoxFuture<'a, io::Result<Vec<u8>>>;
}

/// Asset store backed by a directory on disk
#[derive(Debug, Clone)]
pub struct DirAssetStore {
    root: PathBuf,
}

impl DirAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join `path` under the root, refusing anything that could escape it.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if path.is_empty() || escapes {
            return None;
        }
        Some(self.root.join(relative))
    }
}

impl AssetStore for DirAssetStore {
    fn read<'a>(&'a self, path: &'a str) -> BoxFuture<'a, io::Result<Vec<u8>>> {
        async move {
            let full = self.resolve(path).ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, format!("invalid asset path: {path}"))
            })?;
            if !tokio::fs::metadata(&full).await?.is_file() {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("not a file: {path}"),
                ));
            }
            tokio::fs::read(&full).await
        }
        .boxed()
    }
}
