use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::fs;
use tracing::info;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model bundle `{name}` missing from {}", dir.display())]
    Missing { name: String, dir: PathBuf },
    #[error("failed reading model bundle `{name}`: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("model bundle `{name}` is invalid: {reason}")]
    Invalid { name: String, reason: String },
}

/// Model bundles loaded from disk at startup.
///
/// All bundles named by the detector's manifest are read concurrently; a
/// missing or unreadable bundle fails the whole load with a named error
/// rather than leaving the widget waiting forever.
#[derive(Debug)]
pub struct ModelStore {
    dir: PathBuf,
    bundles: HashMap<String, Arc<Vec<u8>>>,
}

impl ModelStore {
    pub async fn load(dir: &Path, names: &[&str]) -> Result<Self, ModelError> {
        let reads = names.iter().map(|name| async move {
            let path = dir.join(name);
            if !fs::try_exists(&path).await.unwrap_or(false) {
                return Err(ModelError::Missing {
                    name: (*name).to_string(),
                    dir: dir.to_path_buf(),
                });
            }
            let bytes = fs::read(&path).await.map_err(|source| ModelError::Io {
                name: (*name).to_string(),
                source,
            })?;
            info!("loaded model bundle {name} ({} bytes)", bytes.len());
            Ok(((*name).to_string(), Arc::new(bytes)))
        });
        let bundles = futures::future::try_join_all(reads).await?;
        Ok(Self {
            dir: dir.to_path_buf(),
            bundles: bundles.into_iter().collect(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn bytes(&self, name: &str) -> Option<Arc<Vec<u8>>> {
        self.bundles.get(name).cloned()
    }
}
