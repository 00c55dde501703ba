use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::RulesStore;
use crate::evaluation::ThresholdRules;

/// Rules kept as a single JSON document on local disk.
///
/// Saves go through a sibling temp file followed by a rename, so a reader
/// sees either the old document or the new one, never a torn write.
#[derive(Debug, Clone)]
pub struct FileRulesStore {
    path: PathBuf,
}

impl FileRulesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl RulesStore for FileRulesStore {
    async fn fetch(&self) -> Result<Option<ThresholdRules>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to read rules file {}", self.path.display())
                })
            }
        };

        let rules = serde_json::from_slice(&bytes)
            .with_context(|| format!("malformed rules file {}", self.path.display()))?;
        Ok(Some(rules))
    }

    async fn save(&self, rules: &ThresholdRules) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }

        let body = serde_json::to_vec_pretty(rules).context("failed to serialise rules")?;
        let tmp = self.temp_path();

        fs::write(&tmp, &body)
            .await
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("failed to replace {}", self.path.display()))?;

        debug!(path = %self.path.display(), "Rules saved to file");
        Ok(())
    }
}
