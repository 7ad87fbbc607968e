//! JSON file backend.
//!
//! Each write goes to its own sibling `<name>.<uuid>.tmp` file which is then
//! renamed over the target, so a concurrent reader sees either the old or the
//! new record and concurrent writers never share a temp file.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use super::{ReadOutcome, StateStore, WriteOutcome};
use crate::models::RotationState;

pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fresh temp file name next to the target, unique per write
    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(format!(".{}.tmp", Uuid::new_v4().simple()));
        PathBuf::from(name)
    }

    async fn try_write(&self, state: &RotationState) -> Result<(), String> {
        let body = serde_json::to_vec_pretty(state)
            .map_err(|e| format!("Failed to serialize rotation state: {}", e))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("Failed to create state directory: {}", e))?;
        }

        let temp = self.temp_path();
        if let Err(e) = fs::write(&temp, &body).await {
            let _ = fs::remove_file(&temp).await;
            return Err(format!("Failed to write state file: {}", e));
        }

        if let Err(e) = fs::rename(&temp, &self.path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(format!("Failed to replace state file: {}", e));
        }

        Ok(())
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn read(&self) -> ReadOutcome {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return ReadOutcome::Missing,
            Err(e) => {
                log::error!(
                    "Error reading state file {}: {}. Starting with empty state.",
                    self.path.display(),
                    e
                );
                return ReadOutcome::Recovered {
                    reason: e.to_string(),
                };
            }
        };

        match serde_json::from_slice::<RotationState>(&bytes) {
            Ok(state) => ReadOutcome::Loaded(state),
            Err(e) => {
                log::error!(
                    "Error decoding JSON from state file {}: {}. Starting with empty state.",
                    self.path.display(),
                    e
                );
                ReadOutcome::Recovered {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn write(&self, state: &RotationState) -> WriteOutcome {
        match self.try_write(state).await {
            Ok(()) => {
                log::debug!("Rotation state written to {}", self.path.display());
                WriteOutcome::Persisted
            }
            Err(reason) => {
                log::error!("{} ({})", reason, self.path.display());
                WriteOutcome::Failed { reason }
            }
        }
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
