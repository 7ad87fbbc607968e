use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ReadOutcome, StateStore, WriteOutcome};
use crate::models::RotationState;

/// Process-local store. State is lost on restart.
#[derive(Default)]
pub struct MemoryStateStore {
    state: RwLock<Option<RotationState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: RotationState) -> Self {
        Self {
            state: RwLock::new(Some(state)),
        }
    }

    /// Current stored record, if any
    pub async fn snapshot(&self) -> Option<RotationState> {
        self.state.read().await.clone()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn read(&self) -> ReadOutcome {
        match self.state.read().await.as_ref() {
            Some(state) => ReadOutcome::Loaded(state.clone()),
            None => ReadOutcome::Missing,
        }
    }

    async fn write(&self, state: &RotationState) -> WriteOutcome {
        *self.state.write().await = Some(state.clone());
        WriteOutcome::Persisted
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
