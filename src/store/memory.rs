//! In-memory store for tests and ephemeral runs

use anyhow::{anyhow, Result};
use std::sync::Mutex;

use super::StateStore;
use crate::agent::AgentState;

/// Keeps the state in process memory only
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    slot: Mutex<Option<AgentState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a pre-existing state
    pub fn with_state(state: AgentState) -> Self {
        Self {
            slot: Mutex::new(Some(state)),
        }
    }

    /// Copy of whatever is stored right now
    pub fn snapshot(&self) -> Option<AgentState> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> Result<Option<AgentState>> {
        let slot = self.slot.lock().map_err(|_| anyhow!("state slot poisoned"))?;
        Ok(slot.clone())
    }

    fn save(&self, state: &AgentState) -> Result<()> {
        let mut slot = self.slot.lock().map_err(|_| anyhow!("state slot poisoned"))?;
        *slot = Some(state.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_empty() {
        let store = MemoryStateStore::new();
        assert!(store.load().unwrap().is_none());
        assert!(store.snapshot().is_none());
    }

    #[test]
    fn test_save_replaces_slot() {
        let mut state = AgentState::new(10_000.0);
        let store = MemoryStateStore::with_state(state.clone());

        state.capital = 42.0;
        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), Some(state));
    }
}
