//! State persistence
//!
//! The agent keeps a single slot of memory. Whatever was saved last is what
//! the next invocation loads.

mod file;
mod memory;

pub use file::{FileStateStore, DEFAULT_STATE_FILE};
pub use memory::MemoryStateStore;

use anyhow::Result;
use std::sync::Arc;

use crate::agent::AgentState;

/// Load/save interface for the agent's memory
pub trait StateStore: Send + Sync {
    /// `Ok(None)` when nothing has been saved yet
    fn load(&self) -> Result<Option<AgentState>>;

    /// Replace the stored state
    fn save(&self, state: &AgentState) -> Result<()>;
}

impl<S: StateStore + ?Sized> StateStore for Arc<S> {
    fn load(&self) -> Result<Option<AgentState>> {
        (**self).load()
    }

    fn save(&self, state: &AgentState) -> Result<()> {
        (**self).save(state)
    }
}
