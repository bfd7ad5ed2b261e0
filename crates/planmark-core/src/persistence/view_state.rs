//! Debounced per-layout view-state writes.

use crate::layout::{LayoutId, ViewState};
use std::collections::HashMap;

#[cfg(not(target_arch = "wasm32"))]
pub use std::time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

#[cfg(target_arch = "wasm32")]
pub use web_time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Duration;

/// Receives view state once it has settled.
pub trait ViewPersistence {
    fn persist(&mut self, layout: LayoutId, state: ViewState);
}

impl<F: FnMut(LayoutId, ViewState)> ViewPersistence for F {
    fn persist(&mut self, layout: LayoutId, state: ViewState) {
        self(layout, state)
    }
}

/// Collects view-state changes and releases each layout's latest state
/// once it has been quiet for the debounce delay.
#[derive(Debug, Clone)]
pub struct ViewStateSaver {
    delay: Duration,
    pending: HashMap<LayoutId, (ViewState, Instant)>,
}

impl ViewStateSaver {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            pending: HashMap::new(),
        }
    }

    /// Record a change. A newer request for the same layout restarts its
    /// timer.
    pub fn request(&mut self, layout: LayoutId, state: ViewState, now: Instant) {
        self.pending.insert(layout, (state, now + self.delay));
    }

    /// Take every state whose deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Vec<(LayoutId, ViewState)> {
        let due: Vec<LayoutId> = self
            .pending
            .iter()
            .filter(|(_, (_, deadline))| *deadline <= now)
            .map(|(id, _)| *id)
            .collect();
        due.into_iter()
            .filter_map(|id| self.pending.remove(&id).map(|(state, _)| (id, state)))
            .collect()
    }

    /// Take everything regardless of deadlines (layout switch, shutdown).
    pub fn flush(&mut self) -> Vec<(LayoutId, ViewState)> {
        self.pending.drain().map(|(id, (state, _))| (id, state)).collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

impl Default for ViewStateSaver {
    fn default() -> Self {
        Self::new(crate::config::EditorConfig::default().persist_debounce_ms)
    }
}
