use std::collections::HashMap;
use std::sync::Mutex;

/// One-way "this node's subtree changed" notification to the view layer.
pub trait RefreshSignal: Send + Sync {
    fn node_changed(&self, node_id: &str);
}

/// Counts changes per node so clients can tell when to re-read a comparison.
#[derive(Default)]
pub struct RefreshBus {
    revisions: Mutex<HashMap<String, u64>>,
}

impl RefreshBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revision(&self, node_id: &str) -> u64 {
        self.revisions
            .lock()
            .map(|r| r.get(node_id).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

impl RefreshSignal for RefreshBus {
    fn node_changed(&self, node_id: &str) {
        if let Ok(mut revisions) = self.revisions.lock() {
            let revision = revisions.entry(node_id.to_string()).or_insert(0);
            *revision += 1;
            tracing::info!("Comparison {} changed (revision {})", node_id, revision);
        }
    }
}
