//! The live connection map: device id → outbound frame channel
//! (spec.md §4.3 "an in-memory map of live connections keyed by device
//! id"). Grounded on `nexus-gateway::session::SessionManager`, simplified
//! to one session per device (authenticating evicts any prior session
//! for the same id, per spec.md §4.4).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};

/// An outbound text-frame channel. Bounded and back-pressured: a session
/// whose outbound queue is full is dropped rather than left to buffer
/// unboundedly (spec.md §5 "when full, drop the session").
pub type OutboundSender = mpsc::Sender<String>;

#[derive(Default)]
pub struct SessionManager {
    by_device: RwLock<HashMap<String, OutboundSender>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `device_id` to a fresh outbound channel, evicting (and
    /// implicitly closing, once its sender drops) any prior session for
    /// the same device.
    pub async fn register(self: &Arc<Self>, device_id: String, sender: OutboundSender) {
        self.by_device.write().await.insert(device_id, sender);
    }

    pub async fn remove(&self, device_id: &str) {
        self.by_device.write().await.remove(device_id);
    }

    /// Best-effort push to a device's outbound channel. Drops the session
    /// if the channel is full or closed.
    pub async fn try_send(&self, device_id: &str, frame: String) {
        let guard = self.by_device.read().await;
        if let Some(sender) = guard.get(device_id) {
            if sender.try_send(frame).is_err() {
                drop(guard);
                tracing::warn!(device_id, "outbound channel full or closed, dropping session");
                self.remove(device_id).await;
            }
        }
    }

    pub async fn active_count(&self) -> usize {
        self.by_device.read().await.len()
    }
}
