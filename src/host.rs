//! Host Debugger Surface
//!
//! The bridge does not own a browser process. It is built on the narrow
//! capability an extension platform exposes: attach a debugger to one tab,
//! send one JSON command to it, and observe tab/debugger lifecycle
//! notifications. Everything wider than that is synthesized by the bridge.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::Result;

/// Identifier for a host browser tab.
///
/// Allocated by the host when a tab opens and invalidated when the host
/// reports removal. The bridge only ever observes these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabId(pub i64);

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TabId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Notifications pushed by the host, independent of any in-flight command.
#[derive(Debug, Clone)]
pub enum HostEvent {
    /// A debugger event fired on an attached tab.
    ///
    /// `session` carries the host-native token when the event originates
    /// from a nested target (frame, worker) rather than the tab itself.
    DebuggerEvent {
        tab: TabId,
        session: Option<String>,
        method: String,
        params: Value,
    },
    /// The debugger was detached outside the bridge's control, e.g. the
    /// user dismissed the debugging banner.
    DebuggerDetached { tab: TabId },
    /// The tab itself is gone.
    TabRemoved { tab: TabId },
    /// A new tab was opened by an existing tab.
    TabCreated { opener: TabId, tab: TabId },
}

/// The tab-scoped debugger primitives the bridge consumes.
///
/// Implementations wrap whatever the platform actually exposes — a
/// `chrome.debugger`-style API behind a message port, a native-messaging
/// shim, or a scripted double in tests.
#[async_trait]
pub trait Host: Send + Sync + 'static {
    /// Attach the debugger to a tab at the given protocol version.
    async fn attach(&self, tab: TabId, protocol_version: &str) -> Result<()>;

    /// Detach the debugger from a tab. The tab may already be gone; callers
    /// treat failures as non-fatal.
    async fn detach(&self, tab: TabId) -> Result<()>;

    /// Send a raw protocol command to an attached tab. `session` addresses
    /// a nested target by its host-native token.
    async fn send_command(
        &self,
        tab: TabId,
        session: Option<&str>,
        method: &str,
        params: Value,
    ) -> Result<Value>;

    /// Open a new tab and return its handle.
    async fn create_tab(&self, url: &str) -> Result<TabId>;

    /// The host browser's user-agent string.
    fn user_agent(&self) -> String;

    /// Subscribe to host notifications.
    ///
    /// Each subscription is its own channel; dropping the receiver is the
    /// unsubscribe. A bridge instance holds exactly one subscription for
    /// its lifetime, so two bridges over the same host never cross-talk.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<HostEvent>;
}
