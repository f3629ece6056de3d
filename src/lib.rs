//! # Tabweld
//!
//! CDP session bridge over tab-scoped extension debugger hosts.
//!
//! Tabweld lets a Chrome-DevTools-Protocol-speaking automation client
//! control tabs inside a browser it does not own. The host platform only
//! exposes a narrow capability — attach a debugger to one tab, send it JSON
//! commands, observe tab lifecycle notifications — and tabweld makes that
//! look like a normal multi-target, multi-session CDP connection: stable
//! target ids, derived session ids, synthesized attach/detach events,
//! popup auto-attach, and local answers for the handful of commands the
//! host cannot execute faithfully.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use serde_json::json;
//! use tabweld::{Bridge, BridgeConfig, CdpCommand, Host, TabId};
//!
//! # async fn run(host: Arc<dyn Host>) -> tabweld::Result<()> {
//! // Wrap your platform's debugger surface in the Host trait, then bridge it.
//! let (bridge, mut events) = Bridge::new(host, BridgeConfig::default());
//!
//! // Forward protocol events to the client as they arrive.
//! tokio::spawn(async move {
//!     while let Some(_event) = events.recv().await {
//!         // push the event to the client connection
//!     }
//! });
//!
//! // Attach a tab the host told you about; the client sees a real target.
//! let target_id = bridge.attach(TabId(7)).await?;
//!
//! // Client commands go through `handle`, one response per command.
//! let response = bridge
//!     .handle(CdpCommand {
//!         id: 1,
//!         method: "Page.navigate".into(),
//!         params: json!({ "url": "https://example.com" }),
//!         session_id: Some(format!("{}{}", tabweld::SESSION_PREFIX, 7)),
//!     })
//!     .await;
//! assert_eq!(response.id, 1);
//!
//! bridge.close().await?;
//! # let _ = target_id;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

pub mod bridge;
pub mod cdp;
pub mod error;
mod events;
pub mod host;
pub mod registry;
mod router;

// Re-exports
pub use bridge::Bridge;
pub use cdp::{CdpCommand, CdpError, CdpEvent, CdpResponse, TargetInfo};
pub use error::{Error, Result};
pub use host::{Host, HostEvent, TabId};
pub use registry::{session_for_tab, tab_for_session, SESSION_PREFIX};

/// Configuration for a bridge instance
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Protocol version pinned for host attach calls
    pub protocol_version: String,
    /// Upper bound on waiting for teardown during [`Bridge::close`]
    pub close_timeout: Duration,
    /// Attach automatically to tabs opened by an already-attached tab
    pub auto_attach_popups: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            protocol_version: "1.3".to_string(),
            close_timeout: Duration::from_secs(10),
            auto_attach_popups: true,
        }
    }
}

impl BridgeConfig {
    /// Config that leaves popups alone (explicit attach only)
    pub fn manual() -> Self {
        Self {
            auto_attach_popups: false,
            ..Default::default()
        }
    }
}
