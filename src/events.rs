//! Event Translator
//!
//! Host debugger notifications arrive keyed by tab. This pump republishes
//! them to the client in the bridge's session-id space, keeps the
//! nested-session bookkeeping current from the attach/detach payloads that
//! pass through, and funnels every implicit detach signal through the one
//! detach routine.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::bridge::Inner;
use crate::cdp::types::{TargetAttachedToTargetParams, TargetDetachedFromTargetParams};
use crate::cdp::CdpEvent;
use crate::host::{HostEvent, TabId};
use crate::registry::session_for_tab;

/// Consume one host subscription for the lifetime of a bridge instance.
pub(crate) async fn pump(inner: Arc<Inner>, mut events: mpsc::UnboundedReceiver<HostEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            HostEvent::DebuggerEvent {
                tab,
                session,
                method,
                params,
            } => translate(&inner, tab, session, method, params).await,
            HostEvent::DebuggerDetached { tab } | HostEvent::TabRemoved { tab } => {
                let _ = inner.detach(tab).await;
            }
            HostEvent::TabCreated { opener, tab } => attach_popup(&inner, opener, tab).await,
        }
    }
    tracing::debug!("host event stream ended");
}

/// Republish one host debugger event in the bridge's session space.
async fn translate(
    inner: &Inner,
    tab: TabId,
    token: Option<String>,
    method: String,
    params: Value,
) {
    {
        let mut registry = inner.registry.lock().await;
        if !registry.is_attached(tab) {
            // Raced a detach; nothing may be observable for this tab anymore.
            tracing::trace!(tab = %tab, method = %method, "dropping event for unattached tab");
            return;
        }

        match method.as_str() {
            "Target.attachedToTarget" => {
                match serde_json::from_value::<TargetAttachedToTargetParams>(params.clone()) {
                    Ok(attached) => registry.insert_token(attached.session_id, tab),
                    Err(err) => {
                        tracing::warn!(tab = %tab, error = %err, "malformed attachedToTarget")
                    }
                }
            }
            "Target.detachedFromTarget" => {
                match serde_json::from_value::<TargetDetachedFromTargetParams>(params.clone()) {
                    Ok(detached) => registry.remove_token(&detached.session_id),
                    Err(err) => {
                        tracing::warn!(tab = %tab, error = %err, "malformed detachedFromTarget")
                    }
                }
            }
            _ => {}
        }
    }

    // Nested tokens pass through as-is; root events get the derived session.
    let session_id = token.unwrap_or_else(|| session_for_tab(tab));
    inner.emit(CdpEvent {
        method,
        params,
        session_id: Some(session_id),
    });
}

/// Auto-attach to a popup opened by an attached tab.
async fn attach_popup(inner: &Inner, opener: TabId, tab: TabId) {
    if !inner.config.auto_attach_popups {
        return;
    }
    let opener_attached = { inner.registry.lock().await.is_attached(opener) };
    if !opener_attached {
        return;
    }

    // Popups are opportunistic: the host refuses internal pages, and the
    // tab may close before we get to it.
    if let Err(err) = inner.attach(tab).await {
        tracing::debug!(opener = %opener, tab = %tab, error = %err, "popup attach failed");
    }
}
