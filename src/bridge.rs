//! Debugger-to-CDP Session Bridge
//!
//! Makes the host's tab-scoped debugger capability look like a normal
//! multi-target, multi-session CDP connection: target discovery, session
//! identifiers, auto-attach semantics, and local answers for the commands
//! the host cannot execute.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::cdp::types::TargetGetTargetInfoResult;
use crate::cdp::{CdpCommand, CdpEvent, CdpResponse, TargetInfo};
use crate::error::{Error, Result};
use crate::events;
use crate::host::{Host, TabId};
use crate::registry::{tab_for_session, Registry};
use crate::router::{major_version, rewrite_auto_attach, FakeContext, FakeTable};
use crate::BridgeConfig;

/// A CDP session bridge over one host.
///
/// Single-instance per automation session. Commands are independently
/// asynchronous; lifecycle operations are serialized per tab.
pub struct Bridge {
    inner: Arc<Inner>,
    pump: JoinHandle<()>,
}

pub(crate) struct Inner {
    host: Arc<dyn Host>,
    pub(crate) config: BridgeConfig,
    pub(crate) registry: Mutex<Registry>,
    /// Per-tab locks serializing attach/detach for the same tab while
    /// leaving different tabs fully concurrent. Entries live for the
    /// bridge's lifetime; one automation session touches few tabs.
    tab_locks: Mutex<HashMap<TabId, Arc<Mutex<()>>>>,
    fakes: FakeTable,
    fake_ctx: FakeContext,
    host_major: Option<u32>,
    event_tx: mpsc::UnboundedSender<CdpEvent>,
}

impl Bridge {
    /// Create a bridge over a host and start consuming its notifications.
    ///
    /// Returns the bridge and the stream of protocol events to push to the
    /// client. Must be called within a tokio runtime.
    pub fn new(
        host: Arc<dyn Host>,
        config: BridgeConfig,
    ) -> (Self, mpsc::UnboundedReceiver<CdpEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let user_agent = host.user_agent();

        let inner = Arc::new(Inner {
            fake_ctx: FakeContext {
                user_agent: user_agent.clone(),
                protocol_version: config.protocol_version.clone(),
            },
            host_major: major_version(&user_agent),
            host: Arc::clone(&host),
            config,
            registry: Mutex::new(Registry::new()),
            tab_locks: Mutex::new(HashMap::new()),
            fakes: FakeTable::new(),
            event_tx,
        });

        let pump = tokio::spawn(events::pump(Arc::clone(&inner), host.subscribe()));

        (Self { inner, pump }, event_rx)
    }

    /// Attach the debugger to a tab, returning its target id.
    ///
    /// Idempotent: a second attach on the same tab returns the existing
    /// target id without touching the host again.
    pub async fn attach(&self, tab: TabId) -> Result<String> {
        self.inner.attach(tab).await
    }

    /// Detach a tab. No-op if it is not attached.
    pub async fn detach(&self, tab: TabId) -> Result<()> {
        self.inner.detach(tab).await
    }

    /// Detach by target id. No-op if the target is unknown.
    pub async fn detach_target(&self, target_id: &str) -> Result<()> {
        let tab = {
            let registry = self.inner.registry.lock().await;
            registry.tab_for_target(target_id)
        };
        match tab {
            Some(tab) => self.inner.detach(tab).await,
            None => Ok(()),
        }
    }

    /// Whether a tab is currently attached.
    pub async fn is_attached(&self, tab: TabId) -> bool {
        self.inner.registry.lock().await.is_attached(tab)
    }

    /// All currently attached (tab, target id) pairs.
    pub async fn attached_targets(&self) -> Vec<(TabId, String)> {
        self.inner.registry.lock().await.attachments()
    }

    /// Handle one client command, always producing exactly one response.
    ///
    /// Routing failures come back as error responses, never as panics or
    /// dropped replies — the client is owed an answer for every id it sent.
    pub async fn handle(&self, command: CdpCommand) -> CdpResponse {
        let session_id = command.session_id.clone();
        match self
            .inner
            .send(&command.method, command.params, session_id.as_deref())
            .await
        {
            Ok(result) => CdpResponse::ok(command.id, session_id, result),
            Err(err) => {
                tracing::debug!(method = %command.method, error = %err, "command failed");
                CdpResponse::err(command.id, session_id, &err)
            }
        }
    }

    /// Route one command: fake, translate, or forward to the host.
    pub async fn send(
        &self,
        method: &str,
        params: Value,
        session_id: Option<&str>,
    ) -> Result<Value> {
        self.inner.send(method, params, session_id).await
    }

    /// Detach every attached tab and stop consuming host notifications.
    ///
    /// Waits for teardown up to the configured close timeout; detach
    /// failures for individual tabs are best-effort as usual.
    pub async fn close(&self) -> Result<()> {
        let tabs = { self.inner.registry.lock().await.attached_tabs() };
        let teardown = async {
            for tab in tabs {
                let _ = self.inner.detach(tab).await;
            }
        };

        let result = tokio::time::timeout(self.inner.config.close_timeout, teardown).await;
        self.pump.abort();

        result.map_err(|_| {
            Error::Timeout(format!(
                "teardown did not finish within {:?}",
                self.inner.config.close_timeout
            ))
        })
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        // Stop the pump if close() was never called; host-side debugger
        // attachments are left to the host's own lifetime handling.
        self.pump.abort();
    }
}

impl Inner {
    async fn tab_lock(&self, tab: TabId) -> Arc<Mutex<()>> {
        let mut locks = self.tab_locks.lock().await;
        Arc::clone(locks.entry(tab).or_default())
    }

    pub(crate) fn emit(&self, event: CdpEvent) {
        // The client side may already be gone during teardown.
        let _ = self.event_tx.send(event);
    }

    pub(crate) async fn attach(&self, tab: TabId) -> Result<String> {
        let lock = self.tab_lock(tab).await;
        let _guard = lock.lock().await;

        if let Some(target_id) = {
            let registry = self.registry.lock().await;
            registry.target_for_tab(tab).map(str::to_string)
        } {
            tracing::trace!(tab = %tab, target = %target_id, "already attached");
            return Ok(target_id);
        }

        self.host
            .attach(tab, &self.config.protocol_version)
            .await
            .map_err(|err| match err {
                err @ Error::HostAttach { .. } => err,
                other => Error::host_attach(tab, other.to_string()),
            })?;

        // The host attach call is not protocol-visible: fetch the native
        // target metadata and manufacture the attach event ourselves so the
        // client's bookkeeping matches a real browser.
        let info = self.query_target_info(tab).await;

        let attachment = {
            let mut registry = self.registry.lock().await;
            registry.insert(tab, info.target_id.clone())
        };

        self.emit(CdpEvent {
            method: "Target.attachedToTarget".into(),
            params: json!({
                "sessionId": attachment.session_id,
                "targetInfo": info,
                "waitingForDebugger": false,
            }),
            session_id: Some(attachment.session_id.clone()),
        });

        tracing::debug!(tab = %tab, target = %attachment.target_id, "attached");
        Ok(attachment.target_id)
    }

    async fn query_target_info(&self, tab: TabId) -> TargetInfo {
        let mut info = match self
            .host
            .send_command(tab, None, "Target.getTargetInfo", json!({}))
            .await
        {
            Ok(value) => serde_json::from_value::<TargetGetTargetInfoResult>(value)
                .map(|result| result.target_info)
                .unwrap_or_default(),
            Err(err) => {
                tracing::debug!(tab = %tab, error = %err, "target info query failed");
                TargetInfo::default()
            }
        };

        if info.target_id.is_empty() {
            info.target_id = format!("tab-{tab}");
        }
        if info.r#type.is_empty() {
            info.r#type = "page".into();
        }
        info.attached = true;
        info
    }

    pub(crate) async fn detach(&self, tab: TabId) -> Result<()> {
        let lock = self.tab_lock(tab).await;
        let _guard = lock.lock().await;

        // Registry entries go first: a command racing this detach must see
        // the tab gone before any notification becomes observable.
        let attachment = {
            let mut registry = self.registry.lock().await;
            registry.remove(tab)
        };
        let Some(attachment) = attachment else {
            return Ok(());
        };

        self.emit(CdpEvent {
            method: "Target.detachedFromTarget".into(),
            params: json!({
                "sessionId": attachment.session_id,
                "targetId": attachment.target_id,
            }),
            session_id: None,
        });

        // Best effort; the tab may already be gone.
        if let Err(err) = self.host.detach(tab).await {
            tracing::debug!(tab = %tab, error = %err, "host detach failed");
        }

        tracing::debug!(tab = %tab, target = %attachment.target_id, "detached");
        Ok(())
    }

    pub(crate) async fn send(
        &self,
        method: &str,
        params: Value,
        session_id: Option<&str>,
    ) -> Result<Value> {
        tracing::trace!(method, session = ?session_id, "routing command");

        // Locally answered methods never reach the host.
        if let Some(result) = self.fakes.answer(method, &self.fake_ctx, &params) {
            return Ok(result);
        }

        match method {
            "Target.createTarget" => {
                let url = params
                    .get("url")
                    .and_then(Value::as_str)
                    .unwrap_or("about:blank");
                let tab = self.host.create_tab(url).await?;
                let target_id = self.attach(tab).await?;
                Ok(json!({ "targetId": target_id }))
            }
            "Target.closeTarget" => {
                let target_id = params
                    .get("targetId")
                    .and_then(Value::as_str)
                    .ok_or_else(|| Error::routing("Target.closeTarget without targetId"))?;
                let tab = {
                    let registry = self.registry.lock().await;
                    registry.tab_for_target(target_id)
                };
                // Shares detach's no-op semantics: the tab may have been
                // removed externally a moment earlier.
                if let Some(tab) = tab {
                    self.detach(tab).await?;
                }
                Ok(json!({ "success": true }))
            }
            "Target.setAutoAttach" => {
                // The client probes auto-attach before any tab exists; that
                // probe succeeds as a no-op.
                match self.resolve(method, session_id, &params).await {
                    Ok((tab, token)) => {
                        let rewritten = rewrite_auto_attach(&params, self.host_major);
                        self.host
                            .send_command(tab, token.as_deref(), method, rewritten)
                            .await
                    }
                    Err(_) => Ok(json!({})),
                }
            }
            "Target.getTargetInfo" => match self.resolve(method, session_id, &params).await {
                Ok((tab, token)) => {
                    self.host
                        .send_command(tab, token.as_deref(), method, params)
                        .await
                }
                // Unattachable pseudo-target probe.
                Err(_) => Ok(json!({})),
            },
            _ => {
                let (tab, token) = self.resolve(method, session_id, &params).await?;
                self.host
                    .send_command(tab, token.as_deref(), method, params)
                    .await
            }
        }
    }

    /// Resolve the tab (and host session token) a command addresses.
    async fn resolve(
        &self,
        method: &str,
        session_id: Option<&str>,
        params: &Value,
    ) -> Result<(TabId, Option<String>)> {
        let registry = self.registry.lock().await;

        if let Some(session) = session_id {
            if let Some(tab) = tab_for_session(session) {
                if registry.is_attached(tab) {
                    return Ok((tab, None));
                }
                return Err(Error::routing(format!(
                    "session {session} is no longer attached"
                )));
            }
            if let Some(tab) = registry.tab_for_token(session) {
                return Ok((tab, Some(session.to_string())));
            }
            return Err(Error::routing(format!("unknown session {session}")));
        }

        // Top-level commands may name a target by convention.
        if let Some(target_id) = params.get("targetId").and_then(Value::as_str) {
            if let Some(tab) = registry.tab_for_target(target_id) {
                return Ok((tab, None));
            }
            return Err(Error::routing(format!("unknown target {target_id}")));
        }

        Err(Error::routing(format!("no session for {method}")))
    }
}
