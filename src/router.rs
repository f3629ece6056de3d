//! Faking Layer
//!
//! The host executes most protocol commands faithfully once a tab is
//! attached, but a handful of methods either have no host equivalent or
//! misbehave on the host's debugger surface. Those are answered here from a
//! registered handler map and never reach the host — the generic client
//! only needs a plausible reply to keep its handshake moving.

use std::collections::HashMap;

use serde_json::{json, Value};

/// Host major version from which an inclusive catch-all entry is appended
/// to the auto-attach filter, keeping out-of-process frames discoverable.
/// Older hosts reject the empty filter entry outright.
pub(crate) const OOPIF_FILTER_MIN_MAJOR: u32 = 126;

/// Inputs a fake handler may consult.
pub(crate) struct FakeContext {
    pub user_agent: String,
    pub protocol_version: String,
}

type FakeHandler = fn(&FakeContext, &Value) -> Value;

/// Methods answered locally, keyed by method name.
pub(crate) struct FakeTable {
    handlers: HashMap<&'static str, FakeHandler>,
}

impl FakeTable {
    pub fn new() -> Self {
        let mut handlers: HashMap<&'static str, FakeHandler> = HashMap::new();
        handlers.insert("Browser.getVersion", fake_browser_version);
        handlers.insert("Browser.getWindowForTarget", fake_empty);
        handlers.insert("Browser.setDownloadBehavior", fake_empty);
        // The host's debugger surface crashes on detach if emulated media
        // was ever forwarded to it.
        handlers.insert("Emulation.setEmulatedMedia", fake_empty);
        handlers.insert("Target.setDiscoverTargets", fake_empty);
        handlers.insert("Target.disposeBrowserContext", fake_empty);
        Self { handlers }
    }

    /// Answer a method locally, or `None` if it is not a faked method.
    pub fn answer(&self, method: &str, ctx: &FakeContext, params: &Value) -> Option<Value> {
        self.handlers.get(method).map(|handler| handler(ctx, params))
    }
}

fn fake_empty(_ctx: &FakeContext, _params: &Value) -> Value {
    json!({})
}

/// Synthesize a `Browser.getVersion` reply from the host user-agent string.
fn fake_browser_version(ctx: &FakeContext, _params: &Value) -> Value {
    json!({
        "protocolVersion": ctx.protocol_version,
        "product": product_from_user_agent(&ctx.user_agent).unwrap_or("unknown"),
        "revision": "",
        "userAgent": ctx.user_agent,
        "jsVersion": "",
    })
}

/// Extract the `Chrome/NNN.x.y.z` product token from a user-agent string.
pub(crate) fn product_from_user_agent(user_agent: &str) -> Option<&str> {
    let start = user_agent.find("Chrome/")?;
    let token = &user_agent[start..];
    Some(token.split_whitespace().next().unwrap_or(token))
}

/// Parse the host's major version out of its user-agent string.
pub(crate) fn major_version(user_agent: &str) -> Option<u32> {
    let product = product_from_user_agent(user_agent)?;
    product
        .strip_prefix("Chrome/")?
        .split('.')
        .next()?
        .parse()
        .ok()
}

/// Rewrite a `Target.setAutoAttach` filter before forwarding.
///
/// The host's debugger surface exposes service workers and browser/tab
/// pseudo-targets in ways that break the client's attach assumptions, so
/// those are excluded. Hosts at or above [`OOPIF_FILTER_MIN_MAJOR`] get an
/// extra inclusive entry so out-of-process frames stay discoverable.
pub(crate) fn rewrite_auto_attach(params: &Value, host_major: Option<u32>) -> Value {
    let mut params = params.clone();
    if !params.is_object() {
        params = json!({});
    }

    let mut filter = vec![
        json!({ "type": "browser", "exclude": true }),
        json!({ "type": "tab", "exclude": true }),
        json!({ "type": "service_worker", "exclude": true }),
    ];
    if host_major.is_some_and(|major| major >= OOPIF_FILTER_MIN_MAJOR) {
        filter.push(json!({}));
    }

    params["filter"] = Value::Array(filter);
    params
}
