//! Session Registry
//!
//! One table owning every mapping between host tabs, synthesized target ids
//! and session identifiers. All mutations go through [`Registry::insert`] and
//! [`Registry::remove`], so the mappings can never drift apart — a tab is
//! either fully present in all of them or in none.
//!
//! Session ids are never stored: they are derived from the tab id with a
//! fixed prefix, which makes them log-greppable and trivially invertible.

use std::collections::HashMap;

use crate::host::TabId;

/// Prefix for bridge-derived session identifiers. The tab id is appended in
/// decimal form, so `weld-tab-7` always addresses tab 7.
pub const SESSION_PREFIX: &str = "weld-tab-";

/// Derive the session identifier for a tab.
pub fn session_for_tab(tab: TabId) -> String {
    format!("{SESSION_PREFIX}{tab}")
}

/// Invert a bridge-derived session identifier back to its tab, if it is one.
pub fn tab_for_session(session: &str) -> Option<TabId> {
    session
        .strip_prefix(SESSION_PREFIX)?
        .parse::<i64>()
        .ok()
        .map(TabId)
}

/// The mappings for one attached tab.
///
/// `remove` hands this back so detach notifications can be emitted after the
/// registry is already clean.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub tab: TabId,
    pub target_id: String,
    pub session_id: String,
}

/// Bidirectional tab/target/token table.
#[derive(Debug, Default)]
pub struct Registry {
    tab_to_target: HashMap<TabId, String>,
    target_to_tab: HashMap<String, TabId>,
    /// Host-native nested session tokens (frames, workers), keyed by token,
    /// each mapped back to the owning tab for routing.
    token_to_tab: HashMap<String, TabId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly attached tab and return its mappings.
    ///
    /// Replaces any stale entry for the same tab, keeping the invariant of
    /// at most one live target id per tab.
    pub fn insert(&mut self, tab: TabId, target_id: String) -> Attachment {
        if let Some(old) = self.tab_to_target.insert(tab, target_id.clone()) {
            self.target_to_tab.remove(&old);
        }
        self.target_to_tab.insert(target_id.clone(), tab);
        Attachment {
            tab,
            target_id,
            session_id: session_for_tab(tab),
        }
    }

    /// Remove every mapping for a tab, including nested tokens it owns.
    ///
    /// Returns what was removed, or `None` if the tab was not attached — a
    /// second remove is a no-op, which is what makes detach idempotent.
    pub fn remove(&mut self, tab: TabId) -> Option<Attachment> {
        let target_id = self.tab_to_target.remove(&tab)?;
        self.target_to_tab.remove(&target_id);
        self.token_to_tab.retain(|_, owner| *owner != tab);
        Some(Attachment {
            tab,
            target_id,
            session_id: session_for_tab(tab),
        })
    }

    pub fn is_attached(&self, tab: TabId) -> bool {
        self.tab_to_target.contains_key(&tab)
    }

    pub fn target_for_tab(&self, tab: TabId) -> Option<&str> {
        self.tab_to_target.get(&tab).map(String::as_str)
    }

    pub fn tab_for_target(&self, target_id: &str) -> Option<TabId> {
        self.target_to_tab.get(target_id).copied()
    }

    /// Record a nested session token observed in a passing attach event.
    ///
    /// Ignored unless the owning tab is attached: every token in the table
    /// must have a live tab behind it.
    pub fn insert_token(&mut self, token: String, tab: TabId) {
        if self.is_attached(tab) {
            self.token_to_tab.insert(token, tab);
        }
    }

    pub fn remove_token(&mut self, token: &str) {
        self.token_to_tab.remove(token);
    }

    pub fn tab_for_token(&self, token: &str) -> Option<TabId> {
        self.token_to_tab.get(token).copied()
    }

    /// All currently attached tabs.
    pub fn attached_tabs(&self) -> Vec<TabId> {
        self.tab_to_target.keys().copied().collect()
    }

    /// All currently attached (tab, target id) pairs.
    pub fn attachments(&self) -> Vec<(TabId, String)> {
        self.tab_to_target
            .iter()
            .map(|(tab, target)| (*tab, target.clone()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tab_to_target.is_empty()
    }
}
