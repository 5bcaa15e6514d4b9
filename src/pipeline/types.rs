//! Pipeline data types: correspondent extraction and the message grouping.

use std::collections::{BTreeMap, BTreeSet};

use crate::mail::HeaderSet;

/// Extract the correspondent address from a message's headers.
///
/// Takes the last whitespace-delimited token of the `From` value and
/// strips one enclosing `<`/`>` pair if present, so both
/// `"John Doe <john@example.com>"` and a bare `"jane@example.com"`
/// resolve. The address is lowercased for use as a map key and send
/// target. Returns `None` when there is no `From` header or the token
/// does not look like an address.
pub fn extract_correspondent(headers: &HeaderSet) -> Option<String> {
    let from = headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("From"))?;
    let token = from.value.split_whitespace().next_back()?;

    let address = token
        .strip_prefix('<')
        .and_then(|t| t.strip_suffix('>'))
        .unwrap_or(token);

    if address.contains('@') {
        Some(address.to_ascii_lowercase())
    } else {
        None
    }
}

/// Grouping of a cycle's messages by correspondent.
///
/// One structure replaces the forward (message id → address) and
/// inverse (address → message id) maps: each correspondent owns the
/// ordered set of message ids they sent this cycle, so duplicate
/// senders collapse naturally and marking can cover every message.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CorrespondentIndex {
    groups: BTreeMap<String, BTreeSet<String>>,
}

impl CorrespondentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one message for a correspondent.
    pub fn insert(&mut self, correspondent: impl Into<String>, message_id: impl Into<String>) {
        self.groups
            .entry(correspondent.into())
            .or_default()
            .insert(message_id.into());
    }

    /// Distinct correspondents, in deterministic order.
    pub fn correspondents(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// All message ids recorded for one correspondent.
    pub fn message_ids(&self, correspondent: &str) -> impl Iterator<Item = &str> {
        self.groups
            .get(correspondent)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// One message id standing in for the correspondent, for log lines.
    pub fn representative(&self, correspondent: &str) -> Option<&str> {
        self.message_ids(correspondent).next()
    }

    /// Number of distinct correspondents.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total messages across all correspondents.
    pub fn message_count(&self) -> usize {
        self.groups.values().map(BTreeSet::len).sum()
    }
}
