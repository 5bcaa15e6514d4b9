//! Mail service abstraction — the five operations a cycle needs.

use std::time::Duration;

use async_trait::async_trait;

use crate::auth::Session;
use crate::error::MailError;

pub mod gmail;

pub use gmail::GmailClient;

/// Identifier pair for one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    /// Opaque id, unique per message.
    pub message_id: String,
    /// Opaque id grouping messages of one conversation.
    pub thread_id: String,
}

/// One `(name, value)` message header as returned by the mail service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Ordered headers of one message; empty when none were parseable.
pub type HeaderSet = Vec<Header>;

/// The external mail collaborator.
///
/// Every operation takes an authenticated [`Session`] and surfaces
/// transport failures as [`MailError`]. Tests substitute an in-memory
/// fake that records calls.
#[async_trait]
pub trait MailService: Send + Sync {
    /// List unread inbox messages received within `lookback`.
    ///
    /// An empty mailbox is an empty vec, not an error.
    async fn list_recent_unread(
        &self,
        session: &Session,
        lookback: Duration,
    ) -> Result<Vec<MessageRef>, MailError>;

    /// Fetch the headers of one message. Empty when the message has no
    /// parseable headers.
    async fn get_headers(
        &self,
        session: &Session,
        message_id: &str,
    ) -> Result<HeaderSet, MailError>;

    /// Count conversations in the mailbox history sent from `address`.
    async fn count_conversations(
        &self,
        session: &Session,
        address: &str,
    ) -> Result<u64, MailError>;

    /// Send a plaintext message.
    async fn send_message(
        &self,
        session: &Session,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), MailError>;

    /// Add and remove labels on one message.
    async fn relabel_message(
        &self,
        session: &Session,
        message_id: &str,
        add: &[String],
        remove: &[String],
    ) -> Result<(), MailError>;
}
