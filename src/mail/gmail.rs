//! Gmail REST implementation of [`MailService`].
//!
//! Talks to `gmail.googleapis.com` with a bearer session. Search-based
//! operations use Gmail query syntax (`label:`, `newer_than:`, `from:`);
//! outbound mail goes through the raw RFC 2822 send endpoint.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use serde::Deserialize;
use tracing::debug;

use crate::auth::Session;
use crate::error::MailError;
use crate::mail::{Header, HeaderSet, MailService, MessageRef};

const BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// Gmail's system label for unread messages.
pub const UNREAD_LABEL: &str = "UNREAD";

/// Gmail API client.
#[derive(Debug, Clone)]
pub struct GmailClient {
    http: reqwest::Client,
    base_url: String,
    from_address: String,
}

impl GmailClient {
    pub fn new(http: reqwest::Client, from_address: impl Into<String>) -> Self {
        Self {
            http,
            base_url: BASE_URL.to_string(),
            from_address: from_address.into(),
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        session: &Session,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, MailError> {
        let response = self
            .http
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(session.bearer())
            .query(query)
            .send()
            .await?;
        check_status(response).await?.json().await.map_err(Into::into)
    }

    async fn post_json(
        &self,
        session: &Session,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<(), MailError> {
        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(session.bearer())
            .json(body)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

/// Map a non-2xx response to [`MailError::Api`].
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, MailError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(MailError::Api {
        status: status.as_u16(),
        body,
    })
}

/// Convert a lookback duration to Gmail's `newer_than:{n}d` day count.
///
/// Gmail only accepts whole days here; partial days round up, and the
/// window is never shorter than one day.
pub fn lookback_days(lookback: Duration) -> u64 {
    lookback.as_secs().div_ceil(86_400).max(1)
}

/// RFC 2047 encoded-word form of a header value, so non-ASCII subjects
/// survive the 7-bit header.
fn encode_header_word(value: &str) -> String {
    format!("=?UTF-8?B?{}?=", STANDARD.encode(value))
}

/// Build the base64url-encoded RFC 2822 payload for the raw send endpoint.
pub fn encode_raw_message(from: &str, to: &str, subject: &str, body: &str) -> String {
    let subject = encode_header_word(subject);
    let message = format!(
        "Content-Type: text/plain; charset=\"UTF-8\"\r\n\
         MIME-Version: 1.0\r\n\
         Content-Transfer-Encoding: 7bit\r\n\
         To: {to}\r\n\
         From: {from}\r\n\
         Subject: {subject}\r\n\
         \r\n\
         {body}"
    );
    URL_SAFE.encode(message)
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageListEntry>,
}

#[derive(Debug, Deserialize)]
struct MessageListEntry {
    id: String,
    #[serde(rename = "threadId")]
    thread_id: String,
}

#[derive(Debug, Deserialize)]
struct MessageMetadata {
    payload: Option<MessagePayload>,
}

#[derive(Debug, Deserialize)]
struct MessagePayload {
    #[serde(default)]
    headers: Vec<WireHeader>,
}

#[derive(Debug, Deserialize)]
struct WireHeader {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct ThreadList {
    #[serde(rename = "resultSizeEstimate", default)]
    result_size_estimate: u64,
}

// ── MailService impl ────────────────────────────────────────────────

#[async_trait]
impl MailService for GmailClient {
    async fn list_recent_unread(
        &self,
        session: &Session,
        lookback: Duration,
    ) -> Result<Vec<MessageRef>, MailError> {
        let q = format!(
            "label:unread label:inbox newer_than:{}d",
            lookback_days(lookback)
        );
        let list: MessageList = self
            .get_json(session, "/messages", &[("q", q.as_str())])
            .await?;

        debug!(count = list.messages.len(), "Listed recent unread messages");
        Ok(list
            .messages
            .into_iter()
            .map(|m| MessageRef {
                message_id: m.id,
                thread_id: m.thread_id,
            })
            .collect())
    }

    async fn get_headers(
        &self,
        session: &Session,
        message_id: &str,
    ) -> Result<HeaderSet, MailError> {
        let meta: MessageMetadata = self
            .get_json(
                session,
                &format!("/messages/{message_id}"),
                &[("format", "metadata")],
            )
            .await?;

        Ok(meta
            .payload
            .map(|p| {
                p.headers
                    .into_iter()
                    .map(|h| Header::new(h.name, h.value))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn count_conversations(
        &self,
        session: &Session,
        address: &str,
    ) -> Result<u64, MailError> {
        let q = format!("from:{address}");
        let threads: ThreadList = self
            .get_json(session, "/threads", &[("q", q.as_str())])
            .await?;
        Ok(threads.result_size_estimate)
    }

    async fn send_message(
        &self,
        session: &Session,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), MailError> {
        // The from address is carried in the raw payload; Gmail rewrites
        // it to the authenticated account if they differ.
        let raw = encode_raw_message(&self.from_address, to, subject, body);
        self.post_json(session, "/messages/send", &serde_json::json!({ "raw": raw }))
            .await
    }

    async fn relabel_message(
        &self,
        session: &Session,
        message_id: &str,
        add: &[String],
        remove: &[String],
    ) -> Result<(), MailError> {
        self.post_json(
            session,
            &format!("/messages/{message_id}/modify"),
            &serde_json::json!({
                "addLabelIds": add,
                "removeLabelIds": remove,
            }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookback_rounds_up_to_whole_days() {
        assert_eq!(lookback_days(Duration::from_secs(86_400)), 1);
        assert_eq!(lookback_days(Duration::from_secs(90_000)), 2);
        assert_eq!(lookback_days(Duration::from_secs(7 * 86_400)), 7);
    }

    #[test]
    fn lookback_never_shorter_than_one_day() {
        assert_eq!(lookback_days(Duration::from_secs(0)), 1);
        assert_eq!(lookback_days(Duration::from_secs(3600)), 1);
    }

    #[test]
    fn raw_message_roundtrips_through_base64url() {
        let raw = encode_raw_message(
            "me@example.com",
            "bob@x.com",
            "On Leave",
            "Back soon.",
        );
        let decoded = String::from_utf8(URL_SAFE.decode(raw).unwrap()).unwrap();
        assert!(decoded.contains("To: bob@x.com\r\n"));
        assert!(decoded.contains("Subject: =?UTF-8?B?T24gTGVhdmU=?=\r\n"));
        assert!(decoded.ends_with("\r\n\r\nBack soon."));
    }

    #[test]
    fn non_ascii_subject_is_rfc2047_encoded() {
        let raw = encode_raw_message("me@x.com", "bob@x.com", "Congé annuel", "body");
        let decoded = String::from_utf8(URL_SAFE.decode(raw).unwrap()).unwrap();
        let line = decoded
            .lines()
            .find(|l| l.starts_with("Subject: "))
            .unwrap();
        let word = line
            .strip_prefix("Subject: =?UTF-8?B?")
            .unwrap()
            .strip_suffix("?=")
            .unwrap();
        assert_eq!(STANDARD.decode(word).unwrap(), "Congé annuel".as_bytes());
    }

    #[test]
    fn message_list_tolerates_absent_messages_field() {
        let list: MessageList = serde_json::from_str(r#"{"resultSizeEstimate": 0}"#).unwrap();
        assert!(list.messages.is_empty());
    }

    #[test]
    fn message_metadata_tolerates_absent_headers() {
        let meta: MessageMetadata = serde_json::from_str(r#"{"payload": {}}"#).unwrap();
        assert!(meta.payload.unwrap().headers.is_empty());
    }
}
