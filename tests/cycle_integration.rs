//! End-to-end cycle tests against an in-memory mail service.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use vacation_mailer::auth::Session;
use vacation_mailer::config::ResponderConfig;
use vacation_mailer::error::MailError;
use vacation_mailer::mail::{Header, HeaderSet, MailService, MessageRef};
use vacation_mailer::pipeline::Responder;
use vacation_mailer::poller::spawn_responder;

/// Mailbox simulator: unread set shrinks as messages are relabeled,
/// sends are appended to an outbox.
#[derive(Default)]
struct Mailbox {
    unread: Mutex<Vec<MessageRef>>,
    headers: HashMap<String, HeaderSet>,
    thread_counts: HashMap<String, u64>,
    outbox: Mutex<Vec<(String, String)>>,
    cycles_listed: Mutex<usize>,
}

impl Mailbox {
    fn with_message(mut self, id: &str, thread: &str, from: &str, count: u64) -> Self {
        self.unread.get_mut().unwrap().push(MessageRef {
            message_id: id.to_string(),
            thread_id: thread.to_string(),
        });
        let address = from
            .rsplit(' ')
            .next()
            .unwrap()
            .trim_matches(['<', '>'])
            .to_string();
        self.headers
            .insert(id.to_string(), vec![Header::new("From", from)]);
        self.thread_counts.insert(address, count);
        self
    }
}

#[async_trait]
impl MailService for Mailbox {
    async fn list_recent_unread(
        &self,
        _session: &Session,
        _lookback: Duration,
    ) -> Result<Vec<MessageRef>, MailError> {
        *self.cycles_listed.lock().unwrap() += 1;
        Ok(self.unread.lock().unwrap().clone())
    }

    async fn get_headers(
        &self,
        _session: &Session,
        message_id: &str,
    ) -> Result<HeaderSet, MailError> {
        Ok(self.headers.get(message_id).cloned().unwrap_or_default())
    }

    async fn count_conversations(
        &self,
        _session: &Session,
        address: &str,
    ) -> Result<u64, MailError> {
        Ok(self.thread_counts.get(address).copied().unwrap_or(0))
    }

    async fn send_message(
        &self,
        _session: &Session,
        to: &str,
        subject: &str,
        _body: &str,
    ) -> Result<(), MailError> {
        self.outbox
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string()));
        Ok(())
    }

    async fn relabel_message(
        &self,
        _session: &Session,
        message_id: &str,
        _add: &[String],
        _remove: &[String],
    ) -> Result<(), MailError> {
        self.unread
            .lock()
            .unwrap()
            .retain(|m| m.message_id != message_id);
        Ok(())
    }
}

fn config() -> ResponderConfig {
    ResponderConfig {
        from_address: "owner@example.com".to_string(),
        ..ResponderConfig::default()
    }
}

#[tokio::test]
async fn mixed_mailbox_answers_only_first_contacts() {
    // bob: first contact with two duplicate messages.
    // alice: repeat correspondent.
    // noise: unparseable sender.
    let mailbox = Arc::new(
        Mailbox::default()
            .with_message("m1", "t1", "Bob <bob@x.com>", 1)
            .with_message("m2", "t1", "Bob <bob@x.com>", 1)
            .with_message("m3", "t2", "Alice <alice@x.com>", 3)
            .with_message("m4", "t3", "undisclosed-recipients", 0),
    );
    let responder = Responder::new(mailbox.clone(), config());
    let session = Session::from_token("test");

    let report = responder.run_cycle(&session).await.unwrap();

    assert_eq!(report.fetched, 4);
    assert_eq!(report.resolved, 3);
    assert_eq!(report.eligible, 1);
    assert_eq!(report.sent, 1);
    assert_eq!(report.marked, 2);

    let outbox = mailbox.outbox.lock().unwrap().clone();
    assert_eq!(outbox, vec![("bob@x.com".to_string(), "On Leave".to_string())]);

    // Alice's and the noise message stay unread; bob's are gone.
    let remaining: Vec<String> = mailbox
        .unread
        .lock()
        .unwrap()
        .iter()
        .map(|m| m.message_id.clone())
        .collect();
    assert_eq!(remaining, vec!["m3".to_string(), "m4".to_string()]);
}

#[tokio::test]
async fn consecutive_cycles_are_idempotent() {
    let mailbox = Arc::new(Mailbox::default().with_message("m1", "t1", "Bob <bob@x.com>", 1));
    let responder = Responder::new(mailbox.clone(), config());
    let session = Session::from_token("test");

    responder.run_cycle(&session).await.unwrap();
    let second = responder.run_cycle(&session).await.unwrap();

    assert_eq!(second.fetched, 0);
    assert_eq!(second.sent, 0);
    assert_eq!(mailbox.outbox.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn poller_runs_cycles_until_shutdown() {
    let mailbox = Arc::new(Mailbox::default());
    let cfg = ResponderConfig {
        from_address: "owner@example.com".to_string(),
        poll_interval: Duration::from_millis(5),
        ..ResponderConfig::default()
    };

    let (handle, shutdown) = spawn_responder(
        cfg,
        mailbox.clone(),
        None,
        Some(Session::from_token("test")),
    );

    tokio::time::sleep(Duration::from_millis(40)).await;
    shutdown.store(true, Ordering::Relaxed);
    handle.await.unwrap();

    assert!(*mailbox.cycles_listed.lock().unwrap() >= 2);
}
