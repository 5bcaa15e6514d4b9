//! The responder cycle: fetch → resolve → filter → act.
//!
//! Stages run strictly in order, one API call at a time. The mailbox's
//! label state is the only thing that persists between cycles: a
//! message stays unread until its correspondent has been answered, so
//! a failed cycle simply re-evaluates the same messages next time.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::auth::Session;
use crate::config::ResponderConfig;
use crate::error::MailError;
use crate::mail::gmail::UNREAD_LABEL;
use crate::mail::{MailService, MessageRef};
use crate::pipeline::types::{CorrespondentIndex, extract_correspondent};

/// Counters from one completed cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Message refs returned by the unread fetch.
    pub fetched: usize,
    /// Messages that resolved to a correspondent.
    pub resolved: usize,
    /// Distinct correspondents that passed the first-contact check.
    pub eligible: usize,
    /// Autoresponses sent.
    pub sent: usize,
    /// Autoresponses that failed in transport (messages left unread).
    pub send_failures: usize,
    /// Messages relabeled as processed.
    pub marked: usize,
}

/// Runs one fetch→resolve→filter→act cycle against a mail service.
pub struct Responder {
    mail: Arc<dyn MailService>,
    config: ResponderConfig,
}

impl Responder {
    pub fn new(mail: Arc<dyn MailService>, config: ResponderConfig) -> Self {
        Self { mail, config }
    }

    /// Run one full cycle.
    ///
    /// Transport errors during fetch, resolve, or filter abort the
    /// cycle; the caller retries on the next tick. Send and relabel
    /// failures are isolated per correspondent.
    pub async fn run_cycle(&self, session: &Session) -> Result<CycleReport, MailError> {
        let refs = self
            .mail
            .list_recent_unread(session, self.config.lookback)
            .await?;

        let mut report = CycleReport {
            fetched: refs.len(),
            ..CycleReport::default()
        };

        if refs.is_empty() {
            debug!("No recent unread messages");
            return Ok(report);
        }

        let index = self.resolve(session, &refs).await?;
        report.resolved = index.message_count();

        let eligible = self.filter(session, &index).await?;
        report.eligible = eligible.len();

        self.act(session, &index, &eligible, &mut report).await;

        info!(
            fetched = report.fetched,
            resolved = report.resolved,
            eligible = report.eligible,
            sent = report.sent,
            send_failures = report.send_failures,
            marked = report.marked,
            "Cycle complete"
        );
        Ok(report)
    }

    /// Resolve stage: group fetched messages by correspondent.
    ///
    /// Messages with no headers or an unparseable `From` contribute no
    /// correspondent and drop out here.
    pub async fn resolve(
        &self,
        session: &Session,
        refs: &[MessageRef],
    ) -> Result<CorrespondentIndex, MailError> {
        let mut index = CorrespondentIndex::new();
        for msg in refs {
            let headers = self.mail.get_headers(session, &msg.message_id).await?;
            match extract_correspondent(&headers) {
                Some(address) => index.insert(address, msg.message_id.clone()),
                None => {
                    debug!(message_id = %msg.message_id, "No correspondent extracted, skipping");
                }
            }
        }
        Ok(index)
    }

    /// Filter stage: keep correspondents whose mailbox history holds
    /// exactly the first-contact thread count.
    ///
    /// Runs once per distinct correspondent, never per message, so
    /// duplicate senders collapse to a single check.
    pub async fn filter(
        &self,
        session: &Session,
        index: &CorrespondentIndex,
    ) -> Result<Vec<String>, MailError> {
        let mut eligible = Vec::new();
        for address in index.correspondents() {
            let count = self.mail.count_conversations(session, address).await?;
            if count == self.config.first_contact_threshold {
                eligible.push(address.to_string());
            } else {
                debug!(
                    correspondent = %address,
                    conversations = count,
                    "Not a first contact, skipping"
                );
            }
        }
        Ok(eligible)
    }

    /// Act stage: send one reply per eligible correspondent, then mark
    /// every one of their messages as processed.
    ///
    /// A failed send leaves that correspondent's messages unread so the
    /// next cycle retries them; remaining correspondents still proceed.
    async fn act(
        &self,
        session: &Session,
        index: &CorrespondentIndex,
        eligible: &[String],
        report: &mut CycleReport,
    ) {
        for address in eligible {
            match self
                .mail
                .send_message(
                    session,
                    address,
                    &self.config.subject_template,
                    &self.config.body_template,
                )
                .await
            {
                Ok(()) => {
                    info!(
                        to = %address,
                        message_id = index.representative(address).unwrap_or(""),
                        "Autoresponse sent"
                    );
                    report.sent += 1;
                    self.mark(session, index, address, report).await;
                }
                Err(e) => {
                    error!(
                        to = %address,
                        error = %e,
                        "Autoresponse send failed, leaving messages unread"
                    );
                    report.send_failures += 1;
                }
            }
        }
    }

    /// Mark every message of one answered correspondent: drop the
    /// unread label, add the processed label.
    ///
    /// Marking all duplicates (not just a representative) is what
    /// suppresses this correspondent's other messages in later cycles.
    async fn mark(
        &self,
        session: &Session,
        index: &CorrespondentIndex,
        address: &str,
        report: &mut CycleReport,
    ) {
        let add = [self.config.processed_label.clone()];
        let remove = [UNREAD_LABEL.to_string()];
        for message_id in index.message_ids(address) {
            match self
                .mail
                .relabel_message(session, message_id, &add, &remove)
                .await
            {
                Ok(()) => {
                    debug!(message_id = %message_id, "Marked message as processed");
                    report.marked += 1;
                }
                Err(e) => {
                    // The message stays unread and is re-fetched next
                    // cycle. The thread search only counts mail from the
                    // correspondent, so the reply just sent does not make
                    // them ineligible: a duplicate send is possible.
                    warn!(message_id = %message_id, error = %e, "Failed to relabel message");
                }
            }
        }
    }
}
