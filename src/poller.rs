//! Scheduler loop — runs one responder cycle per tick.
//!
//! Explicit replacement for a bare global timer: the loop owns the
//! session lifecycle, runs at most one cycle at a time, and stops when
//! the returned shutdown flag is set.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::auth::{SavedCredentials, Session, refresh_session};
use crate::config::ResponderConfig;
use crate::mail::MailService;
use crate::pipeline::Responder;

/// Spawn the background responder loop.
///
/// `initial_session` seeds the first cycle when one is already at hand
/// (tests, short-lived tokens from the environment); otherwise the loop
/// refreshes from `creds` before the first cycle and again whenever the
/// session nears expiry. A failed refresh or cycle is logged and the
/// loop waits for the next tick.
///
/// Returns a `JoinHandle` and a shutdown flag. Set the flag to stop.
pub fn spawn_responder(
    config: ResponderConfig,
    mail: Arc<dyn MailService>,
    creds: Option<SavedCredentials>,
    initial_session: Option<Session>,
) -> (JoinHandle<()>, Arc<AtomicBool>) {
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = Arc::clone(&shutdown);

    let handle = tokio::spawn(async move {
        info!(
            interval_secs = config.poll_interval.as_secs(),
            "Responder started"
        );

        let http = reqwest::Client::new();
        let mut tick = tokio::time::interval(config.poll_interval);
        let responder = Responder::new(mail, config);
        let mut session = initial_session;

        loop {
            tick.tick().await;

            if shutdown.load(Ordering::Relaxed) {
                info!("Responder shutting down");
                return;
            }

            if session.as_ref().is_none_or(Session::is_expired) {
                let Some(creds) = creds.as_ref() else {
                    error!("Session expired and no credentials to refresh with");
                    return;
                };
                match refresh_session(&http, creds).await {
                    Ok(fresh) => session = Some(fresh),
                    Err(e) => {
                        error!("Session refresh failed: {e}");
                        continue;
                    }
                }
            }

            let Some(current) = session.as_ref() else {
                continue;
            };
            if let Err(e) = responder.run_cycle(current).await {
                error!("Cycle aborted: {e}");
            }
        }
    });

    (handle, shutdown_flag)
}
