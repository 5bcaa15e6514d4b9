use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use vacation_mailer::auth::SavedCredentials;
use vacation_mailer::config::ResponderConfig;
use vacation_mailer::mail::GmailClient;
use vacation_mailer::poller::spawn_responder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ResponderConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export VACATION_FROM_ADDRESS=you@example.com");
        std::process::exit(1);
    });

    let token_path = PathBuf::from(
        std::env::var("VACATION_TOKEN_PATH").unwrap_or_else(|_| "./token.json".to_string()),
    );
    let creds = SavedCredentials::load(&token_path).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  token.json must hold an authorized_user credential (client_id,");
        eprintln!("  client_secret, refresh_token) from the one-time consent flow.");
        std::process::exit(1);
    });

    eprintln!("📬 vacation-mailer v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   From:     {}", config.from_address);
    eprintln!("   Interval: {}s", config.poll_interval.as_secs());
    eprintln!("   Label:    {}", config.processed_label);
    eprintln!("   Ctrl+C to stop.\n");

    let mail = Arc::new(GmailClient::new(
        reqwest::Client::new(),
        config.from_address.clone(),
    ));

    let (handle, shutdown) = spawn_responder(config, mail, Some(creds), None);

    tokio::signal::ctrl_c().await?;
    shutdown.store(true, Ordering::Relaxed);
    handle.abort();
    let _ = handle.await;

    Ok(())
}
