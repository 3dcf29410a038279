pub mod chat;
pub mod moments;
pub mod prefs;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::time::Duration;

use moment_catcher::config::AppConfig;
use moment_catcher::service::{self, CompanionService};

/// Run `fut` behind a spinner. Remote calls have no timeout by default, so the
/// spinner is the only sign of a call that is still waiting.
pub async fn with_spinner<F: Future>(message: &'static str, fut: F) -> F::Output {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));

    let output = fut.await;
    pb.finish_and_clear();
    output
}

/// Ping the companion service and print its status.
pub async fn health(config: &AppConfig) -> Result<()> {
    let service = service::create_service(config)?;
    let health = with_spinner("checking service", service.health())
        .await
        .with_context(|| format!("companion service at {} is unreachable", service.base_url()))?;

    println!("Service:   {}", service.base_url());
    println!("Status:    {}", health.status);
    if !health.message.is_empty() {
        println!("Message:   {}", health.message);
    }
    Ok(())
}
