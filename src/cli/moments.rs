//! CLI `moments` command: list the archive for an identity.

use anyhow::Result;

use moment_catcher::config::AppConfig;
use moment_catcher::identity::UserIdentity;
use moment_catcher::service::{self, CompanionService, MomentSummary};

use super::with_spinner;

pub async fn moments(config: &AppConfig, traveler: &str, companion: &str) -> Result<()> {
    let identity = UserIdentity::new(traveler, companion)?;
    let service = service::create_service(config)?;
    let user_id = identity.user_id();
    let moments = with_spinner("loading moments", service.list_moments(&user_id)).await?;

    println!("Moments for {user_id}");
    println!("{}", "=".repeat(40));
    print_moments(&moments);
    Ok(())
}

pub fn print_moments(moments: &[MomentSummary]) {
    if moments.is_empty() {
        println!("  (no moments yet)");
        return;
    }
    for moment in moments {
        let number = moment
            .display_number
            .map(|n| format!("#{n:<3}"))
            .unwrap_or_else(|| "    ".into());
        let title = moment.title.as_deref().unwrap_or("(untitled)");
        println!("{number} {title}");
        println!(
            "     {} · {} · {} messages",
            format_timestamp(&moment.timestamp),
            moment.emotion_tag.as_deref().unwrap_or("-"),
            moment.message_count
        );
        if let Some(summary) = moment.summary.as_deref() {
            println!("     {summary}");
        }
    }
}

/// `2026-03-01 21:04` for ISO timestamps; anything unparsable is shown as-is.
pub fn format_timestamp(raw: &str) -> String {
    if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(raw) {
        return ts.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(ts) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return ts.format("%Y-%m-%d %H:%M").to_string();
    }
    raw.to_string()
}
