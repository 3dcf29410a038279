//! CLI `prefs` commands: inspect and reset stored backgrounds.

use anyhow::Result;

use moment_catcher::config::AppConfig;
use moment_catcher::identity::UserId;
use moment_catcher::preferences::{self, PreferenceStore};

fn open(config: &AppConfig) -> Result<PreferenceStore> {
    Ok(PreferenceStore::open(preferences::create_backend(config)?))
}

/// Print the stored preference document.
pub fn show(config: &AppConfig) -> Result<()> {
    let store = open(config)?;

    println!("Background Preferences");
    println!("{}", "=".repeat(40));
    println!("  Location:    {}", store.location());
    println!(
        "  Selected:    {}",
        store
            .selected()
            .map(|b| b.to_string())
            .unwrap_or_else(|| "(none)".into())
    );
    println!();

    let mut any = false;
    for user in store.users() {
        if let Some(background) = store.get(user) {
            println!("  {:<24} {}", user, background);
            any = true;
        }
    }
    if !any {
        println!("  (no users have picked a background)");
    }
    Ok(())
}

/// Forget one user's background.
pub fn clear(config: &AppConfig, user_id: &str) -> Result<()> {
    let mut store = open(config)?;
    let user = UserId::new(user_id);
    match store.clear(&user)? {
        Some(background) => println!("Cleared {background} for {user}."),
        None => println!("No background stored for {user}."),
    }
    Ok(())
}
