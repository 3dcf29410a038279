mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use moment_catcher::config::AppConfig;

#[derive(Parser)]
#[command(name = "moment-catcher", version, about = "Talk to your companion, one moment at a time")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct IdentityArgs {
    /// Your name
    #[arg(long)]
    traveler: String,
    /// Your companion's name
    #[arg(long)]
    companion: String,
}

#[derive(Subcommand)]
enum Command {
    /// Open an interactive conversation
    Chat {
        #[command(flatten)]
        identity: IdentityArgs,
    },
    /// List archived moments
    Moments {
        #[command(flatten)]
        identity: IdentityArgs,
    },
    /// Inspect or reset stored background preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
    /// Check that the companion service is reachable
    Health,
}

#[derive(Subcommand)]
enum PrefsAction {
    /// Print the stored preference document
    Show,
    /// Forget one user's background so the picker is shown again
    Clear {
        /// User id, e.g. `alice_tars`
        user_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = AppConfig::load()?;

    // Log to stderr so stdout stays clean for the conversation.
    let filter = EnvFilter::try_new(&config.logging.level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Chat { identity } => {
            cli::chat::chat(&config, &identity.traveler, &identity.companion).await?;
        }
        Command::Moments { identity } => {
            cli::moments::moments(&config, &identity.traveler, &identity.companion).await?;
        }
        Command::Prefs { action } => match action {
            PrefsAction::Show => cli::prefs::show(&config)?,
            PrefsAction::Clear { user_id } => cli::prefs::clear(&config, &user_id)?,
        },
        Command::Health => {
            cli::health(&config).await?;
        }
    }

    Ok(())
}
