//! CLI `chat` command: an interactive conversation in the terminal.

use anyhow::{Context, Result};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use moment_catcher::companion::Companion;
use moment_catcher::config::AppConfig;
use moment_catcher::identity::UserIdentity;
use moment_catcher::moment::{Message, Role};
use moment_catcher::preferences::{self, BackgroundRef, PreferenceStore};
use moment_catcher::service::{self, CompanionService, MomentCard};
use moment_catcher::session::ViewMode;

use super::with_spinner;

const HELP: &str = "\
Commands:
  /save                          crystallize this moment into a card
  /fade                          let this moment go and start a new one
  /new                           start a new moment
  /voice <file>                  send a recorded clip
  /rename <traveler> <companion> change names
  /moments                       list archived moments
  /quit                          leave";

/// Run an interactive session until `/quit` or end of input.
pub async fn chat(config: &AppConfig, traveler: &str, companion_name: &str) -> Result<()> {
    let identity = UserIdentity::new(traveler, companion_name)?;
    let store = PreferenceStore::open(preferences::create_backend(config)?);
    let service: Arc<dyn CompanionService> = Arc::new(service::create_service(config)?);
    let mut companion = Companion::new(identity, store, service, &config.session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut mode = with_spinner("connecting", companion.enter()).await;

    loop {
        match mode {
            ViewMode::Picker => {
                match companion.store().selected() {
                    Some(last) => println!("Choose a background (last shown: {last}):"),
                    None => println!("Choose a background for your journey:"),
                }
                let Some(line) = prompt(&mut lines, "planet> ").await? else {
                    break;
                };
                if line.is_empty() {
                    continue;
                }
                mode = companion.select_background(BackgroundRef::new(line));
            }
            ViewMode::Transition => {
                println!("Warping to your companion...");
                mode = companion.complete_transition().await;
                if mode == ViewMode::Main {
                    print_transcript(&companion);
                    println!("{HELP}");
                }
            }
            ViewMode::Main => {
                let Some(line) = prompt(&mut lines, "you> ").await? else {
                    break;
                };
                if line.is_empty() {
                    continue;
                }
                match handle_line(&mut companion, &line).await? {
                    Some(next) => mode = next,
                    None => break,
                }
            }
        }
    }

    println!("Goodbye.");
    Ok(())
}

/// Handle one line in the main view. `None` ends the session.
async fn handle_line(companion: &mut Companion, line: &str) -> Result<Option<ViewMode>> {
    let mut words = line.split_whitespace();
    match words.next() {
        Some("/quit") => return Ok(None),
        Some("/help") => println!("{HELP}"),
        Some("/save") => match with_spinner("crystallizing", companion.archive()).await {
            Some(card) => {
                print_card(&card);
                print_transcript(companion);
            }
            None => eprintln!("Could not save this moment. Try again."),
        },
        Some("/fade") => match with_spinner("fading", companion.fade()).await {
            Ok(()) => print_transcript(companion),
            Err(e) => eprintln!("Could not fade this moment: {e}"),
        },
        Some("/new") => match with_spinner("starting a new moment", companion.restart()).await {
            Ok(()) => print_transcript(companion),
            Err(e) => eprintln!("Could not start a new moment: {e}"),
        },
        Some("/voice") => {
            let Some(path) = words.next() else {
                eprintln!("usage: /voice <file>");
                return Ok(Some(companion.mode()));
            };
            let audio = match tokio::fs::read(path).await {
                Ok(audio) => audio,
                Err(e) => {
                    eprintln!("Could not read {path}: {e}");
                    return Ok(Some(companion.mode()));
                }
            };
            let file_name = std::path::Path::new(path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "recording.wav".into());
            let sent = with_spinner("listening", companion.send_voice(audio, &file_name)).await;
            report_send(companion, sent);
        }
        Some("/rename") => {
            let (Some(traveler), Some(name)) = (words.next(), words.next()) else {
                eprintln!("usage: /rename <traveler> <companion>");
                return Ok(Some(companion.mode()));
            };
            match with_spinner("renaming", companion.rename(traveler, name)).await {
                Ok(mode) => {
                    println!("You are now {}.", companion.user_id());
                    return Ok(Some(mode));
                }
                Err(e) => eprintln!("Rename failed: {e:#}"),
            }
        }
        Some("/moments") => match with_spinner("loading moments", companion.moments()).await {
            Ok(moments) => super::moments::print_moments(&moments),
            Err(e) => eprintln!("Could not load moments: {e}"),
        },
        _ => {
            let sent = with_spinner("thinking", companion.send(line)).await;
            report_send(companion, sent);
        }
    }
    Ok(Some(companion.mode()))
}

fn report_send(
    companion: &Companion,
    sent: Result<moment_catcher::moment::SentMessage, moment_catcher::moment::SessionError>,
) {
    match sent {
        Ok(sent) if !sent.stale => {
            println!(
                "{}: {}  [{}]",
                companion.identity().companion_name,
                sent.reply,
                sent.emotion
            );
            if let Some(audio) = sent.audio_path {
                println!("  (audio: {audio})");
            }
        }
        Ok(_) => {}
        Err(e) => eprintln!("Send failed: {e}"),
    }
}

async fn prompt(lines: &mut Lines<BufReader<Stdin>>, label: &str) -> Result<Option<String>> {
    print!("{label}");
    std::io::stdout().flush()?;
    let line = lines.next_line().await.context("failed to read input")?;
    Ok(line.map(|l| l.trim().to_string()))
}

fn print_transcript(companion: &Companion) {
    let identity = companion.identity();
    for Message { role, content } in companion.controller().transcript() {
        let speaker = match role {
            Role::User => &identity.traveler_name,
            Role::Assistant => &identity.companion_name,
        };
        println!("{speaker}: {content}");
    }
}

fn print_card(card: &MomentCard) {
    println!();
    println!("  ✦ {}", card.title);
    println!("  {}", card.summary);
    println!(
        "  {} · {} · {} messages",
        super::moments::format_timestamp(&card.timestamp),
        card.emotion,
        card.message_count
    );
    println!();
}
