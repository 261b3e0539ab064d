//! Chat command - Run turns against the configured backend.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use remiro_chat::{ChatError, ChatManager, Settings, TurnOutcome};

use super::open_store;

/// Shown instead of a reply when a turn fails.
const APOLOGY: &str = "Sorry, something went wrong while preparing your answer.";

#[derive(Args)]
pub struct ChatArgs {
    /// User ID (from `remiro signup` / `remiro signin`)
    #[arg(short, long)]
    user: String,

    /// Continue an existing session
    #[arg(short, long)]
    session: Option<String>,

    /// Message to send; starts an interactive conversation when omitted
    message: Option<String>,
}

pub async fn execute(args: ChatArgs, data_dir: Option<PathBuf>) -> Result<()> {
    let store = open_store(data_dir);
    let settings = Settings::load(store.root())?;
    let manager = ChatManager::from_settings(Arc::new(store), &settings)?;

    match args.message {
        Some(message) => {
            let outcome = manager
                .run_turn(&args.user, &message, args.session.as_deref())
                .await
                .map_err(|e| {
                    print_failure(&e);
                    e
                })?;
            print_outcome(&outcome);
            Ok(())
        }
        None => interactive(&manager, &args.user, args.session).await,
    }
}

async fn interactive(manager: &ChatManager, user_id: &str, mut session: Option<String>) -> Result<()> {
    println!("💬 Remiro career advisor. Type 'exit' to quit.");
    if let Some(id) = &session {
        println!("   Continuing session {}", id);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"\n> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        match manager.run_turn(user_id, line, session.as_deref()).await {
            Ok(outcome) => {
                if session.is_none() {
                    info!("Started session {}", outcome.session_id);
                }
                session = Some(outcome.session_id.clone());
                print_outcome(&outcome);
            }
            Err(e) if e.is_config() => return Err(e.into()),
            Err(e) => print_failure(&e),
        }
    }

    if let Some(id) = session {
        println!("\nSession: {}", id);
    }
    Ok(())
}

fn print_outcome(outcome: &TurnOutcome) {
    debug!(
        path = ?outcome.trace.path().iter().map(|s| s.as_str()).collect::<Vec<_>>(),
        "Turn path"
    );
    if !outcome.specialists.is_empty() {
        let names: Vec<&str> = outcome.specialists.iter().map(|s| s.label()).collect();
        println!("🧭 {}", names.join(", "));
    }
    println!("\n{}", outcome.reply);
    println!("\n   Session: {}", outcome.session_id);
}

fn print_failure(error: &ChatError) {
    match error {
        ChatError::Turn(detail) => {
            println!("\n{}", APOLOGY);
            println!("   ({})", detail);
        }
        other => eprintln!("⚠️  {}", other),
    }
}
