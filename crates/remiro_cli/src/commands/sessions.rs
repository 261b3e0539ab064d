//! Sessions command - List a user's conversations.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use remiro_chat::ChatManager;

use super::open_store;

#[derive(Args)]
pub struct SessionsArgs {
    /// User ID
    #[arg(short, long)]
    user: String,
}

pub async fn execute(args: SessionsArgs, data_dir: Option<PathBuf>) -> Result<()> {
    let manager = ChatManager::read_only(Arc::new(open_store(data_dir)));
    let sessions = manager.list_sessions_or_empty(&args.user);

    if sessions.is_empty() {
        println!("No sessions yet. Start one with `remiro chat --user {}`.", args.user);
        return Ok(());
    }

    for session in sessions {
        println!(
            "{}  {}  {}",
            session.id,
            session.created_at.format("%Y-%m-%d %H:%M"),
            session.title
        );
    }
    Ok(())
}
