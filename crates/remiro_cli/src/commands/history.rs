//! History command - Print a session's messages.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use remiro_chat::ChatManager;
use remiro_core::MessageRole;

use super::open_store;

#[derive(Args)]
pub struct HistoryArgs {
    /// User ID owning the session
    #[arg(short, long)]
    user: String,

    /// Session ID
    #[arg(short, long)]
    session: String,
}

pub async fn execute(args: HistoryArgs, data_dir: Option<PathBuf>) -> Result<()> {
    let manager = ChatManager::read_only(Arc::new(open_store(data_dir)));
    let messages = manager.session_messages_or_empty(&args.user, &args.session);

    if messages.is_empty() {
        println!("No messages.");
        return Ok(());
    }

    for message in messages {
        let speaker = match message.role {
            MessageRole::User => "You",
            MessageRole::Assistant => "Remiro",
            MessageRole::System => "System",
        };
        println!("[{}] {}:", message.created_at.format("%H:%M"), speaker);
        println!("{}\n", message.content);
    }
    Ok(())
}
