//! CLI command definitions.
//!
//! Each subcommand maps to one operation on the chat layer.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use remiro_chat::{resolve_data_dir, FileStore};

pub mod chat;
pub mod history;
pub mod sessions;
pub mod signin;
pub mod signup;

/// Remiro - multi-specialist career advisor
#[derive(Parser)]
#[command(name = "remiro")]
#[command(version, about = "Remiro - multi-specialist career advisor")]
#[command(long_about = r#"
Remiro routes each message to up to three career specialists, optionally
looks up fresh market data, and merges their advice into one reply.

COMMANDS:
  signup    → Create a local account
  signin    → Check credentials and print the user id
  chat      → Send one message, or start an interactive conversation
  sessions  → List a user's conversations
  history   → Print the messages of one of your conversations

ENVIRONMENT:
  OPENAI_API_KEY / ANTHROPIC_API_KEY   Generation backend credential
  REMIRO_LLM_MODEL                     Model override
  SERPER_API_KEY                       Web research credential (optional)
  REMIRO_DATA_DIR                      Data directory (default .remiro)

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Configuration error
  4 - Authentication error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory for profiles, sessions and accounts
    #[arg(long, global = true, env = "REMIRO_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a local account
    Signup(signup::SignupArgs),

    /// Check credentials and print the user id
    Signin(signin::SigninArgs),

    /// Chat with Remiro
    Chat(chat::ChatArgs),

    /// List a user's sessions, newest first
    Sessions(sessions::SessionsArgs),

    /// Show the messages of a session
    History(history::HistoryArgs),
}

/// Open the file store under the resolved data directory.
pub fn open_store(data_dir: Option<PathBuf>) -> FileStore {
    FileStore::new(resolve_data_dir(data_dir))
}
