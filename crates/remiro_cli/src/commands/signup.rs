//! Signup command - Create a local account.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use remiro_chat::AuthStore;

use super::open_store;

#[derive(Args)]
pub struct SignupArgs {
    /// Email address
    #[arg(short, long)]
    email: String,

    /// Password (at least 6 characters)
    #[arg(short, long, env = "REMIRO_PASSWORD")]
    password: String,
}

pub async fn execute(args: SignupArgs, data_dir: Option<PathBuf>) -> Result<()> {
    let store = open_store(data_dir);
    let user_id = store.sign_up(&args.email, &args.password)?;
    info!("Account created in {}", store.root().display());

    println!("✅ Account created");
    println!("   User ID: {}", user_id);
    Ok(())
}
