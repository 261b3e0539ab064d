//! Signin command - Verify credentials.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use remiro_chat::AuthStore;

use super::open_store;

#[derive(Args)]
pub struct SigninArgs {
    /// Email address
    #[arg(short, long)]
    email: String,

    /// Password
    #[arg(short, long, env = "REMIRO_PASSWORD")]
    password: String,
}

pub async fn execute(args: SigninArgs, data_dir: Option<PathBuf>) -> Result<()> {
    let user_id = open_store(data_dir).sign_in(&args.email, &args.password)?;
    println!("{}", user_id);
    Ok(())
}
