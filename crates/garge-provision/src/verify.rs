use std::io::Write;

use anyhow::{Result, bail};
use clap::Args;
use garge_core::provision::verify_credentials;

use crate::prompt;
use crate::session::{DatabaseArgs, Session};

/// Arguments for the `verify` subcommand.
#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// MQTT username to check
    #[arg(long)]
    pub username: Option<String>,
}

/// Check a password against the stored hash.
pub async fn run(
    args: VerifyArgs,
    db: &DatabaseArgs,
    non_interactive: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let session = Session::open(db, non_interactive).await?;
    let username = prompt::prompt_username(non_interactive, args.username)?;
    let password = prompt::prompt_password(non_interactive)?;
    if !execute(&session, &username, &password, out).await? {
        bail!("password does not match for {username}");
    }
    Ok(())
}

/// Returns whether the password matched; prints the verdict either way.
pub async fn execute(
    session: &Session,
    username: &str,
    password: &str,
    out: &mut dyn Write,
) -> Result<bool> {
    let matched = verify_credentials(
        &session.pool,
        &session.store,
        &session.config.hashing,
        username,
        password,
    )
    .await?;
    let verdict = if matched { "matches" } else { "does NOT match" };
    writeln!(out, "Password {verdict} for '{username}'")?;
    Ok(matched)
}
