use std::io::Write;

use anyhow::{Result, bail};
use clap::Args;
use garge_core::StoreError;

use crate::prompt;
use crate::session::{DatabaseArgs, Session};

/// Arguments for the `show` subcommand.
#[derive(Debug, Args)]
pub struct ShowArgs {
    /// MQTT username to inspect
    #[arg(long)]
    pub username: Option<String>,
}

/// Print a user's flags and ACL rows. Secrets are never printed.
pub async fn run(
    args: ShowArgs,
    db: &DatabaseArgs,
    non_interactive: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let session = Session::open(db, non_interactive).await?;
    let username = prompt::prompt_username(non_interactive, args.username)?;
    execute(&session, &username, out).await
}

pub async fn execute(session: &Session, username: &str, out: &mut dyn Write) -> Result<()> {
    let mut conn = session.pool.acquire().await.map_err(StoreError::from)?;
    let Some(user) = session.store.get_user(&mut conn, username).await? else {
        bail!("no MQTT user named '{username}'");
    };
    let rows = session.store.list_acl(&mut conn, username).await?;

    writeln!(out, "User:      {}", user.username)?;
    writeln!(out, "Superuser: {}", if user.is_superuser { "yes" } else { "no" })?;
    writeln!(out, "ACL rows:  {}", rows.len())?;
    for row in &rows {
        writeln!(
            out,
            "  {:<9} {:<5} qos={} retain={} {}",
            row.action.as_str(),
            row.permission.as_str(),
            row.qos.level(),
            u8::from(row.retain),
            row.topic,
        )?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::test_support;

    #[tokio::test]
    async fn show_lists_rows_without_secrets() {
        let session = test_support::session().await;
        let mut sink = Vec::new();
        crate::sensor::execute(&session, "aabbccddeeff", None, &mut sink)
            .await
            .unwrap();
        let mut conn = session.pool.acquire().await.unwrap();
        let user = session
            .store
            .get_user(&mut conn, "garge_aabbccddeeff")
            .await
            .unwrap()
            .unwrap();
        drop(conn);

        let mut out = Vec::new();
        execute(&session, "garge_aabbccddeeff", &mut out)
            .await
            .unwrap();
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Superuser: no"));
        assert!(printed.contains("ACL rows:  2"));
        assert!(printed.contains("garge/devices/garge_aabbccddeeff/#"));
        assert!(!printed.contains(&user.password_hash));
        assert!(!printed.contains(&user.salt));
    }

    #[tokio::test]
    async fn show_unknown_user_fails() {
        let session = test_support::session().await;
        let mut out = Vec::new();
        assert!(execute(&session, "ghost", &mut out).await.is_err());
    }
}
