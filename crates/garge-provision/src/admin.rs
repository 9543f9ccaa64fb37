use std::io::Write;

use anyhow::Result;
use clap::Args;
use garge_core::provision::{ProvisionOutcome, ProvisionRequest, admin_rules, provision};
use zeroize::Zeroizing;

use crate::prompt;
use crate::session::{DatabaseArgs, Session};

/// Arguments for the `admin` subcommand.
#[derive(Debug, Args)]
pub struct AdminArgs {
    /// MQTT username for the administrator
    #[arg(long)]
    pub username: Option<String>,
}

/// Provision an MQTT superuser with full access to every topic.
pub async fn run(
    args: AdminArgs,
    db: &DatabaseArgs,
    non_interactive: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let session = Session::open(db, non_interactive).await?;
    let username = prompt::prompt_username(non_interactive, args.username)?;
    let password = prompt::prompt_new_password(non_interactive)?;
    execute(&session, username, password, out).await?;
    Ok(())
}

/// Write the admin identity and its ACL rows.
pub async fn execute(
    session: &Session,
    username: String,
    password: Zeroizing<String>,
    out: &mut dyn Write,
) -> Result<ProvisionOutcome> {
    let request = ProvisionRequest {
        username,
        password,
        is_superuser: true,
        rules: admin_rules(),
    };
    let outcome = provision(
        &session.pool,
        &session.store,
        &session.config.hashing,
        &request,
    )
    .await?;

    writeln!(
        out,
        "Admin user '{}' {} ({} ACL rows, {} strategy)",
        outcome.username,
        crate::cli::describe(outcome.action),
        outcome.acl_rows,
        session.store.strategy(),
    )?;
    Ok(outcome)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use garge_core::provision::{ProvisionAction, verify_credentials};

    use super::*;
    use crate::session::test_support;

    #[tokio::test]
    async fn admin_is_superuser_with_full_access() {
        let session = test_support::session().await;
        let mut out = Vec::new();
        let outcome = execute(&session, "admin".into(), Zeroizing::new("s3cret".into()), &mut out)
            .await
            .unwrap();
        assert_eq!(outcome.action, ProvisionAction::Created);
        assert_eq!(outcome.acl_rows, 6);

        let mut conn = session.pool.acquire().await.unwrap();
        let user = session
            .store
            .get_user(&mut conn, "admin")
            .await
            .unwrap()
            .unwrap();
        assert!(user.is_superuser);
        drop(conn);

        assert!(
            verify_credentials(
                &session.pool,
                &session.store,
                &session.config.hashing,
                "admin",
                "s3cret"
            )
            .await
            .unwrap()
        );
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Admin user 'admin' created"));
        assert!(!printed.contains("s3cret"));
    }

    #[tokio::test]
    async fn rerun_updates_existing_admin() {
        let session = test_support::session().await;
        let mut out = Vec::new();
        execute(&session, "admin".into(), Zeroizing::new("one".into()), &mut out)
            .await
            .unwrap();
        let outcome = execute(&session, "admin".into(), Zeroizing::new("two".into()), &mut out)
            .await
            .unwrap();
        assert_eq!(outcome.action, ProvisionAction::Updated);

        let mut conn = session.pool.acquire().await.unwrap();
        let rows = session.store.list_acl(&mut conn, "admin").await.unwrap();
        assert_eq!(rows.len(), 6);
    }
}
