use std::io::Write;

use anyhow::Result;
use garge_core::StoreError;

use crate::session::{DatabaseArgs, Session};

/// Create the user and ACL tables if they do not exist yet.
pub async fn run(db: &DatabaseArgs, non_interactive: bool, out: &mut dyn Write) -> Result<()> {
    let session = Session::open(db, non_interactive).await?;
    execute(&session, out).await
}

pub async fn execute(session: &Session, out: &mut dyn Write) -> Result<()> {
    let mut tx = session.pool.begin().await.map_err(StoreError::from)?;
    session.store.ensure_schema(&mut tx).await?;
    tx.commit().await.map_err(StoreError::from)?;

    let config = session.store.config();
    writeln!(
        out,
        "Schema ready: {} and {} ({:?} columns)",
        config.user_table, config.acl_table, config.column_naming,
    )?;
    Ok(())
}
