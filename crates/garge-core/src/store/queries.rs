//! Database queries for the user/ACL store.

use sqlx::AnyConnection;
use tracing::{debug, info};

use super::models::{AclRecord, Identity, UserRecord};
use super::sql::MAX_ROWS_PER_INSERT;
use super::{AclStore, AclWriteStrategy};
use crate::acl::{AclRow, PermissionRule, expand_rules};
use crate::db::StoreError;

impl AclStore {
    // =========================================================================
    // Schema
    // =========================================================================

    /// Create the user and ACL tables if they do not exist yet.
    pub async fn ensure_schema(&self, conn: &mut AnyConnection) -> Result<(), StoreError> {
        for statement in [
            &self.sql.create_user_table,
            &self.sql.create_acl_table,
            &self.sql.create_acl_index,
        ] {
            sqlx::query(statement).execute(&mut *conn).await?;
        }

        info!(
            user_table = %self.config.user_table,
            acl_table = %self.config.acl_table,
            "Provisioning tables ready"
        );
        Ok(())
    }

    // =========================================================================
    // User queries
    // =========================================================================

    /// Insert the identity, or overwrite salt, hash and superuser flag of an
    /// existing row with the same username.
    pub async fn upsert_user(
        &self,
        conn: &mut AnyConnection,
        identity: &Identity,
    ) -> Result<(), StoreError> {
        identity.validate()?;

        sqlx::query(&self.sql.upsert_user)
            .bind(identity.username.as_str())
            .bind(identity.salt.as_str())
            .bind(identity.password_hash.as_str())
            .bind(identity.is_superuser)
            .execute(&mut *conn)
            .await?;

        debug!(
            username = %identity.username,
            superuser = identity.is_superuser,
            "MQTT user upserted"
        );
        Ok(())
    }

    /// Get a user by username.
    pub async fn get_user(
        &self,
        conn: &mut AnyConnection,
        username: &str,
    ) -> Result<Option<Identity>, StoreError> {
        let record = sqlx::query_as::<_, UserRecord>(&self.sql.select_user)
            .bind(username)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(record.map(Identity::from))
    }

    // =========================================================================
    // ACL queries
    // =========================================================================

    /// Write `rules` for `username` using the configured strategy.
    ///
    /// Returns the number of rows inserted. Fails with `InvalidInput` before
    /// touching the database when there is nothing to write.
    pub async fn set_acl(
        &self,
        conn: &mut AnyConnection,
        username: &str,
        rules: &[PermissionRule],
    ) -> Result<u64, StoreError> {
        if username.trim().is_empty() {
            return Err(StoreError::InvalidInput("username must not be empty".into()));
        }
        if rules.is_empty() {
            return Err(StoreError::InvalidInput(
                "at least one ACL rule is required".into(),
            ));
        }
        if rules.iter().any(|rule| rule.topic.is_empty()) {
            return Err(StoreError::InvalidInput(
                "ACL rule topic must not be empty".into(),
            ));
        }
        let rows = expand_rules(username, rules);
        if rows.is_empty() {
            return Err(StoreError::InvalidInput(
                "ACL rules carry no QoS levels".into(),
            ));
        }

        let written = match self.strategy() {
            AclWriteStrategy::Replace => {
                let deleted = sqlx::query(&self.sql.delete_acl)
                    .bind(username)
                    .execute(&mut *conn)
                    .await?
                    .rows_affected();
                debug!(username, deleted, "Existing ACL rows removed");
                self.insert_rows(conn, &rows).await?
            }
            AclWriteStrategy::Merge => self.merge_rows(conn, &rows).await?,
        };

        info!(
            username,
            strategy = %self.strategy(),
            requested = rows.len(),
            written,
            "ACL rules written"
        );
        Ok(written)
    }

    /// List the stored ACL rows for a username.
    pub async fn list_acl(
        &self,
        conn: &mut AnyConnection,
        username: &str,
    ) -> Result<Vec<AclRow>, StoreError> {
        let records = sqlx::query_as::<_, AclRecord>(&self.sql.select_acl)
            .bind(username)
            .fetch_all(&mut *conn)
            .await?;

        records.into_iter().map(AclRow::try_from).collect()
    }

    async fn insert_rows(
        &self,
        conn: &mut AnyConnection,
        rows: &[AclRow],
    ) -> Result<u64, StoreError> {
        let mut written = 0;
        for chunk in rows.chunks(MAX_ROWS_PER_INSERT) {
            let statement = self.sql.insert_acl_rows(chunk.len());
            let mut query = sqlx::query(&statement);
            for row in chunk {
                query = query
                    .bind(row.username.as_str())
                    .bind(row.action.as_str())
                    .bind(row.permission.as_str())
                    .bind(row.topic.as_str())
                    .bind(i32::from(row.qos.level()))
                    .bind(i32::from(row.retain));
            }
            written += query.execute(&mut *conn).await?.rows_affected();
        }
        Ok(written)
    }

    async fn merge_rows(
        &self,
        conn: &mut AnyConnection,
        rows: &[AclRow],
    ) -> Result<u64, StoreError> {
        let mut written = 0;
        for row in rows {
            written += sqlx::query(&self.sql.merge_acl_row)
                .bind(row.username.as_str())
                .bind(row.action.as_str())
                .bind(row.permission.as_str())
                .bind(row.topic.as_str())
                .bind(i32::from(row.qos.level()))
                .bind(i32::from(row.retain))
                .execute(&mut *conn)
                .await?
                .rows_affected();
        }
        Ok(written)
    }
}
