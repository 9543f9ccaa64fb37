//! SQL text for one table layout.
//!
//! Table names are validated by [`StoreConfig::validate`] and column names
//! come from a fixed list, so splicing them into statements is safe. All
//! values are bound as parameters. `$n` placeholders work for both the
//! PostgreSQL and `SQLite` drivers.

use super::config::{Columns, StoreConfig};

/// Rows per multi-row INSERT, far below PostgreSQL's bind parameter limit.
pub(crate) const MAX_ROWS_PER_INSERT: usize = 500;

/// Number of bound values per ACL row.
const ACL_ROW_PARAMS: usize = 6;

#[derive(Debug, Clone)]
pub(crate) struct Statements {
    pub upsert_user: String,
    pub select_user: String,
    pub delete_acl: String,
    pub merge_acl_row: String,
    pub select_acl: String,
    pub create_user_table: String,
    pub create_acl_table: String,
    pub create_acl_index: String,
    acl_table: String,
    columns: Columns,
}

impl Statements {
    pub fn new(config: &StoreConfig) -> Self {
        let c = config.column_naming.columns();
        let users = quote(&config.user_table);
        let acls = quote(&config.acl_table);
        let acl_columns = format!(
            "{}, {}, {}, {}, {}, {}",
            c.username, c.action, c.permission, c.topic, c.qos, c.retain
        );

        let upsert_user = format!(
            "INSERT INTO {users} ({u}, {s}, {h}, {su}) VALUES ($1, $2, $3, $4) \
             ON CONFLICT ({u}) DO UPDATE SET {s} = EXCLUDED.{s}, {h} = EXCLUDED.{h}, {su} = EXCLUDED.{su}",
            u = c.username,
            s = c.salt,
            h = c.password_hash,
            su = c.is_superuser,
        );

        let select_user = format!(
            "SELECT {u} AS username, {s} AS salt, {h} AS password_hash, \
             CAST(CASE WHEN {su} THEN 1 ELSE 0 END AS BIGINT) AS is_superuser \
             FROM {users} WHERE {u} = $1",
            u = c.username,
            s = c.salt,
            h = c.password_hash,
            su = c.is_superuser,
        );

        let delete_acl = format!("DELETE FROM {acls} WHERE {} = $1", c.username);

        let merge_acl_row = format!(
            "INSERT INTO {acls} ({acl_columns}) SELECT $1, $2, $3, $4, $5, $6 \
             WHERE NOT EXISTS (SELECT 1 FROM {acls} WHERE {u} = $1 AND {a} = $2 AND {p} = $3 \
             AND {t} = $4 AND {q} = $5 AND {r} = $6)",
            u = c.username,
            a = c.action,
            p = c.permission,
            t = c.topic,
            q = c.qos,
            r = c.retain,
        );

        let select_acl = format!(
            "SELECT {u} AS username, {a} AS action, {p} AS permission, {t} AS topic, \
             CAST({q} AS BIGINT) AS qos, CAST({r} AS BIGINT) AS retain \
             FROM {acls} WHERE {u} = $1 ORDER BY {t}, {a}, {p}, {r}, {q}",
            u = c.username,
            a = c.action,
            p = c.permission,
            t = c.topic,
            q = c.qos,
            r = c.retain,
        );

        let create_user_table = format!(
            "CREATE TABLE IF NOT EXISTS {users} (\
             {u} VARCHAR(255) NOT NULL PRIMARY KEY, \
             {s} VARCHAR(255) NOT NULL, \
             {h} VARCHAR(255) NOT NULL, \
             {su} BOOLEAN NOT NULL DEFAULT FALSE)",
            u = c.username,
            s = c.salt,
            h = c.password_hash,
            su = c.is_superuser,
        );

        let create_acl_table = format!(
            "CREATE TABLE IF NOT EXISTS {acls} (\
             {u} VARCHAR(255) NOT NULL, \
             {a} VARCHAR(16) NOT NULL CHECK ({a} IN ('publish', 'subscribe', 'all')), \
             {p} VARCHAR(16) NOT NULL CHECK ({p} IN ('allow', 'deny')), \
             {t} VARCHAR(1024) NOT NULL, \
             {q} INTEGER NOT NULL CHECK ({q} BETWEEN 0 AND 2), \
             {r} INTEGER NOT NULL CHECK ({r} IN (0, 1)))",
            u = c.username,
            a = c.action,
            p = c.permission,
            t = c.topic,
            q = c.qos,
            r = c.retain,
        );

        let create_acl_index = format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {acls} ({acl_columns})",
            quote(&format!("{}_rule_key", config.acl_table)),
        );

        Self {
            upsert_user,
            select_user,
            delete_acl,
            merge_acl_row,
            select_acl,
            create_user_table,
            create_acl_table,
            create_acl_index,
            acl_table: acls,
            columns: c,
        }
    }

    /// Multi-row INSERT for `rows` ACL rows (`$1`..`$6n`).
    pub fn insert_acl_rows(&self, rows: usize) -> String {
        let c = self.columns;
        let values = (0..rows)
            .map(|i| {
                let base = i * ACL_ROW_PARAMS;
                format!(
                    "(${}, ${}, ${}, ${}, ${}, ${})",
                    base + 1,
                    base + 2,
                    base + 3,
                    base + 4,
                    base + 5,
                    base + 6
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO {} ({}, {}, {}, {}, {}, {}) VALUES {values}",
            self.acl_table, c.username, c.action, c.permission, c.topic, c.qos, c.retain
        )
    }
}

fn quote(identifier: &str) -> String {
    format!("\"{identifier}\"")
}
