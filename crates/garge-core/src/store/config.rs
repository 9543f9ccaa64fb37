//! Table layout and write policy for the user/ACL store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::db::StoreError;

/// Longest accepted table name. Leaves room for derived index names inside
/// PostgreSQL's 63-byte identifier limit.
const MAX_TABLE_NAME_LEN: usize = 48;

/// Where the store writes and how it reconciles ACL rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub user_table: String,
    pub acl_table: String,
    #[serde(default)]
    pub column_naming: ColumnNaming,
    #[serde(default)]
    pub acl_write_strategy: AclWriteStrategy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            user_table: "EMQXMqttUsers".to_string(),
            acl_table: "EMQXMqttAcls".to_string(),
            column_naming: ColumnNaming::default(),
            acl_write_strategy: AclWriteStrategy::default(),
        }
    }
}

impl StoreConfig {
    /// Check that both table names are safe to splice into SQL.
    pub fn validate(&self) -> Result<(), StoreError> {
        validate_table_name(&self.user_table)?;
        validate_table_name(&self.acl_table)?;
        if self.user_table == self.acl_table {
            return Err(StoreError::InvalidInput(
                "user table and ACL table must differ".into(),
            ));
        }
        Ok(())
    }
}

fn validate_table_name(name: &str) -> Result<(), StoreError> {
    let valid = !name.is_empty()
        && name.len() <= MAX_TABLE_NAME_LEN
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidInput(format!(
            "invalid table name {name:?}: use up to {MAX_TABLE_NAME_LEN} ASCII letters, digits or underscores"
        )))
    }
}

/// Column naming convention of the target tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnNaming {
    /// `"Username"`, `"PasswordHash"`, `"IsSuperuser"`, `"Qos"`, ...
    #[default]
    Pascal,
    /// `username`, `password_hash`, `is_superuser`, `qos`, ... (EMQX defaults)
    Snake,
}

/// Quoted column identifiers for one naming convention.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Columns {
    pub username: &'static str,
    pub salt: &'static str,
    pub password_hash: &'static str,
    pub is_superuser: &'static str,
    pub action: &'static str,
    pub permission: &'static str,
    pub topic: &'static str,
    pub qos: &'static str,
    pub retain: &'static str,
}

impl ColumnNaming {
    pub(crate) const fn columns(self) -> Columns {
        match self {
            Self::Pascal => Columns {
                username: r#""Username""#,
                salt: r#""Salt""#,
                password_hash: r#""PasswordHash""#,
                is_superuser: r#""IsSuperuser""#,
                action: r#""Action""#,
                permission: r#""Permission""#,
                topic: r#""Topic""#,
                qos: r#""Qos""#,
                retain: r#""Retain""#,
            },
            Self::Snake => Columns {
                username: r#""username""#,
                salt: r#""salt""#,
                password_hash: r#""password_hash""#,
                is_superuser: r#""is_superuser""#,
                action: r#""action""#,
                permission: r#""permission""#,
                topic: r#""topic""#,
                qos: r#""qos""#,
                retain: r#""retain""#,
            },
        }
    }
}

/// How `set_acl` treats rows already stored for the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AclWriteStrategy {
    /// Delete every existing row for the username, then insert the new set.
    #[default]
    Replace,
    /// Insert new rows, skipping exact duplicates. Old rows stay in place.
    Merge,
}

impl fmt::Display for AclWriteStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace => f.write_str("replace"),
            Self::Merge => f.write_str("merge"),
        }
    }
}

impl FromStr for AclWriteStrategy {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "replace" => Ok(Self::Replace),
            "merge" => Ok(Self::Merge),
            other => Err(StoreError::InvalidInput(format!(
                "unknown ACL write strategy: {other}"
            ))),
        }
    }
}
