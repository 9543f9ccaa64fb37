//! MQTT user and ACL tables in the broker's authentication database.
//!
//! Every operation takes a connection borrowed from a caller-owned
//! transaction. The store never begins, commits or rolls back; the caller
//! commits once both the user upsert and the ACL write have succeeded.

mod config;
mod models;
mod queries;
mod sql;


pub use config::{AclWriteStrategy, ColumnNaming, StoreConfig};
pub use models::Identity;

use crate::db::StoreError;

/// User/ACL store for one table layout.
#[derive(Debug, Clone)]
pub struct AclStore {
    config: StoreConfig,
    sql: sql::Statements,
}

impl AclStore {
    /// Validate `config` and prepare the statements for its tables.
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        config.validate()?;
        let sql = sql::Statements::new(&config);
        Ok(Self { config, sql })
    }

    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub const fn strategy(&self) -> AclWriteStrategy {
        self.config.acl_write_strategy
    }
}
