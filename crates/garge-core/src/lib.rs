//! `garge` Core Library
//!
//! Shared functionality for the garge provisioning tools:
//! - Configuration resolution and hierarchy
//! - MQTT user and ACL tables in the broker's authentication database
//! - ACL rule model and provisioning presets
//! - Common error types

pub mod acl;
pub mod config;
pub mod db;
pub mod error;
pub mod provision;
pub mod store;
pub mod tracing_init;

pub use acl::{AclAction, AclPermission, AclRow, PermissionRule, Qos, QosSpec};
pub use config::Config;
pub use db::StoreError;
pub use error::{Error, Result};
pub use store::{AclStore, AclWriteStrategy, ColumnNaming, Identity, StoreConfig};
