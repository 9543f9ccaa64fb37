//! Data models for the MQTT user and ACL tables.

use garge_crypto::SaltedHash;

use crate::acl::{AclRow, Qos};
use crate::db::StoreError;

/// An MQTT identity as stored in the user table.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub salt: String,
    pub password_hash: String,
    pub is_superuser: bool,
}

impl Identity {
    pub fn new(username: impl Into<String>, credentials: SaltedHash, is_superuser: bool) -> Self {
        Self {
            username: username.into(),
            salt: credentials.salt,
            password_hash: credentials.hash,
            is_superuser,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), StoreError> {
        if self.username.trim().is_empty() {
            return Err(StoreError::InvalidInput("username must not be empty".into()));
        }
        if self.salt.is_empty() || self.password_hash.is_empty() {
            return Err(StoreError::InvalidInput(format!(
                "salt and password hash are required for {}",
                self.username
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("username", &self.username)
            .field("salt", &"[REDACTED]")
            .field("password_hash", &"[REDACTED]")
            .field("is_superuser", &self.is_superuser)
            .finish()
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRecord {
    pub username: String,
    pub salt: String,
    pub password_hash: String,
    pub is_superuser: i64,
}

impl From<UserRecord> for Identity {
    fn from(record: UserRecord) -> Self {
        Self {
            username: record.username,
            salt: record.salt,
            password_hash: record.password_hash,
            is_superuser: record.is_superuser != 0,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AclRecord {
    pub username: String,
    pub action: String,
    pub permission: String,
    pub topic: String,
    pub qos: i64,
    pub retain: i64,
}

impl TryFrom<AclRecord> for AclRow {
    type Error = StoreError;

    fn try_from(record: AclRecord) -> Result<Self, Self::Error> {
        let unexpected = |e: crate::Error| StoreError::Query(format!("unexpected ACL row: {e}"));
        let qos = u8::try_from(record.qos)
            .map_err(|_| StoreError::Query(format!("unexpected ACL QoS {}", record.qos)))?;
        Ok(Self {
            username: record.username,
            action: record.action.parse().map_err(unexpected)?,
            permission: record.permission.parse().map_err(unexpected)?,
            topic: record.topic,
            qos: Qos::new(qos).map_err(unexpected)?,
            retain: record.retain != 0,
        })
    }
}
