//! One-shot provisioning of MQTT identities.
//!
//! Hashes the secret, then writes the user row and its ACL rows inside a
//! single transaction. The transaction is committed only after both writes
//! succeed; any error drops it and the database rolls back.

use garge_crypto::HashAlgorithm;
use sqlx::AnyPool;
use tracing::info;
use zeroize::Zeroizing;

use crate::acl::{AclAction, AclPermission, PermissionRule, Qos};
use crate::db::StoreError;
use crate::error::{Error, Result};
use crate::store::{AclStore, Identity};

/// An identity to create or update, with its full permission set.
pub struct ProvisionRequest {
    pub username: String,
    pub password: Zeroizing<String>,
    pub is_superuser: bool,
    pub rules: Vec<PermissionRule>,
}

impl std::fmt::Debug for ProvisionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisionRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("is_superuser", &self.is_superuser)
            .field("rules", &self.rules)
            .finish()
    }
}

/// Whether the username already existed before provisioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionAction {
    Created,
    Updated,
}

/// Result of a committed provisioning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionOutcome {
    pub username: String,
    pub action: ProvisionAction,
    pub acl_rows: u64,
}

/// Hash the request's password with a fresh salt and write user and ACL
/// rows in one transaction.
pub async fn provision(
    pool: &AnyPool,
    store: &AclStore,
    algorithm: &HashAlgorithm,
    request: &ProvisionRequest,
) -> Result<ProvisionOutcome> {
    if request.username.trim().is_empty() {
        return Err(Error::InvalidInput("username must not be empty".into()));
    }
    if request.rules.is_empty() {
        return Err(Error::InvalidInput(format!(
            "no ACL rules given for {}",
            request.username
        )));
    }

    let credentials = algorithm.derive(&request.password)?;
    let identity = Identity::new(request.username.clone(), credentials, request.is_superuser);

    let mut tx = pool.begin().await.map_err(StoreError::from)?;
    let existed = store.get_user(&mut tx, &identity.username).await?.is_some();
    store.upsert_user(&mut tx, &identity).await?;
    let acl_rows = store
        .set_acl(&mut tx, &identity.username, &request.rules)
        .await?;
    tx.commit().await.map_err(StoreError::from)?;

    let action = if existed {
        ProvisionAction::Updated
    } else {
        ProvisionAction::Created
    };
    info!(
        username = %identity.username,
        superuser = identity.is_superuser,
        algorithm = algorithm.name(),
        ?action,
        acl_rows,
        "MQTT identity provisioned"
    );

    Ok(ProvisionOutcome {
        username: identity.username,
        action,
        acl_rows,
    })
}

/// Check `password` against the stored credentials for `username`.
///
/// A wrong password is `Ok(false)`. An unknown username is
/// `StoreError::NotFound`.
pub async fn verify_credentials(
    pool: &AnyPool,
    store: &AclStore,
    algorithm: &HashAlgorithm,
    username: &str,
    password: &str,
) -> Result<bool> {
    let mut conn = pool.acquire().await.map_err(StoreError::from)?;
    let identity = store
        .get_user(&mut conn, username)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("MQTT user {username}")))?;

    Ok(algorithm.verify(password, &identity.password_hash, &identity.salt)?)
}

/// Full access to every topic, retained and not, at every QoS.
pub fn admin_rules() -> Vec<PermissionRule> {
    [true, false]
        .into_iter()
        .map(|retain| {
            PermissionRule::new(
                AclAction::All,
                AclPermission::Allow,
                "#",
                Qos::ALL.to_vec(),
                retain,
            )
        })
        .collect()
}

/// Username for a sensor: `<project>_<mac>`, MAC as 12 lowercase hex digits.
///
/// Accepts `AA:BB:CC:DD:EE:FF`, `aa-bb-cc-dd-ee-ff` or `aabbccddeeff`.
pub fn sensor_username(project: &str, mac: &str) -> Result<String> {
    let normalized: String = mac
        .trim()
        .chars()
        .filter(|c| !matches!(c, ':' | '-'))
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if normalized.len() != 12 || !normalized.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::InvalidInput(format!("not a MAC address: {mac:?}")));
    }
    Ok(format!("{project}_{normalized}"))
}

/// A sensor may use everything below its own topic, retained or not, at QoS 0.
pub fn sensor_rules(topic_prefix: &str, username: &str) -> Vec<PermissionRule> {
    let topic = format!("{topic_prefix}/{username}/#");
    [true, false]
        .into_iter()
        .map(|retain| {
            PermissionRule::new(
                AclAction::All,
                AclPermission::Allow,
                topic.clone(),
                Qos::AT_MOST_ONCE,
                retain,
            )
        })
        .collect()
}
