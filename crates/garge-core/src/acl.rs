//! MQTT topic permission rules.
//!
//! A [`PermissionRule`] is the declarative form an operator writes; an
//! [`AclRow`] is one stored row in the ACL table. Rules carrying several QoS
//! levels expand into one row per level.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Which client operation a rule governs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AclAction {
    Publish,
    Subscribe,
    All,
}

impl AclAction {
    /// Value stored in the ACL table.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::Subscribe => "subscribe",
            Self::All => "all",
        }
    }
}

impl FromStr for AclAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "publish" => Ok(Self::Publish),
            "subscribe" => Ok(Self::Subscribe),
            "all" => Ok(Self::All),
            other => Err(Error::InvalidInput(format!("unknown ACL action: {other}"))),
        }
    }
}

impl fmt::Display for AclAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a matching operation is allowed or denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AclPermission {
    Allow,
    Deny,
}

impl AclPermission {
    /// Value stored in the ACL table.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }
}

impl FromStr for AclPermission {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allow" => Ok(Self::Allow),
            "deny" => Ok(Self::Deny),
            other => Err(Error::InvalidInput(format!(
                "unknown ACL permission: {other}"
            ))),
        }
    }
}

impl fmt::Display for AclPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// MQTT quality-of-service level (0, 1 or 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Qos(u8);

impl Qos {
    pub const AT_MOST_ONCE: Self = Self(0);
    pub const AT_LEAST_ONCE: Self = Self(1);
    pub const EXACTLY_ONCE: Self = Self(2);

    /// All three levels, lowest first.
    pub const ALL: [Self; 3] = [Self::AT_MOST_ONCE, Self::AT_LEAST_ONCE, Self::EXACTLY_ONCE];

    pub fn new(level: u8) -> Result<Self, Error> {
        if level > 2 {
            return Err(Error::InvalidInput(format!(
                "QoS must be 0, 1 or 2 (got {level})"
            )));
        }
        Ok(Self(level))
    }

    pub const fn level(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Qos {
    type Error = Error;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::new(level)
    }
}

impl From<Qos> for u8 {
    fn from(qos: Qos) -> Self {
        qos.0
    }
}

/// One QoS level, or a set of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QosSpec {
    One(Qos),
    Many(Vec<Qos>),
}

impl QosSpec {
    /// Levels in the order given.
    pub fn levels(&self) -> &[Qos] {
        match self {
            Self::One(qos) => std::slice::from_ref(qos),
            Self::Many(levels) => levels,
        }
    }
}

impl From<Qos> for QosSpec {
    fn from(qos: Qos) -> Self {
        Self::One(qos)
    }
}

impl From<Vec<Qos>> for QosSpec {
    fn from(levels: Vec<Qos>) -> Self {
        Self::Many(levels)
    }
}

/// A declarative topic permission for one identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRule {
    pub action: AclAction,
    pub permission: AclPermission,
    /// Topic filter, possibly with broker wildcards. Not interpreted here.
    pub topic: String,
    pub qos: QosSpec,
    /// Rule applies to retained (`true`) or non-retained messages.
    /// Accepts `true`/`false` or the stored `1`/`0`.
    #[serde(default, deserialize_with = "deserialize_retain")]
    pub retain: bool,
}

impl PermissionRule {
    pub fn new(
        action: AclAction,
        permission: AclPermission,
        topic: impl Into<String>,
        qos: impl Into<QosSpec>,
        retain: bool,
    ) -> Self {
        Self {
            action,
            permission,
            topic: topic.into(),
            qos: qos.into(),
            retain,
        }
    }

    /// Expand into stored rows for `username`, one per QoS level.
    pub fn expand(&self, username: &str) -> Vec<AclRow> {
        self.qos
            .levels()
            .iter()
            .map(|&qos| AclRow {
                username: username.to_string(),
                action: self.action,
                permission: self.permission,
                topic: self.topic.clone(),
                qos,
                retain: self.retain,
            })
            .collect()
    }
}

fn deserialize_retain<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Retain {
        Flag(bool),
        Int(u8),
    }

    match Retain::deserialize(deserializer)? {
        Retain::Flag(flag) => Ok(flag),
        Retain::Int(0) => Ok(false),
        Retain::Int(1) => Ok(true),
        Retain::Int(other) => Err(serde::de::Error::custom(format!(
            "retain must be 0 or 1 (got {other})"
        ))),
    }
}

/// One row of the ACL table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AclRow {
    pub username: String,
    pub action: AclAction,
    pub permission: AclPermission,
    pub topic: String,
    pub qos: Qos,
    #[serde(deserialize_with = "deserialize_retain")]
    pub retain: bool,
}

/// Expand `rules` for `username`, dropping exact duplicates but keeping the
/// first-seen order.
pub fn expand_rules(username: &str, rules: &[PermissionRule]) -> Vec<AclRow> {
    let mut rows: Vec<AclRow> = Vec::new();
    for row in rules.iter().flat_map(|rule| rule.expand(username)) {
        if !rows.contains(&row) {
            rows.push(row);
        }
    }
    rows
}
