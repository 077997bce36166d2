//! Core types for the workbasket engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A workbasket: a routing container for units of work and a node in the
/// distribution-target graph.
///
/// Targets are held by identifier only. A workbasket never embeds another
/// workbasket, so cyclic target graphs cannot produce cyclic values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workbasket {
    /// Empty until assigned by `WorkbasketManager::create`.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub owner: Option<String>,
    /// Set once, at first persistence (ms since epoch).
    #[serde(default)]
    pub created: i64,
    /// Advanced on every persisted update (ms since epoch).
    #[serde(default)]
    pub modified: i64,
    /// Ordered target workbasket ids.
    #[serde(default)]
    pub distribution_targets: Vec<String>,
}

impl Workbasket {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.distribution_targets = targets.into_iter().map(Into::into).collect();
        self
    }
}

/// Named permission flags carried by an access item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Open,
    Write,
    Append,
    Transfer,
    Distribute,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Read => "read",
            Permission::Open => "open",
            Permission::Write => "write",
            Permission::Append => "append",
            Permission::Transfer => "transfer",
            Permission::Distribute => "distribute",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An access-control entry granting a principal permission flags on a
/// workbasket.
///
/// Duplicate entries for the same (workbasket, principal) pair are allowed;
/// their grants combine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkbasketAccessItem {
    /// Assigned by `AccessControlManager::create`.
    #[serde(default)]
    pub id: String,
    pub workbasket_id: String,
    pub principal: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub open: bool,
    #[serde(default)]
    pub write: bool,
    #[serde(default)]
    pub append: bool,
    #[serde(default)]
    pub transfer: bool,
    #[serde(default)]
    pub distribute: bool,
}

impl WorkbasketAccessItem {
    pub fn new(workbasket_id: impl Into<String>, principal: impl Into<String>) -> Self {
        Self {
            workbasket_id: workbasket_id.into(),
            principal: principal.into(),
            ..Self::default()
        }
    }

    /// Set a single flag, builder style.
    pub fn with(mut self, permission: Permission, granted: bool) -> Self {
        match permission {
            Permission::Read => self.read = granted,
            Permission::Open => self.open = granted,
            Permission::Write => self.write = granted,
            Permission::Append => self.append = granted,
            Permission::Transfer => self.transfer = granted,
            Permission::Distribute => self.distribute = granted,
        }
        self
    }

    pub fn grants(&self, permission: Permission) -> bool {
        match permission {
            Permission::Read => self.read,
            Permission::Open => self.open,
            Permission::Write => self.write,
            Permission::Append => self.append,
            Permission::Transfer => self.transfer,
            Permission::Distribute => self.distribute,
        }
    }
}

/// Connection management mode.
///
/// - `Participate`: calls borrow the engine-owned connection, each inside its
///   own savepoint. This is the default.
/// - `Autocommit`: every call gets its own connection and commits as it goes.
/// - `Explicit`: calls run on a caller-bound connection; the caller commits,
///   rolls back and closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionManagementMode {
    #[default]
    Participate,
    Autocommit,
    Explicit,
}

impl ConnectionManagementMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionManagementMode::Participate => "participate",
            ConnectionManagementMode::Autocommit => "autocommit",
            ConnectionManagementMode::Explicit => "explicit",
        }
    }
}

impl fmt::Display for ConnectionManagementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionManagementMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "participate" => Ok(ConnectionManagementMode::Participate),
            "autocommit" => Ok(ConnectionManagementMode::Autocommit),
            "explicit" => Ok(ConnectionManagementMode::Explicit),
            other => Err(format!(
                "unknown connection mode '{}' (expected participate, autocommit or explicit)",
                other
            )),
        }
    }
}
