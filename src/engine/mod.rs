//! Engine facade: the single entry point tying the managers to one
//! connection controller.
//!
//! Each `Engine` owns its own transaction state, so several engines (even over
//! the same database) can coexist with independent modes and connections.

pub mod access;
pub mod connection;
pub mod permission;
pub mod workbasket;

pub use access::AccessControlManager;
pub use connection::{ConnectionController, ConnectionHandle};
pub use permission::{PermissionChecker, SecurityContext};
pub use workbasket::WorkbasketManager;

use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::types::ConnectionManagementMode;
use std::sync::Arc;
use tracing::debug;

pub struct Engine {
    connections: Arc<ConnectionController>,
    security: Arc<SecurityContext>,
    workbaskets: WorkbasketManager,
    access: AccessControlManager,
}

impl Engine {
    /// Build an engine over an opened database.
    pub fn new(db: Database, mode: ConnectionManagementMode, security: SecurityContext) -> Self {
        debug!(%mode, security = security.enabled(), "Engine created");
        let connections = Arc::new(ConnectionController::new(db, mode));
        let security = Arc::new(security);
        let access = AccessControlManager::new(Arc::clone(&connections));
        let workbaskets = WorkbasketManager::new(
            Arc::clone(&connections),
            Arc::new(access.clone()),
            Arc::clone(&security),
        );

        Self {
            connections,
            security,
            workbaskets,
            access,
        }
    }

    /// Open the configured database and build an engine over it.
    pub fn open(config: &Config) -> Result<Self> {
        let db = if config.database.in_memory {
            Database::open_in_memory()?
        } else {
            config.ensure_db_dir()?;
            Database::open_with_timeout(&config.database.path, config.database.busy_timeout())?
        };

        Ok(Self::new(
            db,
            config.engine.connection_mode,
            SecurityContext::new(config.engine.security_enabled, config.engine.principal.clone()),
        ))
    }

    pub fn workbasket_manager(&self) -> &WorkbasketManager {
        &self.workbaskets
    }

    pub fn access_control_manager(&self) -> &AccessControlManager {
        &self.access
    }

    pub fn connection_mode(&self) -> ConnectionManagementMode {
        self.connections.mode()
    }

    /// See [`ConnectionController::set_mode`].
    pub fn set_connection_mode(&self, mode: ConnectionManagementMode) -> Result<()> {
        self.connections.set_mode(mode)
    }

    /// Bind a caller connection for all subsequent calls, entering explicit
    /// mode. The caller commits and rolls back through its own clone of the
    /// handle. `None` is equivalent to [`Engine::close_connection`].
    pub fn set_connection(&self, handle: Option<ConnectionHandle>) -> Result<()> {
        self.connections.set_connection(handle)
    }

    /// Release the held connection and return to participate mode.
    pub fn close_connection(&self) {
        self.connections.close_connection()
    }

    /// The caller-bound connection, if any.
    pub fn connection(&self) -> Option<ConnectionHandle> {
        self.connections.connection()
    }

    /// A fresh connection to the engine's database, for use with
    /// [`Engine::set_connection`].
    pub fn open_connection(&self) -> Result<ConnectionHandle> {
        Ok(ConnectionHandle::new(self.connections.database().connect()?))
    }

    /// The principal authorization checks run as.
    pub fn current_principal(&self) -> Option<String> {
        self.security.principal()
    }

    pub fn set_current_principal(&self, principal: Option<&str>) {
        self.security.set_principal(principal.map(str::to_string));
    }
}
