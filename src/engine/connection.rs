//! Connection and transaction-mode control.
//!
//! Every service call asks the [`ConnectionController`] for the connection to
//! use right now, and the current [`ConnectionManagementMode`] decides how that
//! call commits:
//!
//! - `Participate`: the engine-owned connection is borrowed for the call and the
//!   work runs inside a SAVEPOINT, released when the call succeeds and rolled
//!   back when it fails. The connection stays held until `close_connection`.
//! - `Autocommit`: a fresh connection is opened for the call and each statement
//!   commits as it executes. A failure part way through a multi-row write leaves
//!   the earlier rows in place.
//! - `Explicit`: the caller-bound connection is reused and no transaction
//!   control is issued. The caller commits, rolls back and closes.
//!
//! Mode changes and binding are not synchronized against in-flight calls on
//! the same engine; callers sharing an engine must serialize them.

use crate::db::Database;
use crate::error::{EngineError, Result};
use crate::types::ConnectionManagementMode;
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// A shared handle to one SQLite connection.
///
/// Clones refer to the same connection. A caller binds a handle to the engine
/// with `set_connection` and keeps its own clone to drive the transaction.
#[derive(Clone)]
pub struct ConnectionHandle {
    conn: Arc<Mutex<Connection>>,
}

impl ConnectionHandle {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a deferred transaction on this connection.
    pub fn begin(&self) -> Result<()> {
        self.lock().execute_batch("BEGIN")?;
        Ok(())
    }

    pub fn commit(&self) -> Result<()> {
        self.lock().execute_batch("COMMIT")?;
        Ok(())
    }

    pub fn rollback(&self) -> Result<()> {
        self.lock().execute_batch("ROLLBACK")?;
        Ok(())
    }

    /// True while a transaction is open on this connection.
    pub fn in_transaction(&self) -> bool {
        !self.lock().is_autocommit()
    }

    /// Execute a function with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.lock();
        f(&conn)
    }

    /// Execute a function with mutable access to the connection.
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.lock();
        f(&mut conn)
    }

    /// True if both handles refer to the same underlying connection.
    pub fn same_connection(&self, other: &ConnectionHandle) -> bool {
        Arc::ptr_eq(&self.conn, &other.conn)
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("conn", &Arc::as_ptr(&self.conn))
            .finish()
    }
}

#[derive(Default)]
struct ControllerState {
    mode: ConnectionManagementMode,
    /// Caller-supplied connection (explicit mode only).
    bound: Option<ConnectionHandle>,
    /// Engine-owned connection borrowed by participating calls.
    owned: Option<ConnectionHandle>,
}

/// How a single call will obtain its connection.
enum Acquired {
    Participate(ConnectionHandle),
    Autocommit(Connection),
    Explicit(ConnectionHandle),
}

/// Owns the transaction mode and the connection shared by one engine instance.
///
/// At most one connection is held at a time: either the engine-owned
/// participating connection or a caller-bound one.
pub struct ConnectionController {
    db: Database,
    state: Mutex<ControllerState>,
}

impl ConnectionController {
    pub fn new(db: Database, mode: ConnectionManagementMode) -> Self {
        Self {
            db,
            state: Mutex::new(ControllerState {
                mode,
                ..ControllerState::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn mode(&self) -> ConnectionManagementMode {
        self.state().mode
    }

    /// The caller-bound connection, if any.
    pub fn connection(&self) -> Option<ConnectionHandle> {
        self.state().bound.clone()
    }

    /// True if either a bound or an engine-owned connection is held.
    pub fn holds_connection(&self) -> bool {
        let state = self.state();
        state.bound.is_some() || state.owned.is_some()
    }

    /// Switch the connection management mode.
    ///
    /// Switching to the current mode is a no-op. Any other switch while a
    /// caller connection is bound fails; the caller must close it first so no
    /// uncommitted work is dropped silently.
    pub fn set_mode(&self, mode: ConnectionManagementMode) -> Result<()> {
        let mut state = self.state();
        if state.mode == mode {
            return Ok(());
        }
        if state.bound.is_some() {
            return Err(EngineError::invalid_state(format!(
                "cannot switch from {} to {} while a caller connection is bound; close it first",
                state.mode, mode
            )));
        }

        debug!(from = %state.mode, to = %mode, "Connection mode changed");
        if mode != ConnectionManagementMode::Participate {
            state.owned = None;
        }
        state.mode = mode;
        Ok(())
    }

    /// Bind a caller connection, entering explicit mode. `None` closes.
    pub fn set_connection(&self, handle: Option<ConnectionHandle>) -> Result<()> {
        let Some(handle) = handle else {
            self.close_connection();
            return Ok(());
        };

        let mut state = self.state();
        if let Some(bound) = &state.bound {
            if bound.same_connection(&handle) {
                return Ok(());
            }
            return Err(EngineError::invalid_state(
                "a caller connection is already bound; close it before binding another",
            ));
        }

        debug!(from = %state.mode, "Caller connection bound, entering explicit mode");
        state.owned = None;
        state.bound = Some(handle);
        state.mode = ConnectionManagementMode::Explicit;
        Ok(())
    }

    /// Release whatever connection is held and return to participate mode.
    ///
    /// Idempotent. Releasing drops the engine's reference only; a caller that
    /// kept a clone of its handle still owns the connection and any open
    /// transaction on it.
    pub fn close_connection(&self) {
        let mut state = self.state();
        if state.bound.is_some() || state.owned.is_some() {
            debug!(mode = %state.mode, "Connection released");
        }
        state.bound = None;
        state.owned = None;
        state.mode = ConnectionManagementMode::Participate;
    }

    fn acquire(&self) -> Result<Acquired> {
        let mut state = self.state();
        match state.mode {
            ConnectionManagementMode::Participate => {
                if let Some(handle) = state.owned.clone() {
                    return Ok(Acquired::Participate(handle));
                }
                let handle = ConnectionHandle::new(self.db.connect()?);
                state.owned = Some(handle.clone());
                Ok(Acquired::Participate(handle))
            }
            ConnectionManagementMode::Autocommit => Ok(Acquired::Autocommit(self.db.connect()?)),
            ConnectionManagementMode::Explicit => match &state.bound {
                Some(handle) => Ok(Acquired::Explicit(handle.clone())),
                None => Err(EngineError::invalid_state(
                    "explicit mode requires a connection; call set_connection first",
                )),
            },
        }
    }

    /// Run one service call against the connection the current mode selects.
    ///
    /// The controller state lock is released before `f` runs.
    pub fn run<F, T>(&self, operation: &str, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        match self.acquire()? {
            Acquired::Participate(handle) => {
                debug!(operation, mode = "participate", "Borrowing engine connection");
                handle.with_conn_mut(|conn| {
                    let sp = conn.savepoint()?;
                    let value = f(&sp)?;
                    sp.commit()?;
                    Ok(value)
                })
            }
            Acquired::Autocommit(conn) => {
                debug!(operation, mode = "autocommit", "Opened per-call connection");
                f(&conn)
            }
            Acquired::Explicit(handle) => {
                debug!(operation, mode = "explicit", "Using caller connection");
                handle.with_conn(f)
            }
        }
    }
}
