//! Workbasket manager: workbasket lifecycle and its distribution-target graph.
//!
//! The target graph is kept as id lists (`Workbasket::distribution_targets`)
//! backed by edge rows. Self-loops and cycles are stored and re-read as-is;
//! no cycle detection is performed.

use super::connection::ConnectionController;
use super::permission::{PermissionChecker, SecurityContext};
use crate::db::{distribution_targets, now_ms, workbaskets};
use crate::error::{EngineError, Result};
use crate::types::{Permission, Workbasket};
use rusqlite::Connection;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Validates, persists and reconstitutes workbaskets.
#[derive(Clone)]
pub struct WorkbasketManager {
    connections: Arc<ConnectionController>,
    permissions: Arc<dyn PermissionChecker>,
    security: Arc<SecurityContext>,
}

impl WorkbasketManager {
    pub fn new(
        connections: Arc<ConnectionController>,
        permissions: Arc<dyn PermissionChecker>,
        security: Arc<SecurityContext>,
    ) -> Self {
        Self {
            connections,
            permissions,
            security,
        }
    }

    /// Persist a new workbasket and its distribution-target edges.
    ///
    /// An empty id is replaced with a generated UUID7; a caller-supplied id is
    /// kept. `created` and `modified` are both set to now.
    pub fn create(&self, workbasket: Workbasket) -> Result<Workbasket> {
        let now = now_ms();
        let workbasket = Workbasket {
            id: if workbasket.id.is_empty() {
                Uuid::now_v7().to_string()
            } else {
                workbasket.id
            },
            created: now,
            modified: now,
            distribution_targets: dedup_targets(workbasket.distribution_targets),
            ..workbasket
        };

        self.connections.run("create_workbasket", |conn| {
            workbaskets::insert(conn, &workbasket)?;
            distribution_targets::insert_all(conn, &workbasket.id, &workbasket.distribution_targets)
        })?;

        info!(
            id = %workbasket.id,
            targets = workbasket.distribution_targets.len(),
            "Workbasket created"
        );
        Ok(workbasket)
    }

    /// Fetch a workbasket with its distribution-target ids in stored order.
    pub fn get(&self, id: &str) -> Result<Workbasket> {
        self.connections
            .run("get_workbasket", |conn| load_workbasket(conn, id))
    }

    /// All workbaskets, oldest first, each with its target ids.
    pub fn list(&self) -> Result<Vec<Workbasket>> {
        self.connections.run("list_workbaskets", |conn| {
            let mut all = workbaskets::list(conn)?;
            for workbasket in &mut all {
                workbasket.distribution_targets =
                    distribution_targets::find_for_source(conn, &workbasket.id)?;
            }
            Ok(all)
        })
    }

    /// Resolve one level of distribution targets to workbaskets.
    ///
    /// Each resolved target carries its own stored target ids, which are not
    /// resolved further.
    pub fn get_distribution_targets(&self, id: &str) -> Result<Vec<Workbasket>> {
        self.connections.run("get_distribution_targets", |conn| {
            let source = load_workbasket(conn, id)?;

            source
                .distribution_targets
                .iter()
                .map(|target_id| load_workbasket(conn, target_id))
                .collect()
        })
    }

    /// Replace a workbasket's fields and its whole target set.
    ///
    /// `created` is preserved from the stored row; `modified` strictly
    /// advances past its stored value. Edges are deleted then re-inserted
    /// without diffing. Under autocommit a failure between the two leaves the
    /// basket with fewer edges than either the old or the new set.
    pub fn update(&self, workbasket: Workbasket) -> Result<Workbasket> {
        let existing = self.connections.run("find_workbasket", |conn| {
            workbaskets::find_by_id(conn, &workbasket.id)
        })?;
        let Some(existing) = existing else {
            return Err(EngineError::WorkbasketNotFound(workbasket.id));
        };

        self.security
            .authorize(self.permissions.as_ref(), &existing.id, Permission::Write)?;

        let updated = Workbasket {
            created: existing.created,
            modified: next_modified(existing.modified),
            distribution_targets: dedup_targets(workbasket.distribution_targets),
            ..workbasket
        };

        self.connections.run("update_workbasket", |conn| {
            if workbaskets::update(conn, &updated)? == 0 {
                return Err(EngineError::WorkbasketNotFound(updated.id.clone()));
            }
            distribution_targets::delete_for_source(conn, &updated.id)?;
            distribution_targets::insert_all(conn, &updated.id, &updated.distribution_targets)
        })?;

        info!(
            id = %updated.id,
            targets = updated.distribution_targets.len(),
            "Workbasket updated"
        );
        Ok(updated)
    }
}

fn load_workbasket(conn: &Connection, id: &str) -> Result<Workbasket> {
    let mut workbasket = workbaskets::find_by_id(conn, id)?
        .ok_or_else(|| EngineError::WorkbasketNotFound(id.to_string()))?;
    workbasket.distribution_targets = distribution_targets::find_for_source(conn, id)?;
    Ok(workbasket)
}

/// A timestamp strictly after `previous`, even within the same millisecond.
fn next_modified(previous: i64) -> i64 {
    now_ms().max(previous + 1)
}

/// Keep the first occurrence of each target id.
fn dedup_targets(targets: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(targets.len());
    targets
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_modified_strictly_advances() {
        let far_future = now_ms() + 60_000;
        assert_eq!(next_modified(far_future), far_future + 1);
        assert!(next_modified(0) > 0);
    }

    #[test]
    fn test_dedup_targets_keeps_first_occurrence() {
        let targets = vec!["b".to_string(), "a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(dedup_targets(targets), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_dedup_targets_empty() {
        assert!(dedup_targets(Vec::new()).is_empty());
    }
}
