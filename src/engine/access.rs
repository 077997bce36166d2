//! Access control manager: workbasket access items and the permission
//! lookup built on them.

use super::connection::ConnectionController;
use super::permission::PermissionChecker;
use crate::db::access_items;
use crate::error::{EngineError, Result};
use crate::types::{Permission, WorkbasketAccessItem};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Creates, updates and reads access items.
///
/// No uniqueness is enforced on (workbasket, principal); callers are
/// responsible for not creating logically duplicate entries.
#[derive(Clone)]
pub struct AccessControlManager {
    connections: Arc<ConnectionController>,
}

impl AccessControlManager {
    pub fn new(connections: Arc<ConnectionController>) -> Self {
        Self { connections }
    }

    /// Persist a new access item. A fresh id is always assigned.
    pub fn create(&self, item: WorkbasketAccessItem) -> Result<WorkbasketAccessItem> {
        validate(&item)?;

        let item = WorkbasketAccessItem {
            id: Uuid::now_v7().to_string(),
            ..item
        };

        self.connections
            .run("create_access_item", |conn| access_items::insert(conn, &item))?;

        info!(
            id = %item.id,
            workbasket_id = %item.workbasket_id,
            principal = %item.principal,
            "Access item created"
        );
        Ok(item)
    }

    /// Replace the principal and every flag of an existing item.
    ///
    /// The owning workbasket is not changed.
    pub fn update(&self, item: WorkbasketAccessItem) -> Result<WorkbasketAccessItem> {
        if item.principal.trim().is_empty() {
            return Err(EngineError::MissingField("principal"));
        }

        let updated = self.connections.run("update_access_item", |conn| {
            let existing = access_items::find_by_id(conn, &item.id)?
                .ok_or_else(|| EngineError::AccessItemNotFound(item.id.clone()))?;

            let updated = WorkbasketAccessItem {
                workbasket_id: existing.workbasket_id,
                ..item
            };
            if access_items::update(conn, &updated)? == 0 {
                return Err(EngineError::AccessItemNotFound(updated.id));
            }
            Ok(updated)
        })?;

        info!(id = %updated.id, principal = %updated.principal, "Access item updated");
        Ok(updated)
    }

    pub fn get(&self, id: &str) -> Result<WorkbasketAccessItem> {
        self.connections.run("get_access_item", |conn| {
            access_items::find_by_id(conn, id)?
                .ok_or_else(|| EngineError::AccessItemNotFound(id.to_string()))
        })
    }

    /// All items bound to a workbasket, in creation order.
    pub fn list_for_workbasket(&self, workbasket_id: &str) -> Result<Vec<WorkbasketAccessItem>> {
        self.connections.run("list_access_items", |conn| {
            access_items::find_by_workbasket(conn, workbasket_id)
        })
    }
}

impl PermissionChecker for AccessControlManager {
    fn has_permission(
        &self,
        principal: &str,
        workbasket_id: &str,
        permission: Permission,
    ) -> Result<bool> {
        let items = self.connections.run("check_permission", |conn| {
            access_items::find_for_principal(conn, workbasket_id, principal)
        })?;
        Ok(items.iter().any(|item| item.grants(permission)))
    }
}

fn validate(item: &WorkbasketAccessItem) -> Result<()> {
    if item.workbasket_id.trim().is_empty() {
        return Err(EngineError::MissingField("workbasket_id"));
    }
    if item.principal.trim().is_empty() {
        return Err(EngineError::MissingField("principal"));
    }
    Ok(())
}
