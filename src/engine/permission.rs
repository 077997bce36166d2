//! Permission checks consumed by the workbasket manager.

use crate::error::{EngineError, Result};
use crate::types::Permission;
use std::sync::{PoisonError, RwLock};

/// Capability lookup: does `principal` hold `permission` on a workbasket?
pub trait PermissionChecker: Send + Sync {
    fn has_permission(
        &self,
        principal: &str,
        workbasket_id: &str,
        permission: Permission,
    ) -> Result<bool>;
}

/// Whether authorization is enforced, and on whose behalf calls are made.
#[derive(Debug, Default)]
pub struct SecurityContext {
    enabled: bool,
    principal: RwLock<Option<String>>,
}

impl SecurityContext {
    pub fn new(enabled: bool, principal: Option<String>) -> Self {
        Self {
            enabled,
            principal: RwLock::new(principal),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn principal(&self) -> Option<String> {
        self.principal
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_principal(&self, principal: Option<String>) {
        *self
            .principal
            .write()
            .unwrap_or_else(PoisonError::into_inner) = principal;
    }

    /// Fail with `NotAuthorized` unless the current principal holds
    /// `permission` on `workbasket_id`. Always passes when disabled.
    pub fn authorize(
        &self,
        checker: &dyn PermissionChecker,
        workbasket_id: &str,
        permission: Permission,
    ) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let Some(principal) = self.principal() else {
            return Err(EngineError::not_authorized(
                "<anonymous>",
                workbasket_id,
                permission,
            ));
        };

        if checker.has_permission(&principal, workbasket_id, permission)? {
            Ok(())
        } else {
            tracing::debug!(%principal, workbasket_id, %permission, "Permission denied");
            Err(EngineError::not_authorized(&principal, workbasket_id, permission))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(bool);

    impl PermissionChecker for Fixed {
        fn has_permission(&self, _: &str, _: &str, _: Permission) -> Result<bool> {
            Ok(self.0)
        }
    }

    #[test]
    fn test_disabled_always_passes() {
        let ctx = SecurityContext::new(false, None);
        assert!(ctx.authorize(&Fixed(false), "wb", Permission::Write).is_ok());
    }

    #[test]
    fn test_enabled_without_principal_denies() {
        let ctx = SecurityContext::new(true, None);
        let err = ctx
            .authorize(&Fixed(true), "wb", Permission::Write)
            .unwrap_err();
        assert!(matches!(err, EngineError::NotAuthorized { .. }));
    }

    #[test]
    fn test_enabled_consults_checker() {
        let ctx = SecurityContext::new(true, Some("Arthur Dent".into()));
        assert!(ctx.authorize(&Fixed(true), "wb", Permission::Write).is_ok());
        assert!(ctx.authorize(&Fixed(false), "wb", Permission::Write).is_err());
    }

    #[test]
    fn test_set_principal() {
        let ctx = SecurityContext::new(true, None);
        ctx.set_principal(Some("Zaphod Beeblebrox".into()));
        assert_eq!(ctx.principal().as_deref(), Some("Zaphod Beeblebrox"));
        ctx.set_principal(None);
        assert!(ctx.principal().is_none());
    }
}
