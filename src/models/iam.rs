//! Caller identity for authorization checks.
//!
//! The engine only checks scope membership; token resolution and role
//! expansion happen upstream and arrive pre-validated.

use serde::{Deserialize, Serialize};

/// Capability scopes recognized by the BDR service.
pub mod scopes {
    pub const BACKUP_RUN: &str = "backup:run";
    pub const RESTORE_EXECUTE: &str = "restore:execute";
    pub const DR_MANAGE: &str = "dr:manage";
    pub const DR_EXECUTE: &str = "dr:execute";
}

/// Pre-validated caller identity. Never constructed by the engine itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IamContext {
    pub actor: String,
    pub roles: Vec<String>,
    pub scopes: Vec<String>,
}

impl IamContext {
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            roles: Vec::new(),
            scopes: Vec::new(),
        }
    }

    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles = roles;
        self
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Check scope membership.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_membership() {
        let ctx = IamContext::new("ops@example.com")
            .with_scopes(vec![scopes::BACKUP_RUN.to_string()]);
        assert!(ctx.has_scope(scopes::BACKUP_RUN));
        assert!(!ctx.has_scope(scopes::RESTORE_EXECUTE));
    }
}
