//! # Caller Scope
//!
//! The identity collaborator authenticates callers before they reach the engine. What arrives
//! here is a [`Principal`]: who is acting and which tenant (kitchen organisation) they act for.
//!
//! Every request message carries the principal, and the [`ResourceActor`](super::ResourceActor)
//! filters every lookup by [`Principal::tenant_id`]. Entities of another tenant are simply
//! not found.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Tenant (organisation) identifier supplied by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A pre-authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Acting user, recorded in audit entries and as `reported_by` / `resolved_by`.
    pub actor: String,
    pub tenant_id: TenantId,
}

impl Principal {
    pub fn new(actor: impl Into<String>, tenant_id: TenantId) -> Self {
        Self {
            actor: actor.into(),
            tenant_id,
        }
    }

    /// Whether an entity owned by `tenant` is visible to this caller.
    pub fn can_see(&self, tenant: &TenantId) -> bool {
        &self.tenant_id == tenant
    }
}
