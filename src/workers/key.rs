//! # Registry keys.
//!
//! A [`WorkerKey`] pairs an owner with a worker id and renders as
//! `<namespace>/<name>_<worker-id>`. Scope checks compare the owner part
//! structurally, so `ns/svc` never claims the workers of `ns/svc-extra`.

use std::fmt;

use crate::events::OwnerRef;

/// Composite registry key: owning resource + worker id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerKey {
    owner: OwnerRef,
    id: String,
}

impl WorkerKey {
    pub fn new(owner: &OwnerRef, id: impl Into<String>) -> Self {
        Self {
            owner: owner.clone(),
            id: id.into(),
        }
    }

    pub fn owner(&self) -> &OwnerRef {
        &self.owner
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// True when the key belongs to `owner`.
    pub fn in_scope(&self, owner: &OwnerRef) -> bool {
        self.owner == *owner
    }
}

impl fmt::Display for WorkerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.owner.scope_prefix(), self.id)
    }
}
