//! # Owner identity and reconcile signals.
//!
//! [`OwnerRef`] identifies the resource a worker runs on behalf of.
//! [`Signal`] is the "re-examine this owner" message watchers place on the
//! manager's shared channel. It carries the owner only; the notification
//! that caused it is not forwarded.

use std::fmt;

/// Namespace + name of an owning resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerRef {
    pub namespace: String,
    pub name: String,
}

impl OwnerRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Scope token shared by every worker key of this owner: `<ns>/<name>_`.
    pub fn scope_prefix(&self) -> String {
        format!("{}/{}_", self.namespace, self.name)
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Generic "something changed" notification for one owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub owner: OwnerRef,
}

impl Signal {
    pub fn new(owner: OwnerRef) -> Self {
        Self { owner }
    }
}
