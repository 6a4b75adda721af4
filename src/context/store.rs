// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Context store abstraction.
//!
//! A [`ContextStore`] holds zero or one snapshot for the caller's logical
//! context. Every write is a full replacement.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::ConfigError;

use super::propagate;
use super::snapshot::SharedSnapshot;

/// Storage for the current operation snapshot.
pub trait ContextStore: Send + Sync + fmt::Debug {
    /// Current snapshot, or `None` when no operation is active.
    fn get(&self) -> Option<SharedSnapshot>;

    /// Replace the current snapshot. `None` clears it.
    fn save(&self, snapshot: Option<SharedSnapshot>);

    /// Clear the current snapshot.
    fn clear(&self) {
        self.save(None);
    }

    /// Whether a `save` from the caller would be kept.
    fn is_available(&self) -> bool {
        true
    }
}

/// Store backed by the ambient task-local slot.
///
/// Every logical execution context sees its own value; see
/// [`crate::context::scope`] for how values fork into child tasks.
///
/// Async callers must run inside a scope. An unscoped task on a tokio
/// runtime reads `None`, and its saves are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmbientContextStore;

impl ContextStore for AmbientContextStore {
    fn get(&self) -> Option<SharedSnapshot> {
        propagate::current()
    }

    fn save(&self, snapshot: Option<SharedSnapshot>) {
        if !propagate::replace(snapshot) {
            trace!("ambient save dropped outside a context scope");
        }
    }

    fn is_available(&self) -> bool {
        propagate::is_available()
    }
}

/// Explicit, request-scoped context object.
///
/// Clones share one slot. Frameworks that already carry a per-request value
/// can hold one of these and hand it to a client built for that request,
/// instead of relying on ambient propagation.
#[derive(Clone, Default)]
pub struct ScopedContextStore {
    slot: Arc<Mutex<Option<SharedSnapshot>>>,
}

impl ScopedContextStore {
    /// Create an empty scoped store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scoped store seeded with a snapshot.
    pub fn with_snapshot(snapshot: Option<SharedSnapshot>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(snapshot)),
        }
    }
}

impl ContextStore for ScopedContextStore {
    fn get(&self) -> Option<SharedSnapshot> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn save(&self, snapshot: Option<SharedSnapshot>) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }
}

impl fmt::Debug for ScopedContextStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedContextStore")
            .field("current", &self.get())
            .finish()
    }
}

/// Which store implementation a configured client uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Ambient task-local propagation.
    #[default]
    Ambient,
    /// One explicit slot shared by everything using the client.
    Scoped,
}

impl StoreKind {
    /// Build a store of this kind.
    pub fn build(&self) -> Arc<dyn ContextStore> {
        match self {
            StoreKind::Ambient => Arc::new(AmbientContextStore),
            StoreKind::Scoped => Arc::new(ScopedContextStore::new()),
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Ambient => write!(f, "ambient"),
            StoreKind::Scoped => write!(f, "scoped"),
        }
    }
}

impl FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ambient" => Ok(StoreKind::Ambient),
            "scoped" => Ok(StoreKind::Scoped),
            other => Err(ConfigError::invalid_value(
                "store",
                format!("unknown store '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::OperationContextSnapshot;

    fn snapshot(id: &str) -> SharedSnapshot {
        OperationContextSnapshot::new(id, id, "op").into_shared()
    }

    #[test]
    fn test_ambient_store_roundtrip() {
        let store = AmbientContextStore;
        assert!(store.get().is_none());

        let s = snapshot("a");
        store.save(Some(s.clone()));
        assert!(Arc::ptr_eq(&store.get().unwrap(), &s));

        store.clear();
        assert!(store.get().is_none());
    }

    #[test]
    fn test_ambient_stores_share_the_slot() {
        let first = AmbientContextStore;
        let second = AmbientContextStore;
        first.save(Some(snapshot("a")));
        assert_eq!(second.get().unwrap().parent_operation_id(), "a");
        second.clear();
        assert!(first.get().is_none());
    }

    #[test]
    fn test_scoped_store_clones_share_slot() {
        let store = ScopedContextStore::new();
        let clone = store.clone();
        store.save(Some(snapshot("a")));
        assert_eq!(clone.get().unwrap().parent_operation_id(), "a");
    }

    #[test]
    fn test_scoped_stores_are_independent() {
        let first = ScopedContextStore::new();
        let second = ScopedContextStore::with_snapshot(Some(snapshot("b")));
        first.save(Some(snapshot("a")));
        assert_eq!(second.get().unwrap().parent_operation_id(), "b");
        assert!(AmbientContextStore.get().is_none());
    }

    #[test]
    fn test_scoped_store_survives_poison() {
        let store = ScopedContextStore::new();
        let clone = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = clone.slot.lock().unwrap();
            panic!("poison the slot");
        })
        .join();

        store.save(Some(snapshot("a")));
        assert_eq!(store.get().unwrap().parent_operation_id(), "a");
    }

    #[test]
    fn test_store_kind_build() {
        let store = StoreKind::Scoped.build();
        store.save(Some(snapshot("a")));
        assert!(store.get().is_some());
        assert!(AmbientContextStore.get().is_none());
        assert_eq!(StoreKind::default(), StoreKind::Ambient);
        assert_eq!(StoreKind::Scoped.to_string(), "scoped");
    }

    #[test]
    fn test_store_kind_from_str() {
        assert_eq!("Scoped".parse::<StoreKind>().unwrap(), StoreKind::Scoped);
        assert!("redis".parse::<StoreKind>().is_err());
    }

    #[tokio::test]
    async fn test_ambient_store_unavailable_outside_scope() {
        let store = AmbientContextStore;
        assert!(!store.is_available());
        store.save(Some(snapshot("a")));
        assert!(store.get().is_none());

        let scoped = ScopedContextStore::new();
        assert!(scoped.is_available());
    }
}
