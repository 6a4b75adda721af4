// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Ambient operation context.
//!
//! This module holds the "current operation" for each logical execution
//! context:
//!
//! - [`OperationContextSnapshot`]: immutable record of the active operation
//! - [`ContextStore`]: save/get contract, with the ambient
//!   ([`AmbientContextStore`]) and explicit ([`ScopedContextStore`]) backings
//! - [`scope`], [`spawn`], [`sync_scope`]: fork the ambient value into child
//!   tasks and threads
//!
//! # Usage
//!
//! Async entry points should run inside a scope so the snapshot follows the
//! task across `.await` points:
//!
//! ```rust,ignore
//! use opcontext::context;
//!
//! context::scope(async move {
//!     let _request = client.start_operation::<RequestTelemetry>(Some("GET /"));
//!     call_backend().await;
//! })
//! .await;
//! ```

mod propagate;
mod snapshot;
mod store;

pub use propagate::{current, is_available, is_scoped, scope, scope_with, spawn, sync_scope};
pub use snapshot::{OperationContextSnapshot, SharedSnapshot};
pub use store::{AmbientContextStore, ContextStore, ScopedContextStore, StoreKind};
