// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! opcontext - operation correlation for telemetry clients.
//!
//! Starting an operation publishes an ambient snapshot ("what is running
//! now") for the current logical execution context. Operations started while
//! a snapshot is visible become its children: they inherit the root id and
//! root name and take the running operation's id as their parent id.
//! Stopping an operation puts the previous snapshot back and hands the
//! finished item to a channel.
//!
//! # Architecture
//!
//! - [`context`] - Snapshot type, the ambient slot, and context stores
//! - [`items`] - Request and dependency telemetry items
//! - [`operation`] - Operation handles and the start/stop entry points
//! - [`client`] - [`TelemetryClient`] and its configuration
//! - [`initializer`] - Hooks that fill correlation fields on new items
//! - [`channel`] - Sinks for finished items
//! - [`config`] - Settings loading and merging
//! - [`diagnostics`] - Logging setup and per-client metrics
//! - [`demo`] - Scenarios behind the `opcontext demo` command
//!
//! # Example
//!
//! ```rust,ignore
//! use opcontext::{context, RequestTelemetry, DependencyTelemetry, TelemetryClient};
//!
//! let client = TelemetryClient::new(Default::default());
//!
//! context::scope(async move {
//!     let _request = client.start_operation::<RequestTelemetry>(Some("GET /orders"));
//!     let _call = client.start_operation::<DependencyTelemetry>(Some("SELECT orders"));
//!     // _call stops first, then _request; both reach the channel.
//! })
//! .await;
//! ```

pub mod channel;
pub mod client;
pub mod config;
pub mod context;
pub mod demo;
pub mod diagnostics;
pub mod error;
pub mod ids;
pub mod initializer;
pub mod items;
pub mod operation;

// Re-export commonly used types at crate root
pub use channel::{ChannelKind, InMemoryChannel, TelemetryChannel};
pub use client::{TelemetryClient, TelemetryConfiguration};
pub use context::{ContextStore, OperationContextSnapshot, SharedSnapshot, StoreKind};
pub use error::{ConfigError, OperationError, Result};
pub use ids::IdFormat;
pub use initializer::{OperationCorrelationInitializer, TelemetryInitializer};
pub use items::{
    DependencyTelemetry, OperationContext, OperationTelemetry, RequestTelemetry, Telemetry,
    TelemetryItem,
};
pub use operation::{OperationHandle, OperationState};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
