// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Self-diagnostics: logging setup and per-client metrics.
//!
//! Every start and stop emits `tracing` events inside an `operation` span
//! carrying the correlation ids. Install a subscriber with [`init_logging`]
//! to see them:
//!
//! ```rust,ignore
//! use opcontext::diagnostics::{init_logging, LoggingConfig};
//!
//! let _guard = init_logging(&LoggingConfig::development())?;
//! ```

mod logging;
pub mod metrics;

pub use logging::{init_logging, parse_level, LoggingConfig, LoggingGuard};
pub use metrics::{
    ClientMetrics, Histogram, MetricsSnapshot, OperationStats, DEFAULT_OPERATION_LIMIT,
    OTHER_OPERATIONS,
};
