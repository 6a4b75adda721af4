// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Operation lifecycle.
//!
//! [`OperationHandle`] implements the start and stop protocol; the
//! [`extensions`] module exposes the same entry points as free functions
//! that accept an optional client.

pub mod extensions;
mod handle;

pub use handle::{OperationHandle, OperationState};
