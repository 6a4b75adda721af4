// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Free-function surface for callers that may not hold a client.
//!
//! Each function mirrors a [`TelemetryClient`] method but takes the client as
//! an `Option`. An absent client is a programming error and is reported as
//! [`OperationError::InvalidArgument`]; an absent operation on stop is not.

use crate::client::TelemetryClient;
use crate::error::OperationError;
use crate::items::OperationTelemetry;

use super::OperationHandle;

fn require_client(client: Option<&TelemetryClient>) -> Result<&TelemetryClient, OperationError> {
    client.ok_or_else(|| OperationError::invalid_argument("telemetry client cannot be absent"))
}

/// See [`TelemetryClient::start_operation`].
pub fn start_operation<T>(
    client: Option<&TelemetryClient>,
    name: Option<&str>,
) -> Result<OperationHandle<T>, OperationError>
where
    T: OperationTelemetry + Default,
{
    Ok(require_client(client)?.start_operation(name))
}

/// See [`TelemetryClient::start_operation_with_ids`].
pub fn start_operation_with_ids<T>(
    client: Option<&TelemetryClient>,
    name: Option<&str>,
    operation_id: Option<&str>,
    parent_operation_id: Option<&str>,
) -> Result<OperationHandle<T>, OperationError>
where
    T: OperationTelemetry + Default,
{
    Ok(require_client(client)?.start_operation_with_ids(name, operation_id, parent_operation_id))
}

/// See [`TelemetryClient::start_operation_with_item`].
pub fn start_operation_with_item<T>(
    client: Option<&TelemetryClient>,
    item: Option<T>,
) -> Result<OperationHandle<T>, OperationError>
where
    T: OperationTelemetry,
{
    require_client(client)?.start_operation_with_item(item)
}

/// See [`TelemetryClient::stop_operation`].
pub fn stop_operation<T>(
    client: Option<&TelemetryClient>,
    operation: Option<&mut OperationHandle<T>>,
) -> Result<(), OperationError>
where
    T: OperationTelemetry,
{
    require_client(client)?.stop_operation(operation);
    Ok(())
}
