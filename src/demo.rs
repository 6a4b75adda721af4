// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Canned operation scenarios used by the `opcontext demo` command.
//!
//! Each scenario runs against a fresh client in its own context scope and
//! reports the submitted items, whatever was left in the store, and the
//! client's metrics.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::channel::{FanoutChannel, InMemoryChannel, TelemetryChannel};
use crate::client::{TelemetryClient, TelemetryConfiguration};
use crate::context::{self, OperationContextSnapshot};
use crate::diagnostics::MetricsSnapshot;
use crate::error::ConfigError;
use crate::items::{DependencyTelemetry, RequestTelemetry, TelemetryItem};

/// Available demo scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    /// A request with one dependency call nested inside it.
    Nested,
    /// Parent stopped before its child.
    OutOfOrder,
    /// A request started with explicit operation and parent ids.
    Override,
    /// Two requests running on separate tasks at the same time.
    Concurrent,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::Nested,
        Scenario::OutOfOrder,
        Scenario::Override,
        Scenario::Concurrent,
    ];
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scenario::Nested => write!(f, "nested"),
            Scenario::OutOfOrder => write!(f, "out-of-order"),
            Scenario::Override => write!(f, "override"),
            Scenario::Concurrent => write!(f, "concurrent"),
        }
    }
}

impl FromStr for Scenario {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scenario::ALL
            .into_iter()
            .find(|scenario| scenario.to_string() == s.to_lowercase())
            .ok_or_else(|| {
                ConfigError::invalid_value("scenario", format!("unknown scenario '{}'", s))
            })
    }
}

/// Outcome of one scenario run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioReport {
    pub scenario: Scenario,
    /// Items in the order they were submitted.
    pub items: Vec<TelemetryItem>,
    /// Snapshot left in the store once every operation stopped.
    pub residual_context: Option<OperationContextSnapshot>,
    pub metrics: MetricsSnapshot,
}

/// Run `scenario` with a client built from `configuration`.
///
/// Items still reach the configured channel; an in-memory channel is added
/// alongside it to collect them for the report.
pub async fn run_scenario(
    scenario: Scenario,
    configuration: TelemetryConfiguration,
) -> crate::Result<ScenarioReport> {
    let memory = Arc::new(InMemoryChannel::new());
    let collector: Arc<dyn TelemetryChannel> = memory.clone();
    let fanout = FanoutChannel::new(vec![collector, configuration.channel().clone()]);
    let client = TelemetryClient::new(configuration.with_channel(Arc::new(fanout)));

    info!(%scenario, "running scenario");

    let residual = context::scope_with(None, async {
        match scenario {
            Scenario::Nested => nested(&client),
            Scenario::OutOfOrder => out_of_order(&client),
            Scenario::Override => explicit_ids(&client),
            Scenario::Concurrent => concurrent(&client).await?,
        }
        Ok::<_, anyhow::Error>(client.current_context())
    })
    .await?;

    client.flush();

    Ok(ScenarioReport {
        scenario,
        items: memory.items(),
        residual_context: residual.map(|snapshot| (*snapshot).clone()),
        metrics: client.metrics().snapshot(),
    })
}

fn nested(client: &TelemetryClient) {
    let _request = client.start_operation::<RequestTelemetry>(Some("OuterRequest"));
    let _call = client.start_operation::<DependencyTelemetry>(Some("DependentCall"));
}

fn out_of_order(client: &TelemetryClient) {
    let mut parent = client.start_operation::<RequestTelemetry>(Some("Parent"));
    let mut child = client.start_operation::<DependencyTelemetry>(Some("Child"));
    client.stop_operation(Some(&mut parent));
    client.stop_operation(Some(&mut child));
}

fn explicit_ids(client: &TelemetryClient) {
    let mut request = client.start_operation_with_ids::<RequestTelemetry>(
        Some("Request"),
        Some("ROOT"),
        Some("PARENT"),
    );
    client.stop_operation(Some(&mut request));
}

async fn concurrent(client: &TelemetryClient) -> crate::Result<()> {
    let workers: Vec<_> = (1..=2)
        .map(|n| {
            let inner = client.clone();
            let request = client.track_operation::<RequestTelemetry, _>(
                &format!("Worker-{}", n),
                async move {
                    tokio::task::yield_now().await;
                    let fetch = format!("Fetch-{}", n);
                    let _fetch = inner.start_operation::<DependencyTelemetry>(Some(fetch.as_str()));
                    tokio::task::yield_now().await;
                },
            );
            context::spawn(request)
        })
        .collect();

    for worker in workers {
        worker.await?;
    }
    Ok(())
}
