// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Sinks for finished telemetry items.
//!
//! Batching and transport live behind [`TelemetryChannel`]; the operation
//! core only hands items over. `send` must not block the caller for long.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::ConfigError;
use crate::items::TelemetryItem;

/// Destination for finished telemetry items.
#[cfg_attr(test, mockall::automock)]
pub trait TelemetryChannel: Send + Sync {
    /// Hand an item to the sink.
    fn send(&self, item: TelemetryItem);

    /// Push out anything buffered.
    fn flush(&self) {}
}

/// Collects items in memory. Used by tests and the demo command.
#[derive(Debug, Default)]
pub struct InMemoryChannel {
    items: Mutex<Vec<TelemetryItem>>,
}

impl InMemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every item sent so far, in send order.
    pub fn items(&self) -> Vec<TelemetryItem> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return every collected item.
    pub fn drain(&self) -> Vec<TelemetryItem> {
        std::mem::take(&mut *self.items.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl TelemetryChannel for InMemoryChannel {
    fn send(&self, item: TelemetryItem) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(item);
    }
}

/// Emits one structured `tracing` event per item.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingChannel;

impl TelemetryChannel for TracingChannel {
    fn send(&self, item: TelemetryItem) {
        let operation = item.operation();
        tracing::info!(
            target: "opcontext::channel",
            kind = item.kind(),
            name = item.name().unwrap_or(""),
            operation_id = operation.id.as_deref().unwrap_or(""),
            parent_id = operation.parent_id.as_deref().unwrap_or(""),
            root_id = operation.root_id.as_deref().unwrap_or(""),
            root_name = operation.root_name.as_deref().unwrap_or(""),
            duration_ms = item.duration().map(|d| d.as_secs_f64() * 1000.0),
            "telemetry item"
        );
    }
}

/// Forwards items to an unbounded tokio channel.
///
/// A background consumer owns the receiver. Items sent after the receiver is
/// dropped are discarded.
#[derive(Debug, Clone)]
pub struct MpscChannel {
    sender: mpsc::UnboundedSender<TelemetryItem>,
}

impl MpscChannel {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TelemetryItem>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl TelemetryChannel for MpscChannel {
    fn send(&self, item: TelemetryItem) {
        if let Err(err) = self.sender.send(item) {
            tracing::debug!(kind = err.0.kind(), "telemetry receiver closed, item discarded");
        }
    }
}

/// Discards every item.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullChannel;

impl TelemetryChannel for NullChannel {
    fn send(&self, _item: TelemetryItem) {}
}

/// Sends every item to each inner channel in order.
#[derive(Default, Clone)]
pub struct FanoutChannel {
    channels: Vec<Arc<dyn TelemetryChannel>>,
}

impl FanoutChannel {
    pub fn new(channels: Vec<Arc<dyn TelemetryChannel>>) -> Self {
        Self { channels }
    }

    pub fn push(&mut self, channel: Arc<dyn TelemetryChannel>) {
        self.channels.push(channel);
    }
}

impl TelemetryChannel for FanoutChannel {
    fn send(&self, item: TelemetryItem) {
        if let Some((last, rest)) = self.channels.split_last() {
            for channel in rest {
                channel.send(item.clone());
            }
            last.send(item);
        }
    }

    fn flush(&self) {
        for channel in &self.channels {
            channel.flush();
        }
    }
}

impl fmt::Debug for FanoutChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FanoutChannel")
            .field("channels", &self.channels.len())
            .finish()
    }
}

/// Channel selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// [`TracingChannel`]
    #[default]
    Log,
    /// [`NullChannel`]
    None,
}

impl ChannelKind {
    pub fn build(&self) -> Arc<dyn TelemetryChannel> {
        match self {
            ChannelKind::Log => Arc::new(TracingChannel),
            ChannelKind::None => Arc::new(NullChannel),
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Log => write!(f, "log"),
            ChannelKind::None => write!(f, "none"),
        }
    }
}

impl FromStr for ChannelKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "log" => Ok(ChannelKind::Log),
            "none" => Ok(ChannelKind::None),
            other => Err(ConfigError::invalid_value(
                "channel",
                format!("unknown channel '{}'", other),
            )),
        }
    }
}
