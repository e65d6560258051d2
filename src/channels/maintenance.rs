//! Per-channel maintenance flags.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::clock::current_timestamp_ms;

/// Maintenance state of one channel.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MaintenanceState {
    pub channel: String,
    pub enabled: bool,
    pub reason: Option<String>,
    pub updated_by: String,
    /// Unix milliseconds
    pub updated_at: u64,
}

/// Channels whose inbound events are currently rejected.
///
/// Channels never toggled are not in maintenance.
#[derive(Debug, Default)]
pub struct MaintenanceRegistry {
    channels: BTreeMap<String, MaintenanceState>,
}

impl MaintenanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self, channel: &str) -> bool {
        self.channels.get(channel).is_some_and(|state| state.enabled)
    }

    pub fn get(&self, channel: &str) -> Option<&MaintenanceState> {
        self.channels.get(channel)
    }

    /// Turns maintenance on or off for `channel` and returns the new state.
    pub fn set(
        &mut self,
        channel: &str,
        enabled: bool,
        reason: Option<String>,
        actor: &str,
    ) -> MaintenanceState {
        let state = MaintenanceState {
            channel: channel.to_string(),
            enabled,
            reason,
            updated_by: actor.to_string(),
            updated_at: current_timestamp_ms(),
        };
        self.channels.insert(channel.to_string(), state.clone());
        state
    }

    /// Every channel that has been toggled, sorted by name.
    pub fn list(&self) -> Vec<MaintenanceState> {
        self.channels.values().cloned().collect()
    }
}
