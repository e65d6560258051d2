//! Channels Module
//!
//! Inbound event processing and per-channel maintenance mode.

mod maintenance;
mod processor;

pub use maintenance::{MaintenanceRegistry, MaintenanceState};
pub use processor::{AckProcessor, ChannelEvent, EventProcessor, ProcessedEvent};
