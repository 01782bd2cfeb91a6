//! Responder configuration.
//!
//! The same structure is built programmatically or deserialized from the
//! JSON document used by deployments:
//!
//! ```json
//! {
//!     "interface": "socketcan",
//!     "channel_a": "can0",
//!     "channel_b": "can1",
//!     "node_id": 5,
//!     "heartbeat_period": 0.5,
//!     "max_miss_heartbeat": 3,
//!     "max_bus_switch": null
//! }
//! ```
//!
//! Durations are expressed in seconds in the document.
use alloc::string::String;

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default number of consecutive missed heartbeats before a bus switch.
pub const DEFAULT_MAX_MISS_HEARTBEAT: u32 = 3;
/// Lowest valid node id. Zero is reserved for the controller.
pub const MIN_NODE_ID: u8 = 1;
/// Highest valid node id (seven bits).
pub const MAX_NODE_ID: u8 = 127;

//==================================================================================INTERFACE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Transport kinds the responder can be bound to.
pub enum Interface {
    /// Socket-based CAN driver (Linux SocketCAN or any driver with id/mask filters).
    SocketCan,
}

impl Interface {
    /// Resolve an interface name; every other transport is not implemented.
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        match name {
            "socketcan" => Ok(Interface::SocketCan),
            other => Err(ConfigError::UnsupportedInterface { name: other.into() }),
        }
    }
}

//==================================================================================HEARTBEAT
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Heartbeat monitoring parameters, only present when a period is configured.
pub struct HeartbeatSettings {
    /// Expected heartbeat emission period of the controller.
    pub period: Duration,
    /// Consecutive missed periods before switching buses.
    pub max_miss_heartbeat: u32,
    /// Bus switch budget. `None` is unlimited, `Some(0)` never switches.
    pub max_bus_switch: Option<u32>,
}

//==================================================================================CONFIG
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Complete responder configuration.
pub struct ResponderConfig {
    /// Transport kind, e.g. `"socketcan"`.
    pub interface: String,
    /// Interface name of bus A.
    pub channel_a: String,
    /// Interface name of bus B.
    pub channel_b: String,
    /// Node id, `1..=127`.
    pub node_id: u8,
    /// Heartbeat period in seconds. Monitoring is disabled when absent.
    #[serde(default)]
    pub heartbeat_period: Option<f64>,
    #[serde(default = "default_max_miss_heartbeat")]
    pub max_miss_heartbeat: u32,
    /// `None` (or `null`) allows unlimited bus switches.
    #[serde(default)]
    pub max_bus_switch: Option<u32>,
    /// Seconds without fragments after which a partial packet is discarded.
    #[serde(default)]
    pub packet_stall_timeout: Option<f64>,
}

fn default_max_miss_heartbeat() -> u32 {
    DEFAULT_MAX_MISS_HEARTBEAT
}

impl ResponderConfig {
    /// Configuration without heartbeat monitoring or stall timeout.
    pub fn new(
        interface: impl Into<String>,
        channel_a: impl Into<String>,
        channel_b: impl Into<String>,
        node_id: u8,
    ) -> Self {
        Self {
            interface: interface.into(),
            channel_a: channel_a.into(),
            channel_b: channel_b.into(),
            node_id,
            heartbeat_period: None,
            max_miss_heartbeat: DEFAULT_MAX_MISS_HEARTBEAT,
            max_bus_switch: None,
            packet_stall_timeout: None,
        }
    }

    /// Enable heartbeat monitoring.
    pub fn with_heartbeat(
        mut self,
        period: Duration,
        max_miss_heartbeat: u32,
        max_bus_switch: Option<u32>,
    ) -> Self {
        self.heartbeat_period = Some(seconds(period));
        self.max_miss_heartbeat = max_miss_heartbeat;
        self.max_bus_switch = max_bus_switch;
        self
    }

    /// Discard partial packets that receive no fragment for `timeout`.
    pub fn with_packet_stall_timeout(mut self, timeout: Duration) -> Self {
        self.packet_stall_timeout = Some(seconds(timeout));
        self
    }

    /// Check every field. Called by the responder constructor.
    pub fn validate(&self) -> Result<Interface, ConfigError> {
        if !(MIN_NODE_ID..=MAX_NODE_ID).contains(&self.node_id) {
            return Err(ConfigError::InvalidNodeId {
                node_id: self.node_id,
            });
        }
        let interface = Interface::parse(&self.interface)?;

        if self.heartbeat_period.is_some() {
            self.heartbeat_period()
                .ok_or(ConfigError::InvalidHeartbeatPeriod)?;
            if self.max_miss_heartbeat == 0 {
                return Err(ConfigError::InvalidMaxMissHeartbeat);
            }
        }
        if self.packet_stall_timeout.is_some() {
            self.packet_stall_timeout()
                .ok_or(ConfigError::InvalidStallTimeout)?;
        }

        Ok(interface)
    }

    /// Heartbeat period as a duration, `None` when unset or not positive.
    pub fn heartbeat_period(&self) -> Option<Duration> {
        self.heartbeat_period.and_then(duration)
    }

    pub fn packet_stall_timeout(&self) -> Option<Duration> {
        self.packet_stall_timeout.and_then(duration)
    }

    /// Heartbeat parameters, `None` when monitoring is disabled.
    pub fn heartbeat_settings(&self) -> Option<HeartbeatSettings> {
        self.heartbeat_period().map(|period| HeartbeatSettings {
            period,
            max_miss_heartbeat: self.max_miss_heartbeat,
            max_bus_switch: self.max_bus_switch,
        })
    }

    /// Parse a JSON configuration document.
    #[cfg(feature = "std")]
    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(document).map_err(ConfigError::Parse)
    }

    /// Load a JSON configuration file.
    #[cfg(feature = "std")]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let document = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json(&document)
    }
}

/// Seconds to duration, rejecting non-positive and non-finite values.
/// Rounded to the nearest microsecond.
fn duration(seconds: f64) -> Option<Duration> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return None;
    }
    let micros = (seconds * 1_000_000.0 + 0.5) as u64;
    (micros > 0).then(|| Duration::from_micros(micros))
}

fn seconds(duration: Duration) -> f64 {
    duration.as_micros() as f64 / 1_000_000.0
}
