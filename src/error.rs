//! Error definitions shared across library modules.
//! Each type models a specific failure domain (configuration, bus channels,
//! responder lifecycle, packet framing, queued commands).
use core::fmt::Debug;

use crate::protocol::node::responder::ResponderState;
use crate::protocol::transport::network::Bus;
use thiserror_no_std::Error;

//==================================================================================CONFIG_ERROR
#[derive(Error, Debug)]
/// Invalid responder configuration. Always raised at construction time.
pub enum ConfigError {
    /// Node identifiers live in `1..=127`.
    #[error("Invalid node id {node_id}: expected 1..=127")]
    InvalidNodeId { node_id: u8 },
    /// Only the socket-based CAN transport exists.
    #[error("Interface '{name}' is not implemented")]
    UnsupportedInterface { name: alloc::string::String },
    /// Heartbeat period must be a strictly positive, finite number of seconds.
    #[error("Invalid heartbeat period")]
    InvalidHeartbeatPeriod,
    /// At least one missed heartbeat is needed before switching buses.
    #[error("max_miss_heartbeat must be at least 1")]
    InvalidMaxMissHeartbeat,
    /// Stall timeout must be a strictly positive, finite number of seconds.
    #[error("Invalid packet stall timeout")]
    InvalidStallTimeout,
    /// Configuration file could not be read.
    #[cfg(feature = "std")]
    #[error("Unable to read configuration file: {0}")]
    Io(std::io::Error),
    /// Configuration document is not valid JSON or misses required keys.
    #[cfg(feature = "std")]
    #[error("Malformed configuration: {0}")]
    Parse(serde_json::Error),
}

//==================================================================================NETWORK_ERROR
#[derive(Error, Debug)]
/// Failures raised by the dual-channel network. `E` is the driver error type.
pub enum NetworkError<E: Debug> {
    /// Driver refused to bind the channel.
    #[error("Unable to connect bus {0:?}: {1:?}")]
    Connect(Bus, E),
    /// Driver refused the receive filters.
    #[error("Unable to install filters on bus {0:?}: {1:?}")]
    Filter(Bus, E),
    /// Driver failed while releasing the channel.
    #[error("Unable to disconnect bus {0:?}: {1:?}")]
    Disconnect(Bus, E),
    /// Frame transmission failed on the selected channel.
    #[error("CAN bus send error on bus {0:?}: {1:?}")]
    Send(Bus, E),
    /// Frame reception failed on the selected channel.
    #[error("CAN bus receive error on bus {0:?}: {1:?}")]
    Receive(Bus, E),
    /// Channels are not bound to a transport.
    #[error("Network is not connected")]
    NotConnected,
    /// Reception has not been started.
    #[error("Network is not running")]
    NotRunning,
}

//==================================================================================PACKET_ERROR
#[derive(Error, Debug, PartialEq, Eq)]
/// Packet framing errors.
pub enum PacketError {
    /// The length header only covers 16 bits.
    #[error("Packet too large: {len} bytes")]
    TooLarge { len: usize },
}

//==================================================================================RESPONDER_ERROR
#[derive(Error, Debug)]
/// Errors surfaced by the responder API.
pub enum ResponderError<E: Debug> {
    /// Configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Network layer failure (bind, send, receive).
    #[error("Network error: {0:?}")]
    Network(NetworkError<E>),
    /// Lifecycle method called from the wrong state.
    #[error("Cannot {operation} while {state:?}")]
    InvalidState {
        state: ResponderState,
        operation: &'static str,
    },
    /// Telemetry frames carry at most eight bytes.
    #[error("Telemetry payload too long: {len} bytes")]
    PayloadTooLong { len: usize },
}

impl<E: Debug> From<NetworkError<E>> for ResponderError<E> {
    fn from(err: NetworkError<E>) -> Self {
        ResponderError::Network(err)
    }
}

//==================================================================================SUPERVISOR_ERRORS
#[derive(Error, Debug)]
/// Errors ending the responder runner loop.
pub enum ResponderRunError<E: Debug> {
    /// `drive` was called before `start`.
    #[error("Responder is not running")]
    NotRunning,
    /// A housekeeping tick, dispatch, or queued command failed.
    #[error("Responder error: {0:?}")]
    Responder(ResponderError<E>),
}

impl<E: Debug> From<ResponderError<E>> for ResponderRunError<E> {
    fn from(err: ResponderError<E>) -> Self {
        ResponderRunError::Responder(err)
    }
}

impl<E: Debug> From<NetworkError<E>> for ResponderRunError<E> {
    fn from(err: NetworkError<E>) -> Self {
        ResponderRunError::Responder(ResponderError::Network(err))
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
/// Errors raised while queueing a command through a responder handle.
pub enum ResponderHandleError {
    /// Telemetry frames carry at most eight bytes.
    #[error("Telemetry payload too long: {len} bytes")]
    PayloadTooLong { len: usize },
}
