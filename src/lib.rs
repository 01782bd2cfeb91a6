//! `spacecan` library: responder side of the SpaceCAN command/telemetry
//! protocol. The crate exposes the transport layer (11-bit identifiers, frames,
//! redundant bus network, packet fragmentation) and the node logic (heartbeat
//! consumer, frame dispatch, runner/handle split for multi-task firmware).
#![cfg_attr(not(feature = "std"), no_std)]
//==================================================================================
extern crate alloc;
//==================================================================================
/// Responder configuration (explicit parameters or JSON document).
pub mod config;
/// Domain errors (configuration, network, responder lifecycle, packets).
pub mod error;
/// SpaceCAN protocol implementation: transport layer and responder node.
pub mod protocol;
//==================================================================================
