//! High-level components of the SpaceCAN protocol: the CAN transport layer
//! (identifiers, frames, redundant network, packets) and the responder node.
pub mod node;
pub mod transport;
