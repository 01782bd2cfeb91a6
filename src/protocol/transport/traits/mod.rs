//! Abstraction traits used by the transport layer (CAN bus channel and timer).
pub mod can_bus;
pub mod space_can_timer;
