//! SpaceCAN transport layer: 11-bit identifier layout, CAN frame
//! representation, dual-channel network, packet fragmentation, and bus
//! abstraction traits.
//!
//! ## Identifier space
//!
//! An identifier is a 4-bit function code followed by a 7-bit node id:
//!
//! ```text
//!  10  9  8  7 | 6  5  4  3  2  1  0
//! function code|       node id
//! ```
//!
//! SYNC, HEARTBEAT, SCET and UTC are broadcast codes. TC and TM identifiers
//! add the addressed (TC) or emitting (TM) node id to the function code.

pub mod can_frame;
pub mod can_id;
pub mod network;
pub mod packet;
pub mod traits;

/// Mask covering the full 11-bit identifier.
pub const FULL_MASK: u16 = 0x7FF;
/// Function-code bits of an identifier.
pub const FUNCTION_MASK: u16 = 0x780;
/// Node-id bits of an identifier.
pub const NODE_MASK: u16 = 0x07F;

/// Synchronisation broadcast.
pub const ID_SYNC: u16 = 0x080;
/// Spacecraft elapsed time broadcast.
pub const ID_SCET: u16 = 0x180;
/// UTC time broadcast.
pub const ID_UTC: u16 = 0x200;
/// Telecommand base (controller to responder), plus the addressed node id.
pub const ID_TC: u16 = 0x280;
/// Telemetry base (responder to controller), plus the emitting node id.
pub const ID_TM: u16 = 0x300;
/// Controller heartbeat broadcast.
pub const ID_HEARTBEAT: u16 = 0x700;

/// Maximum payload of a classic CAN frame.
pub const MAX_FRAME_PAYLOAD: usize = 8;
