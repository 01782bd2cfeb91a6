//! Creation and decomposition of the 11-bit SpaceCAN identifiers, plus the
//! acceptance filters installed on each bus channel.
use super::{
    FULL_MASK, FUNCTION_MASK, ID_HEARTBEAT, ID_SCET, ID_SYNC, ID_TC, ID_TM, ID_UTC, NODE_MASK,
};

//==================================================================================CAN_ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Standard CAN identifier (11 bits) stored inside a `u16`.
pub struct CanId(pub u16);

impl CanId {
    /// Compose an identifier from a function code and a node id.
    ///
    /// Bits outside their respective fields are masked out.
    pub const fn new(func_id: u16, node_id: u8) -> Self {
        CanId((func_id & FUNCTION_MASK) | (node_id as u16 & NODE_MASK))
    }

    pub const fn sync() -> Self {
        CanId(ID_SYNC)
    }

    pub const fn heartbeat() -> Self {
        CanId(ID_HEARTBEAT)
    }

    pub const fn scet() -> Self {
        CanId(ID_SCET)
    }

    pub const fn utc() -> Self {
        CanId(ID_UTC)
    }

    /// Telecommand addressed to `node_id`.
    pub const fn telecommand(node_id: u8) -> Self {
        Self::new(ID_TC, node_id)
    }

    /// Telemetry emitted by `node_id`.
    pub const fn telemetry(node_id: u8) -> Self {
        Self::new(ID_TM, node_id)
    }

    /// Function code with the node-id bits cleared.
    pub const fn func_id(&self) -> u16 {
        self.0 & FUNCTION_MASK
    }

    /// Seven-bit node id.
    pub const fn node_id(&self) -> u8 {
        (self.0 & NODE_MASK) as u8
    }

    /// Raw identifier, clamped to 11 bits.
    pub const fn raw(&self) -> u16 {
        self.0 & FULL_MASK
    }
}

//==================================================================================CAN_FILTER
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Acceptance filter in the `{can_id, can_mask}` form used by socket-based drivers.
///
/// A frame passes when `frame_id & can_mask == can_id & can_mask`.
pub struct CanFilter {
    pub can_id: u16,
    pub can_mask: u16,
}

impl CanFilter {
    /// Filter accepting exactly one identifier.
    pub const fn exact(id: CanId) -> Self {
        Self {
            can_id: id.raw(),
            can_mask: FULL_MASK,
        }
    }

    /// Whether a frame carrying `id` passes this filter.
    pub const fn matches(&self, id: CanId) -> bool {
        (id.raw() & self.can_mask) == (self.can_id & self.can_mask)
    }
}
