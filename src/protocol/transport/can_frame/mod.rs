//! In-memory representation of a SpaceCAN frame (classic CAN, 11-bit identifier).
use crate::protocol::transport::can_id::CanId;
use crate::protocol::transport::MAX_FRAME_PAYLOAD;
use embedded_can::{Id, StandardId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Raw SpaceCAN frame as exchanged with the bus driver.
pub struct CanFrame {
    /// 11-bit CAN identifier.
    pub id: CanId,
    /// Payload buffer. Bytes past `len` are unspecified.
    pub data: [u8; MAX_FRAME_PAYLOAD],
    /// Number of valid payload bytes (Data Length Code, 0 to 8).
    pub len: usize,
}

impl CanFrame {
    /// Build a frame from an identifier and up to eight payload bytes.
    ///
    /// The payload length is a caller contract: bytes beyond the eighth are
    /// not transmitted.
    pub fn new(id: CanId, payload: &[u8]) -> Self {
        debug_assert!(payload.len() <= MAX_FRAME_PAYLOAD);
        let len = payload.len().min(MAX_FRAME_PAYLOAD);
        let mut data = [0; MAX_FRAME_PAYLOAD];
        data[..len].copy_from_slice(&payload[..len]);
        Self { id, data, len }
    }

    /// Valid payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len.min(MAX_FRAME_PAYLOAD)]
    }

    #[inline]
    pub fn func_id(&self) -> u16 {
        self.id.func_id()
    }

    #[inline]
    pub fn node_id(&self) -> u8 {
        self.id.node_id()
    }
}

// HAL interop: SpaceCAN only uses standard data frames.
impl embedded_can::Frame for CanFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        match id.into() {
            Id::Standard(id) if data.len() <= MAX_FRAME_PAYLOAD => {
                Some(CanFrame::new(CanId(id.as_raw()), data))
            }
            _ => None,
        }
    }

    fn new_remote(_id: impl Into<Id>, _dlc: usize) -> Option<Self> {
        None
    }

    fn is_extended(&self) -> bool {
        false
    }

    fn is_remote_frame(&self) -> bool {
        false
    }

    fn id(&self) -> Id {
        // `raw()` is clamped to 11 bits, which `StandardId` always accepts.
        Id::Standard(StandardId::new(self.id.raw()).unwrap_or(StandardId::ZERO))
    }

    fn dlc(&self) -> usize {
        self.payload().len()
    }

    fn data(&self) -> &[u8] {
        self.payload()
    }
}
