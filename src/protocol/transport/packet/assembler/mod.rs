//! Packet assembler: rebuilds a packet by accumulating the payloads of the
//! telecommand frames addressed to this node.
//!
//! A single reassembly is in flight at a time. The protocol does not
//! multiplex packets, so every frame fed to the assembler belongs to the
//! current packet until it completes. A truncated packet blocks the
//! assembler until it is reset, either explicitly or by the optional stall
//! limit counted in housekeeping ticks. The tick that follows a fragment only
//! clears the fragment flag, so a partial packet is kept for at least
//! `stall_limit` full periods after its last fragment.
use alloc::vec::Vec;

use super::{Packet, PACKET_HEADER_LEN};
use crate::protocol::transport::can_frame::CanFrame;

//==================================================================================Enums and Structs
#[derive(Debug, PartialEq, Eq)]
pub enum StallCheck {
    /// Nothing buffered.
    Idle,
    /// A partial packet is buffered and still within its stall budget.
    Waiting,
    /// The partial packet exceeded the stall budget and was discarded.
    Discarded { bytes: usize },
}

/// Single-slot packet assembler.
#[derive(Debug, Default)]
pub struct PacketAssembler {
    /// Raw stream bytes received so far, header included.
    buffer: Vec<u8>,
    /// Full housekeeping periods elapsed without a fragment.
    idle_ticks: u32,
    /// A fragment arrived since the previous tick.
    fragment_since_tick: bool,
    /// Ticks after which a partial packet is discarded. `None` keeps it forever.
    stall_limit: Option<u32>,
}

impl PacketAssembler {
    /// Assembler without stall detection.
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            idle_ticks: 0,
            fragment_since_tick: false,
            stall_limit: None,
        }
    }

    /// Assembler discarding partial packets after `ticks` idle housekeeping ticks.
    pub const fn with_stall_limit(ticks: u32) -> Self {
        Self {
            buffer: Vec::new(),
            idle_ticks: 0,
            fragment_since_tick: false,
            stall_limit: Some(ticks),
        }
    }

    //==================================================================================Process Functions
    /// Append the frame payload to the in-flight packet.
    ///
    /// Returns the completed packet once the declared length is reached;
    /// bytes past the declared length in the final frame are dropped.
    pub fn process_frame(&mut self, frame: &CanFrame) -> Option<Packet> {
        self.idle_ticks = 0;
        self.fragment_since_tick = true;
        self.buffer.extend_from_slice(frame.payload());

        let expected = self.declared_len()?;
        if self.buffer.len() < PACKET_HEADER_LEN + expected {
            return None;
        }

        let mut data = core::mem::take(&mut self.buffer);
        data.truncate(PACKET_HEADER_LEN + expected);
        data.drain(..PACKET_HEADER_LEN);
        self.reset();

        // `expected` came from a u16, so the length is always in range.
        Packet::new(data).ok()
    }

    /// Age the in-flight packet by one housekeeping tick.
    pub fn tick(&mut self) -> StallCheck {
        if self.buffer.is_empty() {
            return StallCheck::Idle;
        }
        if core::mem::take(&mut self.fragment_since_tick) {
            return StallCheck::Waiting;
        }

        self.idle_ticks = self.idle_ticks.saturating_add(1);
        match self.stall_limit {
            Some(limit) if self.idle_ticks >= limit => {
                let bytes = self.buffer.len();
                self.reset();
                StallCheck::Discarded { bytes }
            }
            _ => StallCheck::Waiting,
        }
    }

    /// Drop any partial packet.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.idle_ticks = 0;
        self.fragment_since_tick = false;
    }

    /// Whether a partial packet is buffered.
    pub fn is_pending(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Number of stream bytes buffered, header included.
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn stall_limit(&self) -> Option<u32> {
        self.stall_limit
    }

    /// Packet length announced by the header, once both bytes have arrived.
    fn declared_len(&self) -> Option<usize> {
        match self.buffer.as_slice() {
            [hi, lo, ..] => Some(u16::from_be_bytes([*hi, *lo]) as usize),
            _ => None,
        }
    }
}
