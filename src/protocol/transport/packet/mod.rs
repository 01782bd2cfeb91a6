//! SpaceCAN packets: payloads longer than one frame, carried as a stream of
//! CAN frames behind a 2-byte length header.
//!
//! ```text
//! stream  = len_hi len_lo data[0] .. data[len-1]
//! frame 0 = stream[0..8]
//! frame 1 = stream[8..16]
//! ...
//! ```
//!
//! The bus delivers frames in order on a given channel, so no per-frame
//! sequence number is carried. Senders must preserve the chunk order.
use alloc::vec::Vec;

use crate::error::PacketError;
use crate::protocol::transport::MAX_FRAME_PAYLOAD;

/// Size of the length header prefixed to every packet stream.
pub const PACKET_HEADER_LEN: usize = 2;
/// Largest packet the length header can describe.
pub const MAX_PACKET_LEN: usize = u16::MAX as usize;

pub mod assembler;

//==================================================================================PACKET
/// Application packet; its bytes are opaque to this layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Packet {
    data: Vec<u8>,
}

impl Packet {
    /// Wrap `data`, rejecting payloads the length header cannot describe.
    pub fn new(data: Vec<u8>) -> Result<Self, PacketError> {
        if data.len() > MAX_PACKET_LEN {
            return Err(PacketError::TooLarge { len: data.len() });
        }
        Ok(Self { data })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Cut the framed stream into frame-sized chunks, in transmission order.
    pub fn split(&self) -> PacketChunks<'_> {
        PacketChunks {
            header: (self.data.len() as u16).to_be_bytes(),
            data: &self.data,
            offset: 0,
        }
    }
}

impl TryFrom<&[u8]> for Packet {
    type Error = PacketError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Packet::new(bytes.to_vec())
    }
}

//==================================================================================CHUNKS
/// One frame worth of packet stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    data: [u8; MAX_FRAME_PAYLOAD],
    len: usize,
}

impl Chunk {
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

/// Lazy iterator returning chunks one by one as they are cut.
#[derive(Debug, Clone)]
pub struct PacketChunks<'a> {
    header: [u8; PACKET_HEADER_LEN],
    data: &'a [u8],
    /// Position in the virtual `header ++ data` stream.
    offset: usize,
}

impl PacketChunks<'_> {
    fn stream_len(&self) -> usize {
        PACKET_HEADER_LEN + self.data.len()
    }

    fn stream_byte(&self, index: usize) -> u8 {
        if index < PACKET_HEADER_LEN {
            self.header[index]
        } else {
            self.data[index - PACKET_HEADER_LEN]
        }
    }
}

impl Iterator for PacketChunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Self::Item> {
        let remaining = self.stream_len().checked_sub(self.offset)?;
        if remaining == 0 {
            return None;
        }

        let len = remaining.min(MAX_FRAME_PAYLOAD);
        let mut data = [0u8; MAX_FRAME_PAYLOAD];
        for (i, byte) in data.iter_mut().take(len).enumerate() {
            *byte = self.stream_byte(self.offset + i);
        }
        self.offset += len;

        Some(Chunk { data, len })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.stream_len().saturating_sub(self.offset);
        let chunks = remaining.div_ceil(MAX_FRAME_PAYLOAD);
        (chunks, Some(chunks))
    }
}

impl ExactSizeIterator for PacketChunks<'_> {}
