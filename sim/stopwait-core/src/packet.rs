//! The network-layer packet and its wire format.

use crate::{utility::BytesExt, Message, NodeAddress};
use thiserror::Error as ThisError;

/// The number of bytes in a packet header.
pub const PACKET_HEADER_SIZE: usize = 12;

/// A network-layer packet: an application message wrapped with the addresses
/// needed to route it.
///
/// On the wire a packet is laid out as
///
/// | field       | size     |
/// |-------------|----------|
/// | destination | 4        |
/// | source      | 4        |
/// | length      | 4        |
/// | message     | `length` |
///
/// with all integers little endian. The message is last so that only the
/// bytes actually used are transmitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// The node the message is ultimately for
    pub destination: NodeAddress,
    /// The node that created the packet. Preserved across every hop.
    pub source: NodeAddress,
    /// The application payload
    pub message: Message,
}

impl Packet {
    pub fn new(destination: NodeAddress, source: NodeAddress, message: Message) -> Self {
        Self {
            destination,
            source,
            message,
        }
    }

    /// The number of message bytes carried.
    pub fn length(&self) -> usize {
        self.message.len()
    }

    /// The number of bytes the packet occupies on the wire.
    pub fn wire_size(&self) -> usize {
        PACKET_HEADER_SIZE + self.length()
    }

    /// Serializes the packet.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.wire_size());
        out.extend_from_slice(&u32::from(self.destination).to_le_bytes());
        out.extend_from_slice(&u32::from(self.source).to_le_bytes());
        out.extend_from_slice(&(self.length() as u32).to_le_bytes());
        out.extend_from_slice(&self.message);
        out
    }

    /// Parses a packet from exactly the bytes of one packet.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        const HTS: ParseError = ParseError::HeaderTooShort;
        let mut header = bytes.iter().cloned();
        let destination = header.next_u32_le().ok_or(HTS)?;
        let source = header.next_u32_le().ok_or(HTS)?;
        let length = header.next_u32_le().ok_or(HTS)? as usize;

        let body = &bytes[PACKET_HEADER_SIZE..];
        if body.len() != length {
            Err(ParseError::LengthMismatch {
                header: length,
                actual: body.len(),
            })?
        }

        Ok(Self {
            destination: destination.into(),
            source: source.into(),
            message: Message::new(body),
        })
    }
}

#[derive(Debug, ThisError, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error("Too few bytes to constitute a packet header")]
    HeaderTooShort,
    #[error("The header claims {header} message bytes but {actual} are present")]
    LengthMismatch { header: usize, actual: usize },
}
