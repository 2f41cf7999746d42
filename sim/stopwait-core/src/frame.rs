//! The data-link frame and its wire format.
//!
//! A frame is laid out as
//!
//! | field    | size     |
//! |----------|----------|
//! | kind     | 1        |
//! | checksum | 4        |
//! | sequence | 1        |
//! | length   | 4        |
//! | payload  | `length` |
//!
//! with all integers little endian. The payload is last so a frame is only
//! ever as large as its header plus the bytes it carries. The checksum is a
//! CRC-32 over the entire frame computed with the checksum field zeroed.

use crate::{
    packet::{self, Packet},
    utility::{BytesExt, Checksum},
};
use std::fmt::Display;
use thiserror::Error as ThisError;

/// The number of bytes in a frame header.
pub const FRAME_HEADER_SIZE: usize = 10;

const CHECKSUM_RANGE: std::ops::Range<usize> = 1..5;

/// Whether a frame carries data or acknowledges it.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    Data = 0,
    Ack = 1,
}

impl TryFrom<u8> for FrameKind {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Data),
            1 => Ok(Self::Ack),
            other => Err(ParseError::UnknownKind(other)),
        }
    }
}

/// The one-bit sequence number of the stop-and-wait protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Sequence {
    #[default]
    Zero,
    One,
}

impl Sequence {
    /// The other sequence number.
    pub fn toggled(self) -> Self {
        match self {
            Self::Zero => Self::One,
            Self::One => Self::Zero,
        }
    }

    /// Flips the sequence number in place.
    pub fn toggle(&mut self) {
        *self = self.toggled();
    }
}

impl TryFrom<u8> for Sequence {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Zero),
            1 => Ok(Self::One),
            other => Err(ParseError::InvalidSequence(other)),
        }
    }
}

impl From<Sequence> for u8 {
    fn from(sequence: Sequence) -> Self {
        match sequence {
            Sequence::Zero => 0,
            Sequence::One => 1,
        }
    }
}

impl Display for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

/// A data-link frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: FrameKind,
    pub sequence: Sequence,
    /// A serialized [`Packet`] for data frames, empty for acknowledgements
    pub payload: Vec<u8>,
}

impl Frame {
    /// Creates a data frame carrying the given packet.
    pub fn data(sequence: Sequence, packet: &Packet) -> Self {
        Self {
            kind: FrameKind::Data,
            sequence,
            payload: packet.to_bytes(),
        }
    }

    /// Creates an acknowledgement for the given sequence number.
    pub fn ack(sequence: Sequence) -> Self {
        Self {
            kind: FrameKind::Ack,
            sequence,
            payload: vec![],
        }
    }

    /// The number of bytes the frame occupies on the wire.
    pub fn wire_size(&self) -> usize {
        FRAME_HEADER_SIZE + self.payload.len()
    }

    /// Serializes the frame and fills in its checksum.
    ///
    /// ```
    /// # use stopwait_core::frame::{Frame, Sequence, FRAME_HEADER_SIZE};
    /// let bytes = Frame::ack(Sequence::One).to_bytes();
    /// assert_eq!(bytes.len(), FRAME_HEADER_SIZE);
    /// assert_eq!(Frame::from_bytes(&bytes), Ok(Frame::ack(Sequence::One)));
    /// ```
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.wire_size());
        out.push(self.kind as u8);
        out.extend_from_slice(&[0; 4]);
        out.push(self.sequence.into());
        out.extend_from_slice(&(self.payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.payload);

        let checksum = checksum(&out);
        out[CHECKSUM_RANGE].copy_from_slice(&checksum.to_le_bytes());
        out
    }

    /// Parses and verifies a frame from exactly the bytes of one frame.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        const HTS: ParseError = ParseError::HeaderTooShort;
        let mut header = bytes.iter().cloned();
        let kind = header.next_u8().ok_or(HTS)?;
        let expected_checksum = header.next_u32_le().ok_or(HTS)?;
        let sequence = header.next_u8().ok_or(HTS)?;
        let length = header.next_u32_le().ok_or(HTS)? as usize;

        let actual_checksum = checksum(bytes);
        if actual_checksum != expected_checksum {
            Err(ParseError::Checksum {
                actual: actual_checksum,
                expected: expected_checksum,
            })?
        }

        let payload = &bytes[FRAME_HEADER_SIZE..];
        if payload.len() != length {
            Err(ParseError::LengthMismatch {
                header: length,
                actual: payload.len(),
            })?
        }

        Ok(Self {
            kind: kind.try_into()?,
            sequence: sequence.try_into()?,
            payload: payload.to_vec(),
        })
    }

    /// Parses the packet carried by a data frame.
    pub fn packet(&self) -> Result<Packet, packet::ParseError> {
        Packet::from_bytes(&self.payload)
    }
}

/// Computes the checksum of a serialized frame, treating its checksum field
/// as zero.
fn checksum(frame: &[u8]) -> u32 {
    let mut checksum = Checksum::new();
    checksum.add_bytes(&frame[..CHECKSUM_RANGE.start]);
    checksum.add_zeroed_field();
    checksum.add_bytes(&frame[CHECKSUM_RANGE.end..]);
    checksum.as_u32()
}

#[derive(Debug, ThisError, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error("Too few bytes to constitute a frame header")]
    HeaderTooShort,
    #[error(
        "The computed checksum {actual:#010x} did not match the header checksum {expected:#010x}"
    )]
    Checksum { actual: u32, expected: u32 },
    #[error("The header claims {header} payload bytes but {actual} are present")]
    LengthMismatch { header: usize, actual: usize },
    #[error("Unknown frame kind {0}")]
    UnknownKind(u8),
    #[error("Sequence numbers must be 0 or 1, got {0}")]
    InvalidSequence(u8),
}
