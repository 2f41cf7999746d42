//! The opaque application payload carried by the network.

use std::{fmt::Display, ops::Deref};

/// The largest message an application may send unless a node is configured
/// otherwise.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 8192;

/// An opaque application payload.
///
/// The network never looks inside a message. It is copied into a
/// [`Packet`](crate::packet::Packet) when sent and handed back to the
/// application unchanged when it reaches its destination.
///
/// ```
/// # use stopwait_core::Message;
/// let message = Message::new("hello");
/// assert_eq!(message.len(), 5);
/// assert_eq!(&message[..], b"hello");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Message(Vec<u8>);

impl Message {
    /// Creates a new message with the given body content.
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self(body.into())
    }

    /// Checks that the message may be sent over a network that accepts
    /// messages of at most `max_size` bytes.
    pub fn validate(&self, max_size: usize) -> Result<(), MessageError> {
        if self.0.is_empty() {
            Err(MessageError::Empty)
        } else if self.0.len() > max_size {
            Err(MessageError::TooLong {
                length: self.0.len(),
                max: max_size,
            })
        } else {
            Ok(())
        }
    }
}

impl Deref for Message {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<&str> for Message {
    fn from(body: &str) -> Self {
        Self::new(body)
    }
}

impl From<&[u8]> for Message {
    fn from(body: &[u8]) -> Self {
        Self::new(body)
    }
}

impl From<Vec<u8>> for Message {
    fn from(body: Vec<u8>) -> Self {
        Self(body)
    }
}

impl Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum MessageError {
    #[error("Messages must contain at least one byte")]
    Empty,
    #[error("Message of {length} bytes exceeds the maximum of {max}")]
    TooLong { length: usize, max: usize },
}
