//! # Envelope
//!
//! The unit carried between nodes. The body is an opaque `bincode` encoding
//! of the typed message; the header identifies sender, recipient and the
//! channel the receiver matches on.

use crate::PROTOCOL_VERSION;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{FabricError, NodeId, Tag};
use std::fmt;
use tokio::sync::oneshot;

/// Matching key of a transfer besides its sender.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Point-to-point transfer labelled by the caller.
    Tagged(Tag),
    /// Internal transfer of the n-th collective call of the sender.
    Collective(u64),
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Tagged(tag) => write!(f, "{}", tag),
            Channel::Collective(seq) => write!(f, "collective#{}", seq),
        }
    }
}

/// A message in flight.
pub struct Envelope {
    /// Protocol version of the sender.
    pub version: u16,
    /// Node that produced the envelope. Sole authority on the sender identity.
    pub sender: NodeId,
    /// Node the envelope is addressed to.
    pub recipient: NodeId,
    /// Matching channel.
    pub channel: Channel,
    /// Encoded message.
    pub body: Vec<u8>,
    /// Released once the recipient matched the envelope.
    delivered: oneshot::Sender<()>,
}

impl Envelope {
    /// Build an envelope and the handle its sender waits on.
    pub fn new(
        sender: NodeId,
        recipient: NodeId,
        channel: Channel,
        body: Vec<u8>,
    ) -> (Self, oneshot::Receiver<()>) {
        let (delivered, ack) = oneshot::channel();
        (
            Self {
                version: PROTOCOL_VERSION,
                sender,
                recipient,
                channel,
                body,
                delivered,
            },
            ack,
        )
    }

    /// True iff a receive posted for `(sender, channel)` matches this envelope.
    #[must_use]
    pub fn matches(&self, sender: NodeId, channel: Channel) -> bool {
        self.sender == sender && self.channel == channel
    }

    /// Reject envelopes from an incompatible protocol version.
    pub fn verify_version(&self) -> Result<(), FabricError> {
        if self.version != PROTOCOL_VERSION {
            return Err(FabricError::VersionMismatch {
                received: self.version,
                supported: PROTOCOL_VERSION,
            });
        }
        Ok(())
    }

    /// Consume the envelope, release the sender and hand back the body.
    pub fn accept(self) -> Vec<u8> {
        // The sender may have given up waiting; the body is still valid.
        let _ = self.delivered.send(());
        self.body
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("version", &self.version)
            .field("sender", &self.sender)
            .field("recipient", &self.recipient)
            .field("channel", &self.channel)
            .field("body_len", &self.body.len())
            .finish()
    }
}

/// Encode a message body.
pub fn encode<M: Serialize + ?Sized>(message: &M) -> Result<Vec<u8>, FabricError> {
    bincode::serialize(message).map_err(|e| FabricError::Codec(e.to_string()))
}

/// Decode a message body.
pub fn decode<M: DeserializeOwned>(body: &[u8]) -> Result<M, FabricError> {
    bincode::deserialize(body).map_err(|e| FabricError::Codec(e.to_string()))
}
