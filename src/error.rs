use thiserror::Error;

use crate::interface::Direction;

/// Errors surfaced by queues, the codec, and topology construction.
///
/// All of these are recovered at the owning run loop; none of them aborts
/// a node task or reaches the driver.
#[derive(Debug, Error)]
pub enum NetError {
    #[error("queue {0} empty")]
    Empty(Direction),

    #[error("queue {0} full")]
    Full(Direction),

    #[error("interface queue closed")]
    Closed,

    #[error("truncated packet: {0} bytes on the wire")]
    Truncated(usize),

    #[error("unknown protocol option: {0:?}")]
    BadProtocol(String),

    #[error("malformed routing advertisement: {0}")]
    BadAdvertisement(#[from] serde_json::Error),

    #[error("invalid link: {0}")]
    InvalidLink(String),
}
