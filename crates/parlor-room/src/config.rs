//! Room configuration.

/// Configuration for a room instance.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Maximum members allowed in the room. A match needs exactly two,
    /// and joins beyond this are rejected with [`crate::RoomError::Full`].
    pub capacity: usize,

    /// Command channel size for the room actor. When the channel fills,
    /// senders wait (bounded backpressure).
    pub channel_size: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            capacity: 2,
            channel_size: 64,
        }
    }
}
