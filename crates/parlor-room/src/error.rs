//! Error types for the room layer.

use parlor_protocol::ConnId;

/// Errors that can occur during room operations.
///
/// All of these are recoverable and local to the requesting connection —
/// the handler reports them back as a `room_error` event (or drops them)
/// and the coordinator keeps running.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room already holds its maximum number of distinct members.
    #[error("room {room} is full (max {capacity} players)")]
    Full { room: String, capacity: usize },

    /// The connection is not a member of the room.
    #[error("{0} is not a member of room {1}")]
    NotMember(ConnId, String),

    /// A kick was attempted by a connection that is not the room's host.
    #[error("{0} is not the host of room {1}")]
    NotHost(ConnId, String),

    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(String),

    /// The room's command channel is closed (actor gone or shutting down).
    #[error("room {0} is unavailable")]
    Unavailable(String),
}
