//! Error types for the presence layer.

/// Errors that can occur while establishing or using presence.
#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    /// The external auth provider rejected the token.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The connection is not tracked (already gone, or never tracked).
    #[error("unknown connection {0}")]
    UnknownConnection(parlor_protocol::ConnId),
}
