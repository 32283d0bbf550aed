//! # Parlor
//!
//! Real-time two-player game session coordinator.
//!
//! Parlor keeps ephemeral rooms where two players meet, signal ready, and
//! play a match whose rules plug in through the [`MatchRules`] trait. The
//! coordinator is authoritative: it enforces turn order, validates each
//! move against the variant's rules, and relays the legal ones. Around the
//! match it handles room chat, invitations to online players, and cleanup
//! when a socket drops.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parlor::prelude::*;
//!
//! # struct MyAuth;
//! # impl Authenticator for MyAuth {
//! #     async fn verify(&self, t: &str) -> Result<UserId, PresenceError> {
//! #         Ok(UserId(t.to_string()))
//! #     }
//! # }
//! # async fn run() -> Result<(), ParlorError> {
//! let server = ParlorServerBuilder::new()
//!     .bind("0.0.0.0:8080")
//!     .build(TicTacToe, MyAuth)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod invite;
mod server;
mod sweeper;

pub use error::ParlorError;
pub use server::{ParlorServer, ParlorServerBuilder, DEFAULT_SWEEP_INTERVAL};

pub use parlor_presence::{Authenticator, PeerSender, Presence, PresenceError};
pub use parlor_protocol::{
    ClientEvent, Codec, ConnId, JsonCodec, ProtocolError, Role, RoomMember,
    ServerEvent, UserId,
};
pub use parlor_room::{
    host_user_id, MatchRules, MatchVerdict, RoomConfig, RoomError,
    RoomHandle, RoomManager, TicTacToe,
};
pub use parlor_transport::{
    Connection, Transport, TransportError, WebSocketTransport,
};

/// Installs a `tracing` subscriber that reads its filter from
/// `RUST_LOG`. Call once at the top of `main`; does nothing if a
/// subscriber is already set.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("info")
                }),
        )
        .try_init();
}

/// Commonly used items, re-exported for `use parlor::prelude::*`.
pub mod prelude {
    pub use crate::{
        host_user_id, Authenticator, ClientEvent, ConnId, MatchRules,
        MatchVerdict, ParlorError, ParlorServer, ParlorServerBuilder,
        PresenceError, Role, RoomConfig, RoomError, RoomMember, ServerEvent,
        TicTacToe, UserId,
    };
}
