//! Presence tracking for Parlor.
//!
//! This crate answers "who is online right now":
//!
//! 1. **Identity bindings** — which connection currently speaks for a user
//!    id ([`Presence::register`] / [`Presence::resolve`]), with
//!    last-registered-wins semantics and a stale-release guard.
//! 2. **Peer metadata** — the display name and outbound event channel of
//!    every live connection, which the invitation router scans.
//! 3. **Authentication** — the [`Authenticator`] seam to the external
//!    credential provider.
//!
//! # How it fits in the stack
//!
//! ```text
//! Coordinator (above)  ← resolves invite targets, delivers unicast events
//!     ↕
//! Presence (this crate)  ← maps durable identity to live connections
//!     ↕
//! Protocol (below)  ← provides UserId, ConnId, ServerEvent
//! ```

#![allow(async_fn_in_trait)]

mod auth;
mod error;
mod registry;

pub use auth::Authenticator;
pub use error::PresenceError;
pub use registry::{PeerSender, Presence};
