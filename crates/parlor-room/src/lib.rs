//! Room lifecycle for Parlor.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns the
//! member list, the readiness set, and the active match — every mutation
//! of a room's state goes through its command channel, so two connections
//! racing on the same room are serialized by construction.
//!
//! # Key types
//!
//! - [`RoomManager`] — the directory: implicit create-on-join, sweep of
//!   empty rooms, routing by room name
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`MatchRules`] — the thin per-variant policy (legality + win check)
//! - [`TicTacToe`] — the built-in variant
//! - [`RoomConfig`] — room settings (capacity)

mod config;
mod error;
mod manager;
mod room;
mod rules;
mod tictactoe;

pub use config::RoomConfig;
pub use error::RoomError;
pub use manager::RoomManager;
pub use room::{host_user_id, RoomHandle};
pub use rules::{MatchRules, MatchVerdict};
pub use tictactoe::TicTacToe;
