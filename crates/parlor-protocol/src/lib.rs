//! Wire protocol for Parlor.
//!
//! This crate defines the events clients and the coordinator exchange:
//!
//! - **Events** ([`ClientEvent`], [`ServerEvent`]) — every message that
//!   travels on the wire, as internally tagged JSON objects.
//! - **Identity** ([`UserId`], plus [`ConnId`] re-exported from the
//!   transport layer) — durable user identity vs. one live connection.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how events become frames.
//! - **Errors** ([`ProtocolError`]) — what can go wrong at this layer.
//!
//! The protocol layer sits between transport (frames) and the coordinator
//! (presence, rooms). It knows nothing about who is in which room — it only
//! names the events and their shapes.

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use parlor_transport::ConnId;
pub use types::{
    ClientEvent, Role, RoomMember, ServerEvent, UserId,
};
