//! Boundary contract for Nocturn.
//!
//! This crate defines what crosses the line between the room engine
//! and whatever transport hosts it:
//!
//! - **Types** ([`ClientIntent`], [`ServerEvent`], ids, game
//!   vocabulary): the messages themselves.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how they become
//!   bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong in between.
//!
//! The protocol layer knows nothing about rooms, timers, or sockets;
//! it only describes the messages.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientIntent, DayStage, Faction, MemberInfo, Phase, PlayerId, Recipient, Role, RoomId,
    ServerEvent, VoteRecord, VoteTally,
};
