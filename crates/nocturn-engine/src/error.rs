//! Error types for the engine layer.
//!
//! These surface to the embedding layer (transport, registry callers)
//! for logging and routing decisions only. Toward clients the engine
//! is silent-ignore: invalid in-room requests are dropped without a
//! reply.

use nocturn_protocol::{PlayerId, RoomId};

/// Errors that can occur during registry and room operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The room does not exist.
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    /// The player is already in a room.
    #[error("player {0} already in room {1}")]
    AlreadyInRoom(PlayerId, RoomId),

    /// The player is not in any room.
    #[error("player {0} is not in any room")]
    NotInRoom(PlayerId),

    /// The room is past its lobby and no longer accepts joins.
    #[error("room {0} is not accepting players")]
    NotJoinable(RoomId),

    /// The room's command channel is closed or full.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}
