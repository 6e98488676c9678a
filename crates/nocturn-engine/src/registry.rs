//! Room registry: creates, tracks, and routes players to rooms.
//!
//! This is the entry point for the transport layer. It owns the
//! process-wide room map and the player-to-room index, and enforces
//! the "one room per player" invariant; everything game-shaped happens
//! inside the room actors it hands intents to.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use nocturn_protocol::{ClientIntent, PlayerId, RoomId};
use tracing::{error, info};

use crate::scheduler::{EventSender, RoomHandle, RoomInfo, spawn_room};
use crate::{EngineError, GameConfig};

/// Counter for generating unique room IDs.
static NEXT_ROOM_ID: AtomicU64 = AtomicU64::new(1);

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Tracks all active rooms and which player is in which room.
pub struct RoomRegistry {
    config: GameConfig,

    /// Active rooms, keyed by room ID.
    rooms: HashMap<RoomId, RoomHandle>,

    /// Maps each player to the room they're currently in.
    /// A player can be in at most ONE room at a time (key invariant).
    player_rooms: HashMap<PlayerId, RoomId>,
}

impl RoomRegistry {
    /// Creates an empty registry; `config` applies to every room it
    /// spawns.
    pub fn new(config: GameConfig) -> Self {
        Self { config, rooms: HashMap::new(), player_rooms: HashMap::new() }
    }

    /// Routes one client intent to the right operation. The `sender`
    /// is the requester's event channel, used when the intent creates
    /// a membership.
    pub async fn apply(
        &mut self,
        player: PlayerId,
        intent: ClientIntent,
        sender: &EventSender,
    ) -> Result<(), EngineError> {
        match intent {
            ClientIntent::CreateRoom { name } => {
                self.create_room(player, name, sender.clone()).await.map(|_| ())
            }
            ClientIntent::JoinRoom { room_id, name } => {
                self.join_room(player, room_id, name, sender.clone()).await
            }
            ClientIntent::LeaveRoom => self.leave_room(player).await,
            ClientIntent::StartGame => self.start_game(player).await,
            ClientIntent::CastVote { target } => self.cast_vote(player, target).await,
            ClientIntent::SendChat { text } => self.send_chat(player, text).await,
        }
    }

    /// Creates a new room with the creator as its first member (and
    /// therefore host). Returns the new room's ID.
    pub async fn create_room(
        &mut self,
        creator: PlayerId,
        name: String,
        sender: EventSender,
    ) -> Result<RoomId, EngineError> {
        if let Some(existing) = self.player_rooms.get(&creator) {
            return Err(EngineError::AlreadyInRoom(creator, *existing));
        }

        let room_id = RoomId(NEXT_ROOM_ID.fetch_add(1, Ordering::Relaxed));
        let handle = spawn_room(room_id, self.config.clone(), DEFAULT_CHANNEL_SIZE);
        handle.join(creator, name, sender).await?;

        self.rooms.insert(room_id, handle);
        self.player_rooms.insert(creator, room_id);
        info!(%room_id, %creator, "room created");
        Ok(room_id)
    }

    /// Adds a player to an existing room. Enforces the one-room
    /// invariant; the room itself rejects joins past the lobby.
    pub async fn join_room(
        &mut self,
        player: PlayerId,
        room_id: RoomId,
        name: String,
        sender: EventSender,
    ) -> Result<(), EngineError> {
        if let Some(existing) = self.player_rooms.get(&player) {
            return Err(EngineError::AlreadyInRoom(player, *existing));
        }
        let handle = self.rooms.get(&room_id).ok_or(EngineError::RoomNotFound(room_id))?;

        handle.join(player, name, sender).await?;
        self.player_rooms.insert(player, room_id);
        Ok(())
    }

    /// Removes a player from their current room. When the last member
    /// leaves, the room is destroyed on the spot: its actor shuts down
    /// and its timers die with the loop, so nothing can fire later for
    /// a room that no longer exists.
    pub async fn leave_room(&mut self, player: PlayerId) -> Result<(), EngineError> {
        let Some(room_id) = self.player_rooms.remove(&player) else {
            return Err(EngineError::NotInRoom(player));
        };
        let Some(handle) = self.rooms.get(&room_id) else {
            // Index pointed at a room that is gone: a bookkeeping bug,
            // not a reason to take the process down.
            error!(%player, %room_id, "player indexed to a missing room, dropping entry");
            return Err(EngineError::RoomNotFound(room_id));
        };

        let remaining = handle.leave(player).await?;
        if remaining == 0 {
            if let Some(handle) = self.rooms.remove(&room_id) {
                let _ = handle.shutdown().await;
            }
            info!(%room_id, "room destroyed");
        }
        Ok(())
    }

    /// Routes a start request to the player's room.
    pub async fn start_game(&self, player: PlayerId) -> Result<(), EngineError> {
        self.handle_for(player)?.start(player).await
    }

    /// Routes a vote to the player's room.
    pub async fn cast_vote(&self, player: PlayerId, target: String) -> Result<(), EngineError> {
        self.handle_for(player)?.vote(player, target).await
    }

    /// Routes a chat line to the player's room.
    pub async fn send_chat(&self, player: PlayerId, text: String) -> Result<(), EngineError> {
        self.handle_for(player)?.chat(player, text).await
    }

    /// Returns metadata for a specific room.
    pub async fn room_info(&self, room_id: RoomId) -> Result<RoomInfo, EngineError> {
        let handle = self.rooms.get(&room_id).ok_or(EngineError::RoomNotFound(room_id))?;
        handle.info().await
    }

    /// Reverse lookup: the room a player is currently in, if any.
    pub fn room_of(&self, player: &PlayerId) -> Option<RoomId> {
        self.player_rooms.get(player).copied()
    }

    /// Number of active rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// All active room IDs.
    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.keys().copied().collect()
    }

    fn handle_for(&self, player: PlayerId) -> Result<&RoomHandle, EngineError> {
        let room_id =
            self.player_rooms.get(&player).copied().ok_or(EngineError::NotInRoom(player))?;
        match self.rooms.get(&room_id) {
            Some(handle) => Ok(handle),
            None => {
                error!(%player, %room_id, "player indexed to a missing room");
                Err(EngineError::RoomNotFound(room_id))
            }
        }
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}
