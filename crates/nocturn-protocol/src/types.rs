//! Boundary types for the Nocturn engine.
//!
//! Everything a transport layer exchanges with the engine lives here:
//! identities, the intents clients may request, and the events the
//! engine asks to have delivered back to a room's members. The engine
//! never sees a socket; it speaks only in these types.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player (assigned by the transport layer
/// when the connection is accepted, stable for its lifetime).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a room (one game instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient: who should receive an event?
// ---------------------------------------------------------------------------

/// Specifies who should receive a server event.
///
/// Engine mutations return `(Recipient, ServerEvent)` pairs; this enum
/// tells the dispatch layer where each one goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every member of the room.
    All,
    /// One specific player.
    Player(PlayerId),
    /// Everyone except the specified player.
    AllExcept(PlayerId),
}

// ---------------------------------------------------------------------------
// Game vocabulary
// ---------------------------------------------------------------------------

/// The two sides of the game. Win conditions are decided per faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    Mafia,
    Town,
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mafia => write!(f, "mafia"),
            Self::Town => write!(f, "town"),
        }
    }
}

/// A role dealt to a player at game start.
///
/// Detective and doctor carry no mechanical effect beyond their faction
/// yet; they exist so the draw and the narration can name them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Mafia,
    Detective,
    Doctor,
    Citizen,
}

impl Role {
    /// The faction this role fights for.
    pub fn faction(self) -> Faction {
        match self {
            Self::Mafia => Faction::Mafia,
            Self::Detective | Self::Doctor | Self::Citizen => Faction::Town,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mafia => write!(f, "mafia"),
            Self::Detective => write!(f, "detective"),
            Self::Doctor => write!(f, "doctor"),
            Self::Citizen => write!(f, "citizen"),
        }
    }
}

/// Top-level game clock state, as seen on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Lobby,
    Night,
    Day,
    Ended,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => write!(f, "lobby"),
            Self::Night => write!(f, "night"),
            Self::Day => write!(f, "day"),
            Self::Ended => write!(f, "ended"),
        }
    }
}

/// Sub-state of the day phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStage {
    Discussion,
    Voting,
}

impl fmt::Display for DayStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discussion => write!(f, "discussion"),
            Self::Voting => write!(f, "voting"),
        }
    }
}

// ---------------------------------------------------------------------------
// Event payload fragments
// ---------------------------------------------------------------------------

/// One member as shown in a room-state broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInfo {
    pub name: String,
    pub host: bool,
    pub alive: bool,
}

/// Vote count for one target, by display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub target: String,
    pub count: usize,
}

/// One voter's current choice, by display names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub voter: String,
    pub target: String,
}

// ---------------------------------------------------------------------------
// ClientIntent: inbound requests
// ---------------------------------------------------------------------------

/// Requests a client may make against the engine.
///
/// Each intent is attributed to a requesting [`PlayerId`] by the
/// transport; the intent itself never carries the sender's identity.
/// Invalid intents (wrong phase, dead sender, unknown target, ...) are
/// dropped by the engine with no reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientIntent {
    /// Create a new room and join it as host.
    CreateRoom { name: String },
    /// Join an existing room; accepted only while it is in the lobby.
    JoinRoom { room_id: RoomId, name: String },
    /// Leave the current room.
    LeaveRoom,
    /// Start the game; host only, lobby only.
    StartGame,
    /// Vote to eliminate a player, identified by display name.
    /// Accepted only during the day's voting stage.
    CastVote { target: String },
    /// Say something to the room; living members only.
    SendChat { text: String },
}

// ---------------------------------------------------------------------------
// ServerEvent: outbound notifications
// ---------------------------------------------------------------------------

/// Events the engine asks the transport to deliver.
///
/// Game over has no dedicated event: it is a `RoomState` with
/// `phase == Ended` and `winner` set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Sent to the joining player only, confirming membership.
    RoomJoined { room_id: RoomId },

    /// Full room snapshot, broadcast after every membership or
    /// phase/stage change. `stage` is present iff `phase == Day`;
    /// `winner` is present iff `phase == Ended`.
    RoomState {
        phase: Phase,
        stage: Option<DayStage>,
        winner: Option<Faction>,
        members: Vec<MemberInfo>,
    },

    /// Free-text narration: joins, leaves, phase changes, eliminations.
    System { text: String },

    /// A player's own role, sent individually right after the draw.
    RoleAssigned { role: Role },

    /// Current voting picture, sent after every vote and after the
    /// ledger resets.
    VoteUpdate {
        tally: Vec<VoteTally>,
        votes: Vec<VoteRecord>,
        total_voters: usize,
    },

    /// Relayed chat from a living member.
    Chat { from: String, text: String },
}

#[cfg(test)]
mod tests {
    //! The JSON shapes here are the contract with client code: a serde
    //! attribute change that alters them is a breaking protocol change.

    use super::*;

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&PlayerId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_room_id_round_trip_and_display() {
        let id: RoomId = serde_json::from_str("7").unwrap();
        assert_eq!(id, RoomId(7));
        assert_eq!(id.to_string(), "R-7");
    }

    #[test]
    fn test_role_serializes_snake_case() {
        let json = serde_json::to_string(&Role::Detective).unwrap();
        assert_eq!(json, "\"detective\"");
    }

    #[test]
    fn test_role_factions() {
        assert_eq!(Role::Mafia.faction(), Faction::Mafia);
        assert_eq!(Role::Detective.faction(), Faction::Town);
        assert_eq!(Role::Doctor.faction(), Faction::Town);
        assert_eq!(Role::Citizen.faction(), Faction::Town);
    }

    #[test]
    fn test_client_intent_internally_tagged() {
        let intent = ClientIntent::JoinRoom {
            room_id: RoomId(3),
            name: "ada".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["type"], "JoinRoom");
        assert_eq!(json["room_id"], 3);
        assert_eq!(json["name"], "ada");
    }

    #[test]
    fn test_cast_vote_round_trip() {
        let intent = ClientIntent::CastVote { target: "bob".into() };
        let bytes = serde_json::to_vec(&intent).unwrap();
        let decoded: ClientIntent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(intent, decoded);
    }

    #[test]
    fn test_room_state_json_shape() {
        let ev = ServerEvent::RoomState {
            phase: Phase::Day,
            stage: Some(DayStage::Voting),
            winner: None,
            members: vec![MemberInfo {
                name: "ada".into(),
                host: true,
                alive: true,
            }],
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "RoomState");
        assert_eq!(json["phase"], "day");
        assert_eq!(json["stage"], "voting");
        assert!(json["winner"].is_null());
        assert_eq!(json["members"][0]["name"], "ada");
        assert_eq!(json["members"][0]["host"], true);
    }

    #[test]
    fn test_ended_room_state_carries_winner() {
        let ev = ServerEvent::RoomState {
            phase: Phase::Ended,
            stage: None,
            winner: Some(Faction::Town),
            members: vec![],
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["phase"], "ended");
        assert_eq!(json["winner"], "town");
    }

    #[test]
    fn test_vote_update_round_trip() {
        let ev = ServerEvent::VoteUpdate {
            tally: vec![VoteTally { target: "bob".into(), count: 2 }],
            votes: vec![
                VoteRecord { voter: "ada".into(), target: "bob".into() },
                VoteRecord { voter: "cy".into(), target: "bob".into() },
            ],
            total_voters: 4,
        };
        let bytes = serde_json::to_vec(&ev).unwrap();
        let decoded: ServerEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(ev, decoded);
    }

    #[test]
    fn test_role_assigned_json_shape() {
        let ev = ServerEvent::RoleAssigned { role: Role::Mafia };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "RoleAssigned");
        assert_eq!(json["role"], "mafia");
    }

    #[test]
    fn test_recipient_round_trip() {
        for r in [
            Recipient::All,
            Recipient::Player(PlayerId(7)),
            Recipient::AllExcept(PlayerId(3)),
        ] {
            let bytes = serde_json::to_vec(&r).unwrap();
            let decoded: Recipient = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(r, decoded);
        }
    }

    #[test]
    fn test_decode_unknown_intent_returns_error() {
        let unknown = r#"{"type": "FlyToMoon", "speed": 9000}"#;
        let result: Result<ClientIntent, _> = serde_json::from_str(unknown);
        assert!(result.is_err());
    }
}
