//! Room session engine for Nocturn, a Mafia-style social deduction
//! game.
//!
//! Players join a room, the host starts the game, roles are dealt, and
//! the room cycles automatically between night and day until a faction
//! wins. Each room runs as an isolated Tokio task whose command
//! channel serializes every mutation, timer-driven transitions
//! included.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: creates/destroys rooms, routes intents
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`Room`]: the state machine itself, timing-free and testable
//! - [`GameConfig`]: phase durations
//! - [`roles`] / [`win`]: the pure role-draw and win-evaluation rules

mod config;
mod error;
mod registry;
pub mod roles;
mod room;
mod scheduler;
mod votes;
pub mod win;

pub use config::GameConfig;
pub use error::EngineError;
pub use registry::RoomRegistry;
pub use room::{DayState, GamePhase, Outbound, Player, Room};
pub use scheduler::{EventSender, RoomHandle, RoomInfo};
pub use votes::{VoteLedger, VoteOutcome};
