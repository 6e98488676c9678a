//! The room: one game instance and the single source of truth for it.
//!
//! All mutators are synchronous and return the events they want
//! delivered, as `(Recipient, ServerEvent)` pairs. The scheduler owns
//! the timing; the room owns the rules. Nothing here touches a socket
//! or a clock, which is what keeps the whole state machine testable
//! in-process.

use nocturn_protocol::{
    DayStage, Faction, MemberInfo, Phase, PlayerId, Recipient, Role, RoomId, ServerEvent,
    VoteRecord, VoteTally,
};
use rand::Rng;
use tracing::debug;

use crate::votes::{VoteLedger, VoteOutcome};
use crate::{EngineError, roles, win};

/// Events a mutation wants delivered, paired with their recipients.
pub type Outbound = Vec<(Recipient, ServerEvent)>;

/// One member of a room.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub role: Option<Role>,
    pub alive: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: String) -> Self {
        Self { id, name, role: None, alive: true }
    }
}

/// Sub-state of the day phase. The vote ledger lives inside the
/// `Voting` variant, so it exists exactly while voting is open.
#[derive(Debug)]
pub enum DayState {
    Discussion,
    Voting(VoteLedger),
}

impl DayState {
    fn stage(&self) -> DayStage {
        match self {
            Self::Discussion => DayStage::Discussion,
            Self::Voting(_) => DayStage::Voting,
        }
    }
}

/// The game clock state, with phase-dependent data carried in the
/// variant that owns it. `Ended` is terminal.
#[derive(Debug)]
pub enum GamePhase {
    Lobby,
    Night,
    Day(DayState),
    Ended { winner: Faction },
}

impl GamePhase {
    /// The wire-level view of this phase.
    fn wire(&self) -> (Phase, Option<DayStage>, Option<Faction>) {
        match self {
            Self::Lobby => (Phase::Lobby, None, None),
            Self::Night => (Phase::Night, None, None),
            Self::Day(day) => (Phase::Day, Some(day.stage()), None),
            Self::Ended { winner } => (Phase::Ended, None, Some(*winner)),
        }
    }
}

/// One isolated game instance: membership, phase, and votes.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    /// Insertion order is kept so host fallback is deterministic.
    players: Vec<Player>,
    host: Option<PlayerId>,
    phase: GamePhase,
}

impl Room {
    pub fn new(id: RoomId) -> Self {
        Self { id, players: Vec::new(), host: None, phase: GamePhase::Lobby }
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn phase(&self) -> &GamePhase {
        &self.phase
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn host(&self) -> Option<PlayerId> {
        self.host
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.player(id).is_some()
    }

    /// Whether a game is currently running (night or day).
    pub fn is_active(&self) -> bool {
        matches!(self.phase, GamePhase::Night | GamePhase::Day(_))
    }

    /// The wire-level view of the current phase.
    pub fn wire_phase(&self) -> (Phase, Option<DayStage>, Option<Faction>) {
        self.phase.wire()
    }

    fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    fn player_name(&self, id: PlayerId) -> String {
        self.player(id).map(|p| p.name.clone()).unwrap_or_else(|| id.to_string())
    }

    // -----------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------

    /// Adds a player. Accepted only while the room is in the lobby.
    /// The first joiner becomes host.
    pub fn join(&mut self, id: PlayerId, name: String) -> Result<Outbound, EngineError> {
        if !matches!(self.phase, GamePhase::Lobby) {
            return Err(EngineError::NotJoinable(self.id));
        }
        if self.contains(id) {
            return Err(EngineError::AlreadyInRoom(id, self.id));
        }

        self.players.push(Player::new(id, name.clone()));
        if self.host.is_none() {
            self.host = Some(id);
        }

        Ok(vec![
            (Recipient::Player(id), ServerEvent::RoomJoined { room_id: self.id }),
            (Recipient::All, ServerEvent::System { text: format!("{name} joined the room.") }),
            (Recipient::All, self.snapshot()),
        ])
    }

    /// Removes a player. If the host left, the first remaining member
    /// in join order inherits the seat; an emptied room has no host.
    pub fn leave(&mut self, id: PlayerId) -> Outbound {
        let Some(idx) = self.players.iter().position(|p| p.id == id) else {
            return Vec::new();
        };
        let departed = self.players.remove(idx);

        if self.host == Some(id) {
            self.host = self.players.first().map(|p| p.id);
        }
        if self.players.is_empty() {
            return Vec::new();
        }

        let mut out: Outbound = vec![
            (
                Recipient::All,
                ServerEvent::System { text: format!("{} left the room.", departed.name) },
            ),
            (Recipient::All, self.snapshot()),
        ];
        // A departed player's votes, and votes against them, no longer count.
        let purged = match &mut self.phase {
            GamePhase::Day(DayState::Voting(ledger)) => ledger.purge(id),
            _ => false,
        };
        if purged {
            out.push((Recipient::All, self.vote_update()));
        }
        out
    }

    // -----------------------------------------------------------------
    // Game start
    // -----------------------------------------------------------------

    /// Deals roles and announces the start. Host only, lobby only;
    /// anything else is dropped. The caller follows up with
    /// [`Room::begin_night`] and arms the night timer.
    pub fn start(&mut self, requester: PlayerId, rng: &mut impl Rng) -> Option<Outbound> {
        if !matches!(self.phase, GamePhase::Lobby) {
            debug!(room_id = %self.id, %requester, "start outside lobby, ignoring");
            return None;
        }
        if self.host != Some(requester) {
            debug!(room_id = %self.id, %requester, "start from non-host, ignoring");
            return None;
        }
        if self.players.is_empty() {
            return None;
        }

        roles::assign(&mut self.players, rng);

        let mut out: Outbound = vec![(
            Recipient::All,
            ServerEvent::System { text: "The game has begun. Roles have been dealt.".into() },
        )];
        for p in &self.players {
            if let Some(role) = p.role {
                out.push((Recipient::Player(p.id), ServerEvent::RoleAssigned { role }));
            }
        }
        Some(out)
    }

    // -----------------------------------------------------------------
    // Phase transitions (driven by the scheduler)
    // -----------------------------------------------------------------

    /// Enters the night phase. Any day state, votes included, is
    /// dropped with the old variant.
    pub fn begin_night(&mut self) -> Outbound {
        self.phase = GamePhase::Night;
        vec![
            (Recipient::All, ServerEvent::System { text: "Night falls. The town sleeps.".into() }),
            (Recipient::All, self.snapshot()),
        ]
    }

    /// Enters the day phase at the discussion stage, votes cleared.
    pub fn begin_day(&mut self) -> Outbound {
        self.phase = GamePhase::Day(DayState::Discussion);
        vec![
            (
                Recipient::All,
                ServerEvent::System { text: "The sun rises. Discussion is open.".into() },
            ),
            (Recipient::All, self.snapshot()),
        ]
    }

    /// Flips discussion into voting with a fresh, empty ledger, the
    /// only moment votes may begin. Returns `None` when the room is no
    /// longer in the day's discussion stage (a stale sub-timer).
    pub fn open_voting(&mut self) -> Option<Outbound> {
        match &self.phase {
            GamePhase::Day(DayState::Discussion) => {
                self.phase = GamePhase::Day(DayState::Voting(VoteLedger::new()));
                Some(vec![
                    (
                        Recipient::All,
                        ServerEvent::System {
                            text: "Discussion is over. Voting has opened.".into(),
                        },
                    ),
                    (Recipient::All, self.snapshot()),
                    (Recipient::All, self.vote_update()),
                ])
            }
            _ => {
                debug!(room_id = %self.id, "stale voting-stage timer, ignoring");
                None
            }
        }
    }

    // -----------------------------------------------------------------
    // Votes
    // -----------------------------------------------------------------

    /// Records a vote against a target named by display name.
    ///
    /// Dropped unless voting is open, the voter is a living member,
    /// and the target is a living member other than the voter.
    pub fn cast_vote(&mut self, voter: PlayerId, target_name: &str) -> Outbound {
        let GamePhase::Day(DayState::Voting(_)) = &self.phase else {
            debug!(room_id = %self.id, %voter, "vote outside voting stage, ignoring");
            return Vec::new();
        };
        let Some(voter_player) = self.player(voter) else {
            debug!(room_id = %self.id, %voter, "vote from non-member, ignoring");
            return Vec::new();
        };
        if !voter_player.alive {
            debug!(room_id = %self.id, %voter, "vote from dead player, ignoring");
            return Vec::new();
        }
        let Some(target) = self.players.iter().find(|p| p.name == target_name && p.alive) else {
            debug!(room_id = %self.id, %voter, target_name, "vote for unknown or dead target, ignoring");
            return Vec::new();
        };
        let target_id = target.id;
        if target_id == voter {
            debug!(room_id = %self.id, %voter, "self-vote, ignoring");
            return Vec::new();
        }

        let GamePhase::Day(DayState::Voting(ledger)) = &mut self.phase else {
            unreachable!("checked above");
        };
        ledger.cast(voter, target_id);
        vec![(Recipient::All, self.vote_update())]
    }

    /// Resolves the day's votes: applies the elimination if the tally
    /// has a single leader, narrates the outcome either way. Leaves the
    /// phase alone; the caller decides whether the game ends or the
    /// next night begins (both of which discard the ledger).
    pub fn resolve_day(&mut self) -> Outbound {
        let outcome = match &self.phase {
            GamePhase::Day(DayState::Voting(ledger)) => ledger.resolve(),
            GamePhase::Day(DayState::Discussion) => VoteOutcome::NoVotes,
            _ => return Vec::new(),
        };

        let text = match outcome {
            VoteOutcome::Eliminated(id) => {
                let name = self.player_name(id);
                if let Some(p) = self.players.iter_mut().find(|p| p.id == id) {
                    p.alive = false;
                }
                format!("{name} has been voted out.")
            }
            VoteOutcome::Tie => "The vote is tied. No one is eliminated.".into(),
            VoteOutcome::NoVotes => "No votes were cast. No one is eliminated.".into(),
        };
        vec![
            (Recipient::All, ServerEvent::System { text }),
            (Recipient::All, self.snapshot()),
        ]
    }

    // -----------------------------------------------------------------
    // Game end
    // -----------------------------------------------------------------

    /// Ends the game: records the winner and strips every player's
    /// role, since roles are only meaningful during an active game.
    /// Safe to call on an already-ended room (no-op).
    pub fn end_game(&mut self, winner: Faction) -> Outbound {
        if matches!(self.phase, GamePhase::Ended { .. }) {
            return Vec::new();
        }
        self.phase = GamePhase::Ended { winner };
        for p in &mut self.players {
            p.role = None;
        }
        vec![
            (
                Recipient::All,
                ServerEvent::System { text: format!("Game over. The {winner} win.") },
            ),
            (Recipient::All, self.snapshot()),
        ]
    }

    /// Evaluates the win condition over the current players.
    pub fn check_win(&self) -> Option<Faction> {
        win::evaluate(&self.players)
    }

    // -----------------------------------------------------------------
    // Chat
    // -----------------------------------------------------------------

    /// Relays chat from a living member; the dead stay silent.
    pub fn chat(&mut self, sender: PlayerId, text: String) -> Outbound {
        match self.player(sender) {
            Some(p) if p.alive => {
                let from = p.name.clone();
                vec![(Recipient::All, ServerEvent::Chat { from, text })]
            }
            Some(_) => {
                debug!(room_id = %self.id, %sender, "chat from dead player, ignoring");
                Vec::new()
            }
            None => {
                debug!(room_id = %self.id, %sender, "chat from non-member, ignoring");
                Vec::new()
            }
        }
    }

    // -----------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------

    /// The full room-state event broadcast after every membership or
    /// phase/stage change.
    pub fn snapshot(&self) -> ServerEvent {
        let (phase, stage, winner) = self.phase.wire();
        ServerEvent::RoomState {
            phase,
            stage,
            winner,
            members: self
                .players
                .iter()
                .map(|p| MemberInfo {
                    name: p.name.clone(),
                    host: self.host == Some(p.id),
                    alive: p.alive,
                })
                .collect(),
        }
    }

    /// The current voting picture. Tallies are sorted by count (then
    /// name) and records by voter name, so payloads are stable.
    fn vote_update(&self) -> ServerEvent {
        let GamePhase::Day(DayState::Voting(ledger)) = &self.phase else {
            return ServerEvent::VoteUpdate { tally: Vec::new(), votes: Vec::new(), total_voters: 0 };
        };

        let mut tally: Vec<VoteTally> = ledger
            .tally()
            .into_iter()
            .map(|(target, count)| VoteTally { target: self.player_name(target), count })
            .collect();
        tally.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.target.cmp(&b.target)));

        let mut votes: Vec<VoteRecord> = ledger
            .entries()
            .map(|(voter, target)| VoteRecord {
                voter: self.player_name(voter),
                target: self.player_name(target),
            })
            .collect();
        votes.sort_by(|a, b| a.voter.cmp(&b.voter));

        ServerEvent::VoteUpdate {
            tally,
            votes,
            total_voters: self.players.iter().filter(|p| p.alive).count(),
        }
    }
}
