//! Room actor and phase scheduler.
//!
//! Each room runs in its own Tokio task, communicating with the
//! outside world through an mpsc channel. Timer firings are not
//! separate tasks: the two phase deadlines are plain instants awaited
//! inside the same `select!` loop that processes commands, so every
//! mutation of one room (membership, votes, timer-driven
//! transitions) is serialized by construction, and a destroyed room can never be
//! touched by a dangling callback.

use std::collections::HashMap;

use nocturn_protocol::{DayStage, Faction, Phase, PlayerId, Recipient, RoomId, ServerEvent};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::room::{GamePhase, Room};
use crate::{EngineError, GameConfig};

/// Channel sender for delivering events to one player's connection.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    /// Add a player to the room.
    Join {
        player_id: PlayerId,
        name: String,
        sender: EventSender,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },

    /// Remove a player; replies with the remaining member count so the
    /// registry can destroy an emptied room.
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<usize>,
    },

    /// Host wants the game to start.
    Start { player_id: PlayerId },

    /// A vote against a target named by display name.
    Vote { player_id: PlayerId, target: String },

    /// Chat from a member.
    Chat { player_id: PlayerId, text: String },

    /// Request the current room metadata.
    Info { reply: oneshot::Sender<RoomInfo> },

    /// Shut down the room.
    Shutdown,
}

/// A snapshot of room metadata (not the full member list).
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub phase: Phase,
    pub stage: Option<DayStage>,
    pub winner: Option<Faction>,
    pub member_count: usize,
    pub host: Option<PlayerId>,
}

/// Handle to a running room actor. Cheap to clone; it is just an
/// `mpsc::Sender` wrapper. The registry holds one per room.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Sends a join request and waits for the room's verdict.
    pub async fn join(
        &self,
        player_id: PlayerId,
        name: String,
        sender: EventSender,
    ) -> Result<(), EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join { player_id, name, sender, reply: reply_tx })
            .await
            .map_err(|_| EngineError::Unavailable(self.room_id))?;
        reply_rx.await.map_err(|_| EngineError::Unavailable(self.room_id))?
    }

    /// Sends a leave request; resolves to the remaining member count.
    pub async fn leave(&self, player_id: PlayerId) -> Result<usize, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave { player_id, reply: reply_tx })
            .await
            .map_err(|_| EngineError::Unavailable(self.room_id))?;
        reply_rx.await.map_err(|_| EngineError::Unavailable(self.room_id))
    }

    /// Asks the room to start the game (fire-and-forget; non-host or
    /// out-of-lobby requests are dropped inside the actor).
    pub async fn start(&self, player_id: PlayerId) -> Result<(), EngineError> {
        self.sender
            .send(RoomCommand::Start { player_id })
            .await
            .map_err(|_| EngineError::Unavailable(self.room_id))
    }

    /// Delivers a vote (fire-and-forget).
    pub async fn vote(&self, player_id: PlayerId, target: String) -> Result<(), EngineError> {
        self.sender
            .send(RoomCommand::Vote { player_id, target })
            .await
            .map_err(|_| EngineError::Unavailable(self.room_id))
    }

    /// Delivers a chat line (fire-and-forget).
    pub async fn chat(&self, player_id: PlayerId, text: String) -> Result<(), EngineError> {
        self.sender
            .send(RoomCommand::Chat { player_id, text })
            .await
            .map_err(|_| EngineError::Unavailable(self.room_id))
    }

    /// Requests the current room metadata.
    pub async fn info(&self) -> Result<RoomInfo, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Info { reply: reply_tx })
            .await
            .map_err(|_| EngineError::Unavailable(self.room_id))?;
        reply_rx.await.map_err(|_| EngineError::Unavailable(self.room_id))
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| EngineError::Unavailable(self.room_id))
    }
}

// ---------------------------------------------------------------------------
// Phase timers
// ---------------------------------------------------------------------------

/// Which deadline fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fired {
    /// The full phase duration elapsed.
    Phase,
    /// The day's discussion window elapsed.
    Stage,
}

/// The room's two independent cancellable deadlines.
///
/// Arming a phase cancels whatever was pending first, so at most one
/// timer pair is ever outstanding per room. Cancelling clears the
/// instant; cancelling an unarmed timer is a no-op.
#[derive(Debug, Default)]
struct PhaseTimers {
    phase: Option<Instant>,
    stage: Option<Instant>,
}

impl PhaseTimers {
    /// Arms the night deadline, cancelling anything pending.
    fn arm_night(&mut self, config: &GameConfig) {
        self.cancel();
        self.phase = Some(Instant::now() + config.night);
    }

    /// Arms the day pair: the full-day deadline and the
    /// discussion-window sub-deadline, cancelling anything pending.
    fn arm_day(&mut self, config: &GameConfig) {
        self.cancel();
        let now = Instant::now();
        self.phase = Some(now + config.day);
        self.stage = Some(now + config.discussion);
    }

    /// Cancels both deadlines. Idempotent.
    fn cancel(&mut self) {
        self.phase = None;
        self.stage = None;
    }

    /// Waits for the earliest armed deadline and clears it.
    ///
    /// Pends forever while nothing is armed (lobby, ended), which is
    /// exactly what a `select!` branch should do in that case. If the
    /// branch loses the race against a command, nothing is cleared and
    /// the next loop iteration re-awaits the same deadline.
    async fn fired(&mut self) -> Fired {
        let next = match (self.stage, self.phase) {
            (None, None) => None,
            (Some(s), None) => Some((s, Fired::Stage)),
            (None, Some(p)) => Some((p, Fired::Phase)),
            (Some(s), Some(p)) => {
                // The stage sub-deadline always precedes its day
                // deadline, but min() keeps this honest.
                Some(if s <= p { (s, Fired::Stage) } else { (p, Fired::Phase) })
            }
        };

        match next {
            None => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            Some((when, which)) => {
                tokio::time::sleep_until(when).await;
                match which {
                    Fired::Stage => self.stage = None,
                    Fired::Phase => self.phase = None,
                }
                which
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Room actor
// ---------------------------------------------------------------------------

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room: Room,
    config: GameConfig,
    timers: PhaseTimers,
    /// Per-player outbound channels.
    senders: HashMap<PlayerId, EventSender>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop, processing commands and timer firings as
    /// one serialized stream until shutdown.
    async fn run(mut self) {
        info!(room_id = %self.room.id(), "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => {
                        if self.handle_command(cmd) {
                            break;
                        }
                    }
                    None => break,
                },
                fired = self.timers.fired() => self.handle_deadline(fired),
            }
        }

        info!(room_id = %self.room.id(), "room actor stopped");
    }

    /// Returns `true` when the actor should shut down.
    fn handle_command(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join { player_id, name, sender, reply } => {
                match self.room.join(player_id, name) {
                    Ok(events) => {
                        self.senders.insert(player_id, sender);
                        self.dispatch(events);
                        info!(
                            room_id = %self.room.id(),
                            %player_id,
                            members = self.room.len(),
                            "player joined"
                        );
                        let _ = reply.send(Ok(()));
                    }
                    Err(err) => {
                        let _ = reply.send(Err(err));
                    }
                }
            }
            RoomCommand::Leave { player_id, reply } => {
                let events = self.room.leave(player_id);
                self.senders.remove(&player_id);
                self.dispatch(events);
                info!(
                    room_id = %self.room.id(),
                    %player_id,
                    members = self.room.len(),
                    "player left"
                );

                // A departure can decide the game on the spot.
                if self.room.is_active() && !self.room.is_empty() {
                    if let Some(winner) = self.room.check_win() {
                        self.finish(winner);
                    }
                }
                let _ = reply.send(self.room.len());
            }
            RoomCommand::Start { player_id } => {
                let mut rng = rand::rng();
                if let Some(mut events) = self.room.start(player_id, &mut rng) {
                    events.extend(self.room.begin_night());
                    self.timers.arm_night(&self.config);
                    self.dispatch(events);
                    info!(
                        room_id = %self.room.id(),
                        players = self.room.len(),
                        "game started"
                    );
                }
            }
            RoomCommand::Vote { player_id, target } => {
                let events = self.room.cast_vote(player_id, &target);
                self.dispatch(events);
            }
            RoomCommand::Chat { player_id, text } => {
                let events = self.room.chat(player_id, text);
                self.dispatch(events);
            }
            RoomCommand::Info { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Shutdown => {
                self.timers.cancel();
                info!(room_id = %self.room.id(), "room shutting down");
                return true;
            }
        }
        false
    }

    /// Advances the state machine when a deadline fires.
    ///
    /// Each phase entry arms a fresh deadline rather than chaining
    /// futures, and every arm re-checks the room's actual phase; a
    /// deadline that outlived its phase (early end, departure-decided
    /// win) is dropped here.
    fn handle_deadline(&mut self, fired: Fired) {
        match fired {
            Fired::Stage => {
                if let Some(events) = self.room.open_voting() {
                    self.dispatch(events);
                }
            }
            Fired::Phase => match self.room.phase() {
                GamePhase::Night => {
                    if let Some(winner) = self.room.check_win() {
                        self.finish(winner);
                    } else {
                        let events = self.room.begin_day();
                        self.timers.arm_day(&self.config);
                        self.dispatch(events);
                    }
                }
                GamePhase::Day(_) => {
                    // Fixed ordering: resolve votes, apply the
                    // elimination, then check the win condition.
                    // Checking first would miss deaths from this tick.
                    let events = self.room.resolve_day();
                    self.dispatch(events);

                    if let Some(winner) = self.room.check_win() {
                        self.finish(winner);
                    } else {
                        let events = self.room.begin_night();
                        self.timers.arm_night(&self.config);
                        self.dispatch(events);
                    }
                }
                GamePhase::Lobby | GamePhase::Ended { .. } => {
                    debug!(room_id = %self.room.id(), "stale phase timer, ignoring");
                }
            },
        }
    }

    /// Ends the game: timers first, so nothing can fire mid-teardown.
    fn finish(&mut self, winner: Faction) {
        self.timers.cancel();
        let events = self.room.end_game(winner);
        if !events.is_empty() {
            info!(room_id = %self.room.id(), %winner, "game over");
        }
        self.dispatch(events);
    }

    /// Dispatches outbound events to the correct recipients.
    fn dispatch(&self, events: Vec<(Recipient, ServerEvent)>) {
        for (recipient, event) in events {
            match recipient {
                Recipient::All => {
                    for sender in self.senders.values() {
                        let _ = sender.send(event.clone());
                    }
                }
                Recipient::Player(pid) => {
                    self.send_to(pid, event);
                }
                Recipient::AllExcept(excluded) => {
                    for (pid, sender) in &self.senders {
                        if *pid != excluded {
                            let _ = sender.send(event.clone());
                        }
                    }
                }
            }
        }
    }

    /// Sends an event to a single player. Silently drops if the
    /// receiver is gone (player disconnected).
    fn send_to(&self, player_id: PlayerId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&player_id) {
            let _ = sender.send(event);
        }
    }

    fn info(&self) -> RoomInfo {
        let (phase, stage, winner) = self.room.wire_phase();
        RoomInfo {
            room_id: self.room.id(),
            phase,
            stage,
            winner,
            member_count: self.room.len(),
            host: self.room.host(),
        }
    }
}

/// Spawns a new room actor task and returns a handle to it.
///
/// `channel_size` controls backpressure on the command channel.
pub(crate) fn spawn_room(room_id: RoomId, config: GameConfig, channel_size: usize) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor {
        room: Room::new(room_id),
        config: config.validated(),
        timers: PhaseTimers::default(),
        senders: HashMap::new(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { room_id, sender: tx }
}
