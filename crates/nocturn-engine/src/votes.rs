//! The per-round vote ledger: who wants whom eliminated.

use std::collections::HashMap;

use nocturn_protocol::PlayerId;

/// Result of resolving a round of votes.
///
/// "No votes" and "tie" are distinct in narration but identical in
/// effect: nobody is eliminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The target with the single highest tally.
    Eliminated(PlayerId),
    /// The top two tallies are exactly equal; no elimination.
    Tie,
    /// Nobody voted.
    NoVotes,
}

/// Records each voter's current choice for one voting round.
///
/// At most one entry per voter; a later vote overwrites the earlier
/// one. The ledger does no eligibility checking; alive/phase/target
/// validation is the caller's job before anything lands here.
#[derive(Debug, Default)]
pub struct VoteLedger {
    choices: HashMap<PlayerId, PlayerId>,
}

impl VoteLedger {
    /// An empty ledger, opened when the voting stage begins.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records (or overwrites) a voter's choice.
    pub fn cast(&mut self, voter: PlayerId, target: PlayerId) {
        self.choices.insert(voter, target);
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    /// Number of voters with a recorded choice.
    pub fn len(&self) -> usize {
        self.choices.len()
    }

    /// Drops every entry cast by or against the given player.
    /// Returns `true` if anything was removed.
    pub fn purge(&mut self, id: PlayerId) -> bool {
        let before = self.choices.len();
        self.choices.retain(|voter, target| *voter != id && *target != id);
        before != self.choices.len()
    }

    /// All recorded (voter, target) pairs, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = (PlayerId, PlayerId)> + '_ {
        self.choices.iter().map(|(v, t)| (*v, *t))
    }

    /// Vote counts per target, in no particular order.
    pub fn tally(&self) -> HashMap<PlayerId, usize> {
        let mut counts = HashMap::new();
        for target in self.choices.values() {
            *counts.entry(*target).or_insert(0usize) += 1;
        }
        counts
    }

    /// Resolves the round: a pure read, the ledger is unchanged.
    ///
    /// The caller applies the elimination (if any) and then clears the
    /// ledger by closing the voting stage.
    pub fn resolve(&self) -> VoteOutcome {
        let counts = self.tally();
        let Some((&leader, &top)) = counts.iter().max_by_key(|(_, count)| **count) else {
            return VoteOutcome::NoVotes;
        };
        let contenders = counts.values().filter(|&&c| c == top).count();
        if contenders > 1 {
            VoteOutcome::Tie
        } else {
            VoteOutcome::Eliminated(leader)
        }
    }
}
