//! Win evaluation: decides whether a faction has won.

use nocturn_protocol::Faction;

use crate::room::Player;

/// Evaluates the win condition over the current player set.
///
/// Pure function of the alive/faction multiset: with no living mafia
/// the town wins; mafia win on reaching *parity* with the town (`>=`,
/// a deliberate balance choice: at parity the town can no longer
/// outvote them); otherwise the game continues.
///
/// Called after every day-phase vote resolution, at the end of every
/// phase duration, and after a departure during an active game.
pub fn evaluate(players: &[Player]) -> Option<Faction> {
    let mut mafia = 0usize;
    let mut town = 0usize;
    for p in players {
        let Some(role) = p.role else { continue };
        if p.alive {
            match role.faction() {
                Faction::Mafia => mafia += 1,
                Faction::Town => town += 1,
            }
        }
    }

    if mafia == 0 {
        Some(Faction::Town)
    } else if mafia >= town {
        Some(Faction::Mafia)
    } else {
        None
    }
}
