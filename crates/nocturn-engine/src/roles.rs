//! Role draw: deals roles to a lobby's players at game start.

use nocturn_protocol::Role;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::room::Player;

/// Deals roles to the player set and marks every player alive.
///
/// Deterministic by count, random by identity: the allocation table
/// depends only on N, the shuffle decides who gets what. For N players
/// the draw yields `max(1, N / 4)` mafia, one detective iff N >= 4,
/// one doctor iff N >= 5, citizens for the rest. The allocation order
/// (mafia, then detective, then doctor, then citizen fill) is what
/// gates the special town roles behind those population thresholds.
///
/// No-op if any player already holds a role, so a game cannot be
/// re-drawn mid-flight.
pub fn assign(players: &mut [Player], rng: &mut impl Rng) {
    if players.is_empty() || players.iter().any(|p| p.role.is_some()) {
        return;
    }

    let n = players.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);

    let mafia = (n / 4).max(1);
    let mut slots = order.into_iter();
    for idx in slots.by_ref().take(mafia) {
        players[idx].role = Some(Role::Mafia);
    }
    if n >= 4 {
        if let Some(idx) = slots.next() {
            players[idx].role = Some(Role::Detective);
        }
    }
    if n >= 5 {
        if let Some(idx) = slots.next() {
            players[idx].role = Some(Role::Doctor);
        }
    }
    for idx in slots {
        players[idx].role = Some(Role::Citizen);
    }

    for p in players.iter_mut() {
        p.alive = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nocturn_protocol::PlayerId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn lobby(n: u64) -> Vec<Player> {
        (0..n).map(|i| Player::new(PlayerId(i), format!("p{i}"))).collect()
    }

    fn count(players: &[Player], role: Role) -> usize {
        players.iter().filter(|p| p.role == Some(role)).count()
    }

    #[test]
    fn test_allocation_table_for_all_small_sizes() {
        for n in 1..=12u64 {
            let mut players = lobby(n);
            let mut rng = StdRng::seed_from_u64(n);
            assign(&mut players, &mut rng);

            let mafia = (n as usize / 4).max(1);
            let detective = usize::from(n >= 4);
            let doctor = usize::from(n >= 5);

            assert_eq!(count(&players, Role::Mafia), mafia, "n={n}");
            assert_eq!(count(&players, Role::Detective), detective, "n={n}");
            assert_eq!(count(&players, Role::Doctor), doctor, "n={n}");
            assert_eq!(
                count(&players, Role::Citizen),
                n as usize - mafia - detective - doctor,
                "n={n}"
            );
            assert!(players.iter().all(|p| p.role.is_some()), "n={n}");
            assert!(players.iter().all(|p| p.alive), "n={n}");
        }
    }

    #[test]
    fn test_single_player_is_mafia() {
        let mut players = lobby(1);
        assign(&mut players, &mut StdRng::seed_from_u64(0));
        assert_eq!(players[0].role, Some(Role::Mafia));
    }

    #[test]
    fn test_redraw_is_a_noop() {
        let mut players = lobby(5);
        assign(&mut players, &mut StdRng::seed_from_u64(1));
        let before: Vec<_> = players.iter().map(|p| p.role).collect();

        assign(&mut players, &mut StdRng::seed_from_u64(99));
        let after: Vec<_> = players.iter().map(|p| p.role).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_draw_revives_players() {
        let mut players = lobby(5);
        players[2].alive = false;
        assign(&mut players, &mut StdRng::seed_from_u64(2));
        assert!(players[2].alive);
    }

    #[test]
    fn test_assignment_varies_with_rng() {
        // Same lobby, different seeds: the mafia seat should move
        // for at least one of a handful of seeds.
        let positions: Vec<usize> = (0..8)
            .map(|seed| {
                let mut players = lobby(8);
                assign(&mut players, &mut StdRng::seed_from_u64(seed));
                players.iter().position(|p| p.role == Some(Role::Mafia)).unwrap()
            })
            .collect();
        assert!(positions.iter().any(|&p| p != positions[0]));
    }
}
