//! Plays one scripted five-player game against the engine, printing
//! every event each player would see. No network involved; the
//! "players" are five in-process channels.

use std::time::Duration;

use nocturn_engine::{GameConfig, RoomRegistry};
use nocturn_protocol::{PlayerId, Role, ServerEvent};
use tokio::sync::mpsc;

const NAMES: [&str; 5] = ["ada", "bo", "cyn", "dev", "eli"];

type EventReceiver = mpsc::UnboundedReceiver<ServerEvent>;

fn print_feed(receivers: &mut [EventReceiver]) -> Vec<Option<Role>> {
    let mut roles = vec![None; receivers.len()];
    for (i, rx) in receivers.iter_mut().enumerate() {
        while let Ok(ev) = rx.try_recv() {
            match &ev {
                ServerEvent::System { text } => {
                    if i == 0 {
                        println!("  * {text}");
                    }
                }
                ServerEvent::RoleAssigned { role } => {
                    println!("  [{}] you are the {role}", NAMES[i]);
                    roles[i] = Some(*role);
                }
                ServerEvent::RoomState { phase, stage, winner, .. } => {
                    if i == 0 {
                        println!("  = phase {phase} stage {stage:?} winner {winner:?}");
                    }
                }
                ServerEvent::VoteUpdate { tally, .. } => {
                    if i == 0 && !tally.is_empty() {
                        println!("  ~ tally: {tally:?}");
                    }
                }
                other => {
                    if i == 0 {
                        println!("  > {other:?}");
                    }
                }
            }
        }
    }
    roles
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = GameConfig {
        night: Duration::from_secs(2),
        day: Duration::from_secs(4),
        discussion: Duration::from_secs(2),
    };
    let mut registry = RoomRegistry::new(config);

    let mut receivers = Vec::new();
    let (tx, rx) = mpsc::unbounded_channel();
    receivers.push(rx);
    let room = registry.create_room(PlayerId(1), NAMES[0].into(), tx).await?;
    for (i, name) in NAMES.iter().enumerate().skip(1) {
        let (tx, rx) = mpsc::unbounded_channel();
        receivers.push(rx);
        registry.join_room(PlayerId(i as u64 + 1), room, (*name).into(), tx).await?;
    }

    println!("-- lobby --");
    registry.send_chat(PlayerId(2), "evening, everyone".into()).await?;
    registry.start_game(PlayerId(1)).await?;
    tokio::time::sleep(Duration::from_millis(100)).await;

    println!("-- game start --");
    let roles = print_feed(&mut receivers);
    let mafia = roles
        .iter()
        .position(|r| *r == Some(Role::Mafia))
        .expect("a five-player draw deals one mafia");

    // Sleep through the night and the discussion window.
    tokio::time::sleep(Duration::from_millis(4200)).await;
    println!("-- day: voting open --");
    print_feed(&mut receivers);

    // The town has it figured out: everyone votes for the mafia.
    for i in 0..NAMES.len() {
        if i != mafia {
            registry.cast_vote(PlayerId(i as u64 + 1), NAMES[mafia].into()).await?;
        }
    }

    // Let the day run out and the votes resolve.
    tokio::time::sleep(Duration::from_millis(2200)).await;
    println!("-- resolution --");
    print_feed(&mut receivers);

    let info = registry.room_info(room).await?;
    println!("final: phase {} winner {:?}", info.phase, info.winner);
    Ok(())
}
