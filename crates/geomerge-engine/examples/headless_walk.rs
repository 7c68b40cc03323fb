//! Headless session -- a random walker collects and merges tokens, then saves.
//!
//! Run with:
//!   cargo run --example headless_walk -p geomerge-engine -- [SAVE_PATH] [SEED]
//!
//! The walker runs on its own thread and talks to the game only through the
//! position channel, the way a geolocation watcher would. Re-running with the
//! same save path resumes where the last run stopped.
//!
//! Set `RUST_LOG=geomerge_engine=debug` to watch every move and merge.

use std::path::PathBuf;
use std::thread;

use geomerge_engine::prelude::*;

const STEPS_PER_ROUND: usize = 8;
const ROUNDS: usize = 200;

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let save_path = args
        .next()
        .map_or_else(|| std::env::temp_dir().join("geomerge-save.json"), PathBuf::from);
    let seed: u64 = args.next().map(|s| s.parse::<u64>()).transpose()?.unwrap_or(2048);

    let config = GameConfig {
        world: WorldConfig {
            spawn_probability: 0.3,
            max_initial_power: 2,
        },
        winning_threshold: 32,
        ..Default::default()
    };
    let mut game = Game::load_or_new(config, &save_path)?;

    let (tx, rx) = position_channel();
    let walker = thread::spawn(move || -> Result<(), ChannelClosed> {
        let mut walk = RandomWalk::new(seed);
        walk.feed(&tx, STEPS_PER_ROUND * ROUNDS)
    });
    walker
        .join()
        .map_err(|_| anyhow::anyhow!("walker thread panicked"))??;

    for _ in 0..ROUNDS {
        if game.is_won() {
            break;
        }
        for command in rx.drain().take(STEPS_PER_ROUND) {
            game.apply_move(command);
        }

        // Click every visible cell in reach: pick up, merge, or put down.
        let reach = CellRect::around(game.player().position(), game.config().interaction_radius);
        for view in game.visible_cells(reach) {
            if view.in_range {
                game.interact(view.coord);
            }
        }

        for entry in game.journal().notifications() {
            println!("[{:>5}] {}", entry.seq, describe(&entry.event));
        }
        game.drain_events();
    }

    game.save_to(&save_path)?;
    println!(
        "saved {} cells to {} (won: {}, holding: {:?})",
        game.world().memento_count(),
        save_path.display(),
        game.is_won(),
        game.player().holding().map(|t| t.value()),
    );
    Ok(())
}

fn describe(event: &GameEvent) -> String {
    match event {
        GameEvent::TokensCombined { cell, value } => format!("merged into {value} at {cell}"),
        GameEvent::PickupRejected { cell, held, found } => {
            format!("cannot take {found} at {cell} while holding {held}")
        }
        GameEvent::GameWon { threshold, cells } => {
            format!("reached {threshold} at {} cell(s) -- you win!", cells.len())
        }
        GameEvent::SaveFailed { reason } => format!("save failed: {reason}"),
        GameEvent::LoadFailed { reason } => format!("previous save ignored: {reason}"),
        other => format!("{other:?}"),
    }
}
