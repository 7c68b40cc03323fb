//! The game coordinator.
//!
//! [`Game`] ties one [`World`], one [`Player`], and the session configuration
//! together. Front ends drive it with three kinds of input:
//!
//! - position updates ([`Game::apply_move`] / [`Game::process_moves`]),
//! - clicks on cells ([`Game::interact`]),
//! - viewport requests ([`Game::visible_cells`]).
//!
//! Every state change is recorded in the [`EventJournal`].
//!
//! # Click resolution
//!
//! [`Game::interact`] resolves a click in this order:
//!
//! | condition                               | outcome                     |
//! |-----------------------------------------|-----------------------------|
//! | game already won                        | [`Interaction::Locked`]     |
//! | cell outside interaction radius         | [`Interaction::OutOfRange`] |
//! | first look spawns a winning token       | [`Interaction::Locked`]     |
//! | cell has token, hand empty              | [`Interaction::PickedUp`]   |
//! | cell token equals held token            | [`Interaction::Combined`]   |
//! | cell token differs, policy `Swap`       | [`Interaction::Swapped`]    |
//! | cell token differs, policy `Reject`     | [`Interaction::Rejected`]   |
//! | cell empty, hand full                   | [`Interaction::Placed`]     |
//! | cell empty, hand empty                  | [`Interaction::Nothing`]    |
//!
//! Whenever a cell is decided or changed (by a click or by
//! [`Game::visible_cells`]), decided cells are checked against the winning
//! threshold. The first success locks the game, so the won flag always
//! agrees with [`World::has_winning_token`].

use std::path::Path;
use std::sync::Arc;

use geomerge_world::coord::GridCoord;
use geomerge_world::token::TokenRef;
use geomerge_world::world::World;

use crate::config::{GameConfig, PickupPolicy};
use crate::journal::{EventJournal, GameEvent, JournalEntry};
use crate::movement::{MoveCommand, PositionReceiver};
use crate::player::Player;
use crate::projection::{CellRect, GridProjection};
use crate::save::{PlayerRecord, SaveError, SaveGame};
use crate::GameError;

// ---------------------------------------------------------------------------
// Interaction / CellView
// ---------------------------------------------------------------------------

/// Result of clicking a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    /// The game is won; the world no longer changes.
    Locked,
    /// The cell is too far from the player.
    OutOfRange { cell: GridCoord },
    /// The cell's token moved into the empty hand.
    PickedUp { cell: GridCoord, token: TokenRef },
    /// The held token merged with an equal cell token. `value` is the new
    /// cell value and the hand is now empty.
    Combined {
        cell: GridCoord,
        value: u64,
        token: TokenRef,
    },
    /// The held token went onto the cell and the cell's token into the hand.
    Swapped {
        cell: GridCoord,
        picked_up: TokenRef,
        dropped: TokenRef,
    },
    /// The cell's token differs from the held one and swapping is disabled.
    Rejected {
        cell: GridCoord,
        held: TokenRef,
        found: TokenRef,
    },
    /// The held token was put down on an empty cell.
    Placed { cell: GridCoord, token: TokenRef },
    /// Empty cell, empty hand.
    Nothing { cell: GridCoord },
}

impl Interaction {
    /// `true` if the outcome changed the world or the hand.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Interaction::PickedUp { .. }
                | Interaction::Combined { .. }
                | Interaction::Swapped { .. }
                | Interaction::Placed { .. }
        )
    }
}

/// What a renderer needs to draw one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellView {
    pub coord: GridCoord,
    pub token: Option<TokenRef>,
    /// `true` if the player can currently interact with the cell.
    pub in_range: bool,
}

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

/// One game session.
#[derive(Debug)]
pub struct Game {
    config: GameConfig,
    projection: GridProjection,
    world: World,
    player: Player,
    won: bool,
    journal: EventJournal,
}

impl Game {
    /// Start a fresh session with the player at cell `(0, 0)`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Config`] if `config` does not validate.
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        config.validate()?;
        let world = World::new(config.world)?;
        Ok(Self::assemble(config, world, Player::default()))
    }

    /// Resume a session from a save.
    ///
    /// The save is verified in full before anything is built. The won flag
    /// is recomputed from the restored cells.
    ///
    /// # Errors
    ///
    /// [`GameError::Config`] for an invalid config, [`GameError::Save`] for a
    /// save that fails verification or holds malformed mementos.
    pub fn from_save(config: GameConfig, save: &SaveGame) -> Result<Self, GameError> {
        config.validate()?;
        save.verify()?;

        let mut world =
            World::from_mementos(config.world, &save.mementos).map_err(SaveError::from)?;
        let mut player = Player::new(save.player.position());
        if let Some(value) = save.player.inventory {
            player.pick_up_token(world.token_for(value));
        }

        let game = Self::assemble(config, world, player);
        tracing::info!(
            mementos = game.world.memento_count(),
            cell = %game.player.position(),
            won = game.won,
            "restored game from save"
        );
        Ok(game)
    }

    /// Resume from `path`, or start fresh if that is not possible.
    ///
    /// A missing file starts a fresh game quietly. Any other failure (bad
    /// JSON, hash mismatch, malformed mementos) also starts a fresh game but
    /// records [`GameEvent::LoadFailed`] so the player can be told.
    ///
    /// # Errors
    ///
    /// Only an invalid `config` is an error.
    pub fn load_or_new(config: GameConfig, path: impl AsRef<Path>) -> Result<Self, GameError> {
        let path = path.as_ref();
        config.validate()?;

        let loaded = SaveGame::read_from(path)
            .map_err(GameError::from)
            .and_then(|save| Self::from_save(config.clone(), &save));
        match loaded {
            Ok(game) => Ok(game),
            Err(GameError::Save(err)) if err.is_not_found() => {
                tracing::debug!(path = %path.display(), "no save file, starting fresh");
                Self::new(config)
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to load save, starting fresh");
                let mut game = Self::new(config)?;
                game.journal.record(GameEvent::LoadFailed {
                    reason: err.to_string(),
                });
                Ok(game)
            }
        }
    }

    fn assemble(config: GameConfig, world: World, player: Player) -> Self {
        let won = world.has_winning_token(config.winning_threshold);
        Self {
            projection: config.projection(),
            config,
            world,
            player,
            won,
            journal: EventJournal::new(),
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn projection(&self) -> &GridProjection {
        &self.projection
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }

    /// `true` once any decided cell has reached the winning threshold.
    pub fn is_won(&self) -> bool {
        self.won
    }

    /// Remove and return every pending journal entry.
    pub fn drain_events(&mut self) -> Vec<JournalEntry> {
        self.journal.drain()
    }

    // -- movement -----------------------------------------------------------

    /// Apply one position update and return the player's new cell.
    ///
    /// Moving is allowed after the game is won.
    pub fn apply_move(&mut self, command: MoveCommand) -> GridCoord {
        let from = self.player.position();
        let to = command.resolve(from, &self.projection);
        if to != from {
            self.player.set_position(to);
            tracing::debug!(from = %from, to = %to, "player moved");
            self.journal.record(GameEvent::PlayerMoved { from, to });
        }
        to
    }

    /// Apply every queued update in arrival order and return how many were
    /// applied. The last one determines where the player ends up.
    pub fn process_moves(&mut self, receiver: &PositionReceiver) -> usize {
        let mut applied = 0;
        for command in receiver.drain() {
            self.apply_move(command);
            applied += 1;
        }
        applied
    }

    // -- interaction --------------------------------------------------------

    /// Handle a click on `cell`.
    pub fn interact(&mut self, cell: GridCoord) -> Interaction {
        if self.won {
            return Interaction::Locked;
        }
        if !self.player.is_in_range(
            cell,
            self.config.interaction_radius,
            self.config.distance_metric,
        ) {
            tracing::trace!(cell = %cell, player = %self.player.position(), "click out of range");
            return Interaction::OutOfRange { cell };
        }

        // A first look can spawn a token already at the threshold.
        let found = self.world.query_or_spawn(cell);
        self.check_win();
        if self.won {
            return Interaction::Locked;
        }

        let held = self.player.holding().cloned();
        let outcome = match (found, held) {
            (Some(token), None) => self.pick_up(cell, token),
            (Some(token), Some(held)) if token.can_combine_with(&held) => {
                self.combine(cell, &held)
            }
            (Some(found), Some(held)) => match self.config.pickup_policy {
                PickupPolicy::Swap => self.swap(cell, found, held),
                PickupPolicy::Reject => {
                    self.journal.record(GameEvent::PickupRejected {
                        cell,
                        held: held.value(),
                        found: found.value(),
                    });
                    Interaction::Rejected { cell, held, found }
                }
            },
            (None, Some(_)) => self.put_down(cell),
            (None, None) => Interaction::Nothing { cell },
        };

        if outcome.is_mutation() {
            self.check_win();
        }
        outcome
    }

    fn pick_up(&mut self, cell: GridCoord, token: TokenRef) -> Interaction {
        self.world.remove(cell);
        self.player.pick_up_token(Arc::clone(&token));
        self.journal.record(GameEvent::TokenPickedUp {
            cell,
            value: token.value(),
        });
        Interaction::PickedUp { cell, token }
    }

    fn combine(&mut self, cell: GridCoord, held: &TokenRef) -> Interaction {
        let merged = held.combine();
        self.world.place(cell, &merged);
        self.player.place_token();
        let value = merged.value();
        tracing::debug!(cell = %cell, value, "tokens combined");
        self.journal
            .record(GameEvent::TokensCombined { cell, value });
        Interaction::Combined {
            cell,
            value,
            token: self.world.token_for(value),
        }
    }

    fn swap(&mut self, cell: GridCoord, found: TokenRef, held: TokenRef) -> Interaction {
        self.world.place(cell, &held);
        self.player.pick_up_token(Arc::clone(&found));
        self.journal.record(GameEvent::TokensSwapped {
            cell,
            picked_up: found.value(),
            dropped: held.value(),
        });
        Interaction::Swapped {
            cell,
            picked_up: found,
            dropped: held,
        }
    }

    fn put_down(&mut self, cell: GridCoord) -> Interaction {
        match self.player.place_token() {
            Some(token) => {
                self.world.place(cell, &token);
                self.journal.record(GameEvent::TokenPlaced {
                    cell,
                    value: token.value(),
                });
                Interaction::Placed { cell, token }
            }
            None => Interaction::Nothing { cell },
        }
    }

    fn check_win(&mut self) {
        let threshold = self.config.winning_threshold;
        if self.won || !self.world.has_winning_token(threshold) {
            return;
        }
        self.won = true;
        let cells = self.world.winning_cells(threshold);
        tracing::info!(threshold, cells = cells.len(), "game won");
        self.journal.record(GameEvent::GameWon { threshold, cells });
    }

    // -- viewport -----------------------------------------------------------

    /// The rectangle of `viewport_radius` cells around the player.
    pub fn viewport(&self) -> CellRect {
        CellRect::around(self.player.position(), self.config.viewport_radius)
    }

    /// Every cell in `rect`, row-major, with its token and range flag.
    ///
    /// Cells seen for the first time are decided and recorded, so what a
    /// renderer shows once it shows forever. A freshly decided cell that
    /// meets the winning threshold wins the game.
    pub fn visible_cells(&mut self, rect: CellRect) -> Vec<CellView> {
        let radius = self.config.interaction_radius;
        let metric = self.config.distance_metric;
        let cells = rect
            .iter()
            .map(|coord| CellView {
                coord,
                token: self.world.query_or_spawn(coord),
                in_range: self.player.is_in_range(coord, radius, metric),
            })
            .collect();
        self.check_win();
        cells
    }

    // -- persistence --------------------------------------------------------

    /// Snapshot the session into a [`SaveGame`].
    pub fn capture_save(&self) -> SaveGame {
        let position = self.player.position();
        SaveGame::new(
            PlayerRecord {
                row: position.row,
                col: position.col,
                inventory: self.player.holding().map(|token| token.value()),
            },
            self.world.export_mementos(),
        )
    }

    /// Write the session to `path`.
    ///
    /// Success records [`GameEvent::GameSaved`]; failure records
    /// [`GameEvent::SaveFailed`] and returns the error. The game keeps
    /// running either way.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::Io`] if the file cannot be written.
    pub fn save_to(&mut self, path: impl AsRef<Path>) -> Result<(), SaveError> {
        let path = path.as_ref();
        let save = self.capture_save();
        match save.write_to(path) {
            Ok(()) => {
                let mementos = save.mementos.len();
                tracing::info!(path = %path.display(), mementos, "game saved");
                self.journal.record(GameEvent::GameSaved { mementos });
                Ok(())
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to save game");
                self.journal.record(GameEvent::SaveFailed {
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use geomerge_world::world::{CellState, WorldConfig};

    use super::*;
    use crate::movement::{position_channel, Direction};

    fn ones(threshold: u64) -> GameConfig {
        GameConfig {
            world: WorldConfig {
                spawn_probability: 1.0,
                max_initial_power: 1,
            },
            winning_threshold: threshold,
            ..Default::default()
        }
    }

    fn barren() -> GameConfig {
        GameConfig {
            world: WorldConfig {
                spawn_probability: 0.0,
                max_initial_power: 1,
            },
            ..Default::default()
        }
    }

    #[test]
    fn out_of_range_click_does_not_decide_cell() {
        let mut game = Game::new(ones(16)).unwrap();
        let far = GridCoord::new(0, 4);
        assert_eq!(game.interact(far), Interaction::OutOfRange { cell: far });
        assert_eq!(game.world().cell_state(far), CellState::Undecided);
        assert!(game.journal().is_empty());
    }

    #[test]
    fn pick_up_empties_the_cell() {
        let mut game = Game::new(ones(16)).unwrap();
        let cell = GridCoord::new(1, 1);
        assert!(matches!(game.interact(cell), Interaction::PickedUp { .. }));
        assert_eq!(game.world().cell_state(cell), CellState::Empty);
        assert_eq!(game.player().holding().map(|t| t.value()), Some(1));
    }

    #[test]
    fn empty_cell_and_hand_is_nothing() {
        let mut game = Game::new(barren()).unwrap();
        let cell = GridCoord::new(0, 0);
        assert_eq!(game.interact(cell), Interaction::Nothing { cell });
        assert_eq!(game.world().cell_state(cell), CellState::Empty);
    }

    #[test]
    fn put_down_on_empty_cell() {
        let mut game = Game::new(ones(16)).unwrap();
        game.interact(GridCoord::new(0, 0));
        let target = GridCoord::new(0, 0);
        assert!(matches!(
            game.interact(target),
            Interaction::Placed { token, .. } if token.value() == 1
        ));
        assert_eq!(game.world().cell_state(target), CellState::Spawned(1));
        assert!(game.player().holding().is_none());
    }

    #[test]
    fn combined_token_is_the_cached_instance() {
        let mut game = Game::new(ones(16)).unwrap();
        game.interact(GridCoord::new(0, 0));
        let Interaction::Combined { token, .. } = game.interact(GridCoord::new(0, 1)) else {
            panic!("expected a combine");
        };
        let again = game.world.query_or_spawn(GridCoord::new(0, 1)).unwrap();
        assert!(Arc::ptr_eq(&token, &again));
    }

    #[test]
    fn moves_are_applied_in_order() {
        let mut game = Game::new(barren()).unwrap();
        let (tx, rx) = position_channel();
        tx.send(Direction::North.into()).unwrap();
        tx.send(Direction::North.into()).unwrap();
        tx.send(Direction::West.into()).unwrap();
        assert_eq!(game.process_moves(&rx), 3);
        assert_eq!(game.player().position(), GridCoord::new(2, -1));
        assert_eq!(
            game.journal()
                .count_matching(|e| matches!(e, GameEvent::PlayerMoved { .. })),
            3
        );
    }

    #[test]
    fn teleport_to_same_cell_records_nothing() {
        let mut game = Game::new(barren()).unwrap();
        game.apply_move(MoveCommand::Teleport {
            cell: GridCoord::new(0, 0),
        });
        assert!(game.journal().is_empty());
    }

    #[test]
    fn viewport_is_centred_on_player() {
        let mut game = Game::new(GameConfig {
            viewport_radius: 2,
            ..ones(16)
        })
        .unwrap();
        game.apply_move(MoveCommand::Teleport {
            cell: GridCoord::new(10, 10),
        });
        let rect = game.viewport();
        let cells = game.visible_cells(rect);
        assert_eq!(cells.len(), 25);
        assert_eq!(cells[0].coord, GridCoord::new(8, 8));
        assert!(cells.iter().all(|c| c.in_range));
        assert!(cells.iter().all(|c| c.token.is_some()));
        assert_eq!(game.world().memento_count(), 25);
    }

    #[test]
    fn restored_game_recomputes_won_flag() {
        let mut game = Game::new(ones(2)).unwrap();
        game.interact(GridCoord::new(0, 0));
        game.interact(GridCoord::new(0, 1));
        assert!(game.is_won());

        let restored = Game::from_save(ones(2), &game.capture_save()).unwrap();
        assert!(restored.is_won());
        let relaxed = Game::from_save(ones(4), &game.capture_save()).unwrap();
        assert!(!relaxed.is_won());
    }

    #[test]
    fn winning_spawn_on_click_locks_game() {
        let mut game = Game::new(ones(1)).unwrap();
        let cell = GridCoord::new(0, 0);
        assert_eq!(game.interact(cell), Interaction::Locked);
        assert!(game.is_won());
        assert_eq!(game.world().cell_state(cell), CellState::Spawned(1));
        assert!(game.player().holding().is_none());
        assert_eq!(
            game.journal()
                .count_matching(|e| matches!(e, GameEvent::GameWon { .. })),
            1
        );
    }

    #[test]
    fn winning_spawn_in_view_locks_game() {
        let mut game = Game::new(ones(1)).unwrap();
        game.visible_cells(CellRect::around(GridCoord::new(20, 20), 0));
        assert!(game.is_won());
        assert_eq!(game.interact(GridCoord::new(0, 0)), Interaction::Locked);
        assert_eq!(game.world().cell_state(GridCoord::new(0, 0)), CellState::Undecided);
    }
}
