//! The [`World`] is the memento store at the heart of geomerge. It owns the
//! flyweight [`TokenCache`], the map of decided cells, and the hasher that
//! decides cells nobody has looked at yet.
//!
//! Every coordinate is conceptually in one of three states (see
//! [`CellState`]):
//!
//! ```text
//!   Undecided --first query--> Spawned(v) | Empty
//!   Spawned(v) --remove--> Empty
//!   Spawned(v) --place--> Spawned(w)
//!   Empty --place--> Spawned(w)
//! ```
//!
//! The first transition happens at most once per coordinate for the lifetime
//! of the store. After that the memento is authoritative and the generator is
//! never consulted again for that coordinate.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::coord::GridCoord;
use crate::hash::{Blake3Hasher, SpawnHasher};
use crate::snapshot::MementoRecord;
use crate::token::{Token, TokenCache, TokenRef};
use crate::WorldError;

// ---------------------------------------------------------------------------
// WorldConfig
// ---------------------------------------------------------------------------

/// Parameters of the procedural generator.
///
/// Decisions for an undecided cell are a pure function of its key and these
/// two values, so two worlds with equal configs agree on every cell neither
/// of them has mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Probability in `[0, 1]` that an undecided cell holds a token.
    pub spawn_probability: f64,
    /// Spawned tokens take values in `1..=max_initial_power`. Must be `>= 1`.
    pub max_initial_power: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            spawn_probability: 0.1,
            max_initial_power: 2,
        }
    }
}

impl WorldConfig {
    /// Check that every parameter is in range.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidConfig`] if the probability is not a
    /// finite number in `[0, 1]` or the maximum power is zero.
    pub fn validate(&self) -> Result<(), WorldError> {
        if !(0.0..=1.0).contains(&self.spawn_probability) {
            return Err(WorldError::InvalidConfig {
                reason: format!(
                    "spawn_probability must be within [0, 1], got {}",
                    self.spawn_probability
                ),
            });
        }
        if self.max_initial_power == 0 {
            return Err(WorldError::InvalidConfig {
                reason: "max_initial_power must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Memento / CellState
// ---------------------------------------------------------------------------

/// The durable record of a decided cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Memento {
    /// The cell holds no token.
    Empty,
    /// The cell holds a token with this value.
    Spawned(u64),
}

impl Memento {
    /// The stored token value, if any.
    #[inline]
    pub fn token_value(self) -> Option<u64> {
        match self {
            Memento::Empty => None,
            Memento::Spawned(value) => Some(value),
        }
    }

    /// Inverse of [`token_value`](Self::token_value).
    #[inline]
    pub fn from_token_value(value: Option<u64>) -> Self {
        value.map_or(Memento::Empty, Memento::Spawned)
    }
}

/// Observable state of one coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    /// No memento exists; the generator will decide on first query.
    Undecided,
    /// Decided, no token.
    Empty,
    /// Decided, holds a token with this value.
    Spawned(u64),
}

impl From<Memento> for CellState {
    fn from(memento: Memento) -> Self {
        match memento {
            Memento::Empty => CellState::Empty,
            Memento::Spawned(value) => CellState::Spawned(value),
        }
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Sparse, deterministic, memento-backed token grid.
///
/// Memory grows only with the number of cells that have been queried or
/// mutated. Each instance owns its own cache; worlds never share tokens.
#[derive(Debug)]
pub struct World<H = Blake3Hasher> {
    config: WorldConfig,
    hasher: H,
    cache: TokenCache,
    mementos: HashMap<GridCoord, Memento>,
}

impl World<Blake3Hasher> {
    /// Create an empty world using the default BLAKE3 generator.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidConfig`] if `config` does not validate.
    pub fn new(config: WorldConfig) -> Result<Self, WorldError> {
        Self::with_hasher(config, Blake3Hasher)
    }

    /// Create a world and populate it from persisted mementos.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration or on any malformed record (see
    /// [`import_mementos`](World::import_mementos)).
    pub fn from_mementos(
        config: WorldConfig,
        records: &[MementoRecord],
    ) -> Result<Self, WorldError> {
        let mut world = Self::new(config)?;
        world.import_mementos(records)?;
        Ok(world)
    }
}

impl<H: SpawnHasher> World<H> {
    /// Create an empty world that decides cells with `hasher`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidConfig`] if `config` does not validate.
    pub fn with_hasher(config: WorldConfig, hasher: H) -> Result<Self, WorldError> {
        config.validate()?;
        Ok(Self {
            config,
            hasher,
            cache: TokenCache::new(),
            mementos: HashMap::new(),
        })
    }

    /// The generator configuration.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// The hasher used for undecided cells.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// The flyweight cache owned by this world.
    pub fn token_cache(&self) -> &TokenCache {
        &self.cache
    }

    /// The shared token for `value`, from this world's cache.
    ///
    /// Callers that rebuild state held outside the world (a player's hand
    /// after loading a save) use this so their token is the same instance
    /// the world hands out.
    pub fn token_for(&mut self, value: u64) -> TokenRef {
        self.cache.get_or_create(value)
    }

    /// Number of decided cells.
    pub fn memento_count(&self) -> usize {
        self.mementos.len()
    }

    /// Peek at a coordinate without deciding it.
    pub fn cell_state(&self, coord: GridCoord) -> CellState {
        self.mementos
            .get(&coord)
            .map_or(CellState::Undecided, |&memento| memento.into())
    }

    /// Return the token at `coord`, deciding the cell first if needed.
    ///
    /// For an undecided cell the generator computes
    /// `roll = hash("{key},token")`; if `roll < spawn_probability` the cell
    /// spawns a token of value `floor(hash("{key},value") * max_initial_power) + 1`,
    /// otherwise it is empty. Either outcome is recorded as a memento.
    pub fn query_or_spawn(&mut self, coord: GridCoord) -> Option<TokenRef> {
        let memento = match self.mementos.get(&coord) {
            Some(&memento) => memento,
            None => {
                let decided = self.decide(coord);
                self.mementos.insert(coord, decided);
                decided
            }
        };
        self.materialize(memento)
    }

    /// Overwrite `coord` with `token`, whatever it held before.
    pub fn place(&mut self, coord: GridCoord, token: &Token) {
        tracing::debug!(cell = %coord, value = token.value(), "place token");
        self.mementos.insert(coord, Memento::Spawned(token.value()));
    }

    /// Take the token at `coord` (if any) and leave the cell empty.
    ///
    /// An undecided cell is decided first, so removing from a cell that
    /// would have spawned a token returns that token. Removing from an empty
    /// cell returns `None` and leaves it empty.
    pub fn remove(&mut self, coord: GridCoord) -> Option<TokenRef> {
        let current = self.query_or_spawn(coord);
        tracing::debug!(
            cell = %coord,
            value = current.as_ref().map(|t| t.value()),
            "remove token"
        );
        self.mementos.insert(coord, Memento::Empty);
        current
    }

    /// `true` if any decided cell holds a token worth at least `threshold`.
    ///
    /// Undecided cells are not examined, even if they would spawn a winning
    /// token when queried.
    pub fn has_winning_token(&self, threshold: u64) -> bool {
        self.mementos
            .values()
            .any(|memento| matches!(memento, Memento::Spawned(value) if *value >= threshold))
    }

    /// Decided cells holding a token worth at least `threshold`, row-major.
    pub fn winning_cells(&self, threshold: u64) -> Vec<GridCoord> {
        let mut cells: Vec<GridCoord> = self
            .mementos
            .iter()
            .filter(|(_, memento)| matches!(memento, Memento::Spawned(value) if *value >= threshold))
            .map(|(&coord, _)| coord)
            .collect();
        cells.sort_unstable();
        cells
    }

    /// Every memento as a persistable record, sorted row-major.
    pub fn export_mementos(&self) -> Vec<MementoRecord> {
        let mut entries: Vec<(&GridCoord, &Memento)> = self.mementos.iter().collect();
        entries.sort_unstable_by_key(|(coord, _)| **coord);
        entries
            .into_iter()
            .map(|(&coord, &memento)| MementoRecord::new(coord, memento))
            .collect()
    }

    /// Replace all mementos with `records`.
    ///
    /// Every record is validated before any state changes; on error the
    /// world is left exactly as it was. On success the flyweight cache is
    /// warmed with every stored value so later queries share instances.
    ///
    /// # Errors
    ///
    /// - [`WorldError::MalformedKey`] for a key that is not `"row,col"`.
    /// - [`WorldError::InvalidTokenValue`] for a token value of zero.
    /// - [`WorldError::DuplicateMemento`] if a coordinate appears twice.
    pub fn import_mementos(&mut self, records: &[MementoRecord]) -> Result<(), WorldError> {
        let staged = match stage_records(records) {
            Ok(staged) => staged,
            Err(err) => {
                tracing::warn!(error = %err, records = records.len(), "rejecting memento import");
                return Err(err);
            }
        };

        for memento in staged.values() {
            if let Memento::Spawned(value) = *memento {
                self.cache.get_or_create(value);
            }
        }
        self.mementos = staged;
        tracing::debug!(mementos = self.mementos.len(), "imported mementos");
        Ok(())
    }

    // -- internals ----------------------------------------------------------

    fn decide(&self, coord: GridCoord) -> Memento {
        let key = coord.key();
        let roll = self.hasher.unit_interval(&format!("{key},token"));
        if roll < self.config.spawn_probability {
            let max = self.config.max_initial_power;
            let scaled = self.hasher.unit_interval(&format!("{key},value")) * max as f64;
            // Float rounding can land exactly on `max` for very large powers.
            let magnitude = (scaled.floor() as u64).saturating_add(1).min(max);
            tracing::trace!(cell = %coord, roll, value = magnitude, "cell spawned");
            Memento::Spawned(magnitude)
        } else {
            tracing::trace!(cell = %coord, roll, "cell empty");
            Memento::Empty
        }
    }

    fn materialize(&mut self, memento: Memento) -> Option<TokenRef> {
        memento
            .token_value()
            .map(|value| self.cache.get_or_create(value))
    }
}

fn stage_records(records: &[MementoRecord]) -> Result<HashMap<GridCoord, Memento>, WorldError> {
    let mut staged = HashMap::with_capacity(records.len());
    for record in records {
        let (coord, memento) = record.decode()?;
        if staged.insert(coord, memento).is_some() {
            return Err(WorldError::DuplicateMemento {
                key: record.key.clone(),
            });
        }
    }
    Ok(staged)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn always_spawn_ones() -> World {
        World::new(WorldConfig {
            spawn_probability: 1.0,
            max_initial_power: 1,
        })
        .unwrap()
    }

    fn never_spawn() -> World {
        World::new(WorldConfig {
            spawn_probability: 0.0,
            max_initial_power: 4,
        })
        .unwrap()
    }

    #[test]
    fn invalid_configs_are_rejected() {
        for config in [
            WorldConfig {
                spawn_probability: -0.1,
                max_initial_power: 1,
            },
            WorldConfig {
                spawn_probability: 1.5,
                max_initial_power: 1,
            },
            WorldConfig {
                spawn_probability: f64::NAN,
                max_initial_power: 1,
            },
            WorldConfig {
                spawn_probability: 0.5,
                max_initial_power: 0,
            },
        ] {
            assert!(matches!(
                World::new(config),
                Err(WorldError::InvalidConfig { .. })
            ));
        }
    }

    #[test]
    fn first_query_decides_the_cell() {
        let mut world = always_spawn_ones();
        let coord = GridCoord::new(2, -3);
        assert_eq!(world.cell_state(coord), CellState::Undecided);
        let token = world.query_or_spawn(coord).unwrap();
        assert_eq!(token.value(), 1);
        assert_eq!(world.cell_state(coord), CellState::Spawned(1));
        assert_eq!(world.memento_count(), 1);
    }

    #[test]
    fn zero_probability_records_empty() {
        let mut world = never_spawn();
        let coord = GridCoord::new(0, 0);
        assert!(world.query_or_spawn(coord).is_none());
        assert_eq!(world.cell_state(coord), CellState::Empty);
    }

    #[test]
    fn spawned_values_stay_within_power() {
        let mut world = World::new(WorldConfig {
            spawn_probability: 1.0,
            max_initial_power: 3,
        })
        .unwrap();
        let mut seen = [false; 3];
        for row in 0..30 {
            for col in 0..30 {
                let value = world.query_or_spawn(GridCoord::new(row, col)).unwrap().value();
                assert!((1..=3).contains(&value), "value {value} out of range");
                seen[(value - 1) as usize] = true;
            }
        }
        assert!(seen.iter().all(|&s| s), "every value should appear in 900 cells");
    }

    #[test]
    fn remove_takes_the_token_and_is_idempotent() {
        let mut world = always_spawn_ones();
        let coord = GridCoord::new(5, 5);
        assert_eq!(world.remove(coord).map(|t| t.value()), Some(1));
        assert_eq!(world.cell_state(coord), CellState::Empty);
        assert!(world.remove(coord).is_none());
        assert_eq!(world.cell_state(coord), CellState::Empty);
        assert!(world.query_or_spawn(coord).is_none());
    }

    #[test]
    fn place_overwrites_any_state() {
        let mut world = always_spawn_ones();
        let undecided = GridCoord::new(1, 1);
        world.place(undecided, &Token::new(8));
        assert_eq!(world.cell_state(undecided), CellState::Spawned(8));

        let spawned = GridCoord::new(2, 2);
        let existing = world.query_or_spawn(spawned).unwrap();
        world.place(spawned, &existing.combine());
        assert_eq!(world.query_or_spawn(spawned).unwrap().value(), 2);

        world.remove(spawned);
        world.place(spawned, &Token::new(4));
        assert_eq!(world.cell_state(spawned), CellState::Spawned(4));
    }

    #[test]
    fn queries_share_cached_tokens() {
        let mut world = always_spawn_ones();
        let a = world.query_or_spawn(GridCoord::new(0, 0)).unwrap();
        let b = world.query_or_spawn(GridCoord::new(9, -9)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(world.token_cache().len(), 1);
    }

    #[test]
    fn win_detection_checks_threshold() {
        let mut world = never_spawn();
        world.place(GridCoord::new(0, 0), &Token::new(64));
        assert!(world.has_winning_token(64));
        assert!(!world.has_winning_token(128));
        assert_eq!(world.winning_cells(64), vec![GridCoord::new(0, 0)]);
        assert!(world.winning_cells(128).is_empty());
    }

    #[test]
    fn latent_tokens_do_not_win() {
        let world = always_spawn_ones();
        assert!(!world.has_winning_token(1));
    }

    #[test]
    fn export_is_sorted_row_major() {
        let mut world = never_spawn();
        world.place(GridCoord::new(1, 0), &Token::new(2));
        world.place(GridCoord::new(-1, 5), &Token::new(4));
        world.query_or_spawn(GridCoord::new(1, -3));
        let keys: Vec<String> = world
            .export_mementos()
            .into_iter()
            .map(|record| record.key)
            .collect();
        assert_eq!(keys, vec!["-1,5", "1,-3", "1,0"]);
    }

    #[test]
    fn import_replaces_state_and_warms_cache() {
        let mut world = never_spawn();
        world.place(GridCoord::new(7, 7), &Token::new(2));
        let records = vec![
            MementoRecord::new(GridCoord::new(0, 1), Memento::Spawned(4)),
            MementoRecord::new(GridCoord::new(0, 2), Memento::Empty),
        ];
        world.import_mementos(&records).unwrap();
        assert_eq!(world.memento_count(), 2);
        assert_eq!(world.cell_state(GridCoord::new(7, 7)), CellState::Undecided);
        assert_eq!(world.cell_state(GridCoord::new(0, 1)), CellState::Spawned(4));
        assert!(world.token_cache().contains(4));
    }

    #[test]
    fn rejected_import_leaves_world_untouched() {
        let mut world = never_spawn();
        world.place(GridCoord::new(3, 3), &Token::new(2));
        let before = world.export_mementos();

        let bad_batches = [
            vec![
                MementoRecord::new(GridCoord::new(0, 0), Memento::Spawned(2)),
                MementoRecord {
                    key: "nonsense".to_owned(),
                    token_value: Some(2),
                },
            ],
            vec![MementoRecord {
                key: "0,0".to_owned(),
                token_value: Some(0),
            }],
            vec![
                MementoRecord::new(GridCoord::new(0, 0), Memento::Spawned(2)),
                MementoRecord::new(GridCoord::new(0, 0), Memento::Empty),
            ],
        ];
        for batch in &bad_batches {
            assert!(world.import_mementos(batch).is_err());
            assert_eq!(world.export_mementos(), before);
            assert!(!world.token_cache().contains(0));
        }
    }

    #[test]
    fn memento_value_conversion() {
        assert_eq!(Memento::from_token_value(None), Memento::Empty);
        assert_eq!(Memento::from_token_value(Some(8)), Memento::Spawned(8));
        assert_eq!(Memento::Spawned(8).token_value(), Some(8));
        assert_eq!(CellState::from(Memento::Empty), CellState::Empty);
    }
}
