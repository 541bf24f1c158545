use ndarray::Array2;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

use crate::*;

/// Valid transitions:
/// - NotStarted -> InProgress
/// - InProgress -> Win
/// - InProgress -> Lose
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    /// Initial state
    NotStarted,
    /// Game started
    InProgress,
    /// Game ended and player won
    Win,
    /// Game ended and player lost
    Lose,
}

impl GameStatus {
    /// Indicates the game has not started yet
    pub const fn is_initial(self) -> bool {
        matches!(self, Self::NotStarted)
    }

    /// Indicates the game has ended and no moves can be made anymore
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Win | Self::Lose)
    }
}

impl Default for GameStatus {
    fn default() -> Self {
        Self::NotStarted
    }
}

/// Sole authority over mine placement, cell revelation, flagging and win/loss
/// detection for one game session.
///
/// Construction freezes the settings but allocates nothing; `init` allocates
/// the blank board and the mine-free hidden model, and the first `open`
/// places the mines around a protected zone so it can never lose. Invalid
/// runtime actions are silent no-ops (`NoChange`), never errors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Engine {
    config: GameConfig,
    minefield: Minefield,
    board: Array2<CellView>,
    open_count: CellCount,
    flag_count: CellCount,
    any_cell_opened: bool,
    state: GameStatus,
    seed: u64,
}

impl Engine {
    pub fn new(config: GameConfig) -> Result<Self> {
        Self::with_seed(config, rand::rng().random())
    }

    /// Deterministic variant: the seed fixes mine placement, which test
    /// suites use to assert placement properties rather than exact positions.
    pub fn with_seed(config: GameConfig, seed: u64) -> Result<Self> {
        if config.size.0 == 0 || config.size.1 == 0 {
            return Err(ConfigError::EmptyBoard);
        }
        if config.mines == 0 {
            return Err(ConfigError::ZeroMines);
        }
        if config.mines >= config.total_cells() {
            return Err(ConfigError::TooManyMines);
        }

        Ok(Self {
            config,
            minefield: Minefield::blank((0, 0)),
            board: Array2::default([0, 0]),
            open_count: 0,
            flag_count: 0,
            any_cell_opened: false,
            state: Default::default(),
            seed,
        })
    }

    /// Allocates the blank board and the mine-free hidden model. Mines are
    /// placed on the first open, not here. Idempotent: calling again fully
    /// replaces prior state.
    pub fn init(&mut self) {
        self.minefield = Minefield::blank(self.config.size);
        self.board = Array2::default(self.config.size.to_nd_index());
        self.open_count = 0;
        self.flag_count = 0;
        self.any_cell_opened = false;
        self.state = GameStatus::NotStarted;
        log::debug!(
            "board initialized, size {:?}, {} mines pending",
            self.config.size,
            self.config.mines
        );
    }

    /// Clears board and hidden model back to the unallocated state.
    pub fn reset(&mut self) {
        self.minefield = Minefield::blank((0, 0));
        self.board = Array2::default([0, 0]);
        self.open_count = 0;
        self.flag_count = 0;
        self.any_cell_opened = false;
        self.state = GameStatus::NotStarted;
    }

    pub const fn config(&self) -> GameConfig {
        self.config
    }

    pub const fn size(&self) -> Coord2 {
        self.config.size
    }

    pub const fn total_mines(&self) -> CellCount {
        self.config.mines
    }

    pub const fn status(&self) -> GameStatus {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_final()
    }

    /// How many flags are still available to place.
    pub const fn flags_remaining(&self) -> CellCount {
        self.config.mines - self.flag_count
    }

    pub fn cell_at(&self, coords: Coord2) -> CellView {
        self.board[coords.to_nd_index()]
    }

    /// Fresh snapshot of the visible board. Engine state cannot be mutated
    /// through it; consumers re-read after each `open`/`flag`.
    pub fn board(&self) -> Array2<CellView> {
        self.board.clone()
    }

    /// The visible board as `("x-y", view)` entries, the mapping shape grid
    /// renderers consume.
    pub fn keyed_cells(&self) -> impl Iterator<Item = (String, CellView)> + '_ {
        self.board
            .indexed_iter()
            .map(|((x, y), &view)| (cell_key((x as Coord, y as Coord)), view))
    }

    /// Opens a cell. No-op when the game is finished, the coordinate is out
    /// of bounds, or the cell is already open. The first successful open
    /// places the mines away from the clicked neighborhood and can therefore
    /// never explode; later opens of a mine lose the game.
    pub fn open(&mut self, coords: Coord2) -> OpenOutcome {
        use OpenOutcome::*;

        if self.state.is_final() {
            return NoChange;
        }
        let Some(coords) = self.minefield.validate_coords(coords) else {
            return NoChange;
        };
        if self.board[coords.to_nd_index()].is_open() {
            return NoChange;
        }

        if !self.any_cell_opened {
            self.place_mines(coords);
            self.any_cell_opened = true;
            self.state = GameStatus::InProgress;
        } else if self.minefield.contains_mine(coords) {
            self.finish_lost(coords);
            return Explode;
        }

        self.flood_open(coords);

        if self.check_for_win() { Win } else { Safe }
    }

    /// Toggles a flag. No-op when the game is finished, the coordinate is
    /// out of bounds, the cell is open, or no flags remain to place.
    pub fn flag(&mut self, coords: Coord2) -> FlagOutcome {
        use FlagOutcome::*;

        if self.state.is_final() {
            return NoChange;
        }
        let Some(coords) = self.minefield.validate_coords(coords) else {
            return NoChange;
        };

        let outcome = match self.board[coords.to_nd_index()] {
            CellView::Blank => {
                if self.flags_remaining() == 0 {
                    return NoChange;
                }
                self.board[coords.to_nd_index()] = CellView::Flagged;
                self.flag_count += 1;
                MarkChanged
            }
            CellView::Flagged => {
                self.board[coords.to_nd_index()] = CellView::Blank;
                self.flag_count -= 1;
                MarkChanged
            }
            _ => NoChange,
        };

        if outcome.has_update() {
            // A flag toggle re-checks the win rule just like a reveal does.
            self.check_for_win();
        }
        outcome
    }

    fn place_mines(&mut self, start: Coord2) {
        self.minefield = RandomMinefieldGenerator::new(self.seed, start).generate(self.config);
        log::debug!(
            "placed {} mines after first open at {:?}",
            self.minefield.mine_count(),
            start
        );
    }

    /// Breadth-first reveal: zero-count cells open and enqueue their
    /// unvisited neighbors, numbered cells open without expanding further.
    /// Mines are never enqueued since a zero-count cell has none adjacent.
    fn flood_open(&mut self, start: Coord2) {
        let mut visited = HashSet::new();
        let mut to_visit = VecDeque::from([start]);

        while let Some(coords) = to_visit.pop_front() {
            if !visited.insert(coords) {
                continue;
            }

            if self.board[coords.to_nd_index()].is_open() {
                continue;
            }

            // An opened cell cannot stay flagged; hand the flag back.
            if self.board[coords.to_nd_index()] == CellView::Flagged {
                self.flag_count -= 1;
            }

            let count = self.minefield.adjacent_mines(coords);
            self.board[coords.to_nd_index()] = CellView::Open(count);
            self.open_count += 1;
            log::trace!("opened cell at {:?}, adjacent mines: {}", coords, count);

            if count == 0 {
                to_visit.extend(
                    self.minefield
                        .iter_neighbors(coords)
                        .filter(|pos| !visited.contains(pos)),
                );
            }
        }
    }

    fn check_for_win(&mut self) -> bool {
        if self.any_cell_opened && self.open_count == self.config.safe_cells() {
            self.finish_won();
            true
        } else {
            false
        }
    }

    /// Every mine is force-set to `Flagged` and the flag budget zeroes out.
    fn finish_won(&mut self) {
        let (x_end, y_end) = self.config.size;
        for x in 0..x_end {
            for y in 0..y_end {
                if self.minefield.contains_mine((x, y)) {
                    self.board[(x, y).to_nd_index()] = CellView::Flagged;
                }
            }
        }
        self.flag_count = self.config.mines;
        self.state = GameStatus::Win;
        log::debug!("all safe cells opened, game won");
    }

    /// One atomic sweep: unflagged mines revealed, wrong flags marked, the
    /// triggered cell exploded. Correctly flagged mines keep their flag.
    fn finish_lost(&mut self, exploded: Coord2) {
        let (x_end, y_end) = self.config.size;
        for x in 0..x_end {
            for y in 0..y_end {
                let coords = (x, y);
                let view = self.board[coords.to_nd_index()];
                if self.minefield.contains_mine(coords) {
                    if view != CellView::Flagged {
                        self.board[coords.to_nd_index()] = CellView::MineRevealed;
                    }
                } else if view == CellView::Flagged {
                    self.board[coords.to_nd_index()] = CellView::MineWronglyFlagged;
                }
            }
        }
        self.board[exploded.to_nd_index()] = CellView::MineExploded;
        self.state = GameStatus::Lose;
        log::debug!("mine triggered at {:?}, game lost", exploded);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(rows: Coord, cols: Coord, mines: CellCount, seed: u64) -> Engine {
        let mut engine = Engine::with_seed(GameConfig::new((rows, cols), mines), seed).unwrap();
        engine.init();
        engine
    }

    fn cells_where(engine: &Engine, mine: bool) -> Vec<Coord2> {
        let (x_end, y_end) = engine.size();
        (0..x_end)
            .flat_map(|x| (0..y_end).map(move |y| (x, y)))
            .filter(|&coords| engine.minefield.contains_mine(coords) == mine)
            .collect()
    }

    #[test]
    fn construction_rejects_impossible_configs() {
        let empty = Engine::with_seed(GameConfig::new_unchecked((0, 5), 1), 0);
        assert_eq!(empty.unwrap_err(), ConfigError::EmptyBoard);

        let zero_mines = Engine::with_seed(GameConfig::new_unchecked((9, 9), 0), 0);
        assert_eq!(zero_mines.unwrap_err(), ConfigError::ZeroMines);

        let full = Engine::with_seed(GameConfig::new_unchecked((9, 9), 81), 0);
        assert_eq!(full.unwrap_err(), ConfigError::TooManyMines);
    }

    #[test]
    fn starts_not_started_before_and_after_init() {
        let mut engine = Engine::with_seed(GameConfig::new((9, 9), 10), 0).unwrap();
        assert!(engine.status().is_initial());
        assert_eq!(engine.board().len(), 0);
        assert_eq!(engine.config().mines, 10);

        engine.init();
        assert_eq!(engine.status(), GameStatus::NotStarted);
    }

    #[test]
    fn init_allocates_the_blank_board() {
        let engine = engine(1, 8, 1, 0);

        let board: Vec<_> = engine.keyed_cells().collect();
        assert_eq!(board.len(), 8);
        for y in 0..8 {
            assert_eq!(engine.cell_at((0, y)), CellView::Blank);
        }
        assert!(board.iter().any(|(key, _)| key == "0-7"));
        assert_eq!(engine.flags_remaining(), engine.total_mines());
    }

    #[test]
    fn open_before_init_is_a_noop() {
        let mut engine = Engine::with_seed(GameConfig::new((9, 9), 10), 0).unwrap();
        assert_eq!(engine.open((4, 4)), OpenOutcome::NoChange);
        assert_eq!(engine.status(), GameStatus::NotStarted);
    }

    #[test]
    fn first_open_never_loses() {
        let mut picker = SmallRng::seed_from_u64(0xC0FFEE);

        for seed in 0..1000 {
            let mut engine = engine(9, 9, 10, seed);
            let coords = (picker.random_range(0..9), picker.random_range(0..9));

            let outcome = engine.open(coords);

            assert_ne!(engine.status(), GameStatus::Lose, "seed {seed} at {coords:?}");
            assert_ne!(outcome, OpenOutcome::Explode, "seed {seed} at {coords:?}");
            assert!(engine.cell_at(coords).is_open(), "seed {seed} at {coords:?}");
        }
    }

    #[test]
    fn opening_the_same_cell_twice_is_idempotent() {
        let mut engine = engine(9, 9, 10, 3);
        engine.open((2, 3));
        let snapshot = engine.board();

        assert_eq!(engine.open((2, 3)), OpenOutcome::NoChange);
        assert_eq!(engine.board(), snapshot);
    }

    #[test]
    fn out_of_bounds_actions_leave_the_board_unchanged() {
        let mut engine = engine(9, 9, 10, 3);
        engine.open((4, 4));
        let snapshot = engine.board();

        assert_eq!(engine.open((9, 0)), OpenOutcome::NoChange);
        assert_eq!(engine.open((0, 9)), OpenOutcome::NoChange);
        assert_eq!(engine.flag((9, 9)), FlagOutcome::NoChange);
        assert_eq!(engine.board(), snapshot);
    }

    #[test]
    fn flag_toggle_restores_the_prior_state_exactly() {
        let mut engine = engine(9, 9, 10, 3);
        let snapshot = engine.board();

        assert_eq!(engine.flag((5, 5)), FlagOutcome::MarkChanged);
        assert_eq!(engine.cell_at((5, 5)), CellView::Flagged);
        assert_eq!(engine.flags_remaining(), 9);
        // A flag toggle never starts the game.
        assert_eq!(engine.status(), GameStatus::NotStarted);

        assert_eq!(engine.flag((5, 5)), FlagOutcome::MarkChanged);
        assert_eq!(engine.board(), snapshot);
        assert_eq!(engine.flags_remaining(), 10);
    }

    #[test]
    fn flags_are_capped_at_the_mine_count() {
        let mut engine = engine(1, 8, 1, 0);

        assert_eq!(engine.flag((0, 0)), FlagOutcome::MarkChanged);
        for y in 1..8 {
            assert_eq!(engine.flag((0, y)), FlagOutcome::NoChange);
        }

        assert_eq!(engine.flags_remaining(), 0);
        let flagged = engine
            .keyed_cells()
            .filter(|&(_, view)| view == CellView::Flagged)
            .count();
        assert_eq!(flagged, 1);

        // Unflagging hands the budget back.
        assert_eq!(engine.flag((0, 0)), FlagOutcome::MarkChanged);
        assert_eq!(engine.flags_remaining(), 1);
    }

    #[test]
    fn opened_cells_cannot_be_flagged() {
        let mut engine = engine(9, 9, 10, 3);
        engine.open((4, 4));

        assert_eq!(engine.flag((4, 4)), FlagOutcome::NoChange);
        assert!(engine.cell_at((4, 4)).is_open());
    }

    #[test]
    fn opening_a_flagged_safe_cell_reveals_it_and_returns_the_flag() {
        let mut engine = engine(9, 9, 30, 5);
        engine.open((4, 4));

        let target = cells_where(&engine, false)
            .into_iter()
            .find(|&coords| engine.cell_at(coords) == CellView::Blank)
            .expect("a safe unopened cell should remain");

        engine.flag(target);
        assert_eq!(engine.flags_remaining(), 29);

        let outcome = engine.open(target);
        assert!(outcome.has_update());
        assert!(engine.cell_at(target).is_open());
        assert_eq!(engine.flags_remaining(), 30);
    }

    #[test]
    fn flood_opens_a_zero_region_or_a_single_number() {
        let mut engine = engine(9, 9, 10, 11);
        engine.open((2, 3));

        match engine.cell_at((2, 3)) {
            CellView::Open(0) => {
                // Every opened zero cell must have its whole neighborhood open.
                for x in 0..9 {
                    for y in 0..9 {
                        if engine.cell_at((x, y)) != CellView::Open(0) {
                            continue;
                        }
                        for pos in engine.minefield.iter_neighbors((x, y)) {
                            assert!(engine.cell_at(pos).is_open(), "neighbor {pos:?} of zero cell");
                        }
                    }
                }
            }
            CellView::Open(count) => {
                assert!((1..=8).contains(&count));
                assert_eq!(engine.open_count, 1);
            }
            other => panic!("first open produced {other:?}"),
        }

        // Mines stay untouched by the flood.
        for coords in cells_where(&engine, true) {
            assert!(!engine.cell_at(coords).is_open());
        }
    }

    #[test]
    fn opening_every_safe_cell_wins_and_auto_flags_the_mines() {
        let mut engine = engine(1, 8, 1, 9);
        engine.open((0, 0));

        for coords in cells_where(&engine, false) {
            engine.open(coords);
        }

        assert_eq!(engine.status(), GameStatus::Win);
        let mine = cells_where(&engine, true)[0];
        assert_eq!(engine.cell_at(mine), CellView::Flagged);
        assert_eq!(engine.flags_remaining(), 0);
    }

    #[test]
    fn flags_alone_never_finish_the_game() {
        let mut engine = engine(1, 8, 1, 9);

        assert_eq!(engine.flag((0, 3)), FlagOutcome::MarkChanged);
        assert_eq!(engine.status(), GameStatus::NotStarted);
        assert_eq!(engine.flags_remaining(), 0);
    }

    #[test]
    fn near_maximal_density_stays_safe_then_loses_on_a_far_corner() {
        let mut engine = engine(9, 9, 79, 21);

        assert_eq!(engine.open((4, 4)), OpenOutcome::Safe);
        assert_eq!(engine.status(), GameStatus::InProgress);
        // Two free cells total: the clicked one plus a single neighbor.
        assert_eq!(engine.cell_at((4, 4)), CellView::Open(7));
        let free = cells_where(&engine, false);
        assert_eq!(free.len(), 2);

        let spared_neighbor = free.into_iter().find(|&c| c != (4, 4)).unwrap();
        engine.flag(spared_neighbor);
        engine.flag((0, 0));

        assert_eq!(engine.open((8, 8)), OpenOutcome::Explode);
        assert_eq!(engine.status(), GameStatus::Lose);
        assert_eq!(engine.cell_at((8, 8)), CellView::MineExploded);
        assert_eq!(engine.cell_at((0, 0)), CellView::Flagged);
        assert_eq!(engine.cell_at(spared_neighbor), CellView::MineWronglyFlagged);
        assert_eq!(engine.cell_at((0, 1)), CellView::MineRevealed);
        assert_eq!(engine.cell_at((4, 4)), CellView::Open(7));
    }

    #[test]
    fn finished_games_ignore_every_action() {
        let mut engine = engine(9, 9, 79, 21);
        engine.open((4, 4));
        engine.open((8, 8));
        assert_eq!(engine.status(), GameStatus::Lose);
        assert!(engine.is_finished());

        let snapshot = engine.board();
        assert_eq!(engine.open((0, 0)), OpenOutcome::NoChange);
        assert_eq!(engine.flag((0, 0)), FlagOutcome::NoChange);
        assert_eq!(engine.board(), snapshot);
        assert_eq!(engine.status(), GameStatus::Lose);
    }

    #[test]
    fn won_games_ignore_every_action_too() {
        let mut engine = engine(1, 8, 1, 9);
        engine.open((0, 0));
        for coords in cells_where(&engine, false) {
            engine.open(coords);
        }
        assert_eq!(engine.status(), GameStatus::Win);

        let snapshot = engine.board();
        let mine = cells_where(&engine, true)[0];
        assert_eq!(engine.flag(mine), FlagOutcome::NoChange);
        assert_eq!(engine.open(mine), OpenOutcome::NoChange);
        assert_eq!(engine.board(), snapshot);
    }

    #[test]
    fn init_again_fully_replaces_prior_state() {
        let mut engine = engine(9, 9, 10, 3);
        engine.open((4, 4));
        engine.flag((0, 0));

        engine.init();

        assert_eq!(engine.status(), GameStatus::NotStarted);
        assert_eq!(engine.flags_remaining(), 10);
        assert!(engine.keyed_cells().all(|(_, view)| view == CellView::Blank));

        // The first-open latch is back: mines are placed anew and the click
        // is safe again.
        assert_ne!(engine.open((8, 8)), OpenOutcome::Explode);
        assert_ne!(engine.status(), GameStatus::Lose);
        assert!(engine.cell_at((8, 8)).is_open());
    }

    #[test]
    fn reset_clears_board_and_hidden_model_to_empty() {
        let mut engine = engine(9, 9, 10, 3);
        engine.open((4, 4));

        engine.reset();

        assert_eq!(engine.board().len(), 0);
        assert_eq!(engine.keyed_cells().count(), 0);
        assert_eq!(engine.status(), GameStatus::NotStarted);
        assert_eq!(engine.open((4, 4)), OpenOutcome::NoChange);

        engine.init();
        assert_eq!(engine.keyed_cells().count(), 81);
    }

    #[test]
    fn keyed_cells_round_trip_through_the_key_encoding() {
        let engine = engine(2, 8, 3, 0);

        for (key, _) in engine.keyed_cells() {
            let coords = parse_cell_key(&key).expect("key should parse");
            assert!(coords.0 < 2 && coords.1 < 8, "key {key} out of range");
        }
    }

    #[test]
    fn serde_round_trips_a_mid_game_engine() {
        let mut engine = engine(9, 9, 10, 17);
        engine.open((4, 4));
        engine.flag((0, 0));

        let json = serde_json::to_string(&engine).unwrap();
        let restored: Engine = serde_json::from_str(&json).unwrap();

        assert_eq!(engine, restored);
    }
}
