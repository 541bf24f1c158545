//! Minesweeper rule engine: mine placement, cell revelation, flagging and
//! win/loss detection, kept free of any UI concerns so it can sit behind a
//! renderer, a terminal, or a worker thread unchanged.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::ops::Index;

pub use cell::*;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use settings::*;
pub use types::*;

mod cell;
mod engine;
mod error;
mod generator;
mod settings;
mod types;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub size: Coord2,
    pub mines: CellCount,
}

impl GameConfig {
    pub const fn new_unchecked(size: Coord2, mines: CellCount) -> Self {
        Self { size, mines }
    }

    /// Best-effort clamp into a representable config. `Engine::new` is the
    /// strict gate; the settings boundary produces playable values.
    pub fn new((size_x, size_y): Coord2, mines: CellCount) -> Self {
        let size_x = size_x.clamp(1, Coord::MAX);
        let size_y = size_y.clamp(1, Coord::MAX);
        let mines = mines.clamp(1, mult(size_x, size_y));
        Self::new_unchecked((size_x, size_y), mines)
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }

    /// Cells that hold no mine; opening all of them wins the game.
    pub const fn safe_cells(&self) -> CellCount {
        self.total_cells().saturating_sub(self.mines)
    }
}

/// Per-cell hidden record: mine membership plus the precomputed count of
/// mines among the up-to-8 neighbors.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiddenCell {
    pub mine: bool,
    pub adjacent_mines: u8,
}

/// The authoritative hidden layout. Allocated eagerly for the whole board so
/// lookups never go through an optional; owned by the engine and never
/// exposed to consumers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Minefield {
    cells: Array2<HiddenCell>,
    mine_count: CellCount,
}

impl Minefield {
    /// A mine-free field of the given size, the state between `init()` and
    /// the first open.
    pub fn blank(size: Coord2) -> Self {
        Self {
            cells: Array2::default(size.to_nd_index()),
            mine_count: 0,
        }
    }

    pub fn from_mine_mask(mine_mask: Array2<bool>) -> Self {
        let cells = mine_mask.map(|&mine| HiddenCell {
            mine,
            adjacent_mines: 0,
        });
        let mine_count = cells
            .iter()
            .filter(|cell| cell.mine)
            .count()
            .try_into()
            .unwrap();

        let mut field = Self { cells, mine_count };
        field.recompute_adjacency();
        field
    }

    pub fn from_mine_coords(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        let mut mine_mask: Array2<bool> = Array2::default(size.to_nd_index());

        for &coords in mine_coords {
            if coords.0 >= size.0 || coords.1 >= size.1 {
                return Err(ConfigError::InvalidCoords);
            }
            mine_mask[coords.to_nd_index()] = true;
        }

        Ok(Self::from_mine_mask(mine_mask))
    }

    /// Rebuilds every `adjacent_mines` count from the mine mask.
    fn recompute_adjacency(&mut self) {
        let (x_end, y_end) = self.size();
        for x in 0..x_end {
            for y in 0..y_end {
                let coords = (x, y);
                let count = self
                    .cells
                    .iter_neighbors(coords)
                    .filter(|&pos| self.cells[pos.to_nd_index()].mine)
                    .count()
                    .try_into()
                    .unwrap();
                self.cells[coords.to_nd_index()].adjacent_mines = count;
            }
        }
    }

    pub fn validate_coords(&self, coords: Coord2) -> Option<Coord2> {
        let size = self.size();
        (coords.0 < size.0 && coords.1 < size.1).then_some(coords)
    }

    pub fn size(&self) -> Coord2 {
        let dim = self.cells.dim();
        (dim.0.try_into().unwrap(), dim.1.try_into().unwrap())
    }

    pub fn total_cells(&self) -> CellCount {
        self.cells.len().try_into().unwrap()
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.mine_count
    }

    pub fn contains_mine(&self, coords: Coord2) -> bool {
        self[coords].mine
    }

    pub fn adjacent_mines(&self, coords: Coord2) -> u8 {
        self[coords].adjacent_mines
    }

    pub(crate) fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        self.cells.iter_neighbors(coords)
    }
}

impl Index<Coord2> for Minefield {
    type Output = HiddenCell;

    fn index(&self, (x, y): Coord2) -> &Self::Output {
        &self.cells[(x as usize, y as usize)]
    }
}

/// Outcome of a flag toggle.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FlagOutcome {
    NoChange,
    MarkChanged,
}

impl FlagOutcome {
    /// Whether this outcome could have caused an update to the game
    pub const fn has_update(self) -> bool {
        match self {
            Self::NoChange => false,
            Self::MarkChanged => true,
        }
    }
}

/// Outcome of opening a cell.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum OpenOutcome {
    NoChange,
    Safe,
    Explode,
    Win,
}

impl OpenOutcome {
    /// Whether this outcome could have caused an update to the game
    pub const fn has_update(self) -> bool {
        use OpenOutcome::*;
        match self {
            NoChange => false,
            Safe => true,
            Explode => true,
            Win => true,
        }
    }
}
