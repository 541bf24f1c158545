use serde::{Deserialize, Serialize};

use crate::*;

pub const MIN_ROW_COUNT: Coord = 1;
pub const MAX_ROW_COUNT: Coord = 16;
pub const DEFAULT_ROW_COUNT: Coord = 9;

pub const MIN_COLUMN_COUNT: Coord = 8;
pub const MAX_COLUMN_COUNT: Coord = 30;
pub const DEFAULT_COLUMN_COUNT: Coord = 9;

pub const MIN_MINE_COUNT: CellCount = 1;
pub const DEFAULT_MINE_COUNT: CellCount = 10;

/// Preset difficulty levels offered by the settings form.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const fn settings(self) -> Settings {
        match self {
            Self::Beginner => Settings {
                row_count: DEFAULT_ROW_COUNT,
                column_count: DEFAULT_COLUMN_COUNT,
                mine_count: DEFAULT_MINE_COUNT,
            },
            Self::Intermediate => Settings {
                row_count: 16,
                column_count: 16,
                mine_count: 40,
            },
            Self::Advanced => Settings {
                row_count: 16,
                column_count: 30,
                mine_count: 99,
            },
        }
    }
}

/// Validated game settings: whatever reaches an `Engine` went through the
/// clamping here, so the construction contract (positive counts, fewer mines
/// than cells) holds by the time a config is built.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub row_count: Coord,
    pub column_count: Coord,
    pub mine_count: CellCount,
}

impl Settings {
    pub fn new(row_count: Coord, column_count: Coord, mine_count: CellCount) -> Self {
        let row_count = row_count.clamp(MIN_ROW_COUNT, MAX_ROW_COUNT);
        let column_count = column_count.clamp(MIN_COLUMN_COUNT, MAX_COLUMN_COUNT);
        let max_mines = mult(row_count, column_count) - 1;
        let mine_count = mine_count.clamp(MIN_MINE_COUNT, max_mines);
        Self {
            row_count,
            column_count,
            mine_count,
        }
    }

    /// Sanitizes raw form input: unparseable or zero fields fall back to the
    /// defaults, everything else is clamped into range.
    pub fn from_input(row_count: &str, column_count: &str, mine_count: &str) -> Self {
        let row_count = sanitize_field(
            row_count,
            MIN_ROW_COUNT.into(),
            MAX_ROW_COUNT.into(),
            DEFAULT_ROW_COUNT.into(),
        ) as Coord;
        let column_count = sanitize_field(
            column_count,
            MIN_COLUMN_COUNT.into(),
            MAX_COLUMN_COUNT.into(),
            DEFAULT_COLUMN_COUNT.into(),
        ) as Coord;
        let max_mines = mult(row_count, column_count) - 1;
        let mine_count = sanitize_field(mine_count, MIN_MINE_COUNT, max_mines, DEFAULT_MINE_COUNT);
        Self::new(row_count, column_count, mine_count)
    }

    pub const fn config(&self) -> GameConfig {
        GameConfig::new_unchecked((self.row_count, self.column_count), self.mine_count)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Difficulty::Beginner.settings()
    }
}

fn sanitize_field(value: &str, min: CellCount, max: CellCount, default: CellCount) -> CellCount {
    match value.trim().parse::<CellCount>() {
        Ok(0) | Err(_) => default,
        Ok(n) => n.clamp(min, max),
    }
}
