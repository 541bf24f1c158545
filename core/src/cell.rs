use serde::{Deserialize, Serialize};

/// Player-visible state of a single board cell.
///
/// This is the only cell representation handed to consumers; the hidden
/// model behind it never leaves the engine. `MineRevealed`, `MineExploded`
/// and `MineWronglyFlagged` only appear once the game is over.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellView {
    Blank,
    Flagged,
    Open(u8),
    MineRevealed,
    MineExploded,
    MineWronglyFlagged,
}

impl CellView {
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open(_))
    }

    /// Whether the cell still renders as a raised, unopened square.
    pub const fn is_closed(self) -> bool {
        use CellView::*;
        match self {
            Blank => true,
            Flagged => true,
            Open(_) => false,
            MineRevealed => false,
            MineExploded => false,
            MineWronglyFlagged => true,
        }
    }
}

impl Default for CellView {
    fn default() -> Self {
        Self::Blank
    }
}
