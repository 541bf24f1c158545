use ndarray::Array2;
use rand::prelude::*;

use super::*;

/// Cells reserved around the first opened cell, itself included.
const MINE_FREE_CELLS: usize = 9;

/// Generation strategy that keeps the starting cell and as much of its
/// neighborhood as the board affords free of mines, but other than that is
/// purely random: mines are sampled uniformly, without replacement, from the
/// cells outside the protected zone.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomMinefieldGenerator {
    seed: u64,
    start: Coord2,
}

impl RandomMinefieldGenerator {
    pub fn new(seed: u64, start: Coord2) -> Self {
        Self { seed, start }
    }
}

impl MinefieldGenerator for RandomMinefieldGenerator {
    fn generate(self, config: GameConfig) -> Minefield {
        let total_cells = config.total_cells() as usize;
        let mines = config.mines as usize;

        // optimize for full boards
        if mines >= total_cells {
            if mines > total_cells {
                log::warn!(
                    "Minefield already full, generated anyway, requested {} but only fits {}",
                    mines,
                    total_cells
                );
            }
            return Minefield::from_mine_mask(Array2::from_elem(config.size.to_nd_index(), true));
        }

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut mine_mask: Array2<bool> = Array2::default(config.size.to_nd_index());

        // Protected zone: the starting cell plus its neighbors, shrunk to the
        // free-cell count when the density leaves no room for all nine. The
        // starting cell itself is always kept.
        let free_cells = total_cells - mines;
        let budget = free_cells.min(MINE_FREE_CELLS);
        let neighbors: Vec<Coord2> = mine_mask.iter_neighbors(self.start).collect();

        let mut protected = Vec::with_capacity(budget);
        protected.push(self.start);
        if neighbors.len() < budget {
            protected.extend(neighbors);
        } else {
            protected.extend(neighbors.choose_multiple(&mut rng, budget - 1).copied());
        }

        let mut eligible = Vec::with_capacity(total_cells - protected.len());
        let (x_end, y_end) = config.size;
        for x in 0..x_end {
            for y in 0..y_end {
                let coords = (x, y);
                if !protected.contains(&coords) {
                    eligible.push(coords);
                }
            }
        }

        for index in rand::seq::index::sample(&mut rng, eligible.len(), mines) {
            mine_mask[eligible[index].to_nd_index()] = true;
        }

        let field = Minefield::from_mine_mask(mine_mask);

        // double check mine count
        if field.mine_count() as usize != mines {
            log::warn!(
                "Generated minefield count mismatch, actual: {}, requested: {}",
                field.mine_count(),
                mines
            );
        }
        field
    }
}
