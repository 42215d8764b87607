//! Position grid for tolerance lookups
//!
//! Positions are bucketed into cubic cells the size of the comparison tolerance. Two
//! positions within tolerance of each other are at most one cell apart on every axis, so
//! probing the 27 cells around a query finds every candidate.

use hashbrown::HashMap;

/// Absolute per-component tolerance for attribute equality
pub const TOLERANCE: f32 = 1e-6;

type CellKey = [i64; 3];

/// Component-wise `|a - b| <= TOLERANCE`; equal infinities also match
pub fn approx_eq<const N: usize>(a: &[f32; N], b: &[f32; N]) -> bool {
    a.iter().zip(b).all(|(x, y)| x == y || (x - y).abs() <= TOLERANCE)
}

fn cell_of(position: [f32; 3]) -> CellKey {
    position.map(|c| (f64::from(c) / f64::from(TOLERANCE)).floor() as i64)
}

#[derive(Debug, Default)]
pub struct PositionGrid {
    cells: HashMap<CellKey, Vec<usize>>,
}

impl PositionGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, position: [f32; 3], id: usize) {
        self.cells.entry(cell_of(position)).or_default().push(id);
    }

    /// Smallest inserted id near `position` accepted by `matches`
    ///
    /// `matches` performs the exact tolerance comparison; the grid only narrows the
    /// candidates.
    pub fn find(&self, position: [f32; 3], mut matches: impl FnMut(usize) -> bool) -> Option<usize> {
        let [cx, cy, cz] = cell_of(position);
        let mut best: Option<usize> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    // saturated cells at the edge of i64 have no neighbour past the limit
                    let (Some(x), Some(y), Some(z)) =
                        (cx.checked_add(dx), cy.checked_add(dy), cz.checked_add(dz))
                    else {
                        continue;
                    };
                    let Some(ids) = self.cells.get(&[x, y, z]) else {
                        continue;
                    };
                    for &id in ids {
                        if best.is_some_and(|b| b <= id) {
                            continue;
                        }
                        if matches(id) {
                            best = Some(id);
                        }
                    }
                }
            }
        }
        best
    }

    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
