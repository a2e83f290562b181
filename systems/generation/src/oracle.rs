//! Exact reachability queries over the 4-connected tile graph.

use std::collections::{BTreeSet, VecDeque};

use vector_grid_core::{GridSize, TileIndex};

/// Reports whether `end` can be reached from `start` without entering a wall.
///
/// The start tile is always considered traversable; a walled or off-grid end
/// tile is never reachable.
#[must_use]
pub fn reachable(
    size: GridSize,
    start: TileIndex,
    end: TileIndex,
    walls: &BTreeSet<TileIndex>,
) -> bool {
    distance(size, start, end, walls).is_some()
}

/// Length of the shortest wall-free path from `start` to `end`, in moves.
///
/// Runs a breadth-first search over the whole grid, so the answer is exact.
#[must_use]
pub fn distance(
    size: GridSize,
    start: TileIndex,
    end: TileIndex,
    walls: &BTreeSet<TileIndex>,
) -> Option<u32> {
    if size.coord(start).is_none() || size.coord(end).is_none() || walls.contains(&end) {
        return None;
    }
    if start == end {
        return Some(0);
    }

    let cell_count = usize::try_from(size.cell_count()).ok()?;
    let mut distances = vec![u32::MAX; cell_count];
    let mut queue = VecDeque::new();

    *distances.get_mut(slot(start)?)? = 0;
    queue.push_back(start);

    while let Some(tile) = queue.pop_front() {
        let next_distance = distances.get(slot(tile)?)?.saturating_add(1);

        for neighbor in size.neighbors(tile) {
            if walls.contains(&neighbor) {
                continue;
            }

            let Some(entry) = slot(neighbor).and_then(|index| distances.get_mut(index)) else {
                continue;
            };
            if *entry != u32::MAX {
                continue;
            }

            *entry = next_distance;
            if neighbor == end {
                return Some(next_distance);
            }
            queue.push_back(neighbor);
        }
    }

    None
}

pub(crate) fn slot(tile: TileIndex) -> Option<usize> {
    usize::try_from(tile.get()).ok()
}
