//! `CloudReorient`, spec.md §4.4: converts a diagonal-oriented
//! `EdgebSet` (one interval of `i` values per antidiagonal `d`) into a
//! row-oriented one (one interval of `j` values per row `i`), with no
//! loss of cells — "the union of all cells named by the diagonal input
//! equals the union of all cells named by the row output" (spec.md §8
//! property 3).
//!
//! Two independent implementations are kept, per spec.md §8 property 4
//! ("CloudReorient's direct-merge implementation and a dense-bitmask
//! oracle implementation agree on every input"): `reorient_linear` is
//! the one production code calls; `reorient_naive` is the `#[cfg(test)]`
//! oracle.

use super::structs::{Edgebound, EdgebSet, Orientation};

/// Direct merge: walks every `(d, i)` cell named by `diag` once and
/// bins it into row `i`, column `j = d - i`. O(total cell count).
pub fn reorient_linear(diag: &EdgebSet) -> EdgebSet {
    let mut row = EdgebSet::new(Orientation::Row, diag.query_length, diag.profile_length);

    // group raw (row, col) cells per row before pushing, so adjacent
    // columns collapse into one interval instead of one-per-cell.
    let mut by_row: std::collections::BTreeMap<usize, Vec<usize>> = std::collections::BTreeMap::new();
    for b in &diag.bounds {
        for i in b.lb..b.rb {
            let j = b.id - i;
            by_row.entry(i).or_default().push(j);
        }
    }

    for (i, mut cols) in by_row {
        cols.sort_unstable();
        cols.dedup();
        let mut start = cols[0];
        let mut prev = cols[0];
        for &c in &cols[1..] {
            if c == prev + 1 {
                prev = c;
                continue;
            }
            row.push(i, start, prev + 1);
            start = c;
            prev = c;
        }
        row.push(i, start, prev + 1);
    }

    row.finalize();
    row
}

/// Dense-bitmask oracle: materializes every cell into a
/// `(query_length+1) x (profile_length+1)` boolean grid, then reads rows
/// back out as intervals. Quadratic in the box size; used only by tests.
#[cfg(test)]
pub fn reorient_naive(diag: &EdgebSet) -> EdgebSet {
    let rows = diag.query_length + 1;
    let cols = diag.profile_length + 1;
    let mut grid = vec![false; rows * cols];

    for b in &diag.bounds {
        for i in b.lb..b.rb {
            if b.id < i {
                continue;
            }
            let j = b.id - i;
            if i < rows && j < cols {
                grid[i * cols + j] = true;
            }
        }
    }

    let mut row = EdgebSet::new(Orientation::Row, diag.query_length, diag.profile_length);
    for i in 0..rows {
        let mut j = 0;
        while j < cols {
            if grid[i * cols + j] {
                let start = j;
                while j < cols && grid[i * cols + j] {
                    j += 1;
                }
                row.push(i, start, j);
            } else {
                j += 1;
            }
        }
    }
    row.finalize();
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_diag_set() -> EdgebSet {
        let mut set = EdgebSet::new(Orientation::Diagonal, 10, 10);
        // antidiagonal 5: i in [2,4) -> cells (2,3),(3,2)
        set.push(5, 2, 4);
        // antidiagonal 6: i in [2,5) -> cells (2,4),(3,3),(4,2)
        set.push(6, 2, 5);
        set.finalize();
        set
    }

    #[test]
    fn linear_and_naive_agree() {
        let diag = sample_diag_set();
        let linear = reorient_linear(&diag);
        let naive = reorient_naive(&diag);
        assert_eq!(linear.bounds, naive.bounds);
    }

    #[test]
    fn row_reorientation_preserves_cell_count() {
        let diag = sample_diag_set();
        let diag_cells: usize = diag.bounds.iter().map(|b| b.width()).sum();
        let row = reorient_linear(&diag);
        let row_cells: usize = row.bounds.iter().map(|b| b.width()).sum();
        assert_eq!(diag_cells, row_cells);
    }

    #[test]
    fn merges_adjacent_columns_into_one_row_interval() {
        let mut diag = EdgebSet::new(Orientation::Diagonal, 10, 10);
        diag.push(4, 1, 3); // i=1 -> (1,3); i=2 -> (2,2)
        diag.push(5, 1, 3); // i=1 -> (1,4); i=2 -> (2,3)
        diag.finalize();
        let row = reorient_linear(&diag);
        // row 2 should see columns {2,3} merged into one interval [2,4)
        assert_eq!(row.bounds_for_id(2), &[Edgebound { id: 2, lb: 2, rb: 4 }]);
    }
}
