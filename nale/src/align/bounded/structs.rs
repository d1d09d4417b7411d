//! Data model shared by the pruned cloud search and the bounded
//! Forward/Backward recurrences: spec.md §3 ("Antidiagonal coordinate",
//! "Edgebound", "EdgeboundRows", "Rolling 3-antidiag buffer",
//! "SparseMatrix") and §4.2's pruning parameters.

use serde::{Deserialize, Serialize};

/// The first and last M-state cells of a Viterbi seed alignment, the
/// only part of the seed the core reads (spec.md §3, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seed {
    pub target_name: String,
    pub target_start: usize,
    pub target_end: usize,
    pub profile_start: usize,
    pub profile_end: usize,
}

/// Which `AntidiagPruner` dispatch to use (spec.md §9: "the source
/// contains at least three pruning dispatches ... the reimplementation
/// should pick `edgetrim` as the default and expose `bifurcate` behind a
/// configuration enum").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PruningVariant {
    #[default]
    EdgeTrim,
    Bifurcate,
}

/// X-drop pruning parameters, spec.md §4.2 and §6.
#[derive(Debug, Clone, Copy)]
pub struct CloudSearchParams {
    /// Primary X-drop, in nats.
    pub alpha: f32,
    /// Reserved: only consumed by `PruningVariant::Bifurcate` (spec.md §9).
    pub beta: f32,
    /// Free-pass antidiagonal count.
    pub gamma: usize,
    pub variant: PruningVariant,
}

impl Default for CloudSearchParams {
    fn default() -> Self {
        CloudSearchParams {
            alpha: 12.0,
            beta: 16.0,
            gamma: 5,
            variant: PruningVariant::EdgeTrim,
        }
    }
}

/// A half-open `[lb, rb)` interval on a row or antidiagonal, spec.md §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edgebound {
    pub id: usize,
    pub lb: usize,
    pub rb: usize,
}

impl Edgebound {
    #[inline]
    pub fn width(&self) -> usize {
        self.rb.saturating_sub(self.lb)
    }

    #[inline]
    pub fn contains(&self, x: usize) -> bool {
        x >= self.lb && x < self.rb
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Row,
    Diagonal,
}

/// An ordered collection of `Edgebound`s sharing dimensions and
/// orientation, spec.md §3's `EdgebSet`.
#[derive(Debug, Clone)]
pub struct EdgebSet {
    pub orientation: Orientation,
    pub query_length: usize,
    pub profile_length: usize,
    pub bounds: Vec<Edgebound>,
    /// Sorted `(id, start_index_in_bounds, end_index_in_bounds)`, built by
    /// `finalize()`. Empty until finalized (spec.md §9: "expose this as
    /// an explicit `finalize()` step and require it before any
    /// lookup-by-id operation").
    ids_index: Vec<(usize, usize, usize)>,
}

impl EdgebSet {
    pub fn new(orientation: Orientation, query_length: usize, profile_length: usize) -> Self {
        EdgebSet {
            orientation,
            query_length,
            profile_length,
            bounds: Vec::new(),
            ids_index: Vec::new(),
        }
    }

    pub fn reuse(&mut self, query_length: usize, profile_length: usize) {
        self.query_length = query_length;
        self.profile_length = profile_length;
        self.bounds.clear();
        self.ids_index.clear();
    }

    pub fn push(&mut self, id: usize, lb: usize, rb: usize) {
        if rb > lb {
            self.bounds.push(Edgebound { id, lb, rb });
        }
    }

    /// Sorts by `(id, lb)` and merges zero-gap adjacent same-id intervals,
    /// then rebuilds the `id -> bounds slice` index. Must be called (and
    /// re-called after any mutation) before `bounds_for_id`.
    pub fn finalize(&mut self) {
        self.bounds.sort_by_key(|b| (b.id, b.lb));

        let mut merged: Vec<Edgebound> = Vec::with_capacity(self.bounds.len());
        for b in self.bounds.drain(..) {
            if let Some(last) = merged.last_mut() {
                if last.id == b.id && b.lb <= last.rb {
                    last.rb = last.rb.max(b.rb);
                    continue;
                }
            }
            merged.push(b);
        }
        self.bounds = merged;

        self.ids_index.clear();
        let mut i = 0;
        while i < self.bounds.len() {
            let id = self.bounds[i].id;
            let start = i;
            while i < self.bounds.len() && self.bounds[i].id == id {
                i += 1;
            }
            self.ids_index.push((id, start, i));
        }

        self.validate();
    }

    pub fn bounds_for_id(&self, id: usize) -> &[Edgebound] {
        match self.ids_index.binary_search_by_key(&id, |&(i, _, _)| i) {
            Ok(idx) => {
                let (_, start, end) = self.ids_index[idx];
                &self.bounds[start..end]
            }
            Err(_) => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    pub fn max_id(&self) -> usize {
        self.bounds.iter().map(|b| b.id).max().unwrap_or(0)
    }

    /// Debug-only structural check, compiled out of release builds per
    /// spec.md §7 ("Invalid edgebound ... treated as a programmer error;
    /// in debug builds the core validates all produced EdgebSets and
    /// aborts on violation. In release builds validation is compiled
    /// out.").
    pub fn validate(&self) {
        #[cfg(debug_assertions)]
        {
            let max_rb = match self.orientation {
                Orientation::Row => self.profile_length + 1,
                Orientation::Diagonal => self.query_length + 1,
            };
            let max_id = match self.orientation {
                Orientation::Row => self.query_length,
                Orientation::Diagonal => self.query_length + self.profile_length,
            };
            let mut prev: Option<&Edgebound> = None;
            for b in &self.bounds {
                debug_assert!(b.lb < b.rb, "edgebound has lb >= rb: {b:?}");
                debug_assert!(b.rb <= max_rb, "edgebound rb out of range: {b:?}");
                debug_assert!(b.id <= max_id, "edgebound id out of range: {b:?}");
                if let Some(p) = prev {
                    if p.id == b.id {
                        debug_assert!(p.rb < b.lb, "overlapping bounds on same id: {p:?} {b:?}");
                    } else {
                        debug_assert!(p.id < b.id, "bounds not sorted by id: {p:?} {b:?}");
                    }
                }
                prev = Some(b);
            }
        }
    }
}

/// Compile-time cap on intervals tracked per row by `EdgeboundRows`
/// (spec.md §3: "A compile-time R_max bound makes insertion O(1) but
/// must be chosen large enough that overflow is a hard error").
pub const MAX_BOUNDS_PER_ROW: usize = 64;

/// A row-indexed append buffer used only during cloud construction
/// (spec.md §3). Extends the last interval on a row when a new column is
/// within `tolerance` of its right edge, else appends a new interval.
/// Overflowing `MAX_BOUNDS_PER_ROW` on one row is a hard, fatal error
/// (spec.md §7: "Row-interval overflow ... fatal; the diagnostic dumps
/// the offending bound and the row's current list").
#[derive(Debug, Clone, Default)]
pub struct EdgeboundRows {
    query_length: usize,
    profile_length: usize,
    tolerance: usize,
    rows: Vec<Vec<Edgebound>>,
}

impl EdgeboundRows {
    pub fn new(query_length: usize, profile_length: usize, tolerance: usize) -> Self {
        let mut edg = EdgeboundRows::default();
        edg.reuse(query_length, profile_length);
        edg.tolerance = tolerance;
        edg
    }

    pub fn reuse(&mut self, query_length: usize, profile_length: usize) {
        self.query_length = query_length;
        self.profile_length = profile_length;
        if self.rows.len() < query_length + 1 {
            self.rows.resize(query_length + 1, Vec::new());
        }
        for row in self.rows.iter_mut().take(query_length + 1) {
            row.clear();
        }
    }

    /// Appends column `j` to row `row`. Extends the last interval when
    /// `j` is within `tolerance` of its right edge, else starts a new
    /// one. Panics (the only fatal path in the crate that isn't gated by
    /// `debug_assertions`) when a row would carry more than
    /// `MAX_BOUNDS_PER_ROW` disjoint intervals.
    pub fn push(&mut self, row: usize, j: usize) {
        let intervals = &mut self.rows[row];
        if let Some(last) = intervals.last_mut() {
            if j <= last.rb + self.tolerance && j >= last.lb {
                last.rb = last.rb.max(j + 1);
                return;
            }
        }
        if intervals.len() >= MAX_BOUNDS_PER_ROW {
            panic!(
                "EdgeboundRows overflow on row {row}: already holds {} intervals (limit {MAX_BOUNDS_PER_ROW}), \
                 tried to add column {j}. current intervals: {intervals:?}. \
                 raise MAX_BOUNDS_PER_ROW at build time.",
                intervals.len()
            );
        }
        intervals.push(Edgebound {
            id: row,
            lb: j,
            rb: j + 1,
        });
    }

    pub fn row(&self, row: usize) -> &[Edgebound] {
        &self.rows[row]
    }

    /// Converts the accumulated rows into a finalized, row-oriented `EdgebSet`.
    pub fn into_edgebset(self) -> EdgebSet {
        let mut set = EdgebSet::new(Orientation::Row, self.query_length, self.profile_length);
        for row in self.rows {
            for b in row {
                set.push(b.id, b.lb, b.rb);
            }
        }
        set.finalize();
        set
    }
}

/// The rolling 3-antidiagonal buffer of spec.md §3: three M/I/D rows,
/// indexed by `d mod 3`, each long enough to hold every possible `i` on
/// any antidiagonal of the box (`query_length + profile_length + 2`,
/// the generous bound spec.md §3 calls for). `reuse` unconditionally
/// scrubs the whole buffer to `-inf`, which is how this crate resolves
/// the `st_MX->clean` Open Question in SPEC_FULL.md: there is no
/// separate "is clean" flag to get out of sync with reality.
#[derive(Debug, Clone, Default)]
pub struct CloudMatrixLinear {
    shared_len: usize,
    mat: Vec<f32>,
    ins: Vec<f32>,
    del: Vec<f32>,
}

impl CloudMatrixLinear {
    pub fn new(max_query_length: usize, max_profile_length: usize) -> Self {
        let mut m = CloudMatrixLinear::default();
        m.reuse(max_query_length, max_profile_length);
        m
    }

    pub fn reuse(&mut self, query_length: usize, profile_length: usize) {
        self.shared_len = query_length + profile_length + 2;
        let n = 3 * self.shared_len;
        self.mat.clear();
        self.mat.resize(n, f32::NEG_INFINITY);
        self.ins.clear();
        self.ins.resize(n, f32::NEG_INFINITY);
        self.del.clear();
        self.del.resize(n, f32::NEG_INFINITY);
    }

    #[inline]
    fn idx(&self, d_mod: usize, i: usize) -> usize {
        debug_assert!(d_mod < 3);
        debug_assert!(i < self.shared_len, "i={i} shared_len={}", self.shared_len);
        d_mod * self.shared_len + i
    }

    #[inline]
    pub fn mat(&self, d_mod: usize, i: usize) -> f32 {
        self.mat[self.idx(d_mod, i)]
    }
    #[inline]
    pub fn set_mat(&mut self, d_mod: usize, i: usize, v: f32) {
        let idx = self.idx(d_mod, i);
        self.mat[idx] = v;
    }
    #[inline]
    pub fn ins(&self, d_mod: usize, i: usize) -> f32 {
        self.ins[self.idx(d_mod, i)]
    }
    #[inline]
    pub fn set_ins(&mut self, d_mod: usize, i: usize, v: f32) {
        let idx = self.idx(d_mod, i);
        self.ins[idx] = v;
    }
    #[inline]
    pub fn del(&self, d_mod: usize, i: usize) -> f32 {
        self.del[self.idx(d_mod, i)]
    }
    #[inline]
    pub fn set_del(&mut self, d_mod: usize, i: usize, v: f32) {
        let idx = self.idx(d_mod, i);
        self.del[idx] = v;
    }

    #[inline]
    pub fn max_cell(&self, d_mod: usize, i: usize) -> f32 {
        self.mat(d_mod, i).max(self.ins(d_mod, i)).max(self.del(d_mod, i))
    }

    /// Scrubs `[lb, rb)` on row `d_mod` back to `-inf` (spec.md §3's
    /// "scrubbing invariant").
    pub fn scrub_interval(&mut self, d_mod: usize, lb: usize, rb: usize) {
        for i in lb..rb {
            self.set_mat(d_mod, i, f32::NEG_INFINITY);
            self.set_ins(d_mod, i, f32::NEG_INFINITY);
            self.set_del(d_mod, i, f32::NEG_INFINITY);
        }
    }

    /// Checks the scrubbing invariant directly: every cell on row
    /// `d_mod` outside `live` is `-inf`. Used by tests (spec.md §8
    /// property 6); not called from production code.
    pub fn assert_scrubbed_outside(&self, d_mod: usize, live: &[(usize, usize)]) -> bool {
        for i in 0..self.shared_len {
            let is_live = live.iter().any(|&(lb, rb)| i >= lb && i < rb);
            if !is_live && self.max_cell(d_mod, i) != f32::NEG_INFINITY {
                return false;
            }
        }
        true
    }
}

/// The output of one direction of `CloudSearch`: a diagonal-oriented
/// `EdgebSet` plus the operations the teacher's pipeline performs on it
/// before reorientation (`join_bounds`, `trim_wings`).
#[derive(Debug, Clone)]
pub struct CloudBoundGroup {
    pub edges: EdgebSet,
}

impl Default for CloudBoundGroup {
    fn default() -> Self {
        CloudBoundGroup {
            edges: EdgebSet::new(Orientation::Diagonal, 0, 0),
        }
    }
}

impl CloudBoundGroup {
    pub fn new(query_length: usize, profile_length: usize) -> Self {
        CloudBoundGroup {
            edges: EdgebSet::new(Orientation::Diagonal, query_length, profile_length),
        }
    }

    pub fn reuse(&mut self, query_length: usize, profile_length: usize) {
        self.edges.reuse(query_length, profile_length);
    }

    pub fn push(&mut self, diagonal: usize, lb: usize, rb: usize) {
        self.edges.push(diagonal, lb, rb);
    }

    pub fn finalize(&mut self) {
        self.edges.finalize();
    }

    pub fn valid(&self) -> bool {
        !self.edges.is_empty()
    }

    /// Merges the forward and backward diagonal clouds in place into
    /// `forward`: the union of intervals sharing a diagonal id (spec.md
    /// §4.4's union, performed here still in diagonal orientation; the
    /// row reprojection itself is `RowBounds::new`).
    pub fn join_bounds(forward: &mut CloudBoundGroup, backward: &CloudBoundGroup) {
        forward.edges.bounds.extend_from_slice(&backward.edges.bounds);
        forward.edges.query_length = forward.edges.query_length.max(backward.edges.query_length);
        forward.edges.profile_length = forward
            .edges
            .profile_length
            .max(backward.edges.profile_length);
        forward.finalize();
    }

    /// Best-effort cleanup pass dropping any degenerate bound left by the
    /// widen-then-clamp step of `AntidiagPruner` (spec.md §4.2 step 5).
    /// Not itself specified by spec.md (no `trim_wings` operation appears
    /// in §4); kept as a safe, idempotent pass since the teacher's
    /// pipeline calls it between `join_bounds` and row reorientation.
    pub fn trim_wings(&mut self) {
        self.edges.bounds.retain(|b| b.rb > b.lb);
        self.edges.finalize();
    }
}

/// The row-oriented `EdgebSet` produced by `CloudReorient` (spec.md
/// §4.4): the shape definition for `DpMatrixSparse`.
#[derive(Debug, Clone, Default)]
pub struct RowBounds {
    pub query_length: usize,
    pub profile_length: usize,
    /// The last row with any live interval; `BoundedFwdBck`'s callers use
    /// this as the traceback start row.
    pub target_end: usize,
    pub row_edges: EdgebSet,
}

impl RowBounds {
    pub fn new(group: &CloudBoundGroup) -> Self {
        let row_edges = crate::align::bounded::reorient::reorient_linear(&group.edges);
        let target_end = row_edges.max_id();
        RowBounds {
            query_length: row_edges.query_length,
            profile_length: row_edges.profile_length,
            target_end,
            row_edges,
        }
    }

    pub fn valid(&self) -> bool {
        !self.row_edges.is_empty()
    }

    pub fn row(&self, r: usize) -> &[Edgebound] {
        self.row_edges.bounds_for_id(r)
    }

    /// Every row id with a non-empty interval list, in increasing order.
    pub fn active_rows(&self) -> Vec<usize> {
        let mut rows: Vec<usize> = self.row_edges.ids_index_ids();
        rows.sort_unstable();
        rows
    }
}

impl EdgebSet {
    fn ids_index_ids(&self) -> Vec<usize> {
        self.ids_index.iter().map(|&(id, _, _)| id).collect()
    }
}

/// One contiguous storage span within a row's outer cloud, with the flat
/// offset where it begins.
#[derive(Debug, Clone, Copy)]
struct RowSpan {
    lb: usize,
    rb: usize,
    offset: usize,
}

/// `DpMatrixSparse`, spec.md §4.5/§4.6: a flat vector of M/I/D triples
/// shaped by two edgebounds — `edg_inner` (the row cloud: the cells
/// whose values are meaningful outputs) and `edg_outer` (a padded
/// superset, one column wider on each side of every inner interval, so
/// lookbacks for M(i-1,j-1), I(i-1,j), D(i,j-1) never read
/// out-of-bounds). Reads outside the outer cloud return the `-inf`
/// sentinel; writes outside the inner cloud are no-ops.
#[derive(Debug, Clone, Default)]
pub struct DpMatrixSparse {
    query_length: usize,
    profile_length: usize,
    inner: EdgebSet,
    outer_rows: Vec<Vec<RowSpan>>,
    mat: Vec<f32>,
    ins: Vec<f32>,
    del: Vec<f32>,
}

impl DpMatrixSparse {
    pub fn new(query_length: usize, profile_length: usize, row_bounds: &RowBounds) -> Self {
        let mut m = DpMatrixSparse::default();
        m.reuse(query_length, profile_length, row_bounds);
        m
    }

    pub fn reuse(&mut self, query_length: usize, profile_length: usize, row_bounds: &RowBounds) {
        self.query_length = query_length;
        self.profile_length = profile_length;
        self.inner = row_bounds.row_edges.clone();

        let mut outer_rows = vec![Vec::new(); query_length + 2];
        let mut offset = 0usize;
        for r in 0..=query_length {
            let row_bounds = self.inner.bounds_for_id(r);
            let mut intervals: Vec<(usize, usize)> = row_bounds
                .iter()
                .map(|b| {
                    let lb = b.lb.saturating_sub(1);
                    let rb = (b.rb + 1).min(profile_length + 2);
                    (lb, rb)
                })
                .collect();
            intervals.sort_unstable();

            let mut merged: Vec<(usize, usize)> = Vec::new();
            for (lb, rb) in intervals {
                if let Some(last) = merged.last_mut() {
                    if lb <= last.1 {
                        last.1 = last.1.max(rb);
                        continue;
                    }
                }
                merged.push((lb, rb));
            }

            for (lb, rb) in merged {
                outer_rows[r].push(RowSpan { lb, rb, offset });
                offset += rb - lb;
            }
        }

        self.outer_rows = outer_rows;
        self.mat.clear();
        self.mat.resize(offset, f32::NEG_INFINITY);
        self.ins.clear();
        self.ins.resize(offset, f32::NEG_INFINITY);
        self.del.clear();
        self.del.resize(offset, f32::NEG_INFINITY);
    }

    #[inline]
    fn find_offset(&self, row: usize, col: usize) -> Option<usize> {
        let spans = self.outer_rows.get(row)?;
        spans
            .iter()
            .find(|s| col >= s.lb && col < s.rb)
            .map(|s| s.offset + (col - s.lb))
    }

    #[inline]
    fn is_inner(&self, row: usize, col: usize) -> bool {
        self.inner.bounds_for_id(row).iter().any(|b| b.contains(col))
    }

    #[inline]
    pub fn mat(&self, row: usize, col: usize) -> f32 {
        self.find_offset(row, col).map(|i| self.mat[i]).unwrap_or(f32::NEG_INFINITY)
    }
    #[inline]
    pub fn set_mat(&mut self, row: usize, col: usize, v: f32) {
        if self.is_inner(row, col) {
            if let Some(i) = self.find_offset(row, col) {
                self.mat[i] = v;
            }
        }
    }
    #[inline]
    pub fn ins(&self, row: usize, col: usize) -> f32 {
        self.find_offset(row, col).map(|i| self.ins[i]).unwrap_or(f32::NEG_INFINITY)
    }
    #[inline]
    pub fn set_ins(&mut self, row: usize, col: usize, v: f32) {
        if self.is_inner(row, col) {
            if let Some(i) = self.find_offset(row, col) {
                self.ins[i] = v;
            }
        }
    }
    #[inline]
    pub fn del(&self, row: usize, col: usize) -> f32 {
        self.find_offset(row, col).map(|i| self.del[i]).unwrap_or(f32::NEG_INFINITY)
    }
    #[inline]
    pub fn set_del(&mut self, row: usize, col: usize, v: f32) {
        if self.is_inner(row, col) {
            if let Some(i) = self.find_offset(row, col) {
                self.del[i] = v;
            }
        }
    }

    pub fn inner(&self) -> &EdgebSet {
        &self.inner
    }

    pub fn query_length(&self) -> usize {
        self.query_length
    }

    pub fn profile_length(&self) -> usize {
        self.profile_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edgebset_merges_adjacent_intervals_on_same_id() {
        let mut set = EdgebSet::new(Orientation::Row, 10, 10);
        set.push(3, 0, 5);
        set.push(3, 5, 8);
        set.push(4, 0, 2);
        set.finalize();
        assert_eq!(set.bounds_for_id(3).len(), 1);
        assert_eq!(set.bounds_for_id(3)[0].rb, 8);
        assert_eq!(set.bounds_for_id(4).len(), 1);
        assert!(set.bounds_for_id(99).is_empty());
    }

    #[test]
    fn edgebound_rows_extends_within_tolerance() {
        let mut rows = EdgeboundRows::new(5, 20, 1);
        rows.push(2, 3);
        rows.push(2, 4);
        rows.push(2, 10);
        assert_eq!(rows.row(2).len(), 2);
    }

    #[test]
    #[should_panic(expected = "EdgeboundRows overflow")]
    fn edgebound_rows_overflow_is_fatal() {
        let mut rows = EdgeboundRows::new(5, 10_000, 0);
        for j in 0..(MAX_BOUNDS_PER_ROW + 1) {
            rows.push(0, j * 4);
        }
    }

    #[test]
    fn cloud_matrix_reuse_scrubs_everything() {
        let mut m = CloudMatrixLinear::new(5, 5);
        m.set_mat(0, 3, 7.0);
        m.reuse(5, 5);
        assert_eq!(m.mat(0, 3), f32::NEG_INFINITY);
    }

    #[test]
    fn sparse_matrix_writes_outside_inner_are_noops() {
        let mut group = CloudBoundGroup::new(5, 5);
        group.push(4, 2, 3); // diagonal id 4, i in [2,3)
        group.finalize();
        let row_bounds = RowBounds::new(&group);
        let mut sparse = DpMatrixSparse::new(5, 5, &row_bounds);

        // writing at a cell in the outer-but-not-inner padding is a no-op
        if let Some(row) = row_bounds.active_rows().first().copied() {
            let inner_bound = row_bounds.row(row)[0];
            let pad_col = inner_bound.lb.saturating_sub(1);
            if pad_col < inner_bound.lb {
                sparse.set_mat(row, pad_col, 123.0);
                assert_eq!(sparse.mat(row, pad_col), f32::NEG_INFINITY);
            }
        }
    }
}
