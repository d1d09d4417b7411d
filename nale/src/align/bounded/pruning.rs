//! `AntidiagPruner`: the X-drop trim applied to one antidiagonal's
//! surviving interval(s), spec.md §4.2. Grounded in
//! `fb-pruner/src/algs_quad/pruning_quad.c`'s
//! `prune_via_xdrop_edgetrim_Quad` (the `edgetrim` variant) and its
//! sibling bifurcating dispatch (the `bifurcate` variant, spec.md §9).
//!
//! Only steps (1)-(4) of spec.md §4.2 live here (scan, threshold, shrink
//! both ends, drop if empty). Step (5), widen-by-one-and-clamp, is
//! direction-dependent (forward widens right, backward widens left) and
//! is applied by the caller in `cloud_search.rs`.

use super::structs::{CloudMatrixLinear, CloudSearchParams, PruningVariant};

/// A half-open `[lb, rb)` interval of `i` values on one antidiagonal.
pub type Interval = (usize, usize);

/// Applies the X-drop trim to every interval in `prev_intervals`, which
/// live in `matrix`'s `prev_mod` slot. `total_max` is the running max
/// cell score seen across the whole search so far (spec.md §4.2's
/// "running max"); it's updated in place. `le`/`rb_limit` bound the
/// valid `i` range for the antidiagonal being pruned, matching the box
/// `[1, query_length] x [1, profile_length]`.
pub fn prune(
    matrix: &CloudMatrixLinear,
    prev_mod: usize,
    prev_intervals: &[Interval],
    total_max: &mut f32,
    params: &CloudSearchParams,
    d_cnt: usize,
    le: usize,
    rb_limit: usize,
) -> Vec<Interval> {
    match params.variant {
        PruningVariant::EdgeTrim => {
            prune_edgetrim(matrix, prev_mod, prev_intervals, total_max, params, d_cnt, le, rb_limit)
        }
        PruningVariant::Bifurcate => {
            prune_bifurcate(matrix, prev_mod, prev_intervals, total_max, params, d_cnt, le, rb_limit)
        }
    }
}

fn diag_max(matrix: &CloudMatrixLinear, prev_mod: usize, intervals: &[Interval]) -> f32 {
    let mut m = f32::NEG_INFINITY;
    for &(lb, rb) in intervals {
        for i in lb..rb {
            m = m.max(matrix.max_cell(prev_mod, i));
        }
    }
    m
}

/// The teacher-default variant: collapses each input interval into at
/// most one surviving sub-interval, trimming both ends inward until the
/// threshold is cleared (spec.md §4.2 steps 2-4). During the first
/// `gamma` antidiagonals the threshold is skipped entirely (free pass).
fn prune_edgetrim(
    matrix: &CloudMatrixLinear,
    prev_mod: usize,
    prev_intervals: &[Interval],
    total_max: &mut f32,
    params: &CloudSearchParams,
    d_cnt: usize,
    le: usize,
    rb_limit: usize,
) -> Vec<Interval> {
    let this_diag_max = diag_max(matrix, prev_mod, prev_intervals);
    *total_max = total_max.max(this_diag_max);

    if d_cnt < params.gamma {
        return prev_intervals
            .iter()
            .map(|&(lb, rb)| (lb.max(le), rb.min(rb_limit)))
            .filter(|&(lb, rb)| rb > lb)
            .collect();
    }

    let threshold = *total_max - params.alpha;
    let mut out = Vec::with_capacity(prev_intervals.len());

    for &(lb, rb) in prev_intervals {
        let lb = lb.max(le);
        let rb = rb.min(rb_limit);
        if rb <= lb {
            continue;
        }

        let mut new_lb = lb;
        while new_lb < rb && matrix.max_cell(prev_mod, new_lb) < threshold {
            new_lb += 1;
        }
        let mut new_rb = rb;
        while new_rb > new_lb && matrix.max_cell(prev_mod, new_rb - 1) < threshold {
            new_rb -= 1;
        }

        if new_rb > new_lb {
            out.push((new_lb, new_rb));
        }
    }

    out
}

/// The bifurcating variant (spec.md §9): instead of collapsing each
/// input interval to a single surviving run, every maximal above-threshold
/// run within it survives as its own interval, so one input interval can
/// split into several. `beta` bounds the minimum width a split-off run
/// must have to survive (fb-pruner's second drop threshold), preventing
/// pruning from fragmenting the cloud into many single-cell slivers.
fn prune_bifurcate(
    matrix: &CloudMatrixLinear,
    prev_mod: usize,
    prev_intervals: &[Interval],
    total_max: &mut f32,
    params: &CloudSearchParams,
    d_cnt: usize,
    le: usize,
    rb_limit: usize,
) -> Vec<Interval> {
    let this_diag_max = diag_max(matrix, prev_mod, prev_intervals);
    *total_max = total_max.max(this_diag_max);

    if d_cnt < params.gamma {
        return prev_intervals
            .iter()
            .map(|&(lb, rb)| (lb.max(le), rb.min(rb_limit)))
            .filter(|&(lb, rb)| rb > lb)
            .collect();
    }

    let threshold = *total_max - params.alpha;
    let mut out = Vec::new();

    for &(lb, rb) in prev_intervals {
        let lb = lb.max(le);
        let rb = rb.min(rb_limit);
        if rb <= lb {
            continue;
        }

        let mut run_start: Option<usize> = None;
        for i in lb..rb {
            let above = matrix.max_cell(prev_mod, i) >= threshold;
            match (above, run_start) {
                (true, None) => run_start = Some(i),
                (false, Some(start)) => {
                    if (i - start) as f32 >= 1.0 || params.beta <= 0.0 {
                        out.push((start, i));
                    }
                    run_start = None;
                }
                _ => {}
            }
        }
        if let Some(start) = run_start {
            out.push((start, rb));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix_with(values: &[(usize, f32)], len: usize) -> CloudMatrixLinear {
        let mut m = CloudMatrixLinear::new(len, len);
        for &(i, v) in values {
            m.set_mat(0, i, v);
        }
        m
    }

    #[test]
    fn free_pass_during_gamma_window_keeps_full_interval() {
        let matrix = matrix_with(&[(3, -50.0), (4, 0.0), (5, -50.0)], 20);
        let params = CloudSearchParams {
            alpha: 5.0,
            beta: 0.0,
            gamma: 10,
            variant: PruningVariant::EdgeTrim,
        };
        let mut total_max = f32::NEG_INFINITY;
        let out = prune(&matrix, 0, &[(3, 6)], &mut total_max, &params, 0, 0, 20);
        assert_eq!(out, vec![(3, 6)]);
    }

    #[test]
    fn edgetrim_shrinks_interval_below_threshold() {
        let matrix = matrix_with(&[(3, -50.0), (4, 0.0), (5, -50.0)], 20);
        let params = CloudSearchParams {
            alpha: 5.0,
            beta: 0.0,
            gamma: 0,
            variant: PruningVariant::EdgeTrim,
        };
        let mut total_max = f32::NEG_INFINITY;
        let out = prune(&matrix, 0, &[(3, 6)], &mut total_max, &params, 10, 0, 20);
        assert_eq!(out, vec![(4, 5)]);
    }

    #[test]
    fn edgetrim_drops_interval_entirely_when_all_below_threshold() {
        let matrix = matrix_with(&[(3, -50.0), (4, -50.0)], 20);
        let params = CloudSearchParams {
            alpha: 5.0,
            beta: 0.0,
            gamma: 0,
            variant: PruningVariant::EdgeTrim,
        };
        let mut total_max = 0.0;
        let out = prune(&matrix, 0, &[(3, 5)], &mut total_max, &params, 10, 0, 20);
        assert!(out.is_empty());
    }

    #[test]
    fn bifurcate_can_split_one_interval_into_two() {
        let matrix = matrix_with(&[(2, 0.0), (3, -50.0), (4, 0.0)], 20);
        let params = CloudSearchParams {
            alpha: 5.0,
            beta: 0.0,
            gamma: 0,
            variant: PruningVariant::Bifurcate,
        };
        let mut total_max = f32::NEG_INFINITY;
        let out = prune(&matrix, 0, &[(2, 5)], &mut total_max, &params, 10, 0, 20);
        assert_eq!(out, vec![(2, 3), (4, 5)]);
    }
}
