//! `CloudSearch`: the forward and backward antidiagonal sweeps from a
//! Viterbi seed, spec.md §4.3. Grounded in
//! `fb-pruner/src/algs_quad/pruning_quad.c`'s outer sweep loop, adapted
//! to drive `AntidiagPruner` (`pruning.rs`) and emit directly into a
//! diagonal-oriented `CloudBoundGroup` rather than the original's
//! row-major accumulator.

use crate::logsum::{logsum, logsum4};
use crate::structs::profile::Transition;
use crate::structs::{Profile, Sequence};

use super::pruning::{self, Interval};
use super::structs::{CloudBoundGroup, CloudMatrixLinear, CloudSearchParams, Seed};

fn mod3(d: usize) -> usize {
    d % 3
}

/// Shifts a seed cell strictly into the matrix interior, spec.md §4.3:
/// "if i0=0 or j0=0 it is shifted to (1,1)".
fn shift_seed_forward(i: usize, j: usize) -> (usize, usize) {
    if i == 0 || j == 0 {
        (1, 1)
    } else {
        (i, j)
    }
}

/// Symmetric shift for the backward sweep's end cell: "if i1=L_q or
/// j1=L_t it is shifted to (L_q-1, L_t-1)".
fn shift_seed_backward(i: usize, j: usize, query_length: usize, profile_length: usize) -> (usize, usize) {
    if i == query_length || j == profile_length {
        (query_length.saturating_sub(1).max(1), profile_length.saturating_sub(1).max(1))
    } else {
        (i, j)
    }
}

/// Antidiagonal `d`'s valid `i` range within the `[1,query_length] x
/// [1,profile_length]` box, as a half-open interval.
fn diagonal_i_range(d: usize, query_length: usize, profile_length: usize) -> (usize, usize) {
    let lo = d.saturating_sub(profile_length).max(1);
    let hi = d.saturating_sub(1).min(query_length) + 1;
    (lo, hi)
}

/// Sweeps forward from the seed's start cell to the bottom-right corner
/// of the box, writing each antidiagonal's surviving interval(s) into
/// `bounds` (diagonal-oriented) and returning the running max cell score
/// observed (informational only; spec.md §4.3 gives no further use for
/// it beyond driving the X-drop threshold).
pub fn cloud_search_forward(
    profile: &Profile,
    sequence: &Sequence,
    seed: &Seed,
    cloud_matrix: &mut CloudMatrixLinear,
    params: &CloudSearchParams,
    bounds: &mut CloudBoundGroup,
) -> f32 {
    let query_length = sequence.length;
    let profile_length = profile.length;

    let (i0, j0) = shift_seed_forward(seed.target_start, seed.profile_start);
    let d0 = i0 + j0;
    let d_end = query_length + profile_length;

    let d0_mod = mod3(d0);
    cloud_matrix.set_mat(d0_mod, i0, 0.0);
    cloud_matrix.set_ins(d0_mod, i0, f32::NEG_INFINITY);
    cloud_matrix.set_del(d0_mod, i0, f32::NEG_INFINITY);
    bounds.push(d0, i0, i0 + 1);

    let mut total_max = 0.0f32;
    let mut live_prev: Vec<Interval> = vec![(i0, i0 + 1)];
    let mut live_prev2: Vec<Interval> = Vec::new();
    let mut b_prev = 0.0f32;
    let mut d_cnt = 0usize;
    let mut last_d = d0;

    if d0 >= d_end {
        return total_max;
    }

    for d in (d0 + 1)..=d_end {
        if live_prev.is_empty() {
            break;
        }

        let (le, re) = diagonal_i_range(d, query_length, profile_length);
        let prev_mod = mod3(d - 1);
        let new_intervals = pruning::prune(
            cloud_matrix,
            prev_mod,
            &live_prev,
            &mut total_max,
            params,
            d_cnt,
            le,
            re,
        );
        d_cnt += 1;

        // widen right by one (spec.md §4.2 step 5, forward direction)
        let widened: Vec<Interval> = new_intervals
            .iter()
            .map(|&(lb, rb)| (lb.max(le), (rb + 1).min(re)))
            .filter(|&(lb, rb)| rb > lb)
            .collect();

        if widened.is_empty() {
            break;
        }

        let d0_mod = mod3(d);
        let d1_mod = mod3(d - 1);
        let d2_mod = mod3(d - 2);

        for &(lb, rb) in &widened {
            for i in lb..rb {
                let j = d - i;
                let a = sequence.residue(i);

                let from_prev2 = if i >= 1 {
                    logsum4(
                        cloud_matrix.mat(d2_mod, i - 1) + profile.tsc(j - 1, Transition::MM),
                        cloud_matrix.ins(d2_mod, i - 1) + profile.tsc(j - 1, Transition::IM),
                        cloud_matrix.del(d2_mod, i - 1) + profile.tsc(j - 1, Transition::DM),
                        b_prev,
                    )
                } else {
                    b_prev
                };
                let m_val = profile.match_score(j, a) + from_prev2;

                let i_val = if i >= 1 {
                    profile.insert_score(j, a)
                        + logsum(
                            cloud_matrix.mat(d1_mod, i - 1) + profile.tsc(j, Transition::MI),
                            cloud_matrix.ins(d1_mod, i - 1) + profile.tsc(j, Transition::II),
                        )
                } else {
                    f32::NEG_INFINITY
                };

                let d_val = logsum(
                    cloud_matrix.mat(d1_mod, i) + profile.tsc(j - 1, Transition::MD),
                    cloud_matrix.del(d1_mod, i) + profile.tsc(j - 1, Transition::DD),
                );

                cloud_matrix.set_mat(d0_mod, i, m_val);
                cloud_matrix.set_ins(d0_mod, i, i_val);
                cloud_matrix.set_del(d0_mod, i, d_val);
            }
            bounds.push(d, lb, rb);
        }

        for &(lb, rb) in &live_prev2 {
            cloud_matrix.scrub_interval(d2_mod, lb, rb);
        }

        live_prev2 = live_prev;
        live_prev = widened;
        b_prev = f32::NEG_INFINITY;
        last_d = d;
    }

    for &(lb, rb) in &live_prev2 {
        cloud_matrix.scrub_interval(mod3(last_d.saturating_sub(1)), lb, rb);
    }
    for &(lb, rb) in &live_prev {
        cloud_matrix.scrub_interval(mod3(last_d), lb, rb);
    }

    total_max
}

/// Sweeps backward from the seed's end cell to the top-left corner of
/// the box. The recurrence is the time-reversal of the forward one:
/// `bM(i,j)` looks ahead to `(i+1,j+1)` (two antidiagonals ahead) and
/// `(i+1,j)`/`(i,j+1)` (one ahead), using transition scores indexed at
/// the *current* position `j` rather than `j-1` (the state being left is
/// `j`, not a predecessor).
pub fn cloud_search_backward(
    profile: &Profile,
    sequence: &Sequence,
    seed: &Seed,
    cloud_matrix: &mut CloudMatrixLinear,
    params: &CloudSearchParams,
    bounds: &mut CloudBoundGroup,
) -> f32 {
    let query_length = sequence.length;
    let profile_length = profile.length;

    let (i1, j1) = shift_seed_backward(seed.target_end, seed.profile_end, query_length, profile_length);
    let d1 = i1 + j1;

    let d1_mod = mod3(d1);
    cloud_matrix.set_mat(d1_mod, i1, 0.0);
    cloud_matrix.set_ins(d1_mod, i1, f32::NEG_INFINITY);
    cloud_matrix.set_del(d1_mod, i1, f32::NEG_INFINITY);
    bounds.push(d1, i1, i1 + 1);

    let mut total_max = 0.0f32;
    let mut live_next: Vec<Interval> = vec![(i1, i1 + 1)];
    let mut live_next2: Vec<Interval> = Vec::new();
    let mut e_next = 0.0f32;
    let mut d_cnt = 0usize;
    let mut last_d = d1;

    if d1 == 0 {
        return total_max;
    }

    for d in (0..d1).rev() {
        if live_next.is_empty() {
            break;
        }

        let (le, re) = diagonal_i_range(d, query_length, profile_length);
        let next_mod = mod3(d + 1);
        let new_intervals = pruning::prune(
            cloud_matrix,
            next_mod,
            &live_next,
            &mut total_max,
            params,
            d_cnt,
            le,
            re,
        );
        d_cnt += 1;

        // widen left by one (spec.md §4.2 step 5, backward direction)
        let widened: Vec<Interval> = new_intervals
            .iter()
            .map(|&(lb, rb)| (lb.saturating_sub(1).max(le), rb.min(re)))
            .filter(|&(lb, rb)| rb > lb)
            .collect();

        if widened.is_empty() {
            break;
        }

        let d0_mod = mod3(d);
        let d1_mod = mod3(d + 1);
        let d2_mod = mod3(d + 2);

        for &(lb, rb) in &widened {
            for i in lb..rb {
                let j = d - i;

                let bm = {
                    let next_i = i + 1;
                    let a_next = if next_i <= query_length {
                        sequence.residue(next_i)
                    } else {
                        0
                    };
                    let to_match_diag = if next_i <= query_length && j + 1 <= profile_length {
                        profile.tsc(j, Transition::MM)
                            + profile.match_score(j + 1, a_next)
                            + cloud_matrix.mat(d2_mod, next_i)
                    } else {
                        f32::NEG_INFINITY
                    };
                    let to_insert_same = if next_i <= query_length {
                        profile.tsc(j, Transition::MI)
                            + profile.insert_score(j, a_next)
                            + cloud_matrix.ins(d1_mod, next_i)
                    } else {
                        f32::NEG_INFINITY
                    };
                    let to_delete = if j + 1 <= profile_length {
                        profile.tsc(j, Transition::MD) + cloud_matrix.del(d1_mod, i)
                    } else {
                        f32::NEG_INFINITY
                    };
                    let exit = if j == profile_length { e_next } else { f32::NEG_INFINITY };
                    logsum(logsum(to_match_diag, to_insert_same), logsum(to_delete, exit))
                };

                let bi = {
                    let next_i = i + 1;
                    if next_i <= query_length {
                        let a_next = sequence.residue(next_i);
                        let to_match_diag = if j + 1 <= profile_length {
                            profile.tsc(j, Transition::IM)
                                + profile.match_score(j + 1, a_next)
                                + cloud_matrix.mat(d2_mod, next_i)
                        } else {
                            f32::NEG_INFINITY
                        };
                        let to_insert_same =
                            profile.tsc(j, Transition::II) + profile.insert_score(j, a_next) + cloud_matrix.ins(d1_mod, next_i);
                        logsum(to_match_diag, to_insert_same)
                    } else {
                        f32::NEG_INFINITY
                    }
                };

                let bd = {
                    let next_i = i + 1;
                    let a_next = if next_i <= query_length {
                        sequence.residue(next_i)
                    } else {
                        0
                    };
                    let to_match_diag = if next_i <= query_length && j + 1 <= profile_length {
                        profile.tsc(j, Transition::DM)
                            + profile.match_score(j + 1, a_next)
                            + cloud_matrix.mat(d2_mod, next_i)
                    } else {
                        f32::NEG_INFINITY
                    };
                    let to_delete = if j + 1 <= profile_length {
                        profile.tsc(j, Transition::DD) + cloud_matrix.del(d1_mod, i)
                    } else {
                        f32::NEG_INFINITY
                    };
                    logsum(to_match_diag, to_delete)
                };

                cloud_matrix.set_mat(d0_mod, i, bm);
                cloud_matrix.set_ins(d0_mod, i, bi);
                cloud_matrix.set_del(d0_mod, i, bd);
            }
            bounds.push(d, lb, rb);
        }

        for &(lb, rb) in &live_next2 {
            cloud_matrix.scrub_interval(d2_mod, lb, rb);
        }

        live_next2 = live_next;
        live_next = widened;
        e_next = f32::NEG_INFINITY;
        last_d = d;
    }

    for &(lb, rb) in &live_next2 {
        cloud_matrix.scrub_interval(mod3(last_d + 1), lb, rb);
    }
    for &(lb, rb) in &live_next {
        cloud_matrix.scrub_interval(mod3(last_d), lb, rb);
    }

    total_max
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::Sequence;

    fn test_profile_and_sequence() -> (Profile, Sequence) {
        let diag = 0.5f32.ln();
        let off = 0.05f32.ln();
        let mut profile = Profile::constant_test_profile(10, diag, off, 0.9f32.ln(), 0.025f32.ln());
        profile.configure_for_target_length(10);
        let sequence = Sequence::from_utf8(b"ACDEFGHIKL").unwrap();
        (profile, sequence)
    }

    #[test]
    fn forward_search_produces_a_nonempty_cloud_and_covers_the_seed() {
        let (profile, sequence) = test_profile_and_sequence();
        let seed = Seed {
            target_name: "t".into(),
            target_start: 5,
            target_end: 5,
            profile_start: 5,
            profile_end: 5,
        };
        let mut matrix = CloudMatrixLinear::new(sequence.length, profile.length);
        let params = CloudSearchParams::default();
        let mut bounds = CloudBoundGroup::new(sequence.length, profile.length);

        cloud_search_forward(&profile, &sequence, &seed, &mut matrix, &params, &mut bounds);
        bounds.finalize();
        assert!(bounds.valid());
        assert!(bounds.edges.bounds.iter().any(|b| b.id == 10 && b.contains(5)));
    }

    #[test]
    fn backward_search_produces_a_nonempty_cloud_and_covers_the_seed() {
        let (profile, sequence) = test_profile_and_sequence();
        let seed = Seed {
            target_name: "t".into(),
            target_start: 5,
            target_end: 5,
            profile_start: 5,
            profile_end: 5,
        };
        let mut matrix = CloudMatrixLinear::new(sequence.length, profile.length);
        let params = CloudSearchParams::default();
        let mut bounds = CloudBoundGroup::new(sequence.length, profile.length);

        cloud_search_backward(&profile, &sequence, &seed, &mut matrix, &params, &mut bounds);
        bounds.finalize();
        assert!(bounds.valid());
        assert!(bounds.edges.bounds.iter().any(|b| b.id == 10 && b.contains(5)));
    }

    #[test]
    fn forward_scrubs_the_matrix_back_to_neg_infinity_when_done() {
        let (profile, sequence) = test_profile_and_sequence();
        let seed = Seed {
            target_name: "t".into(),
            target_start: 2,
            target_end: 2,
            profile_start: 2,
            profile_end: 2,
        };
        let mut matrix = CloudMatrixLinear::new(sequence.length, profile.length);
        let params = CloudSearchParams::default();
        let mut bounds = CloudBoundGroup::new(sequence.length, profile.length);
        cloud_search_forward(&profile, &sequence, &seed, &mut matrix, &params, &mut bounds);

        let total = 3 * (sequence.length + profile.length + 2);
        let all_neg_inf = (0..total / 3).all(|i| {
            matrix.mat(0, i) == f32::NEG_INFINITY
                && matrix.mat(1, i) == f32::NEG_INFINITY
                && matrix.mat(2, i) == f32::NEG_INFINITY
        });
        assert!(all_neg_inf, "matrix should be fully scrubbed after the forward sweep completes");
    }
}
