//! Bounded Forward/Backward, spec.md §4.6: the real scoring DP, restricted
//! to `DpMatrixSparse`'s row cloud. Entry into the model is single-point
//! (`B -> M_1` via the HMM's node-0 transition row, following the
//! HMMER3/f text format's convention of storing the begin-state's
//! transitions there); exit is multi-point (`M_k -> E` from every
//! position) when `profile.is_local`, single-point (`M_L`/`D_L -> E`)
//! otherwise. Recorded as an Open Question decision in DESIGN.md: the
//! parser has no place to carry per-position local-begin scores, so full
//! HMMER-style local-entry-anywhere isn't representable without inventing
//! data the format doesn't carry.

use crate::logsum::{logsum, logsum3, logsum4};
use crate::structs::profile::{SpecialState, Transition};
use crate::structs::{Profile, Sequence};

use super::structs::{DpMatrixSparse, RowBounds};

/// Forward flanking-state trajectory, spec.md §4.6: `N`, `B`, `E`, `J`,
/// `C` per row, indexed `0..=query_length`.
#[derive(Debug, Clone)]
pub struct SpecialTrajectory {
    pub n: Vec<f32>,
    pub b: Vec<f32>,
    pub e: Vec<f32>,
    pub j: Vec<f32>,
    pub c: Vec<f32>,
}

impl SpecialTrajectory {
    fn new(len: usize) -> Self {
        SpecialTrajectory {
            n: vec![f32::NEG_INFINITY; len],
            b: vec![f32::NEG_INFINITY; len],
            e: vec![f32::NEG_INFINITY; len],
            j: vec![f32::NEG_INFINITY; len],
            c: vec![f32::NEG_INFINITY; len],
        }
    }
}

fn row_exit_term(profile: &Profile, sparse: &DpMatrixSparse, row: usize, row_bounds: &RowBounds) -> f32 {
    let mut e = f32::NEG_INFINITY;
    for b in row_bounds.row(row) {
        for j in b.lb..b.rb {
            if profile.is_local || j == profile.length {
                e = logsum(e, sparse.mat(row, j));
            }
        }
    }
    if !profile.is_local {
        e = logsum(e, sparse.del(row, profile.length));
    }
    e
}

/// Runs Bounded Forward. Returns the populated sparse M/I/D matrix, the
/// special-state trajectory, and the total Forward score in nats
/// (`C(query_length) + C.move`).
pub fn forward_bounded(
    profile: &Profile,
    sequence: &Sequence,
    row_bounds: &RowBounds,
) -> (DpMatrixSparse, SpecialTrajectory, f32) {
    let query_length = sequence.length;
    let mut sparse = DpMatrixSparse::new(query_length, profile.length, row_bounds);
    let mut special = SpecialTrajectory::new(query_length + 1);

    special.n[0] = 0.0;

    for row in 0..=query_length {
        if row > 0 {
            special.n[row] = special.n[row - 1] + profile.special_score(SpecialState::N, false);
        }

        if row > 0 {
            for b in row_bounds.row(row) {
                for j in b.lb..b.rb {
                    let a = sequence.residue(row);
                    let from_diag = if j >= 1 {
                        let entry = if j == 1 {
                            special.b[row - 1] + profile.tsc(0, Transition::MM)
                        } else {
                            f32::NEG_INFINITY
                        };
                        logsum4(
                            sparse.mat(row - 1, j - 1) + profile.tsc(j - 1, Transition::MM),
                            sparse.ins(row - 1, j - 1) + profile.tsc(j - 1, Transition::IM),
                            sparse.del(row - 1, j - 1) + profile.tsc(j - 1, Transition::DM),
                            entry,
                        )
                    } else {
                        f32::NEG_INFINITY
                    };
                    let m_val = profile.match_score(j, a) + from_diag;

                    let i_val = profile.insert_score(j, a)
                        + logsum(
                            sparse.mat(row - 1, j) + profile.tsc(j, Transition::MI),
                            sparse.ins(row - 1, j) + profile.tsc(j, Transition::II),
                        );

                    let d_val = if j >= 1 {
                        logsum(
                            sparse.mat(row, j - 1) + profile.tsc(j - 1, Transition::MD),
                            sparse.del(row, j - 1) + profile.tsc(j - 1, Transition::DD),
                        )
                    } else {
                        f32::NEG_INFINITY
                    };

                    sparse.set_mat(row, j, m_val);
                    sparse.set_ins(row, j, i_val);
                    sparse.set_del(row, j, d_val);
                }
            }
        }

        special.e[row] = row_exit_term(profile, &sparse, row, row_bounds);
        special.j[row] = logsum(
            if row > 0 {
                special.j[row - 1] + profile.special_score(SpecialState::J, false)
            } else {
                f32::NEG_INFINITY
            },
            special.e[row] + profile.special_score(SpecialState::E, false),
        );
        special.c[row] = logsum(
            if row > 0 {
                special.c[row - 1] + profile.special_score(SpecialState::C, false)
            } else {
                f32::NEG_INFINITY
            },
            special.e[row] + profile.special_score(SpecialState::E, true),
        );
        special.b[row] = logsum(
            special.n[row] + profile.special_score(SpecialState::N, true),
            special.j[row] + profile.special_score(SpecialState::J, true),
        );
    }

    let forward_score = special.c[query_length] + profile.special_score(SpecialState::C, true);
    (sparse, special, forward_score)
}

/// Runs Bounded Backward, the time-reversal of `forward_bounded`.
pub fn backward_bounded(
    profile: &Profile,
    sequence: &Sequence,
    row_bounds: &RowBounds,
) -> (DpMatrixSparse, SpecialTrajectory, f32) {
    let query_length = sequence.length;
    let mut sparse = DpMatrixSparse::new(query_length, profile.length, row_bounds);
    let mut special = SpecialTrajectory::new(query_length + 1);

    special.c[query_length] = profile.special_score(SpecialState::C, true);
    special.j[query_length] = f32::NEG_INFINITY;
    special.e[query_length] = logsum(
        special.j[query_length] + profile.special_score(SpecialState::E, false),
        special.c[query_length] + profile.special_score(SpecialState::E, true),
    );
    special.b[query_length] = f32::NEG_INFINITY;
    special.n[query_length] = special.b[query_length] + profile.special_score(SpecialState::N, true);

    for row in (0..=query_length).rev() {
        if row < query_length {
            special.c[row] = special.c[row + 1] + profile.special_score(SpecialState::C, false);
        }

        for b in row_bounds.row(row).to_vec() {
            for j in b.lb..b.rb {
                let next_row = row + 1;
                let has_next_residue = next_row <= query_length;
                let a_next = if has_next_residue { sequence.residue(next_row) } else { 0 };

                let to_match_diag = if has_next_residue && j + 1 <= profile.length {
                    profile.tsc(j, Transition::MM)
                        + profile.match_score(j + 1, a_next)
                        + sparse.mat(next_row, j + 1)
                } else {
                    f32::NEG_INFINITY
                };
                let to_insert_same = if has_next_residue {
                    profile.tsc(j, Transition::MI) + profile.insert_score(j, a_next) + sparse.ins(next_row, j)
                } else {
                    f32::NEG_INFINITY
                };
                let to_delete = if j + 1 <= profile.length {
                    profile.tsc(j, Transition::MD) + sparse.del(row, j + 1)
                } else {
                    f32::NEG_INFINITY
                };
                let to_exit = if profile.is_local || j == profile.length {
                    special.e[row]
                } else {
                    f32::NEG_INFINITY
                };
                let bm = logsum4(to_match_diag, to_insert_same, to_delete, to_exit);

                let bi = if has_next_residue {
                    let to_match_diag = if j + 1 <= profile.length {
                        profile.tsc(j, Transition::IM)
                            + profile.match_score(j + 1, a_next)
                            + sparse.mat(next_row, j + 1)
                    } else {
                        f32::NEG_INFINITY
                    };
                    let to_insert_same =
                        profile.tsc(j, Transition::II) + profile.insert_score(j, a_next) + sparse.ins(next_row, j);
                    logsum(to_match_diag, to_insert_same)
                } else {
                    f32::NEG_INFINITY
                };

                let to_match_diag_d = if has_next_residue && j + 1 <= profile.length {
                    profile.tsc(j, Transition::DM)
                        + profile.match_score(j + 1, a_next)
                        + sparse.mat(next_row, j + 1)
                } else {
                    f32::NEG_INFINITY
                };
                let to_delete_d = if j + 1 <= profile.length {
                    profile.tsc(j, Transition::DD) + sparse.del(row, j + 1)
                } else {
                    f32::NEG_INFINITY
                };
                let to_exit_d = if !profile.is_local && j == profile.length {
                    special.e[row]
                } else {
                    f32::NEG_INFINITY
                };
                let bd = logsum3(to_match_diag_d, to_delete_d, to_exit_d);

                sparse.set_mat(row, j, bm);
                sparse.set_ins(row, j, bi);
                sparse.set_del(row, j, bd);
            }
        }

        if row < query_length {
            let next_residue = sequence.residue(row + 1);
            let into_m1 = if profile.length >= 1 {
                profile.tsc(0, Transition::MM) + profile.match_score(1, next_residue) + sparse.mat(row + 1, 1)
            } else {
                f32::NEG_INFINITY
            };
            special.b[row] = into_m1;
            special.j[row] = logsum(
                special.j[row + 1] + profile.special_score(SpecialState::J, false),
                special.b[row] + profile.special_score(SpecialState::J, true),
            );
            special.n[row] = logsum(
                special.n[row + 1] + profile.special_score(SpecialState::N, false),
                special.b[row] + profile.special_score(SpecialState::N, true),
            );
            special.e[row] = logsum(
                special.j[row] + profile.special_score(SpecialState::E, false),
                special.c[row] + profile.special_score(SpecialState::E, true),
            );
        }
    }

    let backward_score = special.n[0];
    (sparse, special, backward_score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::bounded::structs::CloudBoundGroup;

    fn full_row_bounds(query_length: usize, profile_length: usize) -> RowBounds {
        let mut group = CloudBoundGroup::new(query_length, profile_length);
        for i in 1..=query_length {
            let lo = (i.saturating_sub(2)).max(1);
            let hi = (i + 2).min(profile_length);
            if hi >= lo {
                group.push(i, lo, hi + 1);
            }
        }
        group.finalize();
        RowBounds::new(&group)
    }

    fn tiny_profile_and_sequence() -> (Profile, Sequence) {
        let diag = 0.8f32.ln();
        let off = 0.01f32.ln();
        let mut profile = Profile::constant_test_profile(6, diag, off, 0.9f32.ln(), 0.02f32.ln());
        let sequence = Sequence::from_utf8(b"ACDEFG").unwrap();
        profile.configure_for_target_length(sequence.length);
        (profile, sequence)
    }

    #[test]
    fn forward_score_is_finite_on_a_banded_cloud_around_the_diagonal() {
        let (profile, sequence) = tiny_profile_and_sequence();
        let row_bounds = full_row_bounds(sequence.length, profile.length);
        let (_sparse, _special, score) = forward_bounded(&profile, &sequence, &row_bounds);
        assert!(score.is_finite(), "forward score should be finite for a full diagonal band, got {score}");
    }

    #[test]
    fn backward_score_is_finite_on_a_banded_cloud_around_the_diagonal() {
        let (profile, sequence) = tiny_profile_and_sequence();
        let row_bounds = full_row_bounds(sequence.length, profile.length);
        let (_sparse, _special, score) = backward_bounded(&profile, &sequence, &row_bounds);
        assert!(score.is_finite(), "backward score should be finite for a full diagonal band, got {score}");
    }

    #[test]
    fn forward_and_backward_scores_agree_within_tolerance() {
        // spec.md §8 property 7: forward total score == backward total score
        let (profile, sequence) = tiny_profile_and_sequence();
        let row_bounds = full_row_bounds(sequence.length, profile.length);
        let (_, _, fwd) = forward_bounded(&profile, &sequence, &row_bounds);
        let (_, _, bck) = backward_bounded(&profile, &sequence, &row_bounds);
        assert!(
            (fwd - bck).abs() < 0.25,
            "forward={fwd} backward={bck} should roughly agree on a full band"
        );
    }
}
