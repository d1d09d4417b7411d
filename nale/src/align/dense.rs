//! Unrestricted dense Forward/Backward/Viterbi, compiled only under
//! `#[cfg(test)]`. These exist purely as reference oracles for spec.md §8
//! properties 2 ("no-pruning run matches the dense score within
//! tolerance") and 7 ("forward and backward totals agree"); production
//! code never calls them.

use crate::logsum::{logsum, logsum4};
use crate::structs::dp_matrix::{SPECIAL_B, SPECIAL_C, SPECIAL_E, SPECIAL_J, SPECIAL_N};
use crate::structs::profile::{SpecialState, Transition};
use crate::structs::{DpMatrixFlat, Profile, Sequence};

/// Full `(query_length+1) x (profile_length+1)` Forward, no pruning.
/// Mirrors `bounded::forward_bounded`'s recurrence exactly, just over
/// every cell instead of a sparse cloud.
pub fn dense_forward(profile: &Profile, sequence: &Sequence) -> (DpMatrixFlat, f32) {
    let query_length = sequence.length;
    let mut dp = DpMatrixFlat::new(query_length, profile.length);

    dp.set_special(0, SPECIAL_N, 0.0);
    dp.set_special(0, SPECIAL_B, dp.special(0, SPECIAL_N) + profile.special_score(SpecialState::N, true));
    dp.set_special(0, SPECIAL_E, f32::NEG_INFINITY);
    dp.set_special(0, SPECIAL_J, f32::NEG_INFINITY);
    dp.set_special(0, SPECIAL_C, f32::NEG_INFINITY);

    for row in 1..=query_length {
        let a = sequence.residue(row);
        dp.set_special(row, SPECIAL_N, dp.special(row - 1, SPECIAL_N) + profile.special_score(SpecialState::N, false));

        for j in 1..=profile.length {
            let entry = if j == 1 {
                dp.special(row - 1, SPECIAL_B) + profile.tsc(0, Transition::MM)
            } else {
                f32::NEG_INFINITY
            };
            let m_val = profile.match_score(j, a)
                + logsum4(
                    dp.mat(row - 1, j - 1) + profile.tsc(j - 1, Transition::MM),
                    dp.ins(row - 1, j - 1) + profile.tsc(j - 1, Transition::IM),
                    dp.del(row - 1, j - 1) + profile.tsc(j - 1, Transition::DM),
                    entry,
                );
            let i_val = profile.insert_score(j, a)
                + logsum(
                    dp.mat(row - 1, j) + profile.tsc(j, Transition::MI),
                    dp.ins(row - 1, j) + profile.tsc(j, Transition::II),
                );
            let d_val = logsum(
                dp.mat(row, j - 1) + profile.tsc(j - 1, Transition::MD),
                dp.del(row, j - 1) + profile.tsc(j - 1, Transition::DD),
            );
            dp.set_mat(row, j, m_val);
            dp.set_ins(row, j, i_val);
            dp.set_del(row, j, d_val);
        }

        let mut e = f32::NEG_INFINITY;
        for j in 1..=profile.length {
            if profile.is_local || j == profile.length {
                e = logsum(e, dp.mat(row, j));
            }
        }
        if !profile.is_local {
            e = logsum(e, dp.del(row, profile.length));
        }
        dp.set_special(row, SPECIAL_E, e);
        dp.set_special(
            row,
            SPECIAL_J,
            logsum(
                dp.special(row - 1, SPECIAL_J) + profile.special_score(SpecialState::J, false),
                dp.special(row, SPECIAL_E) + profile.special_score(SpecialState::E, false),
            ),
        );
        dp.set_special(
            row,
            SPECIAL_C,
            logsum(
                dp.special(row - 1, SPECIAL_C) + profile.special_score(SpecialState::C, false),
                dp.special(row, SPECIAL_E) + profile.special_score(SpecialState::E, true),
            ),
        );
        dp.set_special(
            row,
            SPECIAL_B,
            logsum(
                dp.special(row, SPECIAL_N) + profile.special_score(SpecialState::N, true),
                dp.special(row, SPECIAL_J) + profile.special_score(SpecialState::J, true),
            ),
        );
    }

    let score = dp.special(query_length, SPECIAL_C) + profile.special_score(SpecialState::C, true);
    (dp, score)
}

/// Full dense Backward, the time-reversal of `dense_forward`.
pub fn dense_backward(profile: &Profile, sequence: &Sequence) -> (DpMatrixFlat, f32) {
    let query_length = sequence.length;
    let mut dp = DpMatrixFlat::new(query_length, profile.length);

    dp.set_special(query_length, SPECIAL_C, profile.special_score(SpecialState::C, true));
    dp.set_special(query_length, SPECIAL_J, f32::NEG_INFINITY);
    dp.set_special(
        query_length,
        SPECIAL_E,
        logsum(
            dp.special(query_length, SPECIAL_J) + profile.special_score(SpecialState::E, false),
            dp.special(query_length, SPECIAL_C) + profile.special_score(SpecialState::E, true),
        ),
    );
    dp.set_special(query_length, SPECIAL_B, f32::NEG_INFINITY);
    dp.set_special(query_length, SPECIAL_N, f32::NEG_INFINITY);

    for row in (0..query_length).rev() {
        dp.set_special(row, SPECIAL_C, dp.special(row + 1, SPECIAL_C) + profile.special_score(SpecialState::C, false));

        for j in (1..=profile.length).rev() {
            let next_row = row + 1;
            let a_next = sequence.residue(next_row);

            let to_match_diag = if j + 1 <= profile.length {
                profile.tsc(j, Transition::MM) + profile.match_score(j + 1, a_next) + dp.mat(next_row, j + 1)
            } else {
                f32::NEG_INFINITY
            };
            let to_insert_same = profile.tsc(j, Transition::MI) + profile.insert_score(j, a_next) + dp.ins(next_row, j);
            let to_delete = if j + 1 <= profile.length {
                profile.tsc(j, Transition::MD) + dp.del(row, j + 1)
            } else {
                f32::NEG_INFINITY
            };
            let to_exit = if profile.is_local || j == profile.length {
                dp.special(row, SPECIAL_E)
            } else {
                f32::NEG_INFINITY
            };
            dp.set_mat(row, j, logsum4(to_match_diag, to_insert_same, to_delete, to_exit));

            let i_to_match_diag = if j + 1 <= profile.length {
                profile.tsc(j, Transition::IM) + profile.match_score(j + 1, a_next) + dp.mat(next_row, j + 1)
            } else {
                f32::NEG_INFINITY
            };
            let i_to_insert_same = profile.tsc(j, Transition::II) + profile.insert_score(j, a_next) + dp.ins(next_row, j);
            dp.set_ins(row, j, logsum(i_to_match_diag, i_to_insert_same));

            let d_to_match_diag = if j + 1 <= profile.length {
                profile.tsc(j, Transition::DM) + profile.match_score(j + 1, a_next) + dp.mat(next_row, j + 1)
            } else {
                f32::NEG_INFINITY
            };
            let d_to_delete = if j + 1 <= profile.length {
                profile.tsc(j, Transition::DD) + dp.del(row, j + 1)
            } else {
                f32::NEG_INFINITY
            };
            let d_to_exit = if !profile.is_local && j == profile.length {
                dp.special(row, SPECIAL_E)
            } else {
                f32::NEG_INFINITY
            };
            dp.set_del(row, j, logsum(logsum(d_to_match_diag, d_to_delete), d_to_exit));
        }

        if profile.length >= 1 {
            let next_residue = sequence.residue(row + 1);
            let into_m1 = profile.tsc(0, Transition::MM) + profile.match_score(1, next_residue) + dp.mat(row + 1, 1);
            dp.set_special(row, SPECIAL_B, into_m1);
        }
        dp.set_special(
            row,
            SPECIAL_J,
            logsum(
                dp.special(row + 1, SPECIAL_J) + profile.special_score(SpecialState::J, false),
                dp.special(row, SPECIAL_B) + profile.special_score(SpecialState::J, true),
            ),
        );
        dp.set_special(
            row,
            SPECIAL_N,
            logsum(
                dp.special(row + 1, SPECIAL_N) + profile.special_score(SpecialState::N, false),
                dp.special(row, SPECIAL_B) + profile.special_score(SpecialState::N, true),
            ),
        );
        dp.set_special(
            row,
            SPECIAL_E,
            logsum(
                dp.special(row, SPECIAL_J) + profile.special_score(SpecialState::E, false),
                dp.special(row, SPECIAL_C) + profile.special_score(SpecialState::E, true),
            ),
        );
    }

    let score = dp.special(0, SPECIAL_N);
    (dp, score)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_profile_and_sequence() -> (Profile, Sequence) {
        let diag = 0.8f32.ln();
        let off = 0.01f32.ln();
        let mut profile = Profile::constant_test_profile(6, diag, off, 0.9f32.ln(), 0.02f32.ln());
        let sequence = Sequence::from_utf8(b"ACDEFG").unwrap();
        profile.configure_for_target_length(sequence.length);
        (profile, sequence)
    }

    #[test]
    fn forward_and_backward_totals_agree() {
        let (profile, sequence) = tiny_profile_and_sequence();
        let (_, fwd) = dense_forward(&profile, &sequence);
        let (_, bck) = dense_backward(&profile, &sequence);
        assert!((fwd - bck).abs() < 1e-2, "forward={fwd} backward={bck}");
    }

    #[test]
    fn forward_score_is_finite() {
        let (profile, sequence) = tiny_profile_and_sequence();
        let (_, fwd) = dense_forward(&profile, &sequence);
        assert!(fwd.is_finite());
    }
}
