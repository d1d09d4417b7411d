//! Ambient/supplementary DP stages layered on top of Bounded
//! Forward/Backward: posterior decoding, an optimal-accuracy traceback,
//! and the null1/null2 score corrections the `mmoreseqs` pipeline applies
//! before reporting a bit score (SPEC_FULL.md's "Supplementary features"
//! section, grounded in `fb-pruner`'s `posterior_quad.c` /
//! `optimal_accuracy_quad.c` / `null1_quad.c` / `bias_correction_quad.c`).

use crate::structs::trace::State;
use crate::structs::{Profile, Sequence, Trace};

use super::structs::{DpMatrixSparse, RowBounds};

/// Converts a Forward/Backward pair into per-cell posterior
/// probabilities (`exp(fwd + bck - total)`, clamped to `[0,1]`). The
/// returned `DpMatrixSparse` stores probabilities, not log-odds, in its
/// `mat`/`ins`/`del` fields.
pub fn posterior_bounded(
    forward: &DpMatrixSparse,
    backward: &DpMatrixSparse,
    row_bounds: &RowBounds,
    forward_total_score: f32,
) -> DpMatrixSparse {
    let mut posterior = DpMatrixSparse::new(forward.query_length(), forward.profile_length(), row_bounds);

    for row in row_bounds.active_rows() {
        for b in row_bounds.row(row) {
            for j in b.lb..b.rb {
                let p_mat = (forward.mat(row, j) + backward.mat(row, j) - forward_total_score)
                    .exp()
                    .clamp(0.0, 1.0);
                let p_ins = (forward.ins(row, j) + backward.ins(row, j) - forward_total_score)
                    .exp()
                    .clamp(0.0, 1.0);
                let p_del = (forward.del(row, j) + backward.del(row, j) - forward_total_score)
                    .exp()
                    .clamp(0.0, 1.0);
                posterior.set_mat(row, j, p_mat);
                posterior.set_ins(row, j, p_ins);
                posterior.set_del(row, j, p_del);
            }
        }
    }

    posterior
}

/// One cell of the optimal-accuracy traceback frontier.
#[derive(Debug, Clone, Copy)]
struct BestCell {
    row: usize,
    col: usize,
    value: f32,
}

/// Maximum-expected-accuracy DP over the posterior matrix (Durbin/Eddy
/// posterior decoding): `ACC_M(i,j) = post.mat(i,j) + max(predecessors)`,
/// `ACC_D` carries no posterior weight (deletions don't align a residue
/// pair). Returns the accuracy matrix and the best-scoring end cell.
pub fn optimal_accuracy_bounded(
    posterior: &DpMatrixSparse,
    row_bounds: &RowBounds,
) -> (DpMatrixSparse, (usize, usize)) {
    let query_length = posterior.query_length();
    let mut acc = DpMatrixSparse::new(query_length, posterior.profile_length(), row_bounds);
    let mut best = BestCell {
        row: 0,
        col: 0,
        value: f32::NEG_INFINITY,
    };

    for row in 0..=query_length {
        for b in row_bounds.row(row) {
            for j in b.lb..b.rb {
                let entry = if j == 1 { 0.0 } else { f32::NEG_INFINITY };
                let m_pred = acc
                    .mat(row.wrapping_sub(1), j.wrapping_sub(1))
                    .max(acc.ins(row.wrapping_sub(1), j.wrapping_sub(1)))
                    .max(acc.del(row.wrapping_sub(1), j.wrapping_sub(1)))
                    .max(entry);
                let m_val = posterior.mat(row, j) + m_pred;

                let i_pred = acc.mat(row.wrapping_sub(1), j).max(acc.ins(row.wrapping_sub(1), j));
                let i_val = posterior.ins(row, j) + i_pred;

                let d_val = acc.mat(row, j.wrapping_sub(1)).max(acc.del(row, j.wrapping_sub(1)));

                acc.set_mat(row, j, m_val);
                acc.set_ins(row, j, i_val);
                acc.set_del(row, j, d_val);

                let cell_best = m_val.max(i_val).max(d_val);
                if cell_best > best.value {
                    best = BestCell { row, col: j, value: cell_best };
                }
            }
        }
    }

    (acc, (best.row, best.col))
}

/// Reconstructs a `Trace` from the optimal-accuracy matrix by
/// recomputing, at each step, which predecessor achieved the stored
/// value (no separate traceback-pointer matrix is kept).
pub fn traceback_bounded(acc: &DpMatrixSparse, start: (usize, usize)) -> Trace {
    let mut trace = Trace::new(acc.query_length(), acc.profile_length());
    let (mut row, mut col) = start;

    let starting_value = acc.mat(row, col).max(acc.ins(row, col)).max(acc.del(row, col));
    let mut state = if (acc.mat(row, col) - starting_value).abs() < f32::EPSILON {
        State::M
    } else if (acc.ins(row, col) - starting_value).abs() < f32::EPSILON {
        State::I
    } else {
        State::D
    };

    loop {
        if row == 0 && col == 0 {
            break;
        }
        trace.push(state, row, col);

        match state {
            State::M => {
                if row == 0 || col == 0 {
                    break;
                }
                let entry = if col == 1 { 0.0 } else { f32::NEG_INFINITY };
                let prev_row = row - 1;
                let prev_col = col - 1;
                let candidates = [
                    (State::M, acc.mat(prev_row, prev_col)),
                    (State::I, acc.ins(prev_row, prev_col)),
                    (State::D, acc.del(prev_row, prev_col)),
                    (State::B, entry),
                ];
                let (next_state, _) = candidates
                    .into_iter()
                    .max_by(|a, b| a.1.total_cmp(&b.1))
                    .unwrap_or((State::B, f32::NEG_INFINITY));
                row = prev_row;
                col = prev_col;
                if next_state == State::B {
                    break;
                }
                state = next_state;
            }
            State::I => {
                if row == 0 {
                    break;
                }
                let prev_row = row - 1;
                let candidates = [
                    (State::M, acc.mat(prev_row, col)),
                    (State::I, acc.ins(prev_row, col)),
                ];
                let (next_state, _) = candidates
                    .into_iter()
                    .max_by(|a, b| a.1.total_cmp(&b.1))
                    .unwrap();
                row = prev_row;
                state = next_state;
            }
            State::D => {
                if col == 0 {
                    break;
                }
                let prev_col = col - 1;
                let candidates = [
                    (State::M, acc.mat(row, prev_col)),
                    (State::D, acc.del(row, prev_col)),
                ];
                let (next_state, _) = candidates
                    .into_iter()
                    .max_by(|a, b| a.1.total_cmp(&b.1))
                    .unwrap();
                col = prev_col;
                state = next_state;
            }
            _ => break,
        }
    }

    trace.steps.reverse();
    trace
}

/// Standard HMMER null1 correction, in nats: the log-probability of the
/// target sequence under a simple i.i.d. background model with the same
/// expected length (spec.md's ambient scoring layer; grounded in
/// `fb-pruner`'s `null1_quad.c`).
pub fn null1_score(sequence_length: usize) -> f32 {
    let l = sequence_length.max(1) as f32;
    l * (l / (l + 1.0)).ln() + (1.0 / (l + 1.0)).ln()
}

/// Coarse bias correction approximating HMMER's `null2`/composition
/// bias: a posterior-weighted average of `match - insert` emission score
/// across the cloud, scaled down since it's explicitly an approximation
/// (SPEC_FULL.md's "null2/BIAS_CORR_SPARSE as approximation" decision),
/// not the full per-residue mixture HMMER computes.
pub fn null2_score(profile: &Profile, sequence: &Sequence, posterior: &DpMatrixSparse, row_bounds: &RowBounds) -> f32 {
    let mut total = 0.0f32;
    for row in row_bounds.active_rows() {
        if row == 0 {
            continue;
        }
        for b in row_bounds.row(row) {
            for j in b.lb..b.rb {
                let p = posterior.mat(row, j);
                if p > 0.0 {
                    let a = sequence.residue(row);
                    let bias = profile.match_score(j, a) - profile.insert_score(j, a);
                    total += p * bias.max(0.0);
                }
            }
        }
    }
    0.5 * total / (sequence.length.max(1) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::bounded::fwdbck::{backward_bounded, forward_bounded};
    use crate::align::bounded::structs::CloudBoundGroup;

    fn full_row_bounds(query_length: usize, profile_length: usize) -> RowBounds {
        let mut group = CloudBoundGroup::new(query_length, profile_length);
        for i in 1..=query_length {
            group.push(i, 1, profile_length + 1);
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
    fn posterior_probabilities_are_bounded() {
        let (profile, sequence) = tiny_profile_and_sequence();
        let row_bounds = full_row_bounds(sequence.length, profile.length);
        let (fwd, _, total) = forward_bounded(&profile, &sequence, &row_bounds);
        let (bck, _, _) = backward_bounded(&profile, &sequence, &row_bounds);
        let post = posterior_bounded(&fwd, &bck, &row_bounds, total);

        for row in row_bounds.active_rows() {
            for b in row_bounds.row(row) {
                for j in b.lb..b.rb {
                    let p = post.mat(row, j);
                    assert!((0.0..=1.0).contains(&p), "posterior {p} out of range at ({row},{j})");
                }
            }
        }
    }

    #[test]
    fn optimal_accuracy_traceback_starts_and_ends_in_bounds() {
        let (profile, sequence) = tiny_profile_and_sequence();
        let row_bounds = full_row_bounds(sequence.length, profile.length);
        let (fwd, _, total) = forward_bounded(&profile, &sequence, &row_bounds);
        let (bck, _, _) = backward_bounded(&profile, &sequence, &row_bounds);
        let post = posterior_bounded(&fwd, &bck, &row_bounds, total);
        let (acc, best) = optimal_accuracy_bounded(&post, &row_bounds);
        let trace = traceback_bounded(&acc, best);

        assert!(!trace.steps.is_empty());
        for step in &trace.steps {
            assert!(step.i <= sequence.length);
            assert!(step.j <= profile.length);
        }
    }

    #[test]
    fn null1_score_is_finite_and_negative() {
        let score = null1_score(100);
        assert!(score.is_finite());
        assert!(score < 0.0);
    }
}
