//! Plain quadratic global-alignment DP (Needleman-Wunsch).
//!
//! Unrelated to the cloud search; kept because the teacher's pipeline
//! uses it to map MMseqs2 consensus-sequence coordinates onto P7 HMM
//! coordinates (`pipeline.rs::map_p7_to_mmseqs_profiles`) before building
//! alignment seeds. Ambient/supplementary per SPEC_FULL.md.

use crate::structs::Sequence;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleTraceStep {
    Diagonal,
    Up,
    Left,
}

const MATCH_SCORE: i32 = 1;
const MISMATCH_SCORE: i32 = -1;
const GAP_SCORE: i32 = -2;

/// Aligns `a` against `b`, returning the trace from the start to the end
/// of both sequences (an `Up` step consumes a residue of `a` only, a
/// `Left` step consumes a residue of `b` only).
pub fn needleman_wunsch(a: &Sequence, b: &Sequence) -> Vec<SimpleTraceStep> {
    let rows = a.length + 1;
    let cols = b.length + 1;

    let mut score = vec![0i32; rows * cols];
    let idx = |r: usize, c: usize| r * cols + c;

    for r in 0..rows {
        score[idx(r, 0)] = r as i32 * GAP_SCORE;
    }
    for c in 0..cols {
        score[idx(0, c)] = c as i32 * GAP_SCORE;
    }

    for r in 1..rows {
        for c in 1..cols {
            let residue_match = a.residue(r) == b.residue(c);
            let diag_score = score[idx(r - 1, c - 1)]
                + if residue_match {
                    MATCH_SCORE
                } else {
                    MISMATCH_SCORE
                };
            let up_score = score[idx(r - 1, c)] + GAP_SCORE;
            let left_score = score[idx(r, c - 1)] + GAP_SCORE;
            score[idx(r, c)] = diag_score.max(up_score).max(left_score);
        }
    }

    let mut trace = Vec::new();
    let (mut r, mut c) = (rows - 1, cols - 1);
    while r > 0 || c > 0 {
        if r > 0 && c > 0 {
            let residue_match = a.residue(r) == b.residue(c);
            let diag_score = score[idx(r - 1, c - 1)]
                + if residue_match {
                    MATCH_SCORE
                } else {
                    MISMATCH_SCORE
                };
            if score[idx(r, c)] == diag_score {
                trace.push(SimpleTraceStep::Diagonal);
                r -= 1;
                c -= 1;
                continue;
            }
        }
        if r > 0 && score[idx(r, c)] == score[idx(r - 1, c)] + GAP_SCORE {
            trace.push(SimpleTraceStep::Up);
            r -= 1;
        } else {
            trace.push(SimpleTraceStep::Left);
            c -= 1;
        }
    }
    trace.reverse();
    trace
}
