use super::hmm::RawHmm;
use super::{digitize_residue, ALPHABET_SIZE};

/// The seven position-to-position transitions a profile-HMM position
/// carries, per spec.md §3.
#[derive(Debug, Clone, Copy, Default)]
pub struct Transitions {
    pub m_to_m: f32,
    pub m_to_i: f32,
    pub m_to_d: f32,
    pub i_to_m: f32,
    pub i_to_i: f32,
    pub d_to_m: f32,
    pub d_to_d: f32,
}

/// One of the seven transitions, used to index `Profile::tsc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    MM,
    MI,
    MD,
    IM,
    II,
    DM,
    DD,
}

impl Transitions {
    #[inline]
    pub fn get(&self, t: Transition) -> f32 {
        match t {
            Transition::MM => self.m_to_m,
            Transition::MI => self.m_to_i,
            Transition::MD => self.m_to_d,
            Transition::IM => self.i_to_m,
            Transition::II => self.i_to_i,
            Transition::DM => self.d_to_m,
            Transition::DD => self.d_to_d,
        }
    }
}

/// The five flanking/special states, per spec.md §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialState {
    N = 0,
    B = 1,
    E = 2,
    J = 3,
    C = 4,
}

pub const NUM_SPECIAL_STATES: usize = 5;

/// `{loop, move}` log-probabilities for one special state.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpecialTrans {
    pub loop_score: f32,
    pub move_score: f32,
}

/// A profile-HMM, `H` in spec.md §3: positions `1..=length`, each
/// carrying match/insert emissions and the seven transitions, plus the
/// five special-state transitions and an `is_local` flag selecting local
/// vs. glocal termination semantics. All values are natural-log,
/// `-inf` is the impossible sentinel.
#[derive(Debug, Clone)]
pub struct Profile {
    pub name: String,
    pub accession: String,
    pub length: usize,
    pub is_local: bool,
    pub consensus_sequence: Vec<u8>,
    pub match_emit: Vec<[f32; ALPHABET_SIZE]>,
    pub insert_emit: Vec<[f32; ALPHABET_SIZE]>,
    pub transitions: Vec<Transitions>,
    pub special: [SpecialTrans; NUM_SPECIAL_STATES],
    /// The sequence length this profile's special-state transitions were
    /// last configured for (`configure_for_target_length`).
    pub target_length: usize,
}

impl Profile {
    /// Builds a `Profile` from a parsed HMMER3/f model. Raw file values
    /// are negated log-probabilities (`*` => `+inf` meaning impossible);
    /// this flips the sign into the natural-log, `-inf`-sentinel
    /// convention the rest of the core expects.
    pub fn new(raw: &RawHmm) -> Self {
        let consensus_sequence = std::iter::once(0u8)
            .chain((1..=raw.length).map(|pos| {
                let (idx, _) = raw.match_emit[pos]
                    .iter()
                    .enumerate()
                    .fold((0usize, f32::INFINITY), |best, (i, &v)| {
                        if v < best.1 {
                            (i, v)
                        } else {
                            best
                        }
                    });
                crate::structs::AMINO_ALPHABET
                    .get(idx)
                    .copied()
                    .unwrap_or(b'X')
            }))
            .collect();

        let negate_row = |row: &[f32; ALPHABET_SIZE]| -> [f32; ALPHABET_SIZE] {
            let mut out = [0.0f32; ALPHABET_SIZE];
            for (o, v) in out.iter_mut().zip(row.iter()) {
                *o = if v.is_infinite() { f32::NEG_INFINITY } else { -v };
            }
            out
        };

        let match_emit = raw.match_emit.iter().map(negate_row).collect();
        let insert_emit = raw.insert_emit.iter().map(negate_row).collect();

        let transitions = raw
            .transitions
            .iter()
            .map(|t| {
                let n = |v: f32| if v.is_infinite() { f32::NEG_INFINITY } else { -v };
                Transitions {
                    m_to_m: n(t[0]),
                    m_to_i: n(t[1]),
                    m_to_d: n(t[2]),
                    i_to_m: n(t[3]),
                    i_to_i: n(t[4]),
                    d_to_m: n(t[5]),
                    d_to_d: n(t[6]),
                }
            })
            .collect();

        Profile {
            name: raw.name.clone(),
            accession: raw.accession.clone(),
            length: raw.length,
            is_local: true,
            consensus_sequence,
            match_emit,
            insert_emit,
            transitions,
            special: [SpecialTrans::default(); NUM_SPECIAL_STATES],
            target_length: 0,
        }
    }

    /// Builds a length-`length` profile with constant emissions/transitions;
    /// `diagonal_score`/`off_diagonal_score` are applied to `match_emit` with
    /// the `idx`-th position's own consensus residue getting the diagonal
    /// score (used by spec.md §8 scenario S1/S2's "tiny identity" profile).
    pub fn constant_test_profile(
        length: usize,
        diagonal_score: f32,
        off_diagonal_score: f32,
        match_to_match: f32,
        other_transition: f32,
    ) -> Self {
        let mut match_emit = vec![[off_diagonal_score; ALPHABET_SIZE]; length + 1];
        let mut consensus_sequence = vec![0u8];
        for pos in 1..=length {
            let residue = (pos - 1) % super::NUM_AMINO;
            match_emit[pos][residue] = diagonal_score;
            consensus_sequence.push(crate::structs::AMINO_ALPHABET[residue]);
        }

        let transitions = vec![
            Transitions {
                m_to_m: match_to_match,
                m_to_i: other_transition,
                m_to_d: other_transition,
                i_to_m: other_transition,
                i_to_i: other_transition,
                d_to_m: other_transition,
                d_to_d: other_transition,
            };
            length + 1
        ];

        let mut profile = Profile {
            name: "test".to_string(),
            accession: "TEST".to_string(),
            length,
            is_local: true,
            consensus_sequence,
            match_emit,
            insert_emit: vec![[0.0f32; ALPHABET_SIZE]; length + 1],
            transitions,
            special: [SpecialTrans::default(); NUM_SPECIAL_STATES],
            target_length: 0,
        };
        profile.configure_for_target_length(length);
        profile
    }

    /// Recomputes the length-dependent special-state transitions for a
    /// sequence of the given length, using the standard unihit-local
    /// HMMER recurrences. Ambient/supplementary (spec.md §3 only
    /// requires that special transitions exist, not their exact formula).
    pub fn configure_for_target_length(&mut self, length: usize) {
        self.target_length = length;
        let l = length.max(1) as f32;

        let nj_loop = (l / (l + 2.0)).ln();
        let nj_move = (2.0 / (l + 2.0)).ln();

        self.special[SpecialState::N as usize] = SpecialTrans {
            loop_score: nj_loop,
            move_score: nj_move,
        };
        self.special[SpecialState::C as usize] = SpecialTrans {
            loop_score: nj_loop,
            move_score: nj_move,
        };
        self.special[SpecialState::J as usize] = SpecialTrans {
            loop_score: nj_loop,
            move_score: f32::NEG_INFINITY, // unihit: no second pass through the model
        };
        self.special[SpecialState::B as usize] = SpecialTrans {
            loop_score: f32::NEG_INFINITY,
            move_score: 0.0,
        };
        self.special[SpecialState::E as usize] = SpecialTrans {
            loop_score: f32::NEG_INFINITY,
            move_score: 0.0,
        };
    }

    #[inline]
    pub fn match_score(&self, position: usize, residue: u8) -> f32 {
        self.match_emit[position][residue as usize]
    }

    #[inline]
    pub fn insert_score(&self, position: usize, residue: u8) -> f32 {
        self.insert_emit[position][residue as usize]
    }

    #[inline]
    pub fn msc(&self, position: usize, residue_char: u8) -> f32 {
        self.match_score(position, digitize_residue(residue_char) as u8)
    }

    #[inline]
    pub fn tsc(&self, position: usize, t: Transition) -> f32 {
        self.transitions[position].get(t)
    }

    #[inline]
    pub fn special_score(&self, state: SpecialState, is_move: bool) -> f32 {
        let s = &self.special[state as usize];
        if is_move {
            s.move_score
        } else {
            s.loop_score
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_test_profile_has_diagonal_match_scores() {
        let diag = 0.5f32.ln();
        let off = 0.05f32.ln();
        let p = Profile::constant_test_profile(5, diag, off, 0.9f32.ln(), 0.025f32.ln());
        assert_eq!(p.length, 5);
        assert_eq!(p.match_emit[1][0], diag);
        assert_eq!(p.match_emit[1][1], off);
    }

    #[test]
    fn configure_for_target_length_is_finite_for_nonzero_length() {
        let mut p = Profile::constant_test_profile(3, 0.0, -1.0, -0.1, -3.0);
        p.configure_for_target_length(10);
        assert!(p.special[SpecialState::N as usize].loop_score.is_finite());
        assert!(p.special[SpecialState::N as usize].move_score.is_finite());
    }
}
