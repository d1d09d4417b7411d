pub mod alignment;
pub mod dp_matrix;
pub mod hmm;
pub mod profile;
pub mod sequence;
pub mod trace;

pub use alignment::Alignment;
pub use dp_matrix::DpMatrixFlat;
pub use profile::Profile;
pub use sequence::Sequence;
pub use trace::Trace;

/// Number of standard amino acid residues (spec.md §3: "K=20 for amino
/// acids"), plus one trailing column for every residue the digitizer
/// doesn't recognize ('X', 'B', 'Z', gap characters, ...).
pub const NUM_AMINO: usize = 20;
pub const UNKNOWN_RESIDUE: usize = NUM_AMINO;
pub const ALPHABET_SIZE: usize = NUM_AMINO + 1;

pub const AMINO_ALPHABET: [u8; NUM_AMINO] = *b"ACDEFGHIKLMNPQRSTVWY";

/// Map an ASCII residue character to its digital index in `0..ALPHABET_SIZE`.
#[inline]
pub fn digitize_residue(c: u8) -> usize {
    let upper = c.to_ascii_uppercase();
    AMINO_ALPHABET
        .iter()
        .position(|&a| a == upper)
        .unwrap_or(UNKNOWN_RESIDUE)
}
