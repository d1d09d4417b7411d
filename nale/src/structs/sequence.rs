use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

use super::digitize_residue;

#[derive(Error, Debug)]
pub enum SequenceError {
    #[error("failed to read fasta file: {0}")]
    Io(#[from] std::io::Error),
    #[error("fasta file contained no records")]
    Empty,
    #[error("fasta record is missing a header line")]
    MissingHeader,
}

/// An ordered sequence of residue indices in `0..ALPHABET_SIZE` (spec.md
/// §3). `digital_bytes` is 1-indexed: `digital_bytes[0]` is an unused
/// sentinel and valid residues live at `1..=length`, matching the
/// 1-indexed convention `Profile` and the DP recurrences use throughout.
#[derive(Debug, Clone, Default)]
pub struct Sequence {
    pub name: String,
    pub length: usize,
    pub digital_bytes: Vec<u8>,
}

impl Sequence {
    fn from_residues(name: String, residues: &[u8]) -> Self {
        let mut digital_bytes = Vec::with_capacity(residues.len() + 1);
        digital_bytes.push(0);
        digital_bytes.extend(residues.iter().map(|&c| digitize_residue(c) as u8));
        Sequence {
            name,
            length: residues.len(),
            digital_bytes,
        }
    }

    /// Builds a `Sequence` from raw (undigitized) ASCII residue bytes.
    pub fn from_utf8(bytes: &[u8]) -> Result<Self, SequenceError> {
        Ok(Self::from_residues(String::new(), bytes))
    }

    /// Builds a `Sequence` from bytes that are already digital residue
    /// indices (as extracted from an MMseqs2 profile consensus column).
    pub fn from_digital(bytes: &[u8]) -> Result<Self, SequenceError> {
        let mut digital_bytes = Vec::with_capacity(bytes.len() + 1);
        digital_bytes.push(0);
        digital_bytes.extend_from_slice(bytes);
        Ok(Sequence {
            name: String::new(),
            length: bytes.len(),
            digital_bytes,
        })
    }

    /// Parses every FASTA record in `path` into a digitized `Sequence`.
    pub fn amino_from_fasta(path: impl AsRef<Path>) -> Result<Vec<Self>, SequenceError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut sequences = Vec::new();
        let mut current_name: Option<String> = None;
        let mut current_residues: Vec<u8> = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if let Some(rest) = line.strip_prefix('>') {
                if let Some(name) = current_name.take() {
                    sequences.push(Self::from_residues(name, &current_residues));
                    current_residues.clear();
                }
                let name = rest.split_whitespace().next().unwrap_or("").to_string();
                current_name = Some(name);
            } else {
                current_residues.extend(line.trim().bytes());
            }
        }

        match current_name {
            Some(name) => sequences.push(Self::from_residues(name, &current_residues)),
            None if sequences.is_empty() => return Err(SequenceError::MissingHeader),
            None => {}
        }

        if sequences.is_empty() {
            return Err(SequenceError::Empty);
        }

        Ok(sequences)
    }

    /// The digital residue at 1-indexed position `i`.
    #[inline]
    pub fn residue(&self, i: usize) -> u8 {
        self.digital_bytes[i]
    }
}
