//! Minimal HMMER3/f `.hmm` text-format parser.
//!
//! Scoped out of the pruned-search CORE by spec.md §1 ("file parsing ...
//! is outside the core's responsibility"); kept here because the
//! `mmoreseqs` pipeline needs a `Profile` to hand the core, and the
//! teacher's `pipeline.rs`/`external_steps.rs` call
//! `parse_hmms_from_p7hmm_file` directly. Only the subset of the format
//! needed to populate `Profile` is parsed: `NAME`, `ACC`, `LENG`, the
//! per-position match/insert emission lines and the seven-way transition
//! line. Annotation columns (`MAP`, `CONS`, `RF`, ...) are tolerated but
//! ignored.

use std::fs;
use std::path::Path;

use thiserror::Error;

use super::{ALPHABET_SIZE, NUM_AMINO};

#[derive(Error, Debug)]
pub enum HmmParseError {
    #[error("failed to read hmm file: {0}")]
    Io(#[from] std::io::Error),
    #[error("hmm file is missing required header field: {0}")]
    MissingHeader(&'static str),
    #[error("malformed emission/transition line at position {position}: {line}")]
    MalformedLine { position: usize, line: String },
    #[error("hmm file ended before model was terminated with '//'")]
    UnterminatedModel,
}

/// A parsed HMMER3/f model, still in raw file units (negated natural
/// log-probabilities, `*` mapped to `+inf`), prior to `Profile::new`
/// converting signs into the log-odds convention spec.md §3 requires.
#[derive(Debug, Clone)]
pub struct RawHmm {
    pub name: String,
    pub accession: String,
    pub length: usize,
    /// 1-indexed; `match_emit[0]` is an unused placeholder row.
    pub match_emit: Vec<[f32; ALPHABET_SIZE]>,
    /// 0-indexed; `insert_emit[0]` is the insertion state preceding position 1.
    pub insert_emit: Vec<[f32; ALPHABET_SIZE]>,
    /// 0-indexed, order (M->M, M->I, M->D, I->M, I->I, D->M, D->D).
    pub transitions: Vec<[f32; 7]>,
}

fn parse_value(tok: &str) -> f32 {
    if tok == "*" {
        f32::INFINITY
    } else {
        tok.parse().unwrap_or(f32::INFINITY)
    }
}

fn parse_row(line: &str, count: usize, position: usize) -> Result<Vec<f32>, HmmParseError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < count {
        return Err(HmmParseError::MalformedLine {
            position,
            line: line.to_string(),
        });
    }
    Ok(tokens[..count].iter().map(|t| parse_value(t)).collect())
}

/// Parses every model contained in a HMMER3/f text file.
pub fn parse_hmms_from_p7hmm_file(path: impl AsRef<Path>) -> Result<Vec<RawHmm>, HmmParseError> {
    let text = fs::read_to_string(path)?;
    parse_hmms_from_str(&text)
}

pub fn parse_hmms_from_str(text: &str) -> Result<Vec<RawHmm>, HmmParseError> {
    let mut models = Vec::new();
    let mut lines = text.lines().peekable();

    while lines.peek().is_some() {
        // skip to the next model header
        while let Some(&line) = lines.peek() {
            if line.starts_with("HMMER") {
                break;
            }
            lines.next();
        }
        if lines.peek().is_none() {
            break;
        }

        let mut name = None;
        let mut accession = String::new();
        let mut length = None;

        while let Some(line) = lines.next() {
            if let Some(rest) = line.strip_prefix("NAME") {
                name = Some(rest.trim().to_string());
            } else if let Some(rest) = line.strip_prefix("ACC") {
                accession = rest.trim().to_string();
            } else if let Some(rest) = line.strip_prefix("LENG") {
                length = Some(rest.trim().parse::<usize>().unwrap_or(0));
            } else if line.starts_with("HMM") {
                break;
            }
        }

        let name = name.ok_or(HmmParseError::MissingHeader("NAME"))?;
        let length = length.ok_or(HmmParseError::MissingHeader("LENG"))?;
        let accession = if accession.is_empty() {
            name.clone()
        } else {
            accession
        };

        // transition-label line
        lines.next();

        let mut match_emit = vec![[0.0f32; ALPHABET_SIZE]; length + 1];
        let mut insert_emit = vec![[0.0f32; ALPHABET_SIZE]; length + 1];
        let mut transitions = vec![[0.0f32; 7]; length + 1];

        // position-0 block: optional COMPO line is skipped, then the
        // insert-emission + transition lines for the begin state.
        if let Some(&line) = lines.peek() {
            if line.trim_start().starts_with("COMPO") {
                lines.next();
            }
        }
        if let Some(line) = lines.next() {
            let row = parse_row(line, NUM_AMINO, 0)?;
            for (i, v) in row.iter().enumerate() {
                insert_emit[0][i] = *v;
            }
        }
        if let Some(line) = lines.next() {
            let row = parse_row(line, 7, 0)?;
            transitions[0].copy_from_slice(&row);
        }

        for pos in 1..=length {
            let match_line = lines
                .next()
                .ok_or(HmmParseError::UnterminatedModel)?;
            let row = parse_row(match_line, NUM_AMINO, pos)?;
            for (i, v) in row.iter().enumerate() {
                match_emit[pos][i] = *v;
            }

            let insert_line = lines
                .next()
                .ok_or(HmmParseError::UnterminatedModel)?;
            let row = parse_row(insert_line, NUM_AMINO, pos)?;
            for (i, v) in row.iter().enumerate() {
                insert_emit[pos][i] = *v;
            }

            let transition_line = lines
                .next()
                .ok_or(HmmParseError::UnterminatedModel)?;
            let row = parse_row(transition_line, 7, pos)?;
            transitions[pos].copy_from_slice(&row);
        }

        // consume until model terminator
        for line in lines.by_ref() {
            if line.trim() == "//" {
                break;
            }
        }

        models.push(RawHmm {
            name,
            accession,
            length,
            match_emit,
            insert_emit,
            transitions,
        });
    }

    Ok(models)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TINY_HMM: &str = "\
HMMER3/f [3.3.2]
NAME  tiny
ACC   TINY01
LENG  2
HMM          A        C
            m->m     m->i     m->d     i->m     i->i     d->m     d->d
  COMPO   2.0      3.0
          1.0      1.0
          0.1      3.0      3.0      1.0      0.5      0.0      *
    1   0.2      4.0
        1.0      1.0
        0.1      3.0      3.0      1.0      0.5      0.0      *
    2   4.0      0.2
        1.0      1.0
        0.0      *        *        0.0      *        *        *
//
";

    #[test]
    fn parses_a_minimal_model() {
        let models = parse_hmms_from_str(TINY_HMM).unwrap();
        assert_eq!(models.len(), 1);
        let m = &models[0];
        assert_eq!(m.name, "tiny");
        assert_eq!(m.accession, "TINY01");
        assert_eq!(m.length, 2);
        assert_eq!(m.match_emit[1][0], 0.2);
        assert_eq!(m.match_emit[2][1], 0.2);
        assert!(m.transitions[2][1].is_infinite());
    }

    #[test]
    fn missing_header_is_an_error() {
        let bad = "HMMER3/f [3.3.2]\nLENG 2\n";
        let err = parse_hmms_from_str(bad).unwrap_err();
        assert!(matches!(err, HmmParseError::MissingHeader("NAME")));
    }
}
