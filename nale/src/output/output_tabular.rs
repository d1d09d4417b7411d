use std::io::{self, Write};

use crate::structs::Alignment;

/// Writes one tab-separated row per alignment (`Alignment::tab_string`),
/// the m8-style report format the `mmoreseqs` CLI produces as its
/// `results.tsv`.
pub fn write_tabular_output<W: Write>(alignments: &[Alignment], writer: &mut W) -> io::Result<()> {
    for alignment in alignments {
        writeln!(writer, "{}", alignment.tab_string())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::alignment::ScoreParams;
    use crate::structs::{Profile, Sequence, Trace};

    #[test]
    fn writes_one_line_per_alignment() {
        let profile = Profile::constant_test_profile(4, 0.0, -1.0, -0.1, -3.0);
        let sequence = Sequence::from_utf8(b"ACDE").unwrap();
        let params = ScoreParams::new(10);
        let trace = Trace::new(4, 4);
        let alignments = vec![
            Alignment::from_trace(&trace, &profile, &sequence, &params),
            Alignment::from_trace(&trace, &profile, &sequence, &params),
        ];

        let mut buf: Vec<u8> = Vec::new();
        write_tabular_output(&alignments, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
