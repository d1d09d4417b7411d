use super::profile::Profile;
use super::sequence::Sequence;
use super::trace::{State, Trace};

/// The pieces needed to convert a Bounded Forward score (a raw nats
/// log-probability, per spec.md §4.6) into a reported bit score and
/// e-value. Ambient/supplementary: not part of the CORE's contract.
#[derive(Debug, Clone, Copy)]
pub struct ScoreParams {
    pub database_size: usize,
    pub forward_score_nats: f32,
    pub null_score_nats: f32,
    pub bias_correction_score_nats: f32,
}

impl ScoreParams {
    pub fn new(database_size: usize) -> Self {
        ScoreParams {
            database_size,
            forward_score_nats: f32::NEG_INFINITY,
            null_score_nats: 0.0,
            bias_correction_score_nats: 0.0,
        }
    }

    /// `(forward - null - bias) / ln(2)`, converting nats to bits, per
    /// spec.md §4.6 ("the caller is responsible for converting to bits
    /// ... and subtracting a null-model score").
    pub fn bit_score(&self) -> f32 {
        (self.forward_score_nats - self.null_score_nats - self.bias_correction_score_nats)
            / std::f32::consts::LN_2
    }

    /// Classic HMMER approximate e-value: `database_size * 2^-bit_score`.
    pub fn evalue(&self) -> f64 {
        self.database_size as f64 * 2f64.powf(-self.bit_score() as f64)
    }
}

/// A reported hit: the profile/sequence coordinates of the alignment and
/// its statistical significance.
#[derive(Debug, Clone)]
pub struct Alignment {
    pub query_name: String,
    pub target_name: String,
    pub profile_start: usize,
    pub profile_end: usize,
    pub target_start: usize,
    pub target_end: usize,
    pub bit_score: f32,
    pub evalue: f64,
}

impl Alignment {
    pub fn from_trace(
        trace: &Trace,
        profile: &Profile,
        sequence: &Sequence,
        score_params: &ScoreParams,
    ) -> Self {
        let (profile_start, profile_end, target_start, target_end) =
            match trace.first_and_last_match() {
                Some((first, last)) => (first.j, last.j, first.i, last.i),
                None => (0, 0, 0, 0),
            };

        Alignment {
            query_name: profile.accession.clone(),
            target_name: sequence.name.clone(),
            profile_start,
            profile_end,
            target_start,
            target_end,
            bit_score: score_params.bit_score(),
            evalue: score_params.evalue(),
        }
    }

    /// An m8-style tab-separated row: `query target qstart qend tstart tend evalue bitscore`.
    pub fn tab_string(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{:e}\t{:.1}",
            self.query_name,
            self.target_name,
            self.profile_start,
            self.profile_end,
            self.target_start,
            self.target_end,
            self.evalue,
            self.bit_score,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_score_subtracts_null_and_bias() {
        let params = ScoreParams {
            database_size: 1000,
            forward_score_nats: 10.0,
            null_score_nats: 2.0,
            bias_correction_score_nats: 1.0,
        };
        let expected = (10.0 - 2.0 - 1.0) / std::f32::consts::LN_2;
        assert!((params.bit_score() - expected).abs() < 1e-6);
    }

    #[test]
    fn trace_with_no_matches_yields_zeroed_coordinates() {
        let trace = Trace::new(5, 5);
        let profile = Profile::constant_test_profile(5, 0.0, -1.0, -0.1, -3.0);
        let sequence = Sequence::from_utf8(b"ACDEF").unwrap();
        let params = ScoreParams::new(100);
        let alignment = Alignment::from_trace(&trace, &profile, &sequence, &params);
        assert_eq!(alignment.profile_start, 0);
        assert_eq!(alignment.target_start, 0);
    }

    #[test]
    fn trace_coordinates_come_from_first_and_last_match() {
        let mut trace = Trace::new(5, 5);
        trace.push(State::M, 2, 1);
        trace.push(State::M, 3, 2);
        trace.push(State::M, 4, 3);
        let profile = Profile::constant_test_profile(5, 0.0, -1.0, -0.1, -3.0);
        let sequence = Sequence::from_utf8(b"ACDEF").unwrap();
        let params = ScoreParams::new(100);
        let alignment = Alignment::from_trace(&trace, &profile, &sequence, &params);
        assert_eq!(alignment.target_start, 2);
        assert_eq!(alignment.target_end, 4);
        assert_eq!(alignment.profile_start, 1);
        assert_eq!(alignment.profile_end, 3);
    }
}
