//! The pruned antidiagonal cloud search and the bounded Forward/Backward
//! recurrences it feeds, spec.md §4. This is the crate's CORE: everything
//! else in `nale` exists to produce a `Profile`/`Sequence`/`Seed` for this
//! module to consume, or to turn its output into a reported hit.

pub mod cloud_search;
pub mod fwdbck;
pub mod posterior;
pub mod pruning;
pub mod reorient;
pub mod structs;

pub use cloud_search::{cloud_search_backward, cloud_search_forward};
pub use fwdbck::{backward_bounded, forward_bounded, SpecialTrajectory};
pub use posterior::{null1_score, null2_score, optimal_accuracy_bounded, posterior_bounded, traceback_bounded};
pub use structs::{
    CloudBoundGroup, CloudMatrixLinear, CloudSearchParams, DpMatrixSparse, Edgebound, EdgebSet, EdgeboundRows,
    Orientation, PruningVariant, RowBounds, Seed,
};

use crate::structs::{Profile, Sequence};

/// Runs the full pruned-search pipeline for one seed: forward sweep,
/// backward sweep, union the two diagonal clouds, and reproject into row
/// orientation. This is the entry point the `mmoreseqs` pipeline calls
/// per (profile, sequence, seed) triple (spec.md §4's overall data flow).
pub fn build_row_bounds(
    profile: &Profile,
    sequence: &Sequence,
    seed: &Seed,
    cloud_matrix: &mut CloudMatrixLinear,
    params: &CloudSearchParams,
) -> RowBounds {
    let mut forward_bounds = CloudBoundGroup::new(sequence.length, profile.length);
    let mut backward_bounds = CloudBoundGroup::new(sequence.length, profile.length);

    cloud_search_forward(profile, sequence, seed, cloud_matrix, params, &mut forward_bounds);
    forward_bounds.finalize();

    cloud_search_backward(profile, sequence, seed, cloud_matrix, params, &mut backward_bounds);
    backward_bounds.finalize();

    CloudBoundGroup::join_bounds(&mut forward_bounds, &backward_bounds);
    forward_bounds.trim_wings();

    RowBounds::new(&forward_bounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::Sequence;

    #[test]
    fn build_row_bounds_produces_a_valid_cloud_around_the_seed() {
        let diag = 0.7f32.ln();
        let off = 0.02f32.ln();
        let mut profile = crate::structs::Profile::constant_test_profile(20, diag, off, 0.9f32.ln(), 0.02f32.ln());
        let sequence = Sequence::from_utf8(b"ACDEFGHIKLMNPQRSTVWY").unwrap();
        profile.configure_for_target_length(sequence.length);

        let seed = Seed {
            target_name: "t".into(),
            target_start: 10,
            target_end: 10,
            profile_start: 10,
            profile_end: 10,
        };

        let mut cloud_matrix = CloudMatrixLinear::new(sequence.length, profile.length);
        let params = CloudSearchParams::default();
        let row_bounds = build_row_bounds(&profile, &sequence, &seed, &mut cloud_matrix, &params);

        assert!(row_bounds.valid());
        assert!(row_bounds.row(10).iter().any(|b| b.contains(10)));
    }
}
