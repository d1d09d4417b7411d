use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::Mutex;

use crate::pipeline::seed::SeedMap;
use crate::Args;

use anyhow::Context;

use nale::align::bounded::structs::{CloudMatrixLinear, CloudSearchParams, Seed};
use nale::align::bounded::{
    backward_bounded, build_row_bounds, forward_bounded, null1_score, null2_score,
    optimal_accuracy_bounded, posterior_bounded, traceback_bounded,
};
use nale::output::path_buf_ext::PathBufExt;
use nale::structs::alignment::ScoreParams;
use nale::structs::hmm::parse_hmms_from_p7hmm_file;
use nale::structs::{Alignment, Profile, Sequence};

use rayon::prelude::*;
use thread_local::ThreadLocal;

/// Runs Bounded Forward/Backward for every (profile, seed) pair and
/// streams the surviving hits straight to `args.paths.results`.
///
/// Each thread keeps its own `CloudMatrixLinear` scratch buffer, reused
/// across seeds via `ThreadLocal`; the per-seed sparse matrices are
/// allocated fresh since their size tracks the pruned cloud rather than
/// the full DP grid, so there's nothing worth pooling there. A single
/// mutex-guarded writer collects results, so memory use stays
/// proportional to one cloud at a time rather than the whole hit count.
pub fn align(args: &Args, profiles: Option<Vec<Profile>>, seed_map: Option<SeedMap>) -> anyhow::Result<()> {
    let profiles = match profiles {
        // if we happened to run the seed step before this, the profiles
        // will already be in memory
        Some(profiles) => profiles,
        None => {
            let hmms = parse_hmms_from_p7hmm_file(args.paths.query.to_str().unwrap())?;
            hmms.iter().map(Profile::new).collect()
        }
    };

    let seed_map = match seed_map {
        Some(seed_map) => seed_map,
        None => {
            let seeds_string = std::fs::read_to_string(&args.paths.seeds).context(format!(
                "failed to read alignment seeds file: {}",
                &args.paths.seeds.to_string_lossy(),
            ))?;
            serde_json::from_str::<SeedMap>(&seeds_string).context(format!(
                "failed to parse alignment seeds file: {}",
                &args.paths.seeds.to_string_lossy(),
            ))?
        }
    };

    let targets = Sequence::amino_from_fasta(&args.paths.target)?;
    let database_size = targets.len();
    let mut target_map: HashMap<String, Sequence> = HashMap::new();
    for target in targets {
        target_map.insert(target.name.clone(), target);
    }

    let mut profiles = profiles;
    let mut profile_seed_pairs: Vec<(&mut Profile, &Vec<Seed>)> = vec![];
    for profile in profiles.iter_mut() {
        if let Some(seeds) = seed_map.get(&profile.accession) {
            profile_seed_pairs.push((profile, seeds));
        }
    }

    let results_writer: Mutex<BufWriter<File>> = Mutex::new(
        args.paths
            .results
            .open(true)
            .context("failed to open results file for writing")?,
    );

    tracing::info!(
        profiles = profile_seed_pairs.len(),
        "aligning seeded profiles"
    );

    let tl_cloud_matrix: ThreadLocal<RefCell<CloudMatrixLinear>> = ThreadLocal::new();
    let params = CloudSearchParams::default();

    profile_seed_pairs.into_par_iter().for_each(|(profile, seeds)| {
        for seed in seeds {
            let target = match target_map.get(&seed.target_name[..]) {
                Some(target) => target,
                None => continue,
            };
            profile.configure_for_target_length(target.length);

            let mut cloud_matrix = tl_cloud_matrix
                .get_or(|| RefCell::new(CloudMatrixLinear::new(target.length, profile.length)))
                .borrow_mut();
            cloud_matrix.reuse(target.length, profile.length);

            let row_bounds = build_row_bounds(profile, target, seed, &mut cloud_matrix, &params);
            if !row_bounds.valid() {
                continue;
            }

            let (forward, _, forward_score) = forward_bounded(profile, target, &row_bounds);
            let (backward, _, _) = backward_bounded(profile, target, &row_bounds);
            let posterior = posterior_bounded(&forward, &backward, &row_bounds, forward_score);

            let mut score_params = ScoreParams::new(database_size);
            score_params.forward_score_nats = forward_score;
            score_params.null_score_nats = null1_score(target.length);
            score_params.bias_correction_score_nats = null2_score(profile, target, &posterior, &row_bounds);

            let (accuracy, best_cell) = optimal_accuracy_bounded(&posterior, &row_bounds);
            let trace = traceback_bounded(&accuracy, best_cell);

            let alignment = Alignment::from_trace(&trace, profile, target, &score_params);
            if alignment.evalue > args.evalue_cutoff {
                continue;
            }

            let mut writer = results_writer.lock().unwrap();
            let _ = writeln!(writer, "{}", alignment.tab_string());
        }
    });

    Ok(())
}
