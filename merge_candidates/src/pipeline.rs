use std::path::PathBuf;
use std::time::Instant;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::GenerationConfig;
use crate::data::GroundTruth;
use crate::dataset::DatasetSource;
use crate::error::Result;
use crate::generate::generate;

/// What a run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub prefix: String,
    pub positives: usize,
    pub negatives: usize,
    pub undetermined: usize,
    pub paths: Vec<PathBuf>,
}

impl RunSummary {

    pub fn count(&self, bucket: GroundTruth) -> usize {
        match bucket {
            GroundTruth::Positive => self.positives,
            GroundTruth::Negative => self.negatives,
            GroundTruth::Undetermined => self.undetermined,
        }
    }
}

pub fn make_rng(seed: Option<u64>) -> StdRng {

    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Loads the dataset, generates candidates within `config.maximum_distance` and saves the
/// positive, negative and undetermined buckets to `config.output_directory`.
///
/// The prefix of the output files is `config.prefix`, or the source's own prefix when empty.
pub fn generate_edges<S: DatasetSource + ?Sized>(source: &S, config: &GenerationConfig) -> Result<RunSummary> {

    let prefix = config.get_prefix(source.prefix());

    let resolution = source.resolution()?;
    let label_mapping = source.label_mapping()?;

    let start = Instant::now();

    let skeletons = source.skeletons()?;

    let mut candidates = generate(&resolution, config.maximum_distance, &skeletons, &label_mapping, config.strategy())?;

    debug!("{}: generated candidates for {} skeletons in {:.3}s", prefix, skeletons.len(), start.elapsed().as_secs_f64());

    info!("Number positive edges {}", candidates.positives.len());
    info!("Number negative edges {}", candidates.negatives.len());
    info!("Number undetermined edges {}", candidates.undetermined.len());

    let summary_counts = (candidates.positives.len(), candidates.negatives.len(), candidates.undetermined.len());

    let mut rng = make_rng(config.seed);
    let paths = crate::io::save_candidate_set(&config.get_output_directory(), &prefix, config.maximum_distance, &mut candidates, &mut rng)?;

    Ok(RunSummary {
        prefix,
        positives: summary_counts.0,
        negatives: summary_counts.1,
        undetermined: summary_counts.2,
        paths,
    })
}
