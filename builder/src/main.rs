use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use glob::glob;
use kdam::tqdm;
use log::{error, info, warn};

use merge_candidates::config::{GenerationConfig, SearchKind};
use merge_candidates::dataset::YamlDataset;
use merge_candidates::io::read_candidates;
use merge_candidates::pipeline::generate_edges;
use merge_candidates::GroundTruth;

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Task {
    Generate,
    Inspect,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Bucket {
    Positive,
    Negative,
    Undetermined,
}

impl From<Bucket> for GroundTruth {
    fn from(bucket: Bucket) -> Self {
        match bucket {
            Bucket::Positive => GroundTruth::Positive,
            Bucket::Negative => GroundTruth::Negative,
            Bucket::Undetermined => GroundTruth::Undetermined,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {

    //Which task to carry out
    #[arg(short, long, value_enum, default_value_t = Task::Generate)]
    task: Task,

    //Dataset yaml file for generate, candidate file for inspect
    #[arg(short, long)]
    input: Option<PathBuf>,

    //Glob of dataset yaml files for generate
    #[arg(short = 'g', long)]
    input_glob: Option<String>,

    //Yaml generation config, overridden by the flags below
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long)]
    maximum_distance: Option<f64>,

    #[arg(short, long)]
    output_directory: Option<String>,

    #[arg(short, long)]
    seed: Option<u64>,

    #[arg(long, value_enum)]
    search: Option<SearchArg>,

    //Bucket of the candidate file for inspect
    #[arg(short, long, value_enum)]
    bucket: Option<Bucket>,

    //Number of records to print for inspect
    #[arg(short = 'n', long, default_value_t = 10)]
    num_records: usize,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SearchArg {
    Exhaustive,
    KdTree,
}

fn main() -> ExitCode {

    env_logger::init();

    let args = Args::parse();

    let result = match args.task {
        Task::Generate => generate(&args),
        Task::Inspect => inspect(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn build_config(args: &Args) -> Result<GenerationConfig, String> {

    let mut config = match &args.config {
        Some(filename) => GenerationConfig::from_file(filename).map_err(|e| e.to_string())?,
        None => GenerationConfig::default(),
    };

    if let Some(maximum_distance) = args.maximum_distance {
        config.maximum_distance = maximum_distance;
    }
    if let Some(output_directory) = &args.output_directory {
        config.output_directory = output_directory.clone();
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    match args.search {
        Some(SearchArg::Exhaustive) => config.search = SearchKind::Exhaustive,
        Some(SearchArg::KdTree) => config.search = SearchKind::KdTree,
        None => {},
    }

    Ok(config)
}

fn dataset_filenames(args: &Args) -> Result<Vec<PathBuf>, String> {

    let mut filenames: Vec<PathBuf> = Vec::new();

    if let Some(input) = &args.input {
        filenames.push(input.clone());
    }

    if let Some(pattern) = &args.input_glob {
        let paths = glob(pattern).map_err(|e| format!("bad glob '{}': {}", pattern, e))?;
        for entry in paths {
            match entry {
                Ok(path) => filenames.push(path),
                Err(e) => warn!("Skipping unreadable path: {}", e),
            }
        }
    }

    match filenames.is_empty() {
        true => Err("no datasets given, use --input or --input-glob".to_string()),
        false => Ok(filenames),
    }
}

fn generate(args: &Args) -> Result<(), String> {

    let config = build_config(args)?;
    let filenames = dataset_filenames(args)?;

    //a configured prefix only makes sense for a single dataset
    if filenames.len() > 1 && !config.prefix.is_empty() {
        return Err(format!("config prefix '{}' given for {} datasets", config.prefix, filenames.len()));
    }

    for filename in tqdm!(filenames.iter()) {

        let dataset = YamlDataset::from_file(filename).map_err(|e| e.to_string())?;

        info!("{}: maximum distance {}nm", dataset.path().display(), config.maximum_distance);

        let summary = generate_edges(&dataset, &config).map_err(|e| e.to_string())?;

        for path in summary.paths.iter() {
            println!("{}", path.display());
        }
    }

    Ok(())
}

fn inspect(args: &Args) -> Result<(), String> {

    let filename = args.input.as_deref().ok_or("inspect needs --input")?;

    let bucket = match args.bucket {
        Some(bucket) => GroundTruth::from(bucket),
        None => bucket_from_filename(filename).ok_or("cannot tell the bucket from the file name, pass --bucket")?,
    };

    let candidates = read_candidates(filename, bucket).map_err(|e| e.to_string())?;

    println!("{}: {} {} candidates", filename.display(), candidates.len(), bucket);

    for candidate in candidates.iter().take(args.num_records) {
        println!("  {:?} at {}", candidate.labels, candidate.location);
    }

    Ok(())
}

/// Reads the bucket from `<prefix>-<distance>nm-<bucket>.candidates`.
fn bucket_from_filename(filename: &Path) -> Option<GroundTruth> {

    let stem = filename.file_stem()?.to_str()?;
    let name = stem.rsplit('-').next()?;

    GroundTruth::from_bucket_name(name)
}
