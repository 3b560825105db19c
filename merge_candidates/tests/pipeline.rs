use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use merge_candidates::config::{GenerationConfig, SearchKind};
use merge_candidates::dataset::{DatasetDescription, DatasetSource, YamlDataset};
use merge_candidates::io::read_candidates;
use merge_candidates::layout;
use merge_candidates::pipeline::generate_edges;
use merge_candidates::{Candidate, Error, GridPoint, GroundTruth, LabelMapping, Resolution, Skeleton};

const DATASET: &str = "
resolution: [30.0, 4.0, 4.0]
label_mapping: [0, 7, 7, 9, 0]
skeletons:
  - label: 1
    endpoints: [[0, 0, 0], [0, 100, 100]]
  - label: 2
    endpoints: [[0, 0, 5], [0, 100, 103]]
  - label: 3
    endpoints: [[0, 3, 0]]
  - label: 4
    endpoints: [[0, 0, 2]]
";

fn write_dataset(dir: &std::path::Path) -> PathBuf {
    let filename = dir.join("toy.yaml");
    fs::write(&filename, DATASET).unwrap();
    filename
}

fn config(dir: &std::path::Path, search: SearchKind) -> GenerationConfig {
    let mut config = GenerationConfig::default();
    config.maximum_distance = 25.0;
    config.output_directory = dir.join("features").to_string_lossy().into_owned();
    config.seed = Some(5);
    config.search = search;
    config
}

fn read_all(paths: &[PathBuf]) -> Vec<HashSet<Candidate>> {
    paths
        .iter()
        .zip(GroundTruth::ALL)
        .map(|(path, bucket)| read_candidates(path, bucket).unwrap().into_iter().collect())
        .collect()
}

#[test]
fn toy_dataset_end_to_end() {

    let dir = tempfile::tempdir().unwrap();
    let dataset = YamlDataset::from_file(&write_dataset(dir.path())).unwrap();

    let summary = generate_edges(&dataset, &config(dir.path(), SearchKind::Exhaustive)).unwrap();

    assert_eq!(summary.prefix, "toy");
    assert_eq!(summary.paths, vec![
        dir.path().join("features/toy-25nm-positive.candidates"),
        dir.path().join("features/toy-25nm-negative.candidates"),
        dir.path().join("features/toy-25nm-undetermined.candidates"),
    ]);

    //1-2: (0,0,0)-(0,0,5) is 20nm, (0,100,100)-(0,100,103) is 12nm
    //1-3: 12nm, 2-3: sqrt(144 + 400)nm, 1-4: 8nm, 2-4: 12nm, 3-4: sqrt(144 + 64)nm
    let buckets = read_all(&summary.paths);

    let positives: HashSet<Candidate> = [
        Candidate::new((1, 2), GridPoint::new(0, 0, 2), GroundTruth::Positive),
        Candidate::new((1, 2), GridPoint::new(0, 100, 101), GroundTruth::Positive),
    ].into_iter().collect();
    assert_eq!(buckets[0], positives);

    let negatives: HashSet<Candidate> = [
        Candidate::new((1, 3), GridPoint::new(0, 1, 0), GroundTruth::Negative),
        Candidate::new((2, 3), GridPoint::new(0, 1, 2), GroundTruth::Negative),
    ].into_iter().collect();
    assert_eq!(buckets[1], negatives);

    let undetermined: HashSet<Candidate> = [
        Candidate::new((1, 4), GridPoint::new(0, 0, 1), GroundTruth::Undetermined),
        Candidate::new((2, 4), GridPoint::new(0, 0, 3), GroundTruth::Undetermined),
        Candidate::new((3, 4), GridPoint::new(0, 1, 1), GroundTruth::Undetermined),
    ].into_iter().collect();
    assert_eq!(buckets[2], undetermined);

    assert_eq!((summary.positives, summary.negatives, summary.undetermined), (2, 2, 3));

    for (path, bucket) in summary.paths.iter().zip(GroundTruth::ALL) {
        let size = fs::metadata(path).unwrap().len() as usize;
        assert_eq!(size, layout::file_size(summary.count(bucket)));
    }
}

#[test]
fn kd_tree_search_writes_identical_files() {

    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();

    let dataset = YamlDataset::from_file(&write_dataset(dir_a.path())).unwrap();

    let a = generate_edges(&dataset, &config(dir_a.path(), SearchKind::Exhaustive)).unwrap();
    let b = generate_edges(&dataset, &config(dir_b.path(), SearchKind::KdTree)).unwrap();

    for (path_a, path_b) in a.paths.iter().zip(b.paths.iter()) {
        assert_eq!(fs::read(path_a).unwrap(), fs::read(path_b).unwrap());
    }
}

#[test]
fn invalid_dataset_writes_nothing() {

    let dir = tempfile::tempdir().unwrap();

    let description = DatasetDescription {
        resolution: Resolution::new(30.0, 4.0, 4.0),
        label_mapping: LabelMapping::new(vec![0, 7]),
        skeletons: vec![Skeleton::new(1, vec![GridPoint::new(0, 0, 0)]), Skeleton::new(5, vec![GridPoint::new(0, 0, 1)])],
    };
    let dataset = YamlDataset::new("misaligned".to_string(), dir.path().join("misaligned.yaml"), description);
    assert_eq!(dataset.prefix(), "misaligned");

    let config = config(dir.path(), SearchKind::Exhaustive);
    let err = generate_edges(&dataset, &config).unwrap_err();

    assert!(matches!(err, Error::LabelOutOfRange { label: 5, .. }));
    assert!(!config.get_output_directory().exists());
}
