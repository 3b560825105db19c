//! Candidate generation: find every pair of endpoints from different skeletons that lie closer
//! than a physical distance, and label each pair with the gold segmentation.

use std::collections::HashSet;
use std::time::Instant;

use log::debug;

use crate::candidate::{Candidate, CandidateSet};
use crate::data::{LabelMapping, Resolution, Skeleton};
use crate::error::{Error, Result};
use crate::tree::EndpointTree;

/// How qualifying endpoint pairs are found. Both produce the same candidates in the same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchStrategy {
    /// Compare every endpoint of every skeleton pair.
    #[default]
    Exhaustive,
    /// Query a kd tree of all endpoints around each endpoint.
    KdTree { leaf_capacity: usize },
}

/// A qualifying pair: skeleton positions `i < j` and the endpoint index within each.
type EndpointPair = (usize, usize, usize, usize);

/// Checks the inputs a generation run depends on.
pub fn validate(resolution: &Resolution, maximum_distance: f64, skeletons: &[Skeleton], label_mapping: &LabelMapping) -> Result<()> {

    if skeletons.is_empty() {
        return Err(Error::EmptySkeletons);
    }

    if !maximum_distance.is_finite() || maximum_distance <= 0.0 {
        return Err(Error::InvalidDistance(maximum_distance));
    }

    resolution.validate()?;

    let mut seen: HashSet<u64> = HashSet::with_capacity(skeletons.len());
    for skeleton in skeletons.iter() {
        if !label_mapping.contains(skeleton.label) {
            return Err(Error::LabelOutOfRange { label: skeleton.label, mapping_len: label_mapping.len() });
        }
        if !seen.insert(skeleton.label) {
            return Err(Error::DuplicateLabel(skeleton.label));
        }
    }

    Ok(())
}

/// Generates one candidate for every endpoint pair, taken from two different skeletons, whose
/// physical distance is strictly below `maximum_distance`.
///
/// Candidates keep the label of the earlier skeleton first. Pairs of fragments are not
/// deduplicated: every qualifying endpoint pair yields its own candidate.
pub fn generate(
    resolution: &Resolution,
    maximum_distance: f64,
    skeletons: &[Skeleton],
    label_mapping: &LabelMapping,
    strategy: SearchStrategy,
) -> Result<CandidateSet> {

    validate(resolution, maximum_distance, skeletons, label_mapping)?;

    let start = Instant::now();

    let pairs = match strategy {
        SearchStrategy::Exhaustive => exhaustive_pairs(resolution, maximum_distance, skeletons),
        SearchStrategy::KdTree { leaf_capacity } => kd_tree_pairs(resolution, maximum_distance, skeletons, leaf_capacity),
    };

    debug!("found {} endpoint pairs in {:.3}s ({:?})", pairs.len(), start.elapsed().as_secs_f64(), strategy);

    let mut candidates = CandidateSet::new();

    for (is1, is2, ie1, ie2) in pairs.into_iter() {

        let skeleton_one = &skeletons[is1];
        let skeleton_two = &skeletons[is2];

        let endpoint_one = &skeleton_one.endpoints[ie1];
        let endpoint_two = &skeleton_two.endpoints[ie2];

        let ground_truth = label_mapping.ground_truth(skeleton_one.label, skeleton_two.label)?;

        candidates.push(Candidate::new(
            (skeleton_one.label, skeleton_two.label),
            endpoint_one.midpoint(endpoint_two),
            ground_truth,
        ));
    }

    Ok(candidates)
}

fn exhaustive_pairs(resolution: &Resolution, maximum_distance: f64, skeletons: &[Skeleton]) -> Vec<EndpointPair> {

    let mut pairs: Vec<EndpointPair> = Vec::new();

    let max_label = skeletons.len();
    for is1 in 0..max_label {
        for is2 in (is1 + 1)..max_label {
            for (ie1, endpoint_one) in skeletons[is1].endpoints.iter().enumerate() {
                for (ie2, endpoint_two) in skeletons[is2].endpoints.iter().enumerate() {

                    let distance = resolution.physical_distance(endpoint_one, endpoint_two);

                    if distance < maximum_distance {
                        pairs.push((is1, is2, ie1, ie2));
                    }
                }
            }
        }
    }

    return pairs;
}

fn kd_tree_pairs(resolution: &Resolution, maximum_distance: f64, skeletons: &[Skeleton], leaf_capacity: usize) -> Vec<EndpointPair> {

    let tree = EndpointTree::from_skeletons(resolution, skeletons, leaf_capacity);

    debug!("endpoint tree: {} endpoints, {} nodes, depth {}", tree.len(), tree.num_nodes(), tree.depth());

    //tree distances are computed on pre-scaled points, whose rounding error grows with their
    //magnitude; widen the query by that much and re-check exactly
    let magnitude = skeletons
        .iter()
        .flat_map(|skeleton| skeleton.endpoints.iter())
        .flat_map(|endpoint| resolution.to_physical(endpoint))
        .fold(0.0f64, |max, value| max.max(value.abs()));

    let query_radius = maximum_distance * (1.0 + 1e-9) + 4.0 * magnitude * f64::EPSILON;

    let mut pairs: Vec<EndpointPair> = Vec::new();

    for (is1, skeleton) in skeletons.iter().enumerate() {
        for (ie1, endpoint_one) in skeleton.endpoints.iter().enumerate() {

            let point = resolution.to_physical(endpoint_one);

            for hit in tree.within_radius(&point, query_radius) {

                if hit.skeleton <= is1 {
                    continue;
                }

                let endpoint_two = &skeletons[hit.skeleton].endpoints[hit.endpoint];
                if resolution.physical_distance(endpoint_one, endpoint_two) < maximum_distance {
                    pairs.push((is1, hit.skeleton, ie1, hit.endpoint));
                }
            }
        }
    }

    //match the nesting order of the exhaustive search
    pairs.sort_unstable_by_key(|&(is1, is2, ie1, ie2)| (is1, is2, ie1, ie2));

    return pairs;
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::data::{GridPoint, GroundTruth};
    use rand::prelude::*;

    fn skeleton(label: u64, endpoints: &[[i64; 3]]) -> Skeleton {
        Skeleton::new(label, endpoints.iter().map(|p| GridPoint::from(*p)).collect())
    }

    fn random_skeletons(rng: &mut StdRng, n: usize) -> Vec<Skeleton> {
        (0..n)
            .map(|label| {
                let num_endpoints = rng.gen_range(0..6);
                let endpoints = (0..num_endpoints)
                    .map(|_| GridPoint::new(rng.gen_range(0..20), rng.gen_range(0..200), rng.gen_range(0..200)))
                    .collect();
                Skeleton::new(label as u64, endpoints)
            })
            .collect()
    }

    #[test]
    fn threshold_is_strict_and_physical() {

        let resolution = Resolution::new(30.0, 4.0, 4.0);
        let skeletons = vec![skeleton(0, &[[0, 0, 0]]), skeleton(1, &[[0, 0, 5]])];
        let mapping = LabelMapping::new(vec![3, 3]);

        let set = generate(&resolution, 25.0, &skeletons, &mapping, SearchStrategy::Exhaustive).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.positives[0], Candidate::new((0, 1), GridPoint::new(0, 0, 2), GroundTruth::Positive));

        let set = generate(&resolution, 15.0, &skeletons, &mapping, SearchStrategy::Exhaustive).unwrap();
        assert!(set.is_empty());

        let set = generate(&resolution, 20.0, &skeletons, &mapping, SearchStrategy::Exhaustive).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn labels_follow_mapping() {

        let resolution = Resolution::new(1.0, 1.0, 1.0);
        let skeletons = vec![skeleton(1, &[[0, 0, 0]]), skeleton(2, &[[0, 0, 1]])];

        for (gold, expected) in [
            (vec![0, 7, 7], GroundTruth::Positive),
            (vec![0, 7, 9], GroundTruth::Negative),
            (vec![0, 0, 7], GroundTruth::Undetermined),
            (vec![0, 7, 0], GroundTruth::Undetermined),
        ] {
            let mapping = LabelMapping::new(gold);
            let set = generate(&resolution, 2.0, &skeletons, &mapping, SearchStrategy::Exhaustive).unwrap();
            assert_eq!(set.len(), 1);
            assert_eq!(set.bucket(expected).len(), 1);
            assert_eq!(set.bucket(expected)[0].labels, (1, 2));
        }
    }

    #[test]
    fn every_qualifying_pair_is_kept() {

        let resolution = Resolution::new(1.0, 1.0, 1.0);
        let skeletons = vec![
            skeleton(2, &[[0, 0, 0], [0, 0, 10]]),
            skeleton(1, &[[0, 0, 1], [0, 0, 11], [50, 50, 50]]),
        ];
        let mapping = LabelMapping::new(vec![0, 4, 5]);

        let set = generate(&resolution, 2.0, &skeletons, &mapping, SearchStrategy::Exhaustive).unwrap();

        //labels keep input order, not sorted by value
        assert_eq!(set.negatives, vec![
            Candidate::new((2, 1), GridPoint::new(0, 0, 0), GroundTruth::Negative),
            Candidate::new((2, 1), GridPoint::new(0, 0, 10), GroundTruth::Negative),
        ]);
    }

    #[test]
    fn same_skeleton_endpoints_are_not_paired() {

        let resolution = Resolution::new(1.0, 1.0, 1.0);
        let skeletons = vec![skeleton(0, &[[0, 0, 0], [0, 0, 1]]), skeleton(1, &[])];
        let mapping = LabelMapping::new(vec![1, 1]);

        let set = generate(&resolution, 5.0, &skeletons, &mapping, SearchStrategy::Exhaustive).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn invalid_input_is_rejected() {

        let resolution = Resolution::new(1.0, 1.0, 1.0);
        let mapping = LabelMapping::new(vec![0, 1]);
        let skeletons = vec![skeleton(0, &[[0, 0, 0]]), skeleton(1, &[[0, 0, 1]])];

        let err = generate(&resolution, 5.0, &[], &mapping, SearchStrategy::Exhaustive).unwrap_err();
        assert!(matches!(err, Error::EmptySkeletons));

        let err = generate(&resolution, 0.0, &skeletons, &mapping, SearchStrategy::Exhaustive).unwrap_err();
        assert!(matches!(err, Error::InvalidDistance(_)));

        let err = generate(&Resolution::new(0.0, 1.0, 1.0), 5.0, &skeletons, &mapping, SearchStrategy::Exhaustive).unwrap_err();
        assert!(matches!(err, Error::InvalidResolution { .. }));

        let out_of_range = vec![skeleton(0, &[]), skeleton(2, &[])];
        let err = generate(&resolution, 5.0, &out_of_range, &mapping, SearchStrategy::Exhaustive).unwrap_err();
        assert!(matches!(err, Error::LabelOutOfRange { label: 2, mapping_len: 2 }));

        let duplicated = vec![skeleton(1, &[]), skeleton(1, &[])];
        let err = generate(&resolution, 5.0, &duplicated, &mapping, SearchStrategy::Exhaustive).unwrap_err();
        assert!(matches!(err, Error::DuplicateLabel(1)));
    }

    #[test]
    fn fuzzed_counts_and_distances() {

        let mut rng = StdRng::seed_from_u64(3);
        let resolution = Resolution::new(30.0, 4.0, 4.0);
        let maximum_distance = 120.0;

        let skeletons = random_skeletons(&mut rng, 40);
        let mapping = LabelMapping::new((0..40).map(|_| rng.gen_range(0..4)).collect());

        let set = generate(&resolution, maximum_distance, &skeletons, &mapping, SearchStrategy::Exhaustive).unwrap();

        let mut expected = 0;
        for i in 0..skeletons.len() {
            for j in (i + 1)..skeletons.len() {
                for a in skeletons[i].endpoints.iter() {
                    for b in skeletons[j].endpoints.iter() {
                        if resolution.physical_distance(a, b) < maximum_distance {
                            expected += 1;
                        }
                    }
                }
            }
        }

        assert_eq!(set.positives.len() + set.negatives.len() + set.undetermined.len(), expected);

        for candidate in set.iter() {
            let gt = mapping.ground_truth(candidate.labels.0, candidate.labels.1).unwrap();
            assert_eq!(candidate.ground_truth, gt);
            assert!(candidate.labels.0 < candidate.labels.1);
        }
    }

    #[test]
    fn extreme_coordinates_are_far_apart() {

        let resolution = Resolution::new(1.0, 1.0, 1.0);
        let skeletons = vec![skeleton(0, &[[i64::MIN, 0, 0]]), skeleton(1, &[[i64::MAX, 0, 0]])];
        let mapping = LabelMapping::new(vec![1, 1]);

        for strategy in [SearchStrategy::Exhaustive, SearchStrategy::KdTree { leaf_capacity: 1 }] {
            let set = generate(&resolution, 5.0, &skeletons, &mapping, strategy).unwrap();
            assert!(set.is_empty());
        }

        //neighbours at the top of the range still pair up
        let skeletons = vec![skeleton(0, &[[i64::MAX, 0, i64::MAX]]), skeleton(1, &[[i64::MAX, 0, i64::MAX - 2]])];
        let set = generate(&resolution, 5.0, &skeletons, &mapping, SearchStrategy::Exhaustive).unwrap();
        assert_eq!(set.positives, vec![Candidate::new((0, 1), GridPoint::new(i64::MAX, 0, i64::MAX - 1), GroundTruth::Positive)]);
    }

    #[test]
    fn kd_tree_matches_exhaustive_far_from_origin() {

        let mut rng = StdRng::seed_from_u64(17);
        let resolution = Resolution::new(30.0, 4.0, 4.0);
        let mapping = LabelMapping::new(vec![2, 2]);

        for _ in 0..2000 {
            let base: i64 = rng.gen_range(1_000_000_000..50_000_000_000);
            let a = [base, base + rng.gen_range(0..50), base + rng.gen_range(0..50)];
            let b = [base + rng.gen_range(0..3), base + rng.gen_range(0..50), base + rng.gen_range(0..50)];
            let skeletons = vec![skeleton(0, &[a]), skeleton(1, &[b])];

            //threshold just above the exact distance, well inside the rounding of the scaled points
            let distance = resolution.physical_distance(&GridPoint::from(a), &GridPoint::from(b));
            let maximum_distance = distance * (1.0 + 1e-12) + 1e-9;

            let exhaustive = generate(&resolution, maximum_distance, &skeletons, &mapping, SearchStrategy::Exhaustive).unwrap();
            let indexed = generate(&resolution, maximum_distance, &skeletons, &mapping, SearchStrategy::KdTree { leaf_capacity: 1 }).unwrap();

            assert_eq!(exhaustive.len(), 1);
            assert_eq!(exhaustive, indexed);
        }
    }

    #[test]
    fn kd_tree_matches_exhaustive() {

        let mut rng = StdRng::seed_from_u64(11);

        for leaf_capacity in [1, 3, 32] {
            let skeletons = random_skeletons(&mut rng, 60);
            let mapping = LabelMapping::new((0..60).map(|_| rng.gen_range(0..5)).collect());
            let resolution = Resolution::new(30.0, 4.0, 4.0);

            for maximum_distance in [20.0, 60.0, 200.0] {
                let exhaustive = generate(&resolution, maximum_distance, &skeletons, &mapping, SearchStrategy::Exhaustive).unwrap();
                let indexed = generate(&resolution, maximum_distance, &skeletons, &mapping, SearchStrategy::KdTree { leaf_capacity }).unwrap();

                assert_eq!(exhaustive, indexed);
            }
        }
    }
}
