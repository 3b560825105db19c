use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub type FragmentLabel = u64;
pub type GoldLabel = u64;

/// Physical size of one voxel, in nanometers, ordered (z, y, x).
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Resolution {
    pub z: f64,
    pub y: f64,
    pub x: f64,
}

impl Resolution {

    pub fn new(z: f64, y: f64, x: f64) -> Self {

        return Self { z, y, x };
    }

    pub fn validate(&self) -> Result<()> {

        let ok = [self.z, self.y, self.x].iter().all(|v| v.is_finite() && *v > 0.0);
        match ok {
            true => Ok(()),
            false => Err(Error::InvalidResolution { z: self.z, y: self.y, x: self.x }),
        }
    }

    /// Euclidean distance between two grid points after scaling each axis by the voxel size.
    pub fn physical_distance(&self, a: &GridPoint, b: &GridPoint) -> f64 {

        //grid deltas can exceed i64 at the ends of its range
        fn delta(a: i64, b: i64) -> f64 {
            (b as i128 - a as i128) as f64
        }

        let zdiff = self.z * delta(a.z, b.z);
        let ydiff = self.y * delta(a.y, b.y);
        let xdiff = self.x * delta(a.x, b.x);

        return (zdiff * zdiff + ydiff * ydiff + xdiff * xdiff).sqrt();
    }

    pub fn to_physical(&self, point: &GridPoint) -> [f64; 3] {

        return [self.z * point.z as f64, self.y * point.y as f64, self.x * point.x as f64];
    }
}

impl From<[f64; 3]> for Resolution {
    fn from(arr: [f64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }
}

impl From<Resolution> for [f64; 3] {
    fn from(res: Resolution) -> Self {
        [res.z, res.y, res.x]
    }
}

/// Integer voxel coordinate, ordered (z, y, x).
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[i64; 3]", into = "[i64; 3]")]
pub struct GridPoint {
    pub z: i64,
    pub y: i64,
    pub x: i64,
}

pub type Endpoint = GridPoint;

impl GridPoint {

    pub fn new(z: i64, y: i64, x: i64) -> Self {

        return Self { z, y, x };
    }

    /// Element-wise average of two points, rounded toward negative infinity.
    pub fn midpoint(&self, other: &GridPoint) -> GridPoint {

        fn mid(a: i64, b: i64) -> i64 {
            (a as i128 + b as i128).div_euclid(2) as i64
        }

        return GridPoint::new(mid(self.z, other.z), mid(self.y, other.y), mid(self.x, other.x));
    }
}

impl From<[i64; 3]> for GridPoint {
    fn from(arr: [i64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }
}

impl From<GridPoint> for [i64; 3] {
    fn from(point: GridPoint) -> Self {
        [point.z, point.y, point.x]
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {}, {})", self.z, self.y, self.x)
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Skeleton {
    pub label: FragmentLabel,
    pub endpoints: Vec<Endpoint>,
}

impl Skeleton {

    pub fn new(label: FragmentLabel, endpoints: Vec<Endpoint>) -> Self {

        return Self { label, endpoints };
    }
}

/// Whether two fragments belong to the same neuron according to the gold segmentation.
///
/// Also names the output bucket a candidate is written to.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub enum GroundTruth {
    Positive,
    Negative,
    Undetermined,
}

impl GroundTruth {

    pub const ALL: [GroundTruth; 3] = [GroundTruth::Positive, GroundTruth::Negative, GroundTruth::Undetermined];

    pub fn bucket_name(&self) -> &'static str {
        match self {
            GroundTruth::Positive => "positive",
            GroundTruth::Negative => "negative",
            GroundTruth::Undetermined => "undetermined",
        }
    }

    pub fn from_bucket_name(name: &str) -> Option<Self> {
        GroundTruth::ALL.into_iter().find(|gt| gt.bucket_name() == name)
    }
}

impl fmt::Display for GroundTruth {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.bucket_name())
    }
}

/// Fragment label to gold label lookup. A gold label of 0 means no confident match.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelMapping(pub Vec<GoldLabel>);

impl LabelMapping {

    pub const UNMAPPED: GoldLabel = 0;

    pub fn new(gold_labels: Vec<GoldLabel>) -> Self {

        return Self(gold_labels);
    }

    pub fn len(&self) -> usize {
        return self.0.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.0.is_empty();
    }

    pub fn contains(&self, label: FragmentLabel) -> bool {
        return label < self.0.len() as u64;
    }

    pub fn gold_label(&self, label: FragmentLabel) -> Result<GoldLabel> {

        match usize::try_from(label).ok().and_then(|idx| self.0.get(idx)) {
            Some(gold) => Ok(*gold),
            None => Err(Error::LabelOutOfRange { label, mapping_len: self.0.len() }),
        }
    }

    /// Undetermined when either fragment is unmapped, otherwise Positive iff both map to the
    /// same gold label.
    pub fn ground_truth(&self, label_one: FragmentLabel, label_two: FragmentLabel) -> Result<GroundTruth> {

        let gold_one = self.gold_label(label_one)?;
        let gold_two = self.gold_label(label_two)?;

        if gold_one == Self::UNMAPPED || gold_two == Self::UNMAPPED {
            return Ok(GroundTruth::Undetermined);
        }

        match gold_one == gold_two {
            true => Ok(GroundTruth::Positive),
            false => Ok(GroundTruth::Negative),
        }
    }
}
