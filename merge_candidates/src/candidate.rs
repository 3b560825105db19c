//! Holds the candidate record and its fixed-length byte representation.
//!
//! Structs can be sent to and from `layout::RECORD_SIZE` byte arrays to be written to and
//! read from candidate files.

use byteorder::{ByteOrder, LittleEndian};

use crate::data::{FragmentLabel, GridPoint, GroundTruth};
use crate::error::{Error, Result};
use crate::layout;

/// A proposed merge of two fragments at the midpoint of two nearby endpoints.
#[derive(Debug, PartialEq, Eq, Hash, Clone, PartialOrd, Ord)]
pub struct Candidate {
    pub labels: (FragmentLabel, FragmentLabel),
    pub location: GridPoint,
    pub ground_truth: GroundTruth,
}

impl Candidate {

    pub fn new(labels: (FragmentLabel, FragmentLabel), location: GridPoint, ground_truth: GroundTruth) -> Self {

        return Self { labels, location, ground_truth };
    }

    /// Byte stored in the ground truth field. Undetermined records get a placeholder.
    pub fn ground_truth_flag(&self) -> u8 {

        match self.ground_truth {
            GroundTruth::Positive => 1,
            GroundTruth::Negative => 0,
            GroundTruth::Undetermined => layout::UNDETERMINED_PLACEHOLDER,
        }
    }

    pub fn to_arr(&self) -> Result<[u8; layout::RECORD_SIZE]> {

        let mut arr: [u8; layout::RECORD_SIZE] = [0; layout::RECORD_SIZE];

        let slice = &mut arr[layout::LABEL_ONE_START..layout::LABEL_ONE_START + layout::LABEL_ONE_SIZE];
        LittleEndian::write_i64(slice, label_to_field(self.labels.0)?);

        let slice = &mut arr[layout::LABEL_TWO_START..layout::LABEL_TWO_START + layout::LABEL_TWO_SIZE];
        LittleEndian::write_i64(slice, label_to_field(self.labels.1)?);

        let slice = &mut arr[layout::Z_START..layout::Z_START + layout::Z_SIZE];
        LittleEndian::write_i64(slice, self.location.z);

        let slice = &mut arr[layout::Y_START..layout::Y_START + layout::Y_SIZE];
        LittleEndian::write_i64(slice, self.location.y);

        let slice = &mut arr[layout::X_START..layout::X_START + layout::X_SIZE];
        LittleEndian::write_i64(slice, self.location.x);

        arr[layout::GROUND_TRUTH_OFFSET] = self.ground_truth_flag();

        return Ok(arr);
    }

    /// Parses one record. The stored flag alone cannot express the undetermined state, so the
    /// caller names the bucket the record was read from.
    ///
    /// Returns a description of the problem if the record is inconsistent with `bucket`.
    pub fn from_slice(record_slice: &[u8], bucket: GroundTruth) -> std::result::Result<Candidate, String> {

        if record_slice.len() != layout::RECORD_SIZE {
            return Err(format!("record has {} bytes, expected {}", record_slice.len(), layout::RECORD_SIZE));
        }

        let label_one = LittleEndian::read_i64(&record_slice[layout::LABEL_ONE_START..layout::LABEL_ONE_START + layout::LABEL_ONE_SIZE]);
        let label_two = LittleEndian::read_i64(&record_slice[layout::LABEL_TWO_START..layout::LABEL_TWO_START + layout::LABEL_TWO_SIZE]);

        let z = LittleEndian::read_i64(&record_slice[layout::Z_START..layout::Z_START + layout::Z_SIZE]);
        let y = LittleEndian::read_i64(&record_slice[layout::Y_START..layout::Y_START + layout::Y_SIZE]);
        let x = LittleEndian::read_i64(&record_slice[layout::X_START..layout::X_START + layout::X_SIZE]);

        let flag = record_slice[layout::GROUND_TRUTH_OFFSET];

        let labels = match (u64::try_from(label_one), u64::try_from(label_two)) {
            (Ok(a), Ok(b)) => (a, b),
            _ => return Err(format!("negative label in record ({}, {})", label_one, label_two)),
        };

        let ground_truth = match (bucket, flag) {
            (GroundTruth::Positive, 1) => GroundTruth::Positive,
            (GroundTruth::Negative, 0) => GroundTruth::Negative,
            (GroundTruth::Undetermined, _) => GroundTruth::Undetermined,
            (bucket, flag) => return Err(format!("flag {} in {} bucket", flag, bucket)),
        };

        return Ok(Candidate::new(labels, GridPoint::new(z, y, x), ground_truth));
    }
}

fn label_to_field(label: FragmentLabel) -> Result<i64> {

    return i64::try_from(label).map_err(|_| Error::ValueOverflow(label));
}

/// Generated candidates, partitioned by ground truth.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct CandidateSet {
    pub positives: Vec<Candidate>,
    pub negatives: Vec<Candidate>,
    pub undetermined: Vec<Candidate>,
}

impl CandidateSet {

    pub fn new() -> Self {

        return Self::default();
    }

    /// Appends to the bucket matching the candidate's ground truth.
    pub fn push(&mut self, candidate: Candidate) {

        self.bucket_mut(candidate.ground_truth).push(candidate);
    }

    pub fn bucket(&self, ground_truth: GroundTruth) -> &Vec<Candidate> {

        match ground_truth {
            GroundTruth::Positive => &self.positives,
            GroundTruth::Negative => &self.negatives,
            GroundTruth::Undetermined => &self.undetermined,
        }
    }

    pub fn bucket_mut(&mut self, ground_truth: GroundTruth) -> &mut Vec<Candidate> {

        match ground_truth {
            GroundTruth::Positive => &mut self.positives,
            GroundTruth::Negative => &mut self.negatives,
            GroundTruth::Undetermined => &mut self.undetermined,
        }
    }

    pub fn len(&self) -> usize {

        return self.positives.len() + self.negatives.len() + self.undetermined.len();
    }

    pub fn is_empty(&self) -> bool {

        return self.len() == 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {

        self.positives.iter().chain(self.negatives.iter()).chain(self.undetermined.iter())
    }
}

impl FromIterator<Candidate> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = Candidate>>(iter: I) -> Self {
        let mut set = CandidateSet::new();
        for candidate in iter {
            set.push(candidate);
        }
        set
    }
}
