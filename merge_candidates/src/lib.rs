//! Builds training data for a classifier that decides whether two segmented neuron fragments
//! should be merged.
//!
//! Every pair of skeleton endpoints from two different fragments that lie closer than a physical
//! distance becomes a candidate, located at the midpoint of the two endpoints. A label mapping
//! from fragments to the gold segmentation decides whether the candidate is a true merge
//! (positive), a false merge (negative) or cannot be judged (undetermined). Each of the three
//! buckets is shuffled and written to its own binary `.candidates` file of fixed 41 byte records.
//!
//! Candidates are found by comparing all endpoint pairs, or optionally through a kd tree over
//! the endpoints, which yields the same candidates.
pub mod error;
pub mod layout;
pub mod data;
pub mod candidate;
pub mod tree;
pub mod generate;
pub mod io;
pub mod config;
pub mod dataset;
pub mod pipeline;

pub use candidate::{Candidate, CandidateSet};
pub use data::{Endpoint, GridPoint, GroundTruth, LabelMapping, Resolution, Skeleton};
pub use error::{Error, Result};
