//! Inputs of a generation run: resolution, skeleton endpoints and the label mapping.
//!
//! Volumes, skeletonization and the segmentation to gold matching happen upstream;
//! [`DatasetSource`] is the seam where their results enter.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::{LabelMapping, Resolution, Skeleton};
use crate::error::{Error, Result};

pub trait DatasetSource {

    /// Identifier used to name the output files.
    fn prefix(&self) -> &str;

    fn resolution(&self) -> Result<Resolution>;

    fn skeletons(&self) -> Result<Vec<Skeleton>>;

    fn label_mapping(&self) -> Result<LabelMapping>;
}

/// On-disk description of a dataset.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DatasetDescription {
    pub resolution: Resolution,
    pub label_mapping: LabelMapping,
    pub skeletons: Vec<Skeleton>,
}

/// A dataset read from a YAML file. The prefix is the file stem.
#[derive(Debug, Clone)]
pub struct YamlDataset {
    prefix: String,
    path: PathBuf,
    description: DatasetDescription,
}

impl YamlDataset {

    pub fn from_file(filename: &Path) -> Result<Self> {

        let serialized = std::fs::read_to_string(filename).map_err(|e| Error::io(filename, e))?;

        let description: DatasetDescription = serde_yaml::from_str(&serialized)
            .map_err(|e| Error::Parse { path: filename.to_path_buf(), source: e })?;

        let prefix = filename
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        return Ok(Self::new(prefix, filename.to_path_buf(), description));
    }

    pub fn new(prefix: String, path: PathBuf, description: DatasetDescription) -> Self {

        return Self { prefix, path, description };
    }

    pub fn path(&self) -> &Path {
        return &self.path;
    }

    pub fn description(&self) -> &DatasetDescription {
        return &self.description;
    }
}

impl DatasetSource for YamlDataset {

    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn resolution(&self) -> Result<Resolution> {
        Ok(self.description.resolution)
    }

    fn skeletons(&self) -> Result<Vec<Skeleton>> {
        Ok(self.description.skeletons.clone())
    }

    fn label_mapping(&self) -> Result<LabelMapping> {
        Ok(self.description.label_mapping.clone())
    }
}
