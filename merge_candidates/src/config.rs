use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::generate::SearchStrategy;
use crate::tree::DEFAULT_LEAF_CAPACITY;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SearchKind {
    Exhaustive,
    KdTree,
}

/// Settings for one generation run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    /// Dataset identifier, used as the output file prefix.
    pub prefix: String,
    /// Endpoint pairs must be strictly closer than this, in nanometers.
    pub maximum_distance: f64,
    pub output_directory: String,
    /// Seed for the output shuffle. `None` draws from entropy.
    pub seed: Option<u64>,
    pub search: SearchKind,
    pub leaf_capacity: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        return Self {
            prefix: String::new(),
            maximum_distance: 500.0,
            output_directory: "features/skeleton".to_string(),
            seed: None,
            search: SearchKind::Exhaustive,
            leaf_capacity: DEFAULT_LEAF_CAPACITY,
        }
    }
}

impl GenerationConfig {

    pub fn from_file(filename: &Path) -> Result<Self> {

        let serialized = std::fs::read_to_string(filename).map_err(|e| Error::io(filename, e))?;

        let deserialized: Self = serde_yaml::from_str(&serialized)
            .map_err(|e| Error::Parse { path: filename.to_path_buf(), source: e })?;

        return Ok(deserialized);
    }

    pub fn to_file(&self, filename: &Path) -> Result<()> {

        let serialized = serde_yaml::to_string(&self)
            .map_err(|e| Error::Parse { path: filename.to_path_buf(), source: e })?;

        let mut file = File::create(filename).map_err(|e| Error::io(filename, e))?;
        file.write_all(serialized.as_bytes()).map_err(|e| Error::io(filename, e))?;

        Ok(())
    }

    pub fn strategy(&self) -> SearchStrategy {

        match self.search {
            SearchKind::Exhaustive => SearchStrategy::Exhaustive,
            SearchKind::KdTree => SearchStrategy::KdTree { leaf_capacity: self.leaf_capacity },
        }
    }

    pub fn get_output_directory(&self) -> PathBuf {

        return PathBuf::from(&self.output_directory);
    }

    /// The configured prefix, or `source_prefix` when none is set.
    pub fn get_prefix(&self, source_prefix: &str) -> String {

        match self.prefix.is_empty() {
            true => source_prefix.to_string(),
            false => self.prefix.clone(),
        }
    }
}
