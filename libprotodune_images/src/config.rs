use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::binner::BinningMode;
use super::constants::DEFAULT_FIELDS;
use super::detector::{Detector, Plane};
use super::error::ConfigError;

fn default_fields() -> Vec<String> {
    DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect()
}

/// Settings for turning art::ROOT window trees into an HDF5 event store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default)]
    pub input_files: Vec<PathBuf>,
    /// Text file listing more input files, one per line
    #[serde(default)]
    pub input_list: Option<PathBuf>,
    pub output_path: PathBuf,
    #[serde(default)]
    pub neutrino_only: bool,
    #[serde(default = "default_fields")]
    pub fields: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            input_files: vec![],
            input_list: None,
            output_path: PathBuf::from("None"),
            neutrino_only: false,
            fields: default_fields(),
        }
    }
}

impl ExtractionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input_files.is_empty() && self.input_list.is_none() {
            return Err(ConfigError::NoInputFiles);
        }
        if self.fields.is_empty() {
            return Err(ConfigError::NoFields);
        }
        Ok(())
    }
}

/// Settings for turning an HDF5 event store into images
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinningConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub detector: Detector,
    pub n_time_bins: usize,
    pub n_channel_bins: usize,
    /// Make images of this plane only. If None, all three planes are binned together.
    #[serde(default)]
    pub plane: Option<Plane>,
    /// Ignore the known broken module of the detector (APA 1 for np04)
    #[serde(default)]
    pub drop_bad_module: bool,
    /// Custom channel map. If None, the bundled map of the detector is used.
    #[serde(default)]
    pub channel_map_path: Option<PathBuf>,
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("None"),
            output_path: PathBuf::from("None"),
            detector: Detector::Np04,
            n_time_bins: 100,
            n_channel_bins: 100,
            plane: None,
            drop_bad_module: false,
            channel_map_path: None,
        }
    }
}

impl BinningConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_time_bins == 0 {
            return Err(ConfigError::ZeroBins("time"));
        }
        if self.n_channel_bins == 0 {
            return Err(ConfigError::ZeroBins("channel"));
        }
        Ok(())
    }

    pub fn mode(&self) -> BinningMode {
        match self.plane {
            Some(plane) => BinningMode::SinglePlane(plane),
            None => BinningMode::Combined,
        }
    }

    /// The module to leave out, if the user asked for it and the detector has one
    pub fn excluded_module(&self) -> Option<i32> {
        if self.drop_bad_module {
            self.detector.bad_module()
        } else {
            None
        }
    }
}

/// Structure representing a full pipeline run. Either stage may be left out.
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub extraction: Option<ExtractionConfig>,
    #[serde(default)]
    pub binning: Option<BinningConfig>,
}

impl Default for Config {
    /// Generate a template Config. All paths will be empty/invalid
    fn default() -> Self {
        Self {
            extraction: Some(ExtractionConfig::default()),
            binning: Some(BinningConfig::default()),
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(extraction) = &self.extraction {
            extraction.validate()?;
        }
        if let Some(binning) = &self.binning {
            binning.validate()?;
        }
        Ok(())
    }
}
