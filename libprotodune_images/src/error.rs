use std::path::PathBuf;
use thiserror::Error;

use super::detector::Plane;
use super::status::StageStatus;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("ProtoDUNE detectors are either np04 or np02; found {0}")]
    UnknownDetector(String),
    #[error("Invalid plane {0}; planes are 0, 1 or 2")]
    InvalidPlane(i64),
    #[error("Could not read plane {0:?}; planes are 0, 1 or 2")]
    UnparsablePlane(String),
    #[error("Config requested zero {0} bins; bin counts must be at least 1")]
    ZeroBins(&'static str),
    #[error("Config does not list any input files")]
    NoInputFiles,
    #[error("Config does not list any fields to extract")]
    NoFields,
}

#[derive(Debug, Error)]
pub enum ChannelMapError {
    #[error("ChannelMap failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("ChannelMap failed to parse an integer: {0}")]
    ParsingError(#[from] std::num::ParseIntError),
    #[error("ChannelMap failed to parse a plane: {0}")]
    BadPlane(#[from] ConfigError),
    #[error("ChannelMap was given a file with the incorrect format; most likely the number of columns is incorrect")]
    BadFileFormat,
    #[error("ChannelMap has more than one entry for module {0} plane {1}")]
    DuplicateEntry(i32, Plane),
    #[error("ChannelMap has overlapping channel ranges in module {0} for planes {1} and {2}")]
    OverlappingPlanes(i32, Plane, Plane),
    #[error("ChannelMap has no entry for module {0} plane {1}")]
    Lookup(i32, Plane),
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("TreeSource failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Could not open tree file because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Tree file does not contain the tree {0}")]
    MissingTree(String),
    #[error("Tree does not contain the field {0}")]
    MissingField(String),
    #[error("ROOT reader failed: {0}")]
    Root(String),
    #[error("Cannot read {0:?}; this build was compiled without ROOT support (enable the `root` feature)")]
    Unsupported(PathBuf),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("EventStore failed due to HDF5 error: {0}")]
    HDF5Error(#[from] hdf5::Error),
    #[error("EventStore found a group {0} which does not follow the event_<N> naming")]
    MalformedEventKey(String),
    #[error("EventStore found a dataset {0} which does not follow the subevent_<N> naming")]
    MalformedSubEventKey(String),
    #[error("EventStore is missing the group {0}")]
    MissingGroup(String),
    #[error("EventStore event {0} sub-event {1} has fields of different lengths")]
    MismatchedLengths(u64, usize),
    #[error("EventStore event {0} has a different number of sub-events per field")]
    MismatchedSubEvents(u64),
    #[error("EventStore could not encode the {0} attribute: {1}")]
    BadAttribute(String, String),
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Extraction failed due to TreeSource error: {0}")]
    SourceError(#[from] SourceError),
    #[error("Extraction failed due to EventStore error: {0}")]
    StoreError(#[from] StoreError),
    #[error("Extraction failed due to configuration error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Extraction failed because the fields do not have matching shapes: {0}")]
    ShapeMismatch(String),
    #[error("Extraction failed due to Send error: {0}")]
    SendError(#[from] std::sync::mpsc::SendError<StageStatus>),
}

#[derive(Debug, Error)]
pub enum BinningError {
    #[error("Binning failed due to EventStore error: {0}")]
    StoreError(#[from] StoreError),
    #[error("Binning failed due to ChannelMap error: {0}")]
    MapError(#[from] ChannelMapError),
    #[error("Binning failed due to configuration error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Binning failed to stack images: {0}")]
    ShapeError(#[from] ndarray::ShapeError),
    #[error("Binning failed to write the image bundle: {0}")]
    NpzError(#[from] ndarray_npy::WriteNpzError),
    #[error("Binning failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Binning failed due to Send error: {0}")]
    SendError(#[from] std::sync::mpsc::SendError<StageStatus>),
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processor failed due to Extraction error: {0}")]
    ExtractionError(#[from] ExtractionError),
    #[error("Processor failed due to Binning error: {0}")]
    BinningError(#[from] BinningError),
    #[error("Processor failed due to Config error: {0}")]
    ConfigError(#[from] ConfigError),
}
