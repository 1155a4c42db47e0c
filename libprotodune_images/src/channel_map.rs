// Geometry of the ProtoDUNE readout: each (module, plane) pair owns a contiguous block of
// global channel numbers. Module is the APA for np04 and the CRP for np02.
//
// The tables are small and static, so they are bundled as CSV and compiled in. A custom table
// in the same format can be given instead when the geometry changes.
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use fxhash::FxHashMap;

use super::detector::{Detector, Plane};
use super::error::ChannelMapError;

const ENTRIES_PER_LINE: usize = 4; //module, plane, first channel, channel count

/// Load the bundled map for a detector
fn load_default_map(detector: Detector) -> &'static str {
    match detector {
        Detector::Np04 => include_str!("data/np04_channel_map.csv"),
        Detector::Np02 => include_str!("data/np02_channel_map.csv"),
    }
}

/// One row of the channel map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneRecord {
    pub module_id: i32,
    pub plane: Plane,
    pub first_channel: i32,
    pub channel_count: i32,
}

impl PlaneRecord {
    /// One past the last channel of the plane
    pub fn last_channel(&self) -> i32 {
        self.first_channel + self.channel_count
    }

    fn overlaps(&self, other: &PlaneRecord) -> bool {
        self.first_channel < other.last_channel() && other.first_channel < self.last_channel()
    }
}

/// ChannelMap contains the channel range of every (module, plane) pair of a detector.
///
/// Records are kept in the order they were given. Construction checks that no pair appears
/// twice and that the planes of a module never share channels, so a lookup either finds exactly
/// one record or fails.
#[derive(Debug, Clone, Default)]
pub struct ChannelMap {
    records: Vec<PlaneRecord>,
    index: FxHashMap<(i32, Plane), usize>,
}

impl ChannelMap {
    /// Create the bundled ChannelMap for a detector
    pub fn for_detector(detector: Detector) -> Result<Self, ChannelMapError> {
        Self::parse(load_default_map(detector))
    }

    /// Create a ChannelMap from a CSV file with the header
    /// `module,plane,first_channel,channel_count`
    pub fn from_csv(path: &Path) -> Result<Self, ChannelMapError> {
        let mut contents = String::new();
        let mut file = File::open(path)?;
        file.read_to_string(&mut contents)?;
        Self::parse(&contents)
    }

    /// Load the custom map if one is given, otherwise the bundled one
    pub fn new(detector: Detector, path: Option<&Path>) -> Result<Self, ChannelMapError> {
        match path {
            Some(p) => Self::from_csv(p),
            None => Self::for_detector(detector),
        }
    }

    fn parse(contents: &str) -> Result<Self, ChannelMapError> {
        let mut records = Vec::new();
        let mut lines = contents.lines();
        lines.next(); // Skip the header
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let entries: Vec<&str> = line.split_terminator(',').map(|e| e.trim()).collect();
            if entries.len() != ENTRIES_PER_LINE {
                return Err(ChannelMapError::BadFileFormat);
            }
            records.push(PlaneRecord {
                module_id: entries[0].parse()?,
                plane: Plane::from_str(entries[1])?,
                first_channel: entries[2].parse()?,
                channel_count: entries[3].parse()?,
            });
        }
        Self::from_records(records)
    }

    /// Build a map from records, validating the geometry
    pub fn from_records(records: Vec<PlaneRecord>) -> Result<Self, ChannelMapError> {
        let mut index = FxHashMap::default();
        for (row, record) in records.iter().enumerate() {
            if index.insert((record.module_id, record.plane), row).is_some() {
                return Err(ChannelMapError::DuplicateEntry(
                    record.module_id,
                    record.plane,
                ));
            }
            for other in records[..row]
                .iter()
                .filter(|o| o.module_id == record.module_id)
            {
                if record.overlaps(other) {
                    return Err(ChannelMapError::OverlappingPlanes(
                        record.module_id,
                        other.plane,
                        record.plane,
                    ));
                }
            }
        }
        Ok(Self { records, index })
    }

    /// Get the record for a module and plane.
    pub fn get_record(&self, module_id: i32, plane: Plane) -> Result<&PlaneRecord, ChannelMapError> {
        self.index
            .get(&(module_id, plane))
            .map(|row| &self.records[*row])
            .ok_or(ChannelMapError::Lookup(module_id, plane))
    }

    /// Get the channel range `[first, last)` of a module and plane.
    pub fn channel_range(&self, module_id: i32, plane: Plane) -> Result<(i32, i32), ChannelMapError> {
        let record = self.get_record(module_id, plane)?;
        Ok((record.first_channel, record.last_channel()))
    }

    pub fn records(&self) -> &[PlaneRecord] {
        &self.records
    }
}
