use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use super::config::ExtractionConfig;
use super::error::ExtractionError;
use super::hdf_store::EventStoreWriter;
use super::status::{Stage, StageStatus};
use super::tree_source::{open_root_tree, read_file_list, JaggedField, TreeKind, TreeSource};

/// Every field of a tree, fully loaded. Columns are in the same order as the field names.
#[derive(Debug, Clone)]
pub struct FieldColumns {
    names: Vec<String>,
    columns: Vec<JaggedField>,
}

impl FieldColumns {
    /// Load the named fields and check that they describe the same events.
    ///
    /// All fields must have the same number of events, the same number of sub-events per
    /// event, and the same number of values per sub-event.
    pub fn read(source: &mut dyn TreeSource, fields: &[String]) -> Result<Self, ExtractionError> {
        let mut columns = Vec::with_capacity(fields.len());
        for name in fields {
            columns.push(source.read_field(name)?);
        }

        if let Some((reference, rest)) = columns.split_first() {
            for (name, column) in fields[1..].iter().zip(rest.iter()) {
                if column.len() != reference.len() {
                    return Err(ExtractionError::ShapeMismatch(format!(
                        "field {name} has {} events, field {} has {}",
                        column.len(),
                        fields[0],
                        reference.len()
                    )));
                }
                for (event, (subs, ref_subs)) in column.iter().zip(reference.iter()).enumerate() {
                    if subs.len() != ref_subs.len() {
                        return Err(ExtractionError::ShapeMismatch(format!(
                            "field {name} has {} sub-events in event {event}, expected {}",
                            subs.len(),
                            ref_subs.len()
                        )));
                    }
                    let mismatched = subs
                        .iter()
                        .zip(ref_subs.iter())
                        .position(|(a, b)| a.len() != b.len());
                    if let Some(sub) = mismatched {
                        return Err(ExtractionError::ShapeMismatch(format!(
                            "field {name} has a different hit count in event {event} sub-event {sub}"
                        )));
                    }
                }
            }
        }

        Ok(Self {
            names: fields.to_vec(),
            columns,
        })
    }

    pub fn n_events(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    /// Write every event to the store, in order. Returns the indices assigned.
    pub fn write(&self, writer: &mut EventStoreWriter) -> Result<Vec<u64>, ExtractionError> {
        let mut indices = Vec::with_capacity(self.n_events());
        for event in 0..self.n_events() {
            let fields: Vec<_> = self
                .names
                .iter()
                .zip(self.columns.iter())
                .map(|(name, column)| (name.as_str(), &column[event]))
                .collect();
            indices.push(writer.write_event(&fields)?);
        }
        Ok(indices)
    }
}

/// Read a source fully, then append its events to the store at `output_path`.
///
/// The store is opened only after the source is read, and closed before returning. Returns
/// the indices given to the new events.
pub fn extract_source(
    source: &mut dyn TreeSource,
    output_path: &Path,
    fields: &[String],
) -> Result<Vec<u64>, ExtractionError> {
    let columns = FieldColumns::read(source, fields)?;
    let mut writer = EventStoreWriter::open(output_path)?;
    let indices = columns.write(&mut writer)?;
    writer.close()?;
    Ok(indices)
}

/// Collect the input files of the config, including any listed in the input list
pub fn input_files(config: &ExtractionConfig) -> Result<Vec<PathBuf>, ExtractionError> {
    let mut files = config.input_files.clone();
    if let Some(list) = &config.input_list {
        files.extend(read_file_list(list)?);
    }
    Ok(files)
}

/// Extract every input file into the store, one file at a time.
///
/// Returns the total number of events written.
pub fn process_extraction(
    config: &ExtractionConfig,
    tx: &Sender<StageStatus>,
) -> Result<u64, ExtractionError> {
    config.validate()?;
    let files = input_files(config)?;
    let kind = TreeKind::new(config.neutrino_only);
    spdlog::info!(
        "Extracting {} file(s) from tree {} into {}",
        files.len(),
        kind.path(),
        config.output_path.to_string_lossy()
    );

    let mut total_events: u64 = 0;
    tx.send(StageStatus::new(0.0, Stage::Extraction, String::new()))?;
    for (idx, path) in files.iter().enumerate() {
        let size = path.metadata().map(|m| m.len()).unwrap_or(0);
        spdlog::info!(
            "Opening {} ({})",
            path.to_string_lossy(),
            human_bytes::human_bytes(size as f64)
        );
        let mut source = open_root_tree(path, kind)?;
        let indices = extract_source(source.as_mut(), &config.output_path, &config.fields)?;
        match (indices.first(), indices.last()) {
            (Some(first), Some(last)) => spdlog::info!(
                "Wrote {} events (event_{first} to event_{last})",
                indices.len()
            ),
            _ => spdlog::warn!("{} contained no events", path.to_string_lossy()),
        }
        total_events += indices.len() as u64;
        tx.send(StageStatus::new(
            (idx + 1) as f32 / files.len() as f32,
            Stage::Extraction,
            format!("{total_events} events"),
        ))?;
    }

    spdlog::info!("Done with extraction, {total_events} events written.");
    Ok(total_events)
}
