use hdf5::types::VarLenUnicode;
use hdf5::{File, Group, H5Type};
use ndarray::ArrayView1;
use std::path::Path;
use std::str::FromStr;

use super::constants::{
    ADCINTEGRAL_FIELD, APACRP_FIELD, CHANNELID_FIELD, EVENTS_NAME, EVENT_PREFIX, FORMAT_VERSION,
    PLANEID_FIELD, SUBEVENT_PREFIX, TIMEPEAK_FIELD,
};
use super::error::StoreError;
use super::subevent::SubEvent;
use super::tree_source::JaggedEvent;

// Structure
// events - min_event, max_event, version
// |---- event_#
// |    |---- Window_apacrp
// |    |    |---- subevent_#(dset)
// |    |---- Window_planeid
// |    |    |---- subevent_#(dset)
// |    |---- ...one group per extracted field

/// Parse the integer out of a `<prefix><N>` name
fn parse_index(name: &str, prefix: &str) -> Option<u64> {
    name.strip_prefix(prefix)?.parse::<u64>().ok()
}

/// The numerically sorted event indices of the events group.
///
/// Fails if any child does not follow the event_<N> naming.
fn scan_event_indices(events_group: &Group) -> Result<Vec<u64>, StoreError> {
    let mut indices = Vec::new();
    for name in events_group.member_names()? {
        match parse_index(&name, EVENT_PREFIX) {
            Some(idx) => indices.push(idx),
            None => return Err(StoreError::MalformedEventKey(name)),
        }
    }
    indices.sort_unstable();
    Ok(indices)
}

/// Write a scalar attribute, creating it if needed
fn write_attr<T: H5Type>(group: &Group, name: &str, value: &T) -> Result<(), StoreError> {
    let attr = match group.attr(name) {
        Ok(attr) => attr,
        Err(_) => group.new_attr::<T>().create(name)?,
    };
    attr.write_scalar(value)?;
    Ok(())
}

/// A simple struct which wraps around the hdf5-rust library.
///
/// Opens (or creates) an HDF5 event store in append mode. New events are numbered after the
/// largest event already in the store, so repeated extractions into the same file never
/// overwrite each other. Only one writer may have the store open at a time.
#[allow(dead_code)]
#[derive(Debug)]
pub struct EventStoreWriter {
    file_handle: File,
    events_group: Group,
    first_event: u64,
    next_event: u64,
}

impl EventStoreWriter {
    /// Open the store at path, creating the file and the events group if needed
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let file_handle = File::append(path)?;
        let events_group = match file_handle.group(EVENTS_NAME) {
            Ok(group) => group,
            Err(_) => file_handle.create_group(EVENTS_NAME)?,
        };
        let next_event = match scan_event_indices(&events_group)?.last() {
            Some(max) => max + 1,
            None => 0,
        };
        Ok(Self {
            file_handle,
            events_group,
            first_event: next_event,
            next_event,
        })
    }

    /// The index the next written event will receive
    pub fn next_event(&self) -> u64 {
        self.next_event
    }

    /// Number of events written by this writer
    pub fn events_written(&self) -> u64 {
        self.next_event - self.first_event
    }

    /// Write one event. Each field is written as a group holding one dataset per sub-event.
    ///
    /// Returns the index assigned to the event.
    pub fn write_event(&mut self, fields: &[(&str, &JaggedEvent)]) -> Result<u64, StoreError> {
        let index = self.next_event;
        let event_group = self
            .events_group
            .create_group(&format!("{EVENT_PREFIX}{index}"))?;
        for (name, subevents) in fields {
            let field_group = event_group.create_group(name)?;
            for (sub_idx, values) in subevents.iter().enumerate() {
                field_group
                    .new_dataset_builder()
                    .with_data(ArrayView1::from(values.as_slice()))
                    .create(format!("{SUBEVENT_PREFIX}{sub_idx}").as_str())?;
            }
        }
        self.next_event += 1;
        Ok(index)
    }

    /// Write meta information on the events held by the store, consume the writer
    pub fn close(self) -> Result<(), StoreError> {
        let indices = scan_event_indices(&self.events_group)?;
        if let (Some(min), Some(max)) = (indices.first(), indices.last()) {
            write_attr(&self.events_group, "min_event", min)?;
            write_attr(&self.events_group, "max_event", max)?;
        }
        let version = format!("{}:{}", env!("CARGO_PKG_NAME"), FORMAT_VERSION);
        let version = VarLenUnicode::from_str(&version)
            .map_err(|e| StoreError::BadAttribute("version".to_string(), e.to_string()))?;
        write_attr(&self.events_group, "version", &version)?;
        spdlog::info!(
            "{} events written, store now holds {} events.",
            self.events_written(),
            indices.len()
        );
        Ok(())
    }
}

/// Read access to an HDF5 event store
#[allow(dead_code)]
#[derive(Debug)]
pub struct EventStoreReader {
    file_handle: File,
    events_group: Group,
    event_indices: Vec<u64>,
}

impl EventStoreReader {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let file_handle = File::open(path)?;
        let events_group = file_handle
            .group(EVENTS_NAME)
            .map_err(|_| StoreError::MissingGroup(EVENTS_NAME.to_string()))?;
        let event_indices = scan_event_indices(&events_group)?;
        Ok(Self {
            file_handle,
            events_group,
            event_indices,
        })
    }

    /// Event indices in increasing order
    pub fn event_indices(&self) -> &[u64] {
        &self.event_indices
    }

    pub fn n_events(&self) -> usize {
        self.event_indices.len()
    }

    /// Read every sub-event of one field of an event, ordered by sub-event index
    pub fn read_field(&self, event: u64, field: &str) -> Result<JaggedEvent, StoreError> {
        let event_name = format!("{EVENT_PREFIX}{event}");
        let event_group = self
            .events_group
            .group(&event_name)
            .map_err(|_| StoreError::MissingGroup(event_name.clone()))?;
        let field_group = event_group
            .group(field)
            .map_err(|_| StoreError::MissingGroup(format!("{event_name}/{field}")))?;

        let mut names = Vec::new();
        for name in field_group.member_names()? {
            match parse_index(&name, SUBEVENT_PREFIX) {
                Some(idx) => names.push((idx, name)),
                None => return Err(StoreError::MalformedSubEventKey(name)),
            }
        }
        names.sort_unstable();

        let mut values = Vec::with_capacity(names.len());
        for (_, name) in names {
            values.push(field_group.dataset(&name)?.read_raw::<i32>()?);
        }
        Ok(values)
    }

    /// Read the sub-events of an event with the fields needed for binning
    pub fn read_event(&self, event: u64) -> Result<Vec<SubEvent>, StoreError> {
        let adc_integral = self.read_field(event, ADCINTEGRAL_FIELD)?;
        let time_peak = self.read_field(event, TIMEPEAK_FIELD)?;
        let channel_id = self.read_field(event, CHANNELID_FIELD)?;
        let module_id = self.read_field(event, APACRP_FIELD)?;
        let plane_id = self.read_field(event, PLANEID_FIELD)?;

        let n_sub = time_peak.len();
        if [&adc_integral, &channel_id, &module_id, &plane_id]
            .iter()
            .any(|f| f.len() != n_sub)
        {
            return Err(StoreError::MismatchedSubEvents(event));
        }

        let mut subevents = Vec::with_capacity(n_sub);
        let fields = adc_integral
            .into_iter()
            .zip(time_peak)
            .zip(channel_id)
            .zip(module_id)
            .zip(plane_id);
        for (sub_idx, ((((adc, time), channel), module), plane)) in fields.enumerate() {
            let sub = SubEvent::new(adc, time, channel, module, plane)
                .ok_or(StoreError::MismatchedLengths(event, sub_idx))?;
            subevents.push(sub);
        }
        Ok(subevents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index("event_12", EVENT_PREFIX), Some(12));
        assert_eq!(parse_index("subevent_0", SUBEVENT_PREFIX), Some(0));
        assert_eq!(parse_index("event_x", EVENT_PREFIX), None);
        assert_eq!(parse_index("run_1", EVENT_PREFIX), None);
    }
}
