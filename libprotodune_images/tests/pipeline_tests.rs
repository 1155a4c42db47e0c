use std::path::Path;
use std::sync::mpsc;

use libprotodune_images::config::BinningConfig;
use libprotodune_images::constants::{
    ADCINTEGRAL_FIELD, APACRP_FIELD, CHANNELID_FIELD, PLANEID_FIELD, TIMEPEAK_FIELD,
};
use libprotodune_images::detector::{Detector, Plane};
use libprotodune_images::error::{BinningError, ChannelMapError};
use libprotodune_images::extraction::extract_source;
use libprotodune_images::process::process_binning;
use libprotodune_images::tree_source::MemoryTree;

struct Hit {
    adc: i32,
    time: i32,
    channel: i32,
    module: i32,
    plane: i32,
}

fn hit(adc: i32, time: i32, channel: i32, module: i32, plane: i32) -> Hit {
    Hit {
        adc,
        time,
        channel,
        module,
        plane,
    }
}

/// Write one event per entry of `events`, each with one sub-event per inner list
fn write_store(path: &Path, events: &[Vec<Vec<Hit>>]) {
    let column = |get: fn(&Hit) -> i32| {
        events
            .iter()
            .map(|subs| {
                subs.iter()
                    .map(|hits| hits.iter().map(get).collect())
                    .collect()
            })
            .collect()
    };
    let mut tree = MemoryTree::new()
        .with_field(ADCINTEGRAL_FIELD, column(|h| h.adc))
        .with_field(TIMEPEAK_FIELD, column(|h| h.time))
        .with_field(CHANNELID_FIELD, column(|h| h.channel))
        .with_field(APACRP_FIELD, column(|h| h.module))
        .with_field(PLANEID_FIELD, column(|h| h.plane));
    let fields: Vec<String> = [
        ADCINTEGRAL_FIELD,
        TIMEPEAK_FIELD,
        CHANNELID_FIELD,
        APACRP_FIELD,
        PLANEID_FIELD,
    ]
    .iter()
    .map(|f| f.to_string())
    .collect();
    extract_source(&mut tree, path, &fields).unwrap();
}

/// np04 events: APA 1 and APA 2 are complete, APA 3 only has collection hits
fn np04_events() -> Vec<Vec<Vec<Hit>>> {
    vec![
        vec![vec![
            hit(10, 100, 410, 1, 0),
            hit(20, 150, 1210, 1, 1),
            hit(30, 200, 2090, 1, 2),
            hit(40, 5000, 2600, 2, 0),
            hit(50, 5100, 3400, 2, 1),
            hit(60, 5200, 4200, 2, 2),
            hit(70, 9000, 7300, 3, 2),
        ]],
        vec![
            vec![hit(5, 0, 2100, 1, 2)],
            vec![hit(6, 10, 4170, 2, 2), hit(7, 30000, 4170, 2, 2)],
        ],
    ]
}

fn config(dir: &Path, plane: Option<Plane>, drop_bad_module: bool) -> BinningConfig {
    BinningConfig {
        input_path: dir.join("store.h5"),
        output_path: dir.join("images.npz"),
        detector: Detector::Np04,
        n_time_bins: 10,
        n_channel_bins: 8,
        plane,
        drop_bad_module,
        channel_map_path: None,
    }
}

#[test]
fn test_combined_binning_keeps_planes_aligned() {
    let dir = tempfile::tempdir().unwrap();
    write_store(&dir.path().join("store.h5"), &np04_events());
    let (tx, rx) = mpsc::channel();

    let counts = process_binning(&config(dir.path(), None, false), &tx).unwrap();
    // APA 1 and APA 2 from the first event only; everything else lacks induction hits
    assert_eq!(counts, vec![("plane0", 2), ("plane1", 2), ("plane2", 2)]);
    assert!(dir.path().join("images.npz").exists());
    drop(tx);
    let last = rx.iter().last().unwrap();
    assert_eq!(last.progress, 1.0);
}

#[test]
fn test_combined_binning_without_bad_module() {
    let dir = tempfile::tempdir().unwrap();
    write_store(&dir.path().join("store.h5"), &np04_events());
    let (tx, _rx) = mpsc::channel();

    let counts = process_binning(&config(dir.path(), None, true), &tx).unwrap();
    assert_eq!(counts, vec![("plane0", 1), ("plane1", 1), ("plane2", 1)]);
}

#[test]
fn test_single_plane_binning() {
    let dir = tempfile::tempdir().unwrap();
    write_store(&dir.path().join("store.h5"), &np04_events());
    let (tx, _rx) = mpsc::channel();

    let counts = process_binning(&config(dir.path(), Some(Plane::Z), false), &tx).unwrap();
    // Event 0: APAs 1, 2, 3. Event 1: APA 1 in the first sub-event, APA 2 in the second.
    assert_eq!(counts, vec![("images", 5)]);

    let counts = process_binning(&config(dir.path(), Some(Plane::U), false), &tx).unwrap();
    assert_eq!(counts, vec![("images", 2)]);
}

#[test]
fn test_unknown_module_aborts() {
    let dir = tempfile::tempdir().unwrap();
    write_store(
        &dir.path().join("store.h5"),
        &[vec![vec![hit(1, 0, 100, 7, 2)]]],
    );
    let (tx, _rx) = mpsc::channel();

    let result = process_binning(&config(dir.path(), Some(Plane::Z), false), &tx);
    assert!(matches!(
        result,
        Err(BinningError::MapError(ChannelMapError::Lookup(7, Plane::Z)))
    ));
    assert!(!dir.path().join("images.npz").exists());
}

#[test]
fn test_custom_channel_map() {
    let dir = tempfile::tempdir().unwrap();
    write_store(
        &dir.path().join("store.h5"),
        &[vec![vec![hit(1, 0, 100, 7, 2)]]],
    );
    let map_path = dir.path().join("map.csv");
    std::fs::write(&map_path, "module,plane,first_channel,channel_count\n7,2,0,200\n").unwrap();
    let (tx, _rx) = mpsc::channel();

    let mut binning = config(dir.path(), Some(Plane::Z), false);
    binning.channel_map_path = Some(map_path);
    let counts = process_binning(&binning, &tx).unwrap();
    assert_eq!(counts, vec![("images", 1)]);
}
