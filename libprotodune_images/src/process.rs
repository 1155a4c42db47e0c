use std::sync::mpsc::Sender;

use super::binner::{ImageBinner, PlaneTargets};
use super::bundle::ImageBundle;
use super::channel_map::ChannelMap;
use super::config::{BinningConfig, Config};
use super::error::{BinningError, ProcessorError};
use super::extraction::process_extraction;
use super::hdf_store::EventStoreReader;
use super::status::{Stage, StageStatus};

/// Bin every event of an HDF5 event store and write the images to a .npz bundle.
///
/// Returns the number of images saved for each output key.
pub fn process_binning(
    config: &BinningConfig,
    tx: &Sender<StageStatus>,
) -> Result<Vec<(&'static str, usize)>, BinningError> {
    config.validate()?;
    let channel_map = ChannelMap::new(config.detector, config.channel_map_path.as_deref())?;
    let mode = config.mode();
    let binner = ImageBinner::new(
        channel_map,
        PlaneTargets::from(mode),
        config.n_channel_bins,
        config.n_time_bins,
        config.excluded_module(),
    );
    let mut bundle = ImageBundle::new(mode, config.n_channel_bins, config.n_time_bins);

    spdlog::info!("Binning training data");
    spdlog::info!("input file: {}", config.input_path.to_string_lossy());
    spdlog::info!("output file: {}", config.output_path.to_string_lossy());
    spdlog::info!("detector: {}", config.detector);
    if let Some(bad) = config.excluded_module() {
        spdlog::info!("Ignoring module {bad}");
    }

    let reader = EventStoreReader::open(&config.input_path)?;
    let n_events = reader.n_events();
    spdlog::info!("There are {n_events} events in the file");

    let flush_frac: f32 = 0.01;
    let flush_val = ((n_events as f32 * flush_frac) as usize).max(1);
    let mut n_subevents: usize = 0;
    tx.send(StageStatus::new(0.0, Stage::Binning, String::new()))?;
    for (count, event) in reader.event_indices().iter().enumerate() {
        for subevent in reader.read_event(*event)? {
            binner.bin_subevent(&subevent, &mut bundle)?;
            n_subevents += 1;
        }
        if (count + 1) % flush_val == 0 {
            tx.send(StageStatus::new(
                (count + 1) as f32 / n_events as f32,
                Stage::Binning,
                format!("{} events", count + 1),
            ))?;
        }
    }
    spdlog::info!("Binned {n_subevents} sub-events");

    spdlog::info!("Saving images in a .npz file");
    bundle.write_npz(&config.output_path)?;
    let counts = bundle.counts();
    for (key, n_images) in counts.iter() {
        spdlog::info!(
            "Saved {n_images} {key} images to {}",
            config.output_path.to_string_lossy()
        );
    }
    tx.send(StageStatus::new(1.0, Stage::Binning, String::from("done")))?;
    Ok(counts)
}

/// The main loop. Runs the stages present in the config, extraction first.
///
/// Any error aborts the whole run.
pub fn process(config: Config, tx: Sender<StageStatus>) -> Result<(), ProcessorError> {
    config.validate()?;
    if let Some(extraction) = &config.extraction {
        spdlog::info!("Now processing extraction...");
        process_extraction(extraction, &tx)?;
    }
    if let Some(binning) = &config.binning {
        spdlog::info!("Now processing binning...");
        process_binning(binning, &tx)?;
    }
    Ok(())
}
