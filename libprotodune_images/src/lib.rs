//! # protodune_images
//!
//! protodune_images turns ProtoDUNE trigger-primitive (TP) windows into images for machine
//! learning training. It works in two stages:
//!
//! 1. Extraction: the TP window tree written by the `GeneralProtoDUNETriggerTrainingDataMaker`
//! art module is read from one or more art::ROOT files and appended to an HDF5 event store.
//! 2. Binning: every sub-event of the store is split by module (APA for np04, CRP for np02) and
//! plane, and the TPs are histogrammed into fixed size (channel, time) images weighted by ADC
//! integral. The images are written as a compressed numpy `.npz` bundle.
//!
//! ## Installation
//!
//! Currently the only method of install is from source.
//!
//! ### HDF5
//!
//! Before building and running protodune_images, HDF5 must be installed. Typically this will
//! be installed using a package manager (homebrew, apt, etc), and the Rust libraries will
//! auto detect the location of the HDF install. If HDF5 lives in a custom location, write the
//! following snippet into the file `.cargo/config.toml` in the repository:
//!
//! ```toml
//! [env]
//! HDF5_DIR="/path/to/my/hdf5/install/"
//!
//! [build]
//! rustflags="-C link-args=-Wl,-rpath,/path/to/my/hdf5/install/lib"
//! ```
//!
//! ### ROOT input
//!
//! Reading art::ROOT files requires the `root` feature:
//! `cargo install --path ./protodune_images_cli --features root`. Without it, extraction
//! refuses ROOT inputs and only binning of existing stores is available.
//!
//! ## Configuration
//!
//! Both stages can be driven from the command line or from a YAML file. The YAML format is
//! as follows (either section may be left out):
//!
//! ```yml
//! extraction:
//!   input_files: []
//!   input_list: null
//!   output_path: None
//!   neutrino_only: false
//!   fields:
//!   - Window_apacrp
//!   - Window_planeid
//!   - Window_timepeak
//!   - Window_channelid
//!   - Window_adcintegral
//!   - Window_tot
//!   - Window_adcpeak
//! binning:
//!   input_path: None
//!   output_path: None
//!   detector: np04
//!   n_time_bins: 100
//!   n_channel_bins: 100
//!   plane: null
//!   drop_bad_module: false
//!   channel_map_path: null
//! ```
//!
//! If `plane` is null, all three planes are binned together and a module only produces images
//! when every plane has hits. `drop_bad_module` ignores APA 1 for np04 and does nothing for
//! np02. If `channel_map_path` is null the bundled map of the detector is used.
//!
//! ### Channel Map Format
//!
//! The channel map is a CSV file with the columns
//!
//! ```csv
//! module,plane,first_channel,channel_count
//! ```
//!
//! Each (module, plane) pair may appear once, and the channel ranges of the planes of a module
//! may not overlap.
//!
//! ## Output
//!
//! ### HDF5 Event Store
//!
//! ```text
//! events - min_event, max_event, version
//! |---- event_#
//! |    |---- Window_apacrp
//! |    |    |---- subevent_#(dset)
//! |    |---- Window_planeid
//! |    |    |---- subevent_#(dset)
//! |    |---- ...
//! ```
//!
//! Extracting into an existing store appends new events after the largest existing event
//! number.
//!
//! ### Image Bundle
//!
//! A `.npz` archive holding `images` (single plane) or `plane0`, `plane1`, `plane2`
//! (combined), each of shape (count, channel bins, time bins). Every image spans 20000 ticks
//! starting at the earliest TP of its plane; in combined mode all three planes share the window
//! of the collection plane.
//!
//! Images are appended in numeric event order (`event_2` before `event_10`) and, within an
//! event, numeric sub-event order. Tools walking the store by name (h5py, for example) visit
//! `event_10` before `event_2`, so compare outputs by event index rather than position.
pub mod binner;
pub mod bundle;
pub mod channel_map;
pub mod config;
pub mod constants;
pub mod detector;
pub mod error;
pub mod extraction;
pub mod hdf_store;
pub mod histogram;
pub mod process;
pub mod status;
pub mod subevent;
pub mod tree_source;
