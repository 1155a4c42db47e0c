use clap::{value_parser, Arg, ArgAction, ArgGroup, ArgMatches, Command};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::mpsc;
use std::sync::Arc;

use libprotodune_images::config::{BinningConfig, Config, ExtractionConfig};
use libprotodune_images::detector::{Detector, Plane};
use libprotodune_images::error::ConfigError;
use libprotodune_images::process::process;
use libprotodune_images::status::StageStatus;

const LOG_PATH: &str = "./protodune_images.log";

fn make_template_config(path: &Path) -> Result<(), ConfigError> {
    let config = Config::default();
    let yaml_str = serde_yaml::to_string(&config)?;
    let mut file = File::create(path)?;
    file.write_all(yaml_str.as_bytes())?;
    Ok(())
}

/// Log to the terminal and to protodune_images.log
///
/// Returns a logger writing only to the file, used while the progress bar owns the terminal.
fn init_logging() -> spdlog::Result<Arc<spdlog::Logger>> {
    let file_sink = Arc::new(
        spdlog::sink::FileSink::builder()
            .path(PathBuf::from(LOG_PATH))
            .formatter(spdlog::formatter::PatternFormatter::new(
                spdlog::formatter::pattern!(
                    "[{date_short} {time_short}] - [{^{level}}] - {payload}{eol}"
                ),
            ))
            .truncate(true)
            .build()?,
    );
    let logger = Arc::new(
        spdlog::Logger::builder()
            .sinks(spdlog::default_logger().sinks().to_owned())
            .sink(file_sink.clone())
            .flush_level_filter(spdlog::LevelFilter::All)
            .build()?,
    );
    spdlog::set_default_logger(logger);
    let file_logger = spdlog::Logger::builder()
        .sink(file_sink)
        .flush_level_filter(spdlog::LevelFilter::All)
        .build()?;
    Ok(Arc::new(file_logger))
}

fn build_cli() -> Command {
    Command::new("protodune_images")
        .about("Make ML training images from ProtoDUNE trigger primitives")
        .arg_required_else_help(true)
        .subcommand_required(true)
        .subcommand(
            Command::new("new")
                .about("Make a template configuration yaml file")
                .arg(
                    Arg::new("path")
                        .short('p')
                        .long("path")
                        .required(true)
                        .help("Path to the file"),
                ),
        )
        .subcommand(
            Command::new("run")
                .about("Run the stages described by a configuration yaml file")
                .arg(
                    Arg::new("path")
                        .short('p')
                        .long("path")
                        .required(true)
                        .help("Path to the file"),
                ),
        )
        .subcommand(
            Command::new("extract")
                .about("Convert art::ROOT TP window trees to an HDF5 event store")
                .arg(
                    Arg::new("inputfile")
                        .short('i')
                        .long("inputfile")
                        .help("Single input art::ROOT file"),
                )
                .arg(
                    Arg::new("inputlist")
                        .short('I')
                        .long("inputlist")
                        .help("Text file containing a list of input files (one per line)"),
                )
                .group(
                    ArgGroup::new("input")
                        .args(["inputfile", "inputlist"])
                        .required(true),
                )
                .arg(
                    Arg::new("outputfile")
                        .short('o')
                        .long("outputfile")
                        .required(true)
                        .help("Output hdf5 file"),
                )
                .arg(
                    Arg::new("neutrinowindows")
                        .short('n')
                        .long("neutrinowindows")
                        .action(ArgAction::SetTrue)
                        .help("Only extract the neutrino windows"),
                ),
        )
        .subcommand(
            Command::new("bin")
                .about("Create binned images from an HDF5 event store")
                .arg(
                    Arg::new("inputfile")
                        .short('i')
                        .long("inputfile")
                        .required(true)
                        .help("Input .hdf5 file produced by extract"),
                )
                .arg(
                    Arg::new("outputfile")
                        .short('o')
                        .long("outputfile")
                        .required(true)
                        .help("File to save binned images (.npz)"),
                )
                .arg(
                    Arg::new("detector")
                        .short('d')
                        .long("detector")
                        .required(true)
                        .value_parser(["np04", "np02"])
                        .help("Which protodune detector, np04 or np02"),
                )
                .arg(
                    Arg::new("ntimebins")
                        .short('t')
                        .long("ntimebins")
                        .required(true)
                        .value_parser(value_parser!(u64).range(1..))
                        .help("Number of time bins"),
                )
                .arg(
                    Arg::new("nchannelbins")
                        .short('c')
                        .long("nchannelbins")
                        .required(true)
                        .value_parser(value_parser!(u64).range(1..))
                        .help("Number of channel id bins"),
                )
                .arg(
                    Arg::new("planechoice")
                        .short('p')
                        .long("planechoice")
                        .value_parser(value_parser!(i64).range(0..=2))
                        .help("Only make images of this plane; all 3 planes at once if not given"),
                )
                .arg(
                    Arg::new("noapa1")
                        .long("noapa1")
                        .action(ArgAction::SetTrue)
                        .help("Option to ignore broken apa 1 for np04"),
                )
                .arg(
                    Arg::new("channelmap")
                        .short('m')
                        .long("channelmap")
                        .help("Custom channel map CSV (module,plane,first_channel,channel_count)"),
                ),
        )
}

fn extraction_config(matches: &ArgMatches) -> ExtractionConfig {
    ExtractionConfig {
        input_files: matches
            .get_one::<String>("inputfile")
            .map(PathBuf::from)
            .into_iter()
            .collect(),
        input_list: matches.get_one::<String>("inputlist").map(PathBuf::from),
        output_path: matches
            .get_one::<String>("outputfile")
            .map(PathBuf::from)
            .unwrap_or_default(),
        neutrino_only: matches.get_flag("neutrinowindows"),
        ..Default::default()
    }
}

fn binning_config(matches: &ArgMatches) -> Result<BinningConfig, ConfigError> {
    let detector = match matches.get_one::<String>("detector") {
        Some(d) => Detector::from_str(d)?,
        None => Detector::Np04,
    };
    let plane = match matches.get_one::<i64>("planechoice") {
        Some(p) => Some(Plane::try_from(*p)?),
        None => None,
    };
    Ok(BinningConfig {
        input_path: matches
            .get_one::<String>("inputfile")
            .map(PathBuf::from)
            .unwrap_or_default(),
        output_path: matches
            .get_one::<String>("outputfile")
            .map(PathBuf::from)
            .unwrap_or_default(),
        detector,
        n_time_bins: matches.get_one::<u64>("ntimebins").copied().unwrap_or(1) as usize,
        n_channel_bins: matches.get_one::<u64>("nchannelbins").copied().unwrap_or(1) as usize,
        plane,
        drop_bad_module: matches.get_flag("noapa1"),
        channel_map_path: matches.get_one::<String>("channelmap").map(PathBuf::from),
    })
}

/// Run the pipeline on a separate thread and show its progress
///
/// While the bar is drawn the worker logs only go to `file_logger`, so log lines and bar redraws
/// do not interleave on the terminal.
fn run_with_progress(config: Config, file_logger: Option<Arc<spdlog::Logger>>) -> ExitCode {
    let (tx, rx) = mpsc::channel::<StageStatus>();
    let pb = ProgressBar::new(100);
    if let Ok(style) = ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos:>3}% {msg}") {
        pb.set_style(style);
    }

    let terminal_logger = spdlog::default_logger();
    if let Some(logger) = file_logger {
        spdlog::set_default_logger(logger);
    }

    let handle = std::thread::spawn(move || process(config, tx));

    // The channel closes once the worker is done with its sender
    for status in rx.iter() {
        pb.set_position((status.progress * 100.0) as u64);
        pb.set_message(format!("{:?} {}", status.stage, status.message));
    }
    pb.finish();
    let result = handle.join();
    spdlog::set_default_logger(terminal_logger);

    match result {
        Ok(Ok(())) => {
            spdlog::info!("Done. See {LOG_PATH} for details.");
            ExitCode::SUCCESS
        }
        Ok(Err(e)) => {
            spdlog::error!("Processing failed with error: {e}");
            ExitCode::FAILURE
        }
        Err(_) => {
            spdlog::error!("Failed to join processing task!");
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    let matches = build_cli().get_matches();

    let file_logger = match init_logging() {
        Ok(logger) => Some(logger),
        Err(e) => {
            eprintln!("Could not create logging: {e}");
            None
        }
    };

    let config = match matches.subcommand() {
        Some(("new", sub)) => {
            let path = PathBuf::from(sub.get_one::<String>("path").expect("path is required"));
            spdlog::info!("Making a template config at {}...", path.to_string_lossy());
            return match make_template_config(&path) {
                Ok(()) => {
                    spdlog::info!("Done.");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    spdlog::error!("{e}");
                    ExitCode::FAILURE
                }
            };
        }
        Some(("run", sub)) => {
            let path = PathBuf::from(sub.get_one::<String>("path").expect("path is required"));
            spdlog::info!("Loading config from {}...", path.to_string_lossy());
            match Config::read_config_file(&path) {
                Ok(c) => c,
                Err(e) => {
                    spdlog::error!("{e}");
                    return ExitCode::FAILURE;
                }
            }
        }
        Some(("extract", sub)) => Config {
            extraction: Some(extraction_config(sub)),
            binning: None,
        },
        Some(("bin", sub)) => match binning_config(sub) {
            Ok(binning) => Config {
                extraction: None,
                binning: Some(binning),
            },
            Err(e) => {
                spdlog::error!("{e}");
                return ExitCode::FAILURE;
            }
        },
        _ => return ExitCode::FAILURE,
    };

    run_with_progress(config, file_logger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use libprotodune_images::binner::BinningMode;

    #[test]
    fn test_cli_is_valid() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_bin_args() {
        let matches = build_cli().get_matches_from([
            "protodune_images", "bin", "-i", "in.h5", "-o", "out.npz", "-d", "np04", "-t", "50",
            "-c", "60", "-p", "2", "--noapa1",
        ]);
        let (_, sub) = matches.subcommand().unwrap();
        let config = binning_config(sub).unwrap();
        assert_eq!(config.n_time_bins, 50);
        assert_eq!(config.n_channel_bins, 60);
        assert_eq!(config.mode(), BinningMode::SinglePlane(Plane::Z));
        assert_eq!(config.excluded_module(), Some(1));
    }

    #[test]
    fn test_bad_detector_and_plane_are_usage_errors() {
        let result = build_cli().try_get_matches_from([
            "protodune_images", "bin", "-i", "a", "-o", "b", "-d", "np03", "-t", "1", "-c", "1",
        ]);
        assert!(result.is_err());
        let result = build_cli().try_get_matches_from([
            "protodune_images", "bin", "-i", "a", "-o", "b", "-d", "np02", "-t", "1", "-c", "1",
            "-p", "3",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_progress_run_restores_terminal_logger() {
        let terminal_logger = spdlog::default_logger();
        let quiet = Arc::new(spdlog::Logger::builder().build().unwrap());
        let config = Config {
            extraction: None,
            binning: None,
        };
        run_with_progress(config, Some(quiet));
        assert!(Arc::ptr_eq(&spdlog::default_logger(), &terminal_logger));
    }

    #[test]
    fn test_extract_requires_one_input() {
        let result = build_cli().try_get_matches_from([
            "protodune_images", "extract", "-i", "a.root", "-I", "list.txt", "-o", "out.h5",
        ]);
        assert!(result.is_err());
        let matches = build_cli()
            .get_matches_from(["protodune_images", "extract", "-I", "list.txt", "-o", "out.h5", "-n"]);
        let (_, sub) = matches.subcommand().unwrap();
        let config = extraction_config(sub);
        assert!(config.input_files.is_empty());
        assert!(config.neutrino_only);
    }
}
