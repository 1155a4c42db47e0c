// Length of the trigger-primitive readout window in TPC ticks. Every image spans exactly this
// much time starting from the earliest hit of its anchor plane.
pub const TIME_WINDOW_TICKS: f64 = 20_000.0;

// Store layout
pub const EVENTS_NAME: &str = "events";
pub const EVENT_PREFIX: &str = "event_";
pub const SUBEVENT_PREFIX: &str = "subevent_";
/// This is the version of the store format
pub const FORMAT_VERSION: &str = "1.0";

// Source trees written by the training data maker module
pub const STANDARD_TREE_PATH: &str = "GeneralProtoDUNETriggerTrainingDataMaker/TPWindowTree";
pub const NEUTRINO_TREE_PATH: &str = "GeneralProtoDUNETriggerTrainingDataMaker/TPNuWindowTree";

// Fields read by the binner
pub const APACRP_FIELD: &str = "Window_apacrp";
pub const PLANEID_FIELD: &str = "Window_planeid";
pub const TIMEPEAK_FIELD: &str = "Window_timepeak";
pub const CHANNELID_FIELD: &str = "Window_channelid";
pub const ADCINTEGRAL_FIELD: &str = "Window_adcintegral";
// Extra fields carried along by extraction
pub const TOT_FIELD: &str = "Window_tot";
pub const ADCPEAK_FIELD: &str = "Window_adcpeak";

/// The fields extracted when the configuration does not name any
pub const DEFAULT_FIELDS: [&str; 7] = [
    APACRP_FIELD,
    PLANEID_FIELD,
    TIMEPEAK_FIELD,
    CHANNELID_FIELD,
    ADCINTEGRAL_FIELD,
    TOT_FIELD,
    ADCPEAK_FIELD,
];

/// The fields a store must carry for binning
pub const BINNING_FIELDS: [&str; 5] = [
    ADCINTEGRAL_FIELD,
    TIMEPEAK_FIELD,
    CHANNELID_FIELD,
    APACRP_FIELD,
    PLANEID_FIELD,
];

// Output bundle keys
pub const SINGLE_PLANE_KEY: &str = "images";
pub const PLANE_KEYS: [&str; 3] = ["plane0", "plane1", "plane2"];
