use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use super::error::ConfigError;

/// The two supported ProtoDUNE detectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Detector {
    /// ProtoDUNE horizontal drift (APAs)
    Np04,
    /// ProtoDUNE vertical drift (CRPs)
    Np02,
}

impl Detector {
    /// The module which is dropped when the user asks to skip the broken one.
    ///
    /// Only np04 has one (APA 1); for np02 this is always None.
    pub fn bad_module(&self) -> Option<i32> {
        match self {
            Self::Np04 => Some(1),
            Self::Np02 => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Np04 => "np04",
            Self::Np02 => "np02",
        }
    }
}

impl FromStr for Detector {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "np04" => Ok(Self::Np04),
            "np02" => Ok(Self::Np02),
            _ => Err(ConfigError::UnknownDetector(s.to_string())),
        }
    }
}

impl TryFrom<String> for Detector {
    type Error = ConfigError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value)
    }
}

impl From<Detector> for String {
    fn from(value: Detector) -> Self {
        value.name().to_string()
    }
}

impl Display for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Readout plane of a module. U and V are induction planes, Z is the collection plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Plane {
    U,
    V,
    Z,
}

impl Plane {
    pub const ALL: [Plane; 3] = [Plane::U, Plane::V, Plane::Z];

    /// The plane id as it appears in the trigger-primitive data
    pub fn id(&self) -> i32 {
        match self {
            Self::U => 0,
            Self::V => 1,
            Self::Z => 2,
        }
    }

    pub fn index(&self) -> usize {
        self.id() as usize
    }
}

impl TryFrom<i64> for Plane {
    type Error = ConfigError;
    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::U),
            1 => Ok(Self::V),
            2 => Ok(Self::Z),
            _ => Err(ConfigError::InvalidPlane(value)),
        }
    }
}

impl From<Plane> for i64 {
    fn from(value: Plane) -> Self {
        value.id() as i64
    }
}

impl FromStr for Plane {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<i64>() {
            Ok(v) => Self::try_from(v),
            Err(_) => Err(ConfigError::UnparsablePlane(s.to_string())),
        }
    }
}

impl Display for Plane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}
