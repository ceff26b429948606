use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("required field `{0}` is missing or empty")]
    MissingField(&'static str),
    #[error("field `{field}` has invalid value `{value}`")]
    InvalidField { field: &'static str, value: String },
    #[error("operation mode `{0}` cannot be set from the display")]
    UnsupportedMode(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed record in {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    #[error("upstream unreachable: {0}")]
    Unreachable(String),
    #[error("upstream answered with status {0}")]
    Status(u16),
    #[error("malformed upstream document: {0}")]
    Malformed(String),
}

// Codes match the exit statuses of the control-side target lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("configuration record has no data for operation mode `{0}`")]
    MissingModeData(&'static str),
    #[error("operation mode is not defined")]
    ModeUndefined,
    #[error("unknown operation mode `{0}`")]
    UnknownMode(String),
    #[error("no target temperature defined for the current time")]
    NoTarget,
    #[error("thermostat is off")]
    Off,
}

impl TargetError {
    pub fn code(&self) -> u8 {
        match self {
            Self::MissingModeData(_) => 1,
            Self::ModeUndefined => 2,
            Self::UnknownMode(_) => 3,
            Self::NoTarget => 4,
            Self::Off => 5,
        }
    }
}
