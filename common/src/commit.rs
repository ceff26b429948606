use serde::{Deserialize, Serialize};

use crate::{
    conf::{ConfPatch, ImmediateSetting, TempOverride},
    error::ValidationError,
    live::LiveStatePatch,
    types::{Celsius, OperationMode},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Commit {
    pub tempt: Celsius,
    pub operation_mode: OperationMode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitForm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TelemetryForm<'a> {
    pub plant_id: &'a str,
    pub apikey: &'a str,
    pub tempt: String,
    pub operation_mode: &'static str,
}

impl Commit {
    pub fn live_patch(&self) -> LiveStatePatch {
        LiveStatePatch {
            tempt: Some(self.tempt),
        }
    }

    pub fn conf_patch(&self, now_epoch: i64) -> ConfPatch {
        let mut patch = ConfPatch {
            operation_mode: Some(self.operation_mode),
            ..ConfPatch::default()
        };

        match self.operation_mode {
            OperationMode::TempOverride => {
                patch.temp_override = Some(TempOverride {
                    temp: self.tempt,
                    timestamp: now_epoch,
                });
            }
            OperationMode::Immediate => {
                patch.immediate = Some(ImmediateSetting { temp: self.tempt });
            }
            OperationMode::DailySchedule | OperationMode::Off => {}
        }

        patch
    }

    pub fn to_form(&self) -> CommitForm {
        CommitForm {
            tempt: Some(self.tempt.to_string()),
            operation_mode: Some(self.operation_mode.as_str().to_string()),
        }
    }

    pub fn telemetry_form<'a>(&self, plant_id: &'a str, api_key: &'a str) -> TelemetryForm<'a> {
        TelemetryForm {
            plant_id,
            apikey: api_key,
            tempt: self.tempt.to_string(),
            operation_mode: self.operation_mode.as_str(),
        }
    }
}

impl CommitForm {
    pub fn validate(&self) -> Result<Commit, ValidationError> {
        let tempt = required(self.tempt.as_deref(), "tempt")?;
        let mode = required(self.operation_mode.as_deref(), "operation_mode")?;

        let tempt = Celsius::parse(tempt).ok_or_else(|| ValidationError::InvalidField {
            field: "tempt",
            value: tempt.to_string(),
        })?;
        let operation_mode = OperationMode::parse(mode)
            .filter(|mode| mode.is_display_writable())
            .ok_or_else(|| ValidationError::UnsupportedMode(mode.to_string()))?;

        Ok(Commit {
            tempt,
            operation_mode,
        })
    }
}

fn required<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, ValidationError> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(ValidationError::MissingField(field))
}
