use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::{
    error::TargetError,
    schedule::DailySchedule,
    types::{Celsius, OperationMode},
};

pub const TEMP_OVERRIDE_TIMEOUT_S: i64 = 2 * 3_600;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImmediateSetting {
    pub temp: Celsius,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempOverride {
    pub temp: Celsius,
    #[serde(rename = "time_stamp", default)]
    pub timestamp: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThermostatConf {
    #[serde(default)]
    pub operation_mode: Option<String>,
    #[serde(default)]
    pub immediate: Option<ImmediateSetting>,
    #[serde(default)]
    pub temp_override: Option<TempOverride>,
    #[serde(default)]
    pub daily_schedule: Option<DailySchedule>,
    // Contents are never read; the key only has to be present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub off: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_mode: Option<OperationMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub immediate: Option<ImmediateSetting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_override: Option<TempOverride>,
}

impl ThermostatConf {
    pub fn mode(&self) -> Result<OperationMode, TargetError> {
        let label = self
            .operation_mode
            .as_deref()
            .ok_or(TargetError::ModeUndefined)?;
        OperationMode::parse(label).ok_or_else(|| TargetError::UnknownMode(label.to_string()))
    }

    pub fn resolve_target(&self, now: DateTime<FixedOffset>) -> Result<Celsius, TargetError> {
        let mode = self.mode()?;
        match mode {
            OperationMode::Off => {
                self.off
                    .as_ref()
                    .ok_or(TargetError::MissingModeData(mode.as_str()))?;
                Err(TargetError::Off)
            }
            OperationMode::Immediate => self
                .immediate
                .map(|setting| setting.temp)
                .ok_or(TargetError::MissingModeData(mode.as_str())),
            OperationMode::DailySchedule => self
                .daily_schedule
                .as_ref()
                .ok_or(TargetError::MissingModeData(mode.as_str()))?
                .active_slot(now)
                .map(|slot| slot.temp)
                .ok_or(TargetError::NoTarget),
            OperationMode::TempOverride => {
                let overridden = self
                    .temp_override
                    .ok_or(TargetError::MissingModeData(mode.as_str()))?;
                let slot = self
                    .daily_schedule
                    .as_ref()
                    .and_then(|schedule| schedule.active_slot(now));

                match slot {
                    // Override holds for the rest of the slot it was set in.
                    Some(slot) if slot.contains(overridden.timestamp) => Ok(overridden.temp),
                    Some(slot) => Ok(slot.temp),
                    None if overridden.timestamp > now.timestamp() - TEMP_OVERRIDE_TIMEOUT_S => {
                        Ok(overridden.temp)
                    }
                    None => Err(TargetError::NoTarget),
                }
            }
        }
    }
}
