use serde::{Deserialize, Serialize};

use crate::types::OperationMode;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenericConfig {
    pub plant_id: String,
    pub api_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermostatSection {
    pub control1_name: String,
    pub control2_name: String,
    pub user_mode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuiConfig {
    pub location: String,
    pub weather_api_url: String,
    pub weather_app_id: String,
    pub weather_icon_base_url: String,
    pub timezone: String,
}

impl Default for GuiConfig {
    fn default() -> Self {
        Self {
            location: String::new(),
            weather_api_url: "http://api.openweathermap.org/data/2.5/weather".to_string(),
            weather_app_id: String::new(),
            weather_icon_base_url: "http://openweathermap.org/img/w".to_string(),
            timezone: "Europe/Rome".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub live_state_path: String,
    pub config_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            live_state_path: "/tmp/curr_data.json".to_string(),
            config_path: "/media/data/thermostat.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncTimings {
    pub live_poll_ms: u64,
    pub weather_poll_ms: u64,
    pub clock_tick_ms: u64,
}

impl Default for SyncTimings {
    fn default() -> Self {
        Self {
            live_poll_ms: 5_000,
            weather_poll_ms: 600_000,
            clock_tick_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustmentConfig {
    pub debounce_ms: u64,
    pub min_target_c: i32,
    pub max_target_c: i32,
}

impl Default for AdjustmentConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 3_000,
            min_target_c: 5,
            max_target_c: 35,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub generic: GenericConfig,
    pub thermostat: ThermostatSection,
    pub gui: GuiConfig,
    pub stores: StoreConfig,
    pub timings: SyncTimings,
    pub adjustment: AdjustmentConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControlVisibility {
    pub control1: bool,
    pub control2: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherLookup {
    pub location: String,
    #[serde(rename = "apiUrl")]
    pub api_url: String,
    #[serde(rename = "appId")]
    pub app_id: String,
    #[serde(rename = "iconBaseUrl")]
    pub icon_base_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplaySettings {
    #[serde(rename = "plantId")]
    pub plant_id: String,
    #[serde(rename = "operationMode")]
    pub operation_mode: OperationMode,
    pub controls: ControlVisibility,
    pub weather: Option<WeatherLookup>,
    #[serde(rename = "webApiEnabled")]
    pub web_api_enabled: bool,
    pub timezone: String,
    pub timings: SyncTimings,
    pub adjustment: AdjustmentConfig,
}

impl GenericConfig {
    pub fn webapi_enabled(&self) -> bool {
        !self.plant_id.trim().is_empty() && !self.api_key.trim().is_empty()
    }
}

impl SyncTimings {
    pub fn sanitize(&mut self) {
        self.live_poll_ms = self.live_poll_ms.clamp(500, 60_000);
        self.weather_poll_ms = self.weather_poll_ms.clamp(60_000, 86_400_000);
        self.clock_tick_ms = self.clock_tick_ms.clamp(1_000, 60_000);
    }
}

impl AdjustmentConfig {
    pub fn sanitize(&mut self) {
        self.debounce_ms = self.debounce_ms.clamp(250, 60_000);
        if self.min_target_c > self.max_target_c {
            std::mem::swap(&mut self.min_target_c, &mut self.max_target_c);
        }
    }
}

impl RuntimeConfig {
    pub fn sanitize(&mut self) {
        self.timings.sanitize();
        self.adjustment.sanitize();
    }

    pub fn webapi_enabled(&self) -> bool {
        self.generic.webapi_enabled()
    }

    pub fn weather_enabled(&self) -> bool {
        !self.gui.location.trim().is_empty()
    }

    pub fn control_visibility(&self) -> ControlVisibility {
        ControlVisibility {
            control1: !self.thermostat.control1_name.trim().is_empty(),
            control2: !self.thermostat.control2_name.trim().is_empty(),
        }
    }

    pub fn operation_mode(&self) -> OperationMode {
        OperationMode::for_user_mode(self.thermostat.user_mode.trim())
    }

    pub fn display_settings(&self) -> DisplaySettings {
        let weather = self.weather_enabled().then(|| WeatherLookup {
            location: self.gui.location.trim().to_string(),
            api_url: self.gui.weather_api_url.clone(),
            app_id: self.gui.weather_app_id.clone(),
            icon_base_url: self.gui.weather_icon_base_url.clone(),
        });

        DisplaySettings {
            plant_id: self.generic.plant_id.clone(),
            operation_mode: self.operation_mode(),
            controls: self.control_visibility(),
            weather,
            web_api_enabled: self.webapi_enabled(),
            timezone: self.gui.timezone.clone(),
            timings: self.timings,
            adjustment: self.adjustment,
        }
    }
}
