use serde::Deserialize;

use crate::error::UpstreamError;

const KELVIN_OFFSET: f64 = 273.15;

#[derive(Debug, Deserialize)]
struct OwmResponse {
    #[serde(default)]
    weather: Vec<OwmCondition>,
    main: OwmMain,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherReport {
    pub icon: String,
    pub exterior_temp_c: i32,
}

impl WeatherReport {
    pub fn parse(body: &[u8]) -> Result<Self, UpstreamError> {
        let response: OwmResponse = serde_json::from_slice(body)
            .map_err(|err| UpstreamError::Malformed(err.to_string()))?;
        let icon = response
            .weather
            .into_iter()
            .next()
            .map(|condition| condition.icon)
            .filter(|icon| !icon.trim().is_empty())
            .ok_or_else(|| UpstreamError::Malformed("no weather condition".to_string()))?;

        Ok(Self {
            icon,
            exterior_temp_c: kelvin_to_whole_celsius(response.main.temp),
        })
    }

    pub fn icon_url(&self, base_url: &str) -> String {
        format!("{}/{}.png", base_url.trim_end_matches('/'), self.icon)
    }
}

// Truncates toward zero.
pub fn kelvin_to_whole_celsius(kelvin: f64) -> i32 {
    (kelvin - KELVIN_OFFSET).trunc() as i32
}
