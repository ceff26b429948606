use thermostat_common::{config::GenericConfig, telemetry_url, Commit, UpstreamError};

#[derive(Clone)]
pub struct TelemetryRelay {
    client: reqwest::Client,
    endpoint: Option<String>,
    plant_id: String,
    api_key: String,
}

impl TelemetryRelay {
    pub fn new(client: reqwest::Client, generic: &GenericConfig) -> Self {
        let endpoint = (generic.webapi_enabled() && !generic.api_url.trim().is_empty())
            .then(|| telemetry_url(generic.api_url.trim()));

        Self {
            client,
            endpoint,
            plant_id: generic.plant_id.trim().to_string(),
            api_key: generic.api_key.trim().to_string(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub async fn forward(&self, commit: &Commit) -> Result<bool, UpstreamError> {
        let Some(endpoint) = self.endpoint.as_deref() else {
            return Ok(false);
        };

        let response = self
            .client
            .post(endpoint)
            .form(&commit.telemetry_form(&self.plant_id, &self.api_key))
            .send()
            .await
            .map_err(|err| UpstreamError::Unreachable(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }
        Ok(true)
    }
}
