use std::sync::Arc;

use thermostat_common::{
    config::WeatherLookup, CommitForm, DisplaySettings, LiveState, UpstreamError, WeatherReport,
    ROUTE_DISPLAY_SETTINGS, ROUTE_INPUT_HANDLER,
};

#[derive(Clone)]
pub struct GuiGateway {
    client: reqwest::Client,
    base_url: Arc<String>,
}

impl GuiGateway {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: Arc::new(base_url.trim().trim_end_matches('/').to_string()),
        }
    }

    pub fn url(&self, route: &str) -> String {
        format!("{}{route}", self.base_url)
    }

    pub async fn display_settings(&self) -> Result<DisplaySettings, UpstreamError> {
        let body = fetch(self.client.get(self.url(ROUTE_DISPLAY_SETTINGS))).await?;
        serde_json::from_slice(&body).map_err(|err| UpstreamError::Malformed(err.to_string()))
    }

    pub async fn live_state(&self) -> Result<LiveState, UpstreamError> {
        let body = fetch(self.client.get(self.url(ROUTE_INPUT_HANDLER))).await?;
        LiveState::parse(&body)
    }

    pub async fn commit(&self, form: &CommitForm) -> Result<(), UpstreamError> {
        fetch(self.client.post(self.url(ROUTE_INPUT_HANDLER)).form(form))
            .await
            .map(|_| ())
    }

    pub async fn weather(&self, lookup: &WeatherLookup) -> Result<WeatherReport, UpstreamError> {
        let request = self.client.get(&lookup.api_url).query(&[
            ("q", lookup.location.as_str()),
            ("appid", lookup.app_id.as_str()),
        ]);
        let body = fetch(request).await?;
        WeatherReport::parse(&body)
    }
}

async fn fetch(request: reqwest::RequestBuilder) -> Result<Vec<u8>, UpstreamError> {
    let response = request
        .send()
        .await
        .map_err(|err| UpstreamError::Unreachable(err.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(UpstreamError::Status(status.as_u16()));
    }

    response
        .bytes()
        .await
        .map(|body| body.to_vec())
        .map_err(|err| UpstreamError::Unreachable(err.to_string()))
}
