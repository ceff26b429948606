pub const ROUTE_INPUT_HANDLER: &str = "/input-handler";
pub const ROUTE_DISPLAY_SETTINGS: &str = "/api/display-settings";
pub const ROUTE_TARGET: &str = "/api/target";
pub const ROUTE_HEALTH: &str = "/api/health";

pub const TELEMETRY_ENDPOINT: &str = "thermostat.php";

pub fn telemetry_url(api_url: &str) -> String {
    format!("{}/{}", api_url.trim_end_matches('/'), TELEMETRY_ENDPOINT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn telemetry_url_tolerates_trailing_slash() {
        assert_eq!(
            telemetry_url("https://telegea.example/api/"),
            "https://telegea.example/api/thermostat.php"
        );
        assert_eq!(
            telemetry_url("https://telegea.example/api"),
            "https://telegea.example/api/thermostat.php"
        );
    }
}
