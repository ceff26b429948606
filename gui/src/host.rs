use std::{io::ErrorKind, net::SocketAddr, path::Path, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    extract::{
        rejection::{FormRejection, QueryRejection},
        Query, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Form, Json, Router,
};
use chrono::{Offset, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use thermostat_common::{
    Celsius, Commit, CommitForm, DisplaySettings, RuntimeConfig, ROUTE_DISPLAY_SETTINGS,
    ROUTE_HEALTH, ROUTE_INPUT_HANDLER, ROUTE_TARGET,
};

use crate::{
    relay::TelemetryRelay,
    store::{ConfigStore, LiveStateStore},
};

const DEFAULT_CONFIG_PATH: &str = "./thermostat-gui.json";
const RELAY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
struct AppState {
    live: LiveStateStore,
    conf: ConfigStore,
    relay: TelemetryRelay,
    settings: Arc<DisplaySettings>,
    timezone: Arc<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct TargetView {
    target: Option<Celsius>,
    code: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl AppState {
    fn new(runtime: &RuntimeConfig, client: reqwest::Client) -> Self {
        Self {
            live: LiveStateStore::new(&runtime.stores.live_state_path),
            conf: ConfigStore::new(&runtime.stores.config_path),
            relay: TelemetryRelay::new(client, &runtime.generic),
            settings: Arc::new(runtime.display_settings()),
            timezone: Arc::new(runtime.gui.timezone.clone()),
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config_path =
        std::env::var("THERMOSTAT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut runtime = load_runtime_config(Path::new(&config_path))
        .await
        .unwrap_or_else(|err| {
            warn!("failed to load runtime config from {config_path}: {err:#}");
            RuntimeConfig::default()
        });
    runtime.sanitize();

    if now_in_timezone(&runtime.gui.timezone).is_none() {
        warn!("unknown timezone {}, target lookups will fail", runtime.gui.timezone);
    }

    let client = reqwest::Client::builder()
        .timeout(RELAY_TIMEOUT)
        .build()
        .context("failed to build telemetry http client")?;
    let app_state = AppState::new(&runtime, client);

    match app_state.relay.endpoint() {
        Some(endpoint) => info!(
            "telemetry relay enabled for plant {} via {endpoint}",
            runtime.generic.plant_id
        ),
        None => info!("telemetry relay disabled"),
    }

    let app = router(app_state);

    let port = std::env::var("GUI_HTTP_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind gui server at {addr}"))?;

    info!("gui listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn router(app_state: AppState) -> Router {
    Router::new()
        .route(
            ROUTE_INPUT_HANDLER,
            get(handle_read_live_state).post(handle_write_commit),
        )
        .route(ROUTE_DISPLAY_SETTINGS, get(handle_get_display_settings))
        .route(ROUTE_TARGET, get(handle_get_target))
        .route(ROUTE_HEALTH, get(handle_health))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn load_runtime_config(path: &Path) -> anyhow::Result<RuntimeConfig> {
    match tokio::fs::read(path).await {
        Ok(raw) => Ok(serde_json::from_slice::<RuntimeConfig>(&raw)?),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(RuntimeConfig::default()),
        Err(err) => Err(err.into()),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("gui shutting down");
}

async fn handle_read_live_state(State(state): State<AppState>) -> axum::response::Response {
    match state.live.read_raw().await {
        Ok(raw) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            raw,
        )
            .into_response(),
        Err(err) => {
            warn!("failed to read live state: {err}");
            StatusCode::OK.into_response()
        }
    }
}

async fn handle_write_commit(
    State(state): State<AppState>,
    query: Result<Query<CommitForm>, QueryRejection>,
    body: Result<Form<CommitForm>, FormRejection>,
) -> StatusCode {
    let query = match query {
        Ok(Query(query)) => query,
        Err(err) => {
            debug!("ignoring write query: {err}");
            CommitForm::default()
        }
    };
    let form = match body {
        Ok(Form(body)) => CommitForm {
            tempt: body.tempt.or(query.tempt),
            operation_mode: body.operation_mode.or(query.operation_mode),
        },
        Err(_) => query,
    };

    match form.validate() {
        Ok(commit) => apply_commit(&state, commit).await,
        Err(err) => debug!("ignoring write request: {err}"),
    }

    StatusCode::OK
}

async fn apply_commit(state: &AppState, commit: Commit) {
    if let Err(err) = state.live.merge(&commit.live_patch()).await {
        warn!("failed to update live target: {err}");
    }

    let now_epoch = Utc::now().timestamp();
    if let Err(err) = state.conf.merge(&commit.conf_patch(now_epoch)).await {
        warn!("failed to persist thermostat configuration: {err}");
    }

    info!(
        "target {} committed ({})",
        commit.tempt,
        commit.operation_mode.as_str()
    );

    if state.relay.is_enabled() {
        let relay = state.relay.clone();
        tokio::spawn(async move {
            match relay.forward(&commit).await {
                Ok(_) => debug!("telemetry relayed target {}", commit.tempt),
                Err(err) => warn!("telemetry relay failed: {err}"),
            }
        });
    }
}

async fn handle_get_display_settings(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.settings.as_ref().clone())
}

async fn handle_get_target(State(state): State<AppState>) -> axum::response::Response {
    let Some(now) = now_in_timezone(&state.timezone) else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Invalid timezone");
    };

    let conf = match state.conf.read().await {
        Ok(conf) => conf,
        Err(err) => {
            warn!("failed to read thermostat configuration: {err}");
            return error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "Thermostat configuration unavailable",
            );
        }
    };

    let view = match conf.resolve_target(now) {
        Ok(target) => TargetView {
            target: Some(target),
            code: 0,
            error: None,
        },
        Err(err) => TargetView {
            target: None,
            code: err.code(),
            error: Some(err.to_string()),
        },
    };
    Json(view).into_response()
}

async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    let live_state = state.live.read().await.is_ok();
    Json(serde_json::json!({ "ok": true, "liveState": live_state }))
}

fn now_in_timezone(timezone: &str) -> Option<chrono::DateTime<chrono::FixedOffset>> {
    let tz: Tz = timezone.parse().ok()?;
    let local = Utc::now().with_timezone(&tz);
    Some(local.with_timezone(&local.offset().fix()))
}

fn error_response(status: StatusCode, message: &str) -> axum::response::Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    use super::*;

    struct Fixture {
        _dir: tempfile::TempDir,
        live_path: PathBuf,
        conf_path: PathBuf,
        state: AppState,
    }

    fn fixture(configure: impl FnOnce(&mut RuntimeConfig)) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let live_path = dir.path().join("curr_data.json");
        let conf_path = dir.path().join("thermostat.json");

        let mut runtime = RuntimeConfig::default();
        runtime.stores.live_state_path = live_path.to_string_lossy().into_owned();
        runtime.stores.config_path = conf_path.to_string_lossy().into_owned();
        configure(&mut runtime);

        let state = AppState::new(&runtime, reqwest::Client::new());
        Fixture {
            _dir: dir,
            live_path,
            conf_path,
            state,
        }
    }

    async fn seed(fixture: &Fixture) {
        let live = json!({ "tempc": "21.3", "tempt": "22", "state1": 1, "state2": 0, "mode": "heating" });
        let conf = json!({
            "operation_mode": "immediate",
            "immediate": { "temp": "22" },
            "temp_override": { "temp": "18", "time_stamp": 100 }
        });
        tokio::fs::write(&fixture.live_path, serde_json::to_vec(&live).unwrap())
            .await
            .unwrap();
        tokio::fs::write(&fixture.conf_path, serde_json::to_vec(&conf).unwrap())
            .await
            .unwrap();
    }

    async fn load(path: &Path) -> Value {
        serde_json::from_slice(&tokio::fs::read(path).await.unwrap()).unwrap()
    }

    async fn write(fixture: &Fixture, tempt: Option<&str>, mode: Option<&str>) -> StatusCode {
        let form = CommitForm {
            tempt: tempt.map(str::to_string),
            operation_mode: mode.map(str::to_string),
        };
        handle_write_commit(
            State(fixture.state.clone()),
            Ok(Query(CommitForm::default())),
            Ok(Form(form)),
        )
        .await
    }

    async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn incomplete_write_leaves_stores_untouched() {
        let fixture = fixture(|_| {});
        seed(&fixture).await;
        let live_before = tokio::fs::read(&fixture.live_path).await.unwrap();
        let conf_before = tokio::fs::read(&fixture.conf_path).await.unwrap();

        assert_eq!(write(&fixture, None, Some("immediate")).await, StatusCode::OK);
        assert_eq!(write(&fixture, Some("23"), Some("")).await, StatusCode::OK);
        assert_eq!(write(&fixture, Some("23"), Some("off")).await, StatusCode::OK);

        assert_eq!(tokio::fs::read(&fixture.live_path).await.unwrap(), live_before);
        assert_eq!(tokio::fs::read(&fixture.conf_path).await.unwrap(), conf_before);
    }

    #[tokio::test]
    async fn immediate_write_updates_both_stores() {
        let fixture = fixture(|_| {});
        seed(&fixture).await;

        write(&fixture, Some("24"), Some("immediate")).await;

        assert_eq!(
            load(&fixture.live_path).await,
            json!({ "tempc": "21.3", "tempt": "24", "state1": 1, "state2": 0, "mode": "heating" })
        );
        assert_eq!(
            load(&fixture.conf_path).await,
            json!({
                "operation_mode": "immediate",
                "immediate": { "temp": "24" },
                "temp_override": { "temp": "18", "time_stamp": 100 }
            })
        );
    }

    #[tokio::test]
    async fn override_write_stamps_commit_time() {
        let fixture = fixture(|_| {});
        seed(&fixture).await;
        let before = Utc::now().timestamp();

        write(&fixture, Some("19"), Some("temp_override")).await;

        let conf = load(&fixture.conf_path).await;
        assert_eq!(conf["operation_mode"], "temp_override");
        assert_eq!(conf["immediate"], json!({ "temp": "22" }));
        assert_eq!(conf["temp_override"]["temp"], "19");
        let stamped = conf["temp_override"]["time_stamp"].as_i64().unwrap();
        assert!(stamped >= before && stamped <= Utc::now().timestamp());
    }

    #[tokio::test]
    async fn query_parameters_fill_missing_form_fields() {
        let fixture = fixture(|_| {});
        seed(&fixture).await;

        let status = handle_write_commit(
            State(fixture.state.clone()),
            Ok(Query(CommitForm {
                tempt: Some("20".to_string()),
                operation_mode: Some("immediate".to_string()),
            })),
            Ok(Form(CommitForm::default())),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(load(&fixture.live_path).await["tempt"], "20");
    }

    #[tokio::test]
    async fn malformed_query_is_acknowledged_without_writing() {
        let fixture = fixture(|_| {});
        seed(&fixture).await;
        let live_before = tokio::fs::read(&fixture.live_path).await.unwrap();
        let conf_before = tokio::fs::read(&fixture.conf_path).await.unwrap();

        let uri: axum::http::Uri = "/input-handler?tempt=20&tempt=21&operation_mode=immediate"
            .parse()
            .unwrap();
        let query = Query::<CommitForm>::try_from_uri(&uri);
        assert!(query.is_err());

        let status = handle_write_commit(
            State(fixture.state.clone()),
            query,
            Ok(Form(CommitForm::default())),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(tokio::fs::read(&fixture.live_path).await.unwrap(), live_before);
        assert_eq!(tokio::fs::read(&fixture.conf_path).await.unwrap(), conf_before);

        let status = handle_write_commit(
            State(fixture.state.clone()),
            Query::<CommitForm>::try_from_uri(&uri),
            Ok(Form(CommitForm {
                tempt: Some("23".to_string()),
                operation_mode: Some("immediate".to_string()),
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(load(&fixture.live_path).await["tempt"], "23");
    }

    #[tokio::test]
    async fn read_returns_live_file_verbatim() {
        let fixture = fixture(|_| {});
        let raw = br#"{"tempc":"20.1","tempt":"21","state1":0,"state2":1,"mode":"cooling"}"#;
        tokio::fs::write(&fixture.live_path, raw).await.unwrap();

        let response = handle_read_live_state(State(fixture.state.clone())).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, raw.to_vec());
    }

    #[tokio::test]
    async fn read_without_live_file_is_empty() {
        let fixture = fixture(|_| {});

        let response = handle_read_live_state(State(fixture.state.clone())).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn display_settings_hide_api_key() {
        let fixture = fixture(|runtime| {
            runtime.generic.plant_id = "12".to_string();
            runtime.generic.api_key = "secret-key".to_string();
            runtime.generic.api_url = "https://plant.example/api".to_string();
            runtime.thermostat.user_mode = "smart".to_string();
        });

        let response = handle_get_display_settings(State(fixture.state.clone()))
            .await
            .into_response();
        let body = body_bytes(response).await;
        let view: Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(view["webApiEnabled"], true);
        assert_eq!(view["operationMode"], "temp_override");
        assert!(!String::from_utf8(body).unwrap().contains("secret-key"));
    }

    #[tokio::test]
    async fn target_reports_resolution_outcome() {
        let fixture = fixture(|runtime| runtime.gui.timezone = "UTC".to_string());
        seed(&fixture).await;

        let response = handle_get_target(State(fixture.state.clone())).await;
        let view: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(view, json!({ "target": "22", "code": 0 }));

        tokio::fs::write(&fixture.conf_path, br#"{"operation_mode":"off"}"#)
            .await
            .unwrap();
        let response = handle_get_target(State(fixture.state.clone())).await;
        let view: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(view["code"], 1);

        tokio::fs::write(&fixture.conf_path, br#"{"operation_mode":"off","off":"off"}"#)
            .await
            .unwrap();
        let response = handle_get_target(State(fixture.state.clone())).await;
        let view: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(view["code"], 5);
        assert_eq!(view["target"], Value::Null);
    }

    #[tokio::test]
    async fn health_reports_live_state_availability() {
        let fixture = fixture(|_| {});

        let response = handle_health(State(fixture.state.clone())).await.into_response();
        let view: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(view, json!({ "ok": true, "liveState": false }));

        seed(&fixture).await;
        let response = handle_health(State(fixture.state.clone())).await.into_response();
        let view: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(view["liveState"], true);
    }

    #[tokio::test]
    async fn target_without_record_is_unavailable() {
        let fixture = fixture(|runtime| runtime.gui.timezone = "UTC".to_string());

        let response = handle_get_target(State(fixture.state.clone())).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
