use std::{
    sync::OnceLock,
    time::{Duration, Instant},
};

use anyhow::Context;
use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{debug, info, warn};

use thermostat_common::{
    DisplayModel, DisplaySettings, LiveState, SessionId, SyncAction, SyncClient, UpstreamError,
    WeatherReport,
};

use crate::gateway::GuiGateway;

const DEFAULT_GUI_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_SESSION: &str = "kiosk";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const SETTINGS_RETRY: Duration = Duration::from_secs(5);
const IDLE_WAKEUP_MS: u64 = 1_000;

#[derive(Debug)]
enum SyncEvent {
    LiveState(u64, Result<LiveState, UpstreamError>),
    Weather(Result<WeatherReport, UpstreamError>),
    CommitDone(Result<(), UpstreamError>),
    Gesture(i32),
    EndSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureInput {
    Step(i32),
    EndSession,
}

#[derive(Debug, Default)]
struct LineRenderer {
    last: Option<String>,
}

impl LineRenderer {
    fn render(&mut self, model: &DisplayModel) -> Option<String> {
        let line = model.render_line();
        if self.last.as_deref() == Some(line.as_str()) {
            return None;
        }
        self.last = Some(line.clone());
        Some(line)
    }
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let gui_url = std::env::var("GUI_URL").unwrap_or_else(|_| DEFAULT_GUI_URL.to_string());
    let session = SessionId::from(
        std::env::var("DISPLAY_SESSION")
            .unwrap_or_else(|_| DEFAULT_SESSION.to_string())
            .as_str(),
    );

    let client = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("failed to build display http client")?;
    let gateway = GuiGateway::new(client, &gui_url);

    let settings = wait_for_display_settings(&gateway).await;
    let timezone: Tz = settings.timezone.parse().unwrap_or_else(|_| {
        warn!("unknown timezone {}, clock shows UTC", settings.timezone);
        Tz::UTC
    });

    info!(
        "display session {session} for plant {} started against {gui_url} ({})",
        settings.plant_id,
        settings.operation_mode.as_str()
    );

    let mut sync = SyncClient::new(settings, session);
    let (tx, mut rx) = mpsc::channel::<SyncEvent>(32);
    spawn_gesture_reader(tx.clone());

    let mut renderer = LineRenderer::default();
    let actions = sync.start(monotonic_ms());
    execute_sync_actions(&gateway, &mut sync, timezone, actions, &tx);
    draw(&mut renderer, sync.model());

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let now_ms = monotonic_ms();
        let sleep_ms = sync
            .next_wakeup_ms()
            .map(|wakeup| wakeup.saturating_sub(now_ms))
            .unwrap_or(IDLE_WAKEUP_MS);

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(sleep_ms)) => {
                let actions = sync.tick(monotonic_ms());
                execute_sync_actions(&gateway, &mut sync, timezone, actions, &tx);
            }
            Some(event) = rx.recv() => {
                handle_event(&mut sync, event, monotonic_ms());
            }
            _ = &mut shutdown => {
                sync.end_session(monotonic_ms());
                info!("display shutting down");
                break;
            }
        }

        draw(&mut renderer, sync.model());
    }

    Ok(())
}

async fn wait_for_display_settings(gateway: &GuiGateway) -> DisplaySettings {
    loop {
        match gateway.display_settings().await {
            Ok(settings) => return settings,
            Err(err) => {
                warn!("display settings unavailable: {err}");
                tokio::time::sleep(SETTINGS_RETRY).await;
            }
        }
    }
}

fn execute_sync_actions(
    gateway: &GuiGateway,
    sync: &mut SyncClient,
    timezone: Tz,
    actions: Vec<SyncAction>,
    tx: &mpsc::Sender<SyncEvent>,
) {
    for action in actions {
        match action {
            SyncAction::FetchLiveState(generation) => {
                let gateway = gateway.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let result = gateway.live_state().await;
                    let _ = tx.send(SyncEvent::LiveState(generation, result)).await;
                });
            }
            SyncAction::FetchWeather => {
                let Some(lookup) = sync.settings().weather.clone() else {
                    continue;
                };
                let gateway = gateway.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let result = gateway.weather(&lookup).await;
                    let _ = tx.send(SyncEvent::Weather(result)).await;
                });
            }
            SyncAction::RefreshClock => {
                let (hour, minute) = local_clock(Utc::now(), timezone);
                sync.on_clock(hour, minute);
            }
            SyncAction::Commit(form) => {
                info!(
                    "committing target {}",
                    form.tempt.as_deref().unwrap_or_default()
                );
                let gateway = gateway.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let result = gateway.commit(&form).await;
                    let _ = tx.send(SyncEvent::CommitDone(result)).await;
                });
            }
        }
    }
}

fn handle_event(sync: &mut SyncClient, event: SyncEvent, now_ms: u64) {
    match event {
        SyncEvent::LiveState(generation, result) => {
            if let Err(err) = &result {
                debug!("live state poll failed: {err}");
            }
            if !sync.on_live_state(generation, result) {
                debug!("live state poll {generation} not applied");
            }
        }
        SyncEvent::Weather(result) => {
            if let Err(err) = &result {
                warn!("weather lookup failed: {err}");
            }
            sync.on_weather(result);
        }
        SyncEvent::CommitDone(result) => {
            if let Err(err) = &result {
                warn!("target commit failed: {err}");
            }
            sync.on_commit_complete(now_ms);
        }
        SyncEvent::Gesture(steps) => {
            let candidate = sync.on_gesture(steps, now_ms);
            debug!("target candidate {candidate}");
        }
        SyncEvent::EndSession => {
            sync.end_session(now_ms);
        }
    }
}

fn spawn_gesture_reader(tx: mpsc::Sender<SyncEvent>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let event = match parse_gesture(&line) {
                        Some(GestureInput::Step(steps)) => SyncEvent::Gesture(steps),
                        Some(GestureInput::EndSession) => SyncEvent::EndSession,
                        None => {
                            debug!("ignoring input {line:?}");
                            continue;
                        }
                    };
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    warn!("gesture input error: {err}");
                    break;
                }
            }
        }
    });
}

fn parse_gesture(line: &str) -> Option<GestureInput> {
    match line.trim() {
        "+" | "up" => Some(GestureInput::Step(1)),
        "-" | "down" => Some(GestureInput::Step(-1)),
        "end" | "cancel" => Some(GestureInput::EndSession),
        other => other
            .parse::<i32>()
            .ok()
            .filter(|steps| *steps != 0)
            .map(GestureInput::Step),
    }
}

fn local_clock(now: DateTime<Utc>, timezone: Tz) -> (u32, u32) {
    let local = now.with_timezone(&timezone);
    (local.hour(), local.minute())
}

fn draw(renderer: &mut LineRenderer, model: &DisplayModel) {
    if let Some(line) = renderer.render(model) {
        println!("{line}");
    }
}

fn monotonic_ms() -> u64 {
    static START: OnceLock<Instant> = OnceLock::new();
    START
        .get_or_init(Instant::now)
        .elapsed()
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}
