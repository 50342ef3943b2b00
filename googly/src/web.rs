use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{
        State,
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    },
    response::{Html, IntoResponse},
    routing::get,
};
use ogle::{
    Boot, Detector, DisplaySize, Event, EventBus, Point, Rect, Tracker, TrackerConfig,
    TrackerHandle,
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tower_http::services::ServeDir;
use tracing::{debug, info, warn};

use crate::feed::FrameFeed;

/// Session cadence and feature toggles, fixed at startup.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// How often to poll while waiting for the first face.
    pub poll_interval: Duration,
    /// Detection cadence once a face is tracked.
    pub frame_interval: Duration,
    /// Forward detection boxes for the page's debug overlay.
    pub overlay: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            frame_interval: Duration::from_millis(33),
            overlay: false,
        }
    }
}

/// State shared across HTTP handlers and WebSocket tasks.
#[derive(Clone)]
pub struct AppState {
    /// `None` when the model bootstrap failed; sessions then surface
    /// `boot_error` instead of ever becoming ready.
    pub detector: Option<Arc<dyn Detector>>,
    pub boot_error: Option<String>,
    pub logs: broadcast::Sender<String>,
    pub config: SessionConfig,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WsRequest {
    /// Opens a session: the viewport and the eye widget's on-screen
    /// rectangle, both captured once for the session's lifetime.
    Start { display: DisplaySize, eyes: Rect },
    /// One webcam frame as a base64 data URL.
    Frame { data: String },
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WsResponse {
    Boot {
        phase: &'static str,
    },
    Face {
        visible: bool,
    },
    Gaze {
        x: f64,
        y: f64,
    },
    Detection {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        score: f32,
    },
    Error {
        message: String,
    },
}

/// Serve the embedded widget page.
pub async fn index() -> Html<&'static str> {
    static INDEX: &str = include_str!("../../index.html");
    Html(INDEX)
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    info!("widget socket upgrade initiated");
    ws.on_upgrade(move |socket| async move { handle_socket(socket, state).await })
}

pub async fn log_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    info!("log socket upgrade initiated");
    ws.on_upgrade(move |socket| async move { handle_log_socket(socket, state).await })
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    info!("widget session connected");
    let bus = EventBus::new();
    let mut events = bus.subscribe();
    let feed = Arc::new(FrameFeed::new());
    let mut boot = Boot::default();
    let mut geometry: Option<(DisplaySize, Point)> = None;
    let mut tracker: Option<TrackerHandle> = None;

    if let Some(message) = &state.boot_error {
        bus.publish(Event::BootFailed(message.clone()));
    } else {
        boot.on_models_loaded();
    }
    bus.publish(Event::Phase(boot.phase()));

    loop {
        tokio::select! {
            evt = events.recv() => {
                match evt {
                    Ok(event) => {
                        if let Some(payload) = render(&event, state.config.overlay) {
                            if socket.send(WsMessage::Text(payload.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(WsMessage::Text(text))) => {
                        let Ok(request) = serde_json::from_str::<WsRequest>(&text) else {
                            debug!("unparseable widget message");
                            continue;
                        };
                        match request {
                            WsRequest::Start { display, eyes } => {
                                let (dw, dh) = (display.width, display.height);
                                debug!("session display {}x{}", dw, dh);
                                geometry = Some((display, eyes.center()));
                            }
                            WsRequest::Frame { data } => {
                                let first = !feed.has_frame();
                                match feed.push_data_url(&data) {
                                    Ok(()) => {
                                        if first {
                                            boot.on_first_frame();
                                            bus.publish(Event::Phase(boot.phase()));
                                        }
                                    }
                                    Err(err) => {
                                        warn!("dropped frame: {err}");
                                        if first {
                                            bus.publish(Event::BootFailed(err.to_string()));
                                        }
                                    }
                                }
                            }
                        }
                        maybe_start(&state, &bus, &feed, &boot, geometry, &mut tracker);
                    }
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }
    // teardown: no further detector call once the page is gone
    if let Some(handle) = &tracker {
        handle.stop();
    }
    info!("widget session closed");
}

/// Spawn the tracker once everything it needs is in place: models loaded,
/// a first frame seen and the widget geometry reported.
fn maybe_start(
    state: &AppState,
    bus: &EventBus,
    feed: &Arc<FrameFeed>,
    boot: &Boot,
    geometry: Option<(DisplaySize, Point)>,
    tracker: &mut Option<TrackerHandle>,
) {
    if tracker.is_some() || !boot.is_ready() {
        return;
    }
    let (Some(detector), Some((display, eyes_center))) = (state.detector.clone(), geometry) else {
        return;
    };
    let config = TrackerConfig {
        poll_interval: state.config.poll_interval,
        frame_interval: state.config.frame_interval,
        display,
        eyes_center,
    };
    *tracker = Some(Tracker::new(detector, feed.clone(), bus.clone(), config).spawn());
    debug!("tracker spawned");
}

fn render(event: &Event, overlay: bool) -> Option<String> {
    let response = match event {
        Event::Phase(phase) => WsResponse::Boot {
            phase: phase.as_str(),
        },
        Event::TrackingStarted => WsResponse::Boot { phase: "tracking" },
        Event::FaceAppeared => WsResponse::Face { visible: true },
        Event::FaceLost => WsResponse::Face { visible: false },
        Event::Gaze(offset) => WsResponse::Gaze {
            x: offset.x,
            y: offset.y,
        },
        Event::Spotted { bounds, score } => {
            if !overlay {
                return None;
            }
            WsResponse::Detection {
                x: bounds.x,
                y: bounds.y,
                width: bounds.width,
                height: bounds.height,
                score: *score,
            }
        }
        Event::BootFailed(message) => WsResponse::Error {
            message: message.clone(),
        },
    };
    Some(serde_json::to_string(&response).unwrap())
}

async fn handle_log_socket(mut socket: WebSocket, state: AppState) {
    info!("log socket connected");
    let mut logs = state.logs.subscribe();
    while let Ok(line) = logs.recv().await {
        if socket.send(WsMessage::Text(line.into())).await.is_err() {
            break;
        }
    }
    info!("log socket disconnected");
}

/// Build the application router with the provided state.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ws", get(ws_handler))
        .route("/log", get(log_ws_handler))
        .fallback_service(ServeDir::new("frontend"))
        .with_state(state)
}
