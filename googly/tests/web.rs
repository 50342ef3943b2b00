use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::serve;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures::{SinkExt, StreamExt};
use googly::{AppState, SessionConfig, app, index};
use ogle::{DetectError, Detection, Detector, Frame, Rect};
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::Message;

/// Detector that always sees one face filling the whole frame.
struct AlwaysFace;

#[async_trait]
impl Detector for AlwaysFace {
    async fn detect(&self, frame: &Frame) -> Result<Option<Detection>, DetectError> {
        Ok(Some(Detection {
            bounds: Rect {
                x: 0.0,
                y: 0.0,
                width: frame.width as f64,
                height: frame.height as f64,
            },
            score: 0.9,
            expression: None,
        }))
    }

    fn bundles(&self) -> &[&str] {
        &[]
    }
}

fn state(detector: Option<Arc<dyn Detector>>, boot_error: Option<String>) -> AppState {
    let (logs, _) = broadcast::channel(16);
    AppState {
        detector,
        boot_error,
        logs,
        config: SessionConfig {
            poll_interval: Duration::from_millis(5),
            frame_interval: Duration::from_millis(5),
            overlay: false,
        },
    }
}

async fn spawn_server(state: AppState) -> (std::net::SocketAddr, tokio::task::JoinHandle<()>) {
    let app = app(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        serve(listener, app.into_make_service()).await.unwrap();
    });
    (addr, server)
}

fn png_data_url() -> String {
    let img = image::GrayImage::from_pixel(2, 2, image::Luma([128u8]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageLuma8(img)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    format!("data:image/png;base64,{}", BASE64.encode(&bytes))
}

#[tokio::test]
async fn serves_the_widget_page() {
    let resp = index().await;
    assert!(resp.0.contains("new WebSocket"));
    assert!(resp.0.contains("getUserMedia"));
    assert!(resp.0.contains("pupil"));
}

#[tokio::test]
async fn session_reaches_tracking_and_reports_gaze() {
    let (addr, server) = spawn_server(state(Some(Arc::new(AlwaysFace)), None)).await;
    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .unwrap();

    // widget centered on the viewport center, face filling the frame:
    // the mapped gaze offset is exactly zero
    let start = serde_json::json!({
        "type": "start",
        "display": { "width": 1000.0, "height": 800.0 },
        "eyes": { "x": 450.0, "y": 360.0, "width": 100.0, "height": 80.0 },
    });
    socket
        .send(Message::Text(start.to_string().into()))
        .await
        .unwrap();
    let frame = serde_json::json!({ "type": "frame", "data": png_data_url() });
    socket
        .send(Message::Text(frame.to_string().into()))
        .await
        .unwrap();

    let mut phases = Vec::new();
    let mut face_visible = None;
    let gaze = loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("message within deadline")
            .unwrap()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(msg.to_text().unwrap()).unwrap();
        match value["type"].as_str().unwrap() {
            "boot" => phases.push(value["phase"].as_str().unwrap().to_string()),
            "face" => face_visible = value["visible"].as_bool(),
            "gaze" => break value,
            other => panic!("unexpected payload type {other}"),
        }
    };

    assert_eq!(
        phases,
        vec!["models", "ready", "tracking"],
        "boot progressed through model load, first frame and first face"
    );
    assert_eq!(face_visible, Some(true));
    assert_eq!(gaze["x"].as_f64(), Some(0.0));
    assert_eq!(gaze["y"].as_f64(), Some(0.0));
    server.abort();
}

#[tokio::test]
async fn failed_bootstrap_is_surfaced_to_the_page() {
    let (addr, server) = spawn_server(state(None, Some("model bundle missing".into()))).await;
    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .unwrap();

    let msg = tokio::time::timeout(Duration::from_secs(5), socket.next())
        .await
        .expect("message within deadline")
        .unwrap()
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(msg.to_text().unwrap()).unwrap();
    assert_eq!(value["type"], "error");
    assert_eq!(value["message"], "model bundle missing");

    let msg = socket.next().await.unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(msg.to_text().unwrap()).unwrap();
    assert_eq!(value["type"], "boot");
    assert_eq!(value["phase"], "idle");
    server.abort();
}

#[tokio::test]
async fn log_socket_streams_log_lines() {
    let (logs, _keep) = broadcast::channel(16);
    let session = AppState {
        detector: None,
        boot_error: None,
        logs: logs.clone(),
        config: SessionConfig::default(),
    };
    let (addr, server) = spawn_server(session).await;
    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/log"))
        .await
        .unwrap();

    // let the handler subscribe before publishing
    tokio::time::sleep(Duration::from_millis(50)).await;
    logs.send("tracker spawned".to_string()).unwrap();
    let msg = tokio::time::timeout(Duration::from_secs(5), socket.next())
        .await
        .expect("log line within deadline")
        .unwrap()
        .unwrap();
    assert_eq!(msg.to_text().unwrap(), "tracker spawned");
    server.abort();
}
