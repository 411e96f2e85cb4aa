//! Router tests.
//!
//! Drive the full router with `tower::ServiceExt::oneshot` and read
//! response bodies frame by frame, so chunk boundaries and their arrival
//! times are visible. Time is paused; delays are virtual.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use earlyflush_core::{QuestConfig, SlowOperation, StreamError};
use earlyflush_web::{ResponseBinder, build_router, build_router_with};
use http_body_util::BodyExt;
use tokio::time::Instant;
use tokio_util::task::TaskTracker;
use tower::ServiceExt;

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Read every data frame with its arrival time relative to `start`.
async fn frames(resp: Response, start: Instant) -> Vec<(String, Duration)> {
    let mut body = resp.into_body();
    let mut out = Vec::new();
    while let Some(frame) = body.frame().await {
        let data = frame.unwrap().into_data().expect("data frame");
        out.push((String::from_utf8(data.to_vec()).unwrap(), start.elapsed()));
    }
    out
}

async fn body_text(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn assert_html_headers(resp: &Response) {
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/html; charset=utf-8");
    assert_eq!(resp.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(resp.headers()[header::CACHE_CONTROL], "no-store");
    assert!(resp.headers().get(header::ETAG).is_none());
}

#[derive(Clone)]
struct Collapse;

impl SlowOperation for Collapse {
    async fn perform(&self, delay: Duration) -> Result<(), StreamError> {
        tokio::time::sleep(delay / 2).await;
        Err(StreamError::operation("the ceiling collapsed"))
    }
}

// ── Streaming ──────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn streaming_sends_head_then_body_after_delay() {
    let router = build_router(QuestConfig::new(2000, 800), TaskTracker::new());
    let start = Instant::now();

    let resp = router.oneshot(get("/streaming")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(start.elapsed() < Duration::from_millis(10));
    assert_html_headers(&resp);

    let frames = frames(resp, start).await;
    assert_eq!(frames.len(), 2);

    let (head, head_at) = &frames[0];
    assert!(head.contains("<head>"));
    assert!(head.contains("/assets/quest.css"));
    assert!(*head_at < Duration::from_millis(10));

    let (body, body_at) = &frames[1];
    assert!(body.contains("quest-stats"));
    assert!(*body_at >= Duration::from_millis(2000));
}

#[tokio::test(start_paused = true)]
async fn streaming_zero_delay_override_arrives_together() {
    let router = build_router(QuestConfig::default(), TaskTracker::new());
    let start = Instant::now();

    let resp = router
        .oneshot(get("/streaming?dungeon_delay_ms=0"))
        .await
        .unwrap();
    let frames = frames(resp, start).await;

    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1].1, Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn streaming_failure_is_in_band_with_status_200() {
    let binder = ResponseBinder::with_operation(TaskTracker::new(), Collapse);
    let router = build_router_with(QuestConfig::new(1000, 0), binder);
    let start = Instant::now();

    let resp = router.oneshot(get("/streaming")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let frames = frames(resp, start).await;
    assert_eq!(frames.len(), 2, "head and error chunk only");
    assert!(frames[0].0.contains("<head>"));
    assert!(frames[1].0.contains("the ceiling collapsed"));
    assert!(frames[1].0.trim_end().ends_with("</html>"));
}

#[tokio::test(start_paused = true)]
async fn streaming_tasks_are_tracked_until_done() {
    let tracker = TaskTracker::new();
    let router = build_router(QuestConfig::new(500, 0), tracker.clone());

    let resp = router.oneshot(get("/streaming")).await.unwrap();
    assert_eq!(tracker.len(), 1);

    let _ = body_text(resp).await;
    tracker.close();
    tracker.wait().await;
    assert!(tracker.is_empty());
}

// ── Blocking ───────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn blocking_sends_nothing_before_the_delay() {
    let router = build_router(QuestConfig::new(2000, 800), TaskTracker::new());
    let start = Instant::now();

    let resp = router.oneshot(get("/blocking")).await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(2000));
    assert_eq!(resp.status(), StatusCode::OK);
    assert_html_headers(&resp);
    assert!(resp.headers().get(header::CONTENT_LENGTH).is_some());

    let frames = frames(resp, start).await;
    assert_eq!(frames.len(), 1, "one complete body");
    assert!(frames[0].0.contains("<head>"));
    assert!(frames[0].0.contains("quest-stats"));
}

#[tokio::test(start_paused = true)]
async fn blocking_failure_returns_500() {
    let binder = ResponseBinder::with_operation(TaskTracker::new(), Collapse);
    let router = build_router_with(QuestConfig::new(100, 0), binder);

    let resp = router.oneshot(get("/blocking")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(resp).await.contains("the ceiling collapsed"));
}

// ── Overrides ──────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn overrides_apply_per_request_only() {
    let router = build_router(QuestConfig::new(2000, 800), TaskTracker::new());

    let resp = router
        .clone()
        .oneshot(get("/blocking?dungeon_delay_ms=50&armorDownloadMs=5"))
        .await
        .unwrap();
    let html = body_text(resp).await;
    assert!(html.contains("Dungeon delay 50 ms"));
    assert!(html.contains("armor download ~5 ms"));

    let resp = router.oneshot(get("/debug/config")).await.unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(json["dungeonDelayMs"], 2000);
    assert_eq!(json["armorDownloadMs"], 800);
}

#[tokio::test]
async fn negative_override_is_rejected() {
    let router = build_router(QuestConfig::default(), TaskTracker::new());

    let resp = router
        .oneshot(get("/streaming?dungeon_delay_ms=-1"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(start_paused = true)]
async fn oversized_override_is_capped() {
    let router = build_router(QuestConfig::default(), TaskTracker::new());
    let start = Instant::now();

    let resp = router
        .oneshot(get("/blocking?dungeon_delay_ms=18446744073709551615"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let waited = start.elapsed();
    assert!(waited >= Duration::from_secs(60), "waited {waited:?}");
    assert!(waited < Duration::from_secs(61), "waited {waited:?}");
    assert!(body_text(resp).await.contains("Dungeon delay 60000 ms"));
}

#[tokio::test(start_paused = true)]
async fn blank_override_falls_back_to_process_config() {
    let router = build_router(QuestConfig::new(1200, 300), TaskTracker::new());

    let resp = router
        .clone()
        .oneshot(get("/?dungeon_delay_ms=&armor_download_ms="))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("/streaming?dungeon_delay_ms=1200"));

    let resp = router
        .oneshot(get("/blocking?dungeon_delay_ms=&armor_download_ms=5"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains("Dungeon delay 1200 ms"));
    assert!(html.contains("armor download ~5 ms"));
}

// ── Landing, assets, health ────────────────────────────────────

#[tokio::test]
async fn landing_embeds_both_variants() {
    let router = build_router(QuestConfig::new(1200, 300), TaskTracker::new());

    let resp = router.oneshot(get("/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_html_headers(&resp);

    let html = body_text(resp).await;
    assert!(html.contains("/streaming?dungeon_delay_ms=1200"));
    assert!(html.contains("/blocking?dungeon_delay_ms=1200"));
}

#[tokio::test]
async fn assets_are_served_with_their_types() {
    let router = build_router(QuestConfig::default(), TaskTracker::new());

    let resp = router.clone().oneshot(get("/assets/quest.css")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/css; charset=utf-8");
    assert!(body_text(resp).await.contains(".quest-waiting"));

    let resp = router.oneshot(get("/assets/quest.js")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::CONTENT_TYPE],
        "text/javascript; charset=utf-8"
    );
}

#[tokio::test]
async fn health_reports_ok() {
    let router = build_router(QuestConfig::default(), TaskTracker::new());

    let resp = router.oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, r#"{"status":"ok"}"#);
}

#[tokio::test]
async fn unknown_path_is_404() {
    let router = build_router(QuestConfig::default(), TaskTracker::new());

    let resp = router.oneshot(get("/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
