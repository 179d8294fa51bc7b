//! Supervisory HTTP surface, driven through the router with `oneshot`.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use plc_api::{
    ActionRequest, ClientMessage, PushEvent, Supervisor, build_router, spawn_state_broadcaster,
};
use plc_common::image::{Bank, ProcessImage};
use plc_scan::ScanEngine;
use serde_json::{Value, json};
use tower::ServiceExt;

fn setup() -> (Arc<ProcessImage>, Arc<Supervisor>, Router) {
    let image = Arc::new(ProcessImage::default());
    let supervisor = Arc::new(Supervisor::new(
        Arc::clone(&image),
        Duration::from_millis(100),
        8,
    ));
    let router = build_router(Arc::clone(&supervisor));
    (image, supervisor, router)
}

async fn post_action(router: Router, body: Value) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::post("/api/action")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get_state(router: Router) -> Value {
    let response = router
        .oneshot(Request::get("/api/state").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn state_reflects_scanned_image() {
    let (image, _supervisor, router) = setup();
    let engine = ScanEngine::new(Arc::clone(&image), Duration::from_millis(100)).unwrap();
    image.write_bit(Bank::BinaryInputs, 0, true).unwrap();
    engine.scan_once().unwrap();

    let state = get_state(router).await;
    assert_eq!(state["motorRunning"], true);
    assert_eq!(state["pumpRunning"], false);
    assert_eq!(state["coils"][0], true);
    assert_eq!(state["discreteInputs"][0], true);
    assert_eq!(state["holdingRegisters"][4], 800);
    assert_eq!(state["inputRegisters"][0], 799);
    assert_eq!(state["scanTime"], 0.1);
    assert_eq!(state["holdingRegisters"].as_array().unwrap().len(), 8);
}

#[tokio::test]
async fn set_register_clamps() {
    let (image, _supervisor, router) = setup();
    let (status, body) = post_action(
        router.clone(),
        json!({"type": "setRegister", "address": 4, "value": 70000}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(image.read_word(Bank::IntegerOutputs, 4).unwrap(), 65535);

    let (status, _) = post_action(
        router,
        json!({"type": "setRegister", "address": 4, "value": -5}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(image.read_word(Bank::IntegerOutputs, 4).unwrap(), 0);
}

#[tokio::test]
async fn unknown_type_is_bad_request() {
    let (_image, _supervisor, router) = setup();
    let (status, body) = post_action(router, json!({"type": "explode", "address": 0})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("explode"));
}

#[tokio::test]
async fn out_of_range_address_is_bad_request() {
    let (_image, _supervisor, router) = setup();
    let (status, body) = post_action(
        router.clone(),
        json!({"type": "setInput", "address": 64, "value": true}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = post_action(
        router,
        json!({"type": "setInput", "address": -1, "value": true}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unusable_value_is_bad_request() {
    let (_image, _supervisor, router) = setup();
    let (status, body) = post_action(
        router,
        json!({"type": "setRegister", "address": 1, "value": {"nested": 1}}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn snake_case_aliases_and_toggle() {
    let (image, _supervisor, router) = setup();
    let (status, _) = post_action(
        router.clone(),
        json!({"action_type": "set_input", "address": 3, "value": true}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(image.read_bit(Bank::BinaryInputs, 3).unwrap());

    let (status, _) = post_action(router, json!({"type": "toggleInput", "address": 3})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!image.read_bit(Bank::BinaryInputs, 3).unwrap());
}

fn ws_action(text: &str) -> ActionRequest {
    let ClientMessage::Action(payload) = serde_json::from_str(text).unwrap();
    payload.into_request()
}

#[test]
fn flip_message_toggles_binary_input() {
    let (image, supervisor, _router) = setup();
    let flip = ws_action(r#"{"kind": "action", "payload": {"flip": 5}}"#);
    supervisor.apply(&flip).unwrap();
    assert!(image.read_bit(Bank::BinaryInputs, 5).unwrap());
    supervisor.apply(&flip).unwrap();
    assert!(!image.read_bit(Bank::BinaryInputs, 5).unwrap());

    let flip = ws_action(r#"{"kind": "action", "payload": {"flip": -1}}"#);
    assert!(supervisor.apply(&flip).is_err());
}

#[tokio::test]
async fn action_publishes_state_event() {
    let (_image, supervisor, router) = setup();
    let mut rx = supervisor.subscribe();
    post_action(router, json!({"type": "setInput", "address": 0, "value": 1})).await;
    match rx.recv().await.unwrap() {
        PushEvent::State(view) => assert!(view.discrete_inputs[0]),
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn broadcaster_emits_periodically() {
    let (_image, supervisor, _router) = setup();
    let mut rx = supervisor.subscribe();
    let task = spawn_state_broadcaster(Arc::clone(&supervisor), Duration::from_millis(10));
    for _ in 0..3 {
        let event = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(event, PushEvent::State(_)));
    }
    task.abort();
}

#[test]
fn concurrent_supervisory_writes_with_running_engine() {
    let image = Arc::new(ProcessImage::default());
    let supervisor = Arc::new(Supervisor::new(Arc::clone(&image), Duration::from_millis(1), 8));
    let engine = ScanEngine::new(Arc::clone(&image), Duration::from_millis(1)).unwrap();
    engine.start().unwrap();

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let supervisor = Arc::clone(&supervisor);
            thread::spawn(move || {
                for i in 0..25usize {
                    let addr = 10 + t * 10 + (i % 10);
                    supervisor.set_integer_output(addr, (addr * 3) as i64).unwrap();
                    supervisor.set_binary_input(addr, true).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    engine.stop().unwrap();

    for addr in 10..50usize {
        assert_eq!(image.read_word(Bank::IntegerOutputs, addr).unwrap() as usize, addr * 3);
        assert!(image.read_bit(Bank::BinaryInputs, addr).unwrap());
    }
}
