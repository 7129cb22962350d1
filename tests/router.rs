//! Router-level tests driven with `oneshot`, no sockets.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tower::ServiceExt;

use timelock_vault::blockchain::ClarityValue;
use timelock_vault::units::BLOCKS_PER_DAY;

mod common;

async fn send(router: &Router, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_my_vaults_redirects_when_signed_out() {
    let (router, _) = common::router_app();

    let response = router
        .clone()
        .oneshot(Request::builder().uri("/my-vaults").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");
}

#[tokio::test]
async fn test_create_flow_steps() {
    let (router, wallet) = common::router_app();
    send(&router, Method::POST, "/session/connect", None).await;

    let (status, _) = send(&router, Method::POST, "/create-vault/back", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &router,
        Method::PUT,
        "/create-vault/durations",
        Some(json!({ "unlock_days": 10, "inactivity_days": 30 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, flow) = send(&router, Method::GET, "/create-vault", None).await;
    assert_eq!(flow["unlock_days"], 365);
    assert_eq!(flow["unlock_blocks"], 365 * BLOCKS_PER_DAY);

    let (status, flow) = send(&router, Method::POST, "/create-vault/next", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flow["step"], "reviewing_summary");

    let (status, flow) = send(&router, Method::POST, "/create-vault/back", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flow["step"], "collecting_durations");
    assert_eq!(flow["inactivity_days"], 30);

    send(&router, Method::POST, "/create-vault/next", None).await;
    let (status, created) = send(&router, Method::POST, "/create-vault/submit", None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(created["unlock_height"], 100_000 + 365 * BLOCKS_PER_DAY);

    let calls = wallet.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].function_args,
        vec![
            ClarityValue::uint(100_000 + 365 * BLOCKS_PER_DAY),
            ClarityValue::uint(30 * BLOCKS_PER_DAY),
        ]
    );
}

#[tokio::test]
async fn test_failed_create_keeps_durations() {
    let (router, wallet) = common::router_app();
    send(&router, Method::POST, "/session/connect", None).await;
    wallet.decline.store(true, std::sync::atomic::Ordering::SeqCst);

    send(
        &router,
        Method::PUT,
        "/create-vault/durations",
        Some(json!({ "unlock_days": 90, "inactivity_days": 14 })),
    )
    .await;
    send(&router, Method::POST, "/create-vault/next", None).await;

    let (status, body) = send(&router, Method::POST, "/create-vault/submit", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Failed to create vault. Please try again.");

    let (_, flow) = send(&router, Method::GET, "/create-vault", None).await;
    assert_eq!(flow["step"], "reviewing_summary");
    assert_eq!(flow["unlock_days"], 90);
    assert_eq!(flow["submitting"], false);
}

#[tokio::test]
async fn test_manage_actions_reach_wallet_in_order() {
    let (router, wallet) = common::router_app();
    send(&router, Method::POST, "/session/connect", None).await;

    send(&router, Method::POST, "/vault/3/deposit", Some(json!({ "amount": "1.5" }))).await;
    send(
        &router,
        Method::POST,
        "/vault/3/heirs",
        Some(json!({ "address": common::OWNER_TESTNET, "percentage": 40 })),
    )
    .await;
    send(&router, Method::POST, "/vault/3/ping", None).await;
    send(&router, Method::POST, "/vault/3/claim", None).await;

    assert_eq!(
        wallet.functions(),
        vec!["deposit-stx", "add-heir", "ping", "claim-as-heir"]
    );
    let calls = wallet.calls.lock().unwrap().clone();
    assert_eq!(
        calls[0].function_args,
        vec![ClarityValue::uint(3u64), ClarityValue::uint(1_500_000u64)]
    );

    let (_, notes) = send(&router, Method::GET, "/notifications", None).await;
    let messages: Vec<&str> = notes["notifications"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|n| n["message"].as_str())
        .collect();
    assert_eq!(
        messages,
        vec![
            "Deposit transaction submitted!",
            "Add heir transaction submitted!",
            "Ping transaction submitted!",
            "Claim transaction submitted!",
        ]
    );

    let (_, notes) = send(&router, Method::GET, "/notifications", None).await;
    assert_eq!(notes["notifications"], json!([]));
}

#[tokio::test]
async fn test_heir_on_wrong_network_rejected() {
    let (router, wallet) = common::router_app();
    send(&router, Method::POST, "/session/connect", None).await;

    let (status, _) = send(
        &router,
        Method::POST,
        "/vault/1/heirs",
        Some(json!({ "address": common::OWNER_MAINNET, "percentage": 50 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(wallet.functions().is_empty());
}

#[tokio::test]
async fn test_unknown_action_is_not_found() {
    let (router, _) = common::router_app();
    send(&router, Method::POST, "/session/connect", None).await;

    let (status, _) = send(
        &router,
        Method::GET,
        "/actions/6f9619ff-8b86-4011-b42d-00c04fc964ff",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_abandoned_submissions_release_their_forms() {
    let (router, wallet) = common::router_app();
    send(&router, Method::POST, "/session/connect", None).await;
    send(&router, Method::POST, "/create-vault/next", None).await;
    wallet.hang.store(true, Ordering::SeqCst);

    // The caller gives up while the wallet prompt is still open
    let create = send(&router, Method::POST, "/create-vault/submit", None);
    assert!(tokio::time::timeout(Duration::from_millis(50), create).await.is_err());
    let deposit = send(&router, Method::POST, "/vault/3/deposit", Some(json!({ "amount": "1" })));
    assert!(tokio::time::timeout(Duration::from_millis(50), deposit).await.is_err());

    let (_, flow) = send(&router, Method::GET, "/create-vault", None).await;
    assert_eq!(flow["step"], "reviewing_summary");
    assert_eq!(flow["submitting"], false);
    let (_, screen) = send(&router, Method::GET, "/vault/3", None).await;
    assert_eq!(screen["in_flight"], json!([]));

    wallet.hang.store(false, Ordering::SeqCst);
    let (status, _) = send(&router, Method::POST, "/vault/3/deposit", Some(json!({ "amount": "1" }))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let (status, _) = send(&router, Method::POST, "/create-vault/submit", None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(wallet.functions(), vec!["deposit-stx", "create-vault"]);
}

#[tokio::test]
async fn test_heir_percentage_sent_as_text() {
    let (router, wallet) = common::router_app();
    send(&router, Method::POST, "/session/connect", None).await;

    let (status, body) = send(
        &router,
        Method::POST,
        "/vault/2/heirs",
        Some(json!({ "address": common::OWNER_TESTNET, "percentage": "abc" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please enter valid heir details");

    let (status, _) = send(
        &router,
        Method::POST,
        "/vault/2/heirs",
        Some(json!({ "address": common::OWNER_TESTNET, "percentage": "50" })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let calls = wallet.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].function_args[2], ClarityValue::uint(50u64));
}
