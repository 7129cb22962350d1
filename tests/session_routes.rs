//! Session, network switching and route guard tests.

use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::atomic::Ordering;

mod common;

#[tokio::test]
async fn test_guarded_screens_redirect_when_signed_out() {
    let app = common::spawn_app().await;

    for path in ["/my-vaults", "/heir-claims", "/create-vault", "/vault/1"] {
        let res = app.get(path).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER, "{} should redirect", path);
        assert_eq!(res.headers()["location"], "/");
    }

    let res = app.get("/").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["screen"], "landing");
    assert_eq!(body["signed_in"], false);
}

#[tokio::test]
async fn test_signed_out_actions_never_reach_wallet() {
    let app = common::spawn_app().await;

    let res = app.post("/create-vault/submit", json!({})).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    let res = app.post("/vault/1/deposit", json!({ "amount": "5" })).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);

    assert!(app.backend.calls().is_empty());
}

#[tokio::test]
async fn test_sign_in_shows_dashboard() {
    let app = common::spawn_app().await;
    app.sign_in().await;

    let body: Value = app.get("/").await.json().await.unwrap();
    assert_eq!(body["screen"], "dashboard");
    assert_eq!(body["address"], "ST1PQH...GZGM");

    let session: Value = app.get("/session").await.json().await.unwrap();
    assert_eq!(session["signed_in"], true);
    assert_eq!(session["address"], common::OWNER_TESTNET);
    assert_eq!(session["username"], "owner.btc");
}

#[tokio::test]
async fn test_declined_sign_in_keeps_session_signed_out() {
    let app = common::spawn_app().await;
    app.backend.decline.store(true, Ordering::SeqCst);

    let res = app.post("/session/connect", json!({})).await;
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    let session: Value = app.get("/session").await.json().await.unwrap();
    assert_eq!(session["signed_in"], false);
}

#[tokio::test]
async fn test_network_switch_changes_address() {
    let app = common::spawn_app().await;
    app.sign_in().await;

    let res = app.put("/network", json!({ "network": "mainnet" })).await;
    assert_eq!(res.status(), StatusCode::OK);

    let session: Value = app.get("/session").await.json().await.unwrap();
    assert_eq!(session["network"], "mainnet");
    assert_eq!(session["address"], common::OWNER_MAINNET);

    let res = app.put("/network", json!({ "network": "devnet" })).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_disconnect_clears_session() {
    let app = common::spawn_app().await;
    app.sign_in().await;
    assert_eq!(app.get("/my-vaults").await.status(), StatusCode::OK);

    let res = app.post("/session/disconnect", json!({})).await;
    assert_eq!(res.status(), StatusCode::OK);

    assert_eq!(app.get("/my-vaults").await.status(), StatusCode::SEE_OTHER);
    assert!(app.state.inner.screens.is_empty());
}

#[tokio::test]
async fn test_empty_states() {
    let app = common::spawn_app().await;
    app.sign_in().await;

    let body: Value = app.get("/my-vaults").await.json().await.unwrap();
    assert_eq!(body["vaults"], json!([]));
    assert_eq!(body["empty_state"]["title"], "No Vaults Created Yet");

    let body: Value = app.get("/heir-claims").await.json().await.unwrap();
    assert_eq!(body["empty_state"]["title"], "No Pending Claims");
}

#[tokio::test]
async fn test_health_reports_chain_height() {
    let app = common::spawn_app().await;

    let body: Value = app.get("/health").await.json().await.unwrap();
    assert_eq!(body["chain_api"], true);
    assert_eq!(body["block_height"], 100_000);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = common::spawn_app().await;

    let res = app
        .client
        .get(app.url("/health"))
        .header("x-request-id", "abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "abc-123");

    let res = app.get("/health").await;
    assert!(res.headers().contains_key("x-request-id"));
}
