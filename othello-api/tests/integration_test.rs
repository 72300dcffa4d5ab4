/// Integration tests for the Othello RPC dispatcher
///
/// These drive the full router over an in-memory store:
/// - Account lifecycle (create, authenticate, delete)
/// - Password login and the Login alias
/// - Declared-but-unimplemented and unknown methods
/// - Request validation and caller deadlines
/// - Health check

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::TestContext;
use othello_api::rpc::{Capability, METHODS};
use othello_shared::models::account::{AccountId, SCRUBBED};
use othello_shared::store::memory::FaultPoint;
use serde_json::json;

#[tokio::test]
async fn test_account_lifecycle() {
    let ctx = TestContext::new();

    let token = ctx.create_account("David", "insecure").await;

    // Token identifies the new account
    let (status, body) = ctx
        .rpc("Authenticate", json!({ "session_token": token }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let account_id = AccountId(body["account_id"].as_i64().unwrap());
    assert!(body.get("session_token").is_none());

    // Wrong password leaves everything in place
    let (status, body) = ctx
        .rpc(
            "DeleteAccount",
            json!({ "session_token": token, "password": "guess" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "permission_denied");
    assert_eq!(body["message"], "Password didn't match");
    assert_eq!(ctx.store.session_count(account_id).await, 1);

    let (status, body) = ctx
        .rpc(
            "DeleteAccount",
            json!({ "session_token": token, "password": "insecure" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    // Account is scrubbed and soft-deleted; its sessions are gone
    let account = ctx.store.account(account_id).await.unwrap();
    assert!(account.is_deleted);
    assert!(account.deleted_at.is_some());
    assert_eq!(account.name, SCRUBBED);
    assert_eq!(account.email, SCRUBBED);
    assert_eq!(account.phone, SCRUBBED);
    assert_eq!(account.password_hash, SCRUBBED);
    assert_eq!(ctx.store.session_count(account_id).await, 0);

    let (status, body) = ctx
        .rpc("Authenticate", json!({ "session_token": token }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthenticated");

    let (status, body) = ctx
        .rpc(
            "DeleteAccount",
            json!({ "session_token": token, "password": "insecure" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "No such session.");
}

#[tokio::test]
async fn test_david_signup_and_delete() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .rpc(
            "CreateAccount",
            json!({
                "name": "David",
                "email": "david@weekly.org",
                "phone": "415-336-2617",
                "password": "tr33tr33",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["session_token"].as_i64().unwrap();

    let (status, _) = ctx
        .rpc(
            "DeleteAccount",
            json!({ "session_token": token, "password": "f00f00" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // A token that was never issued
    let bogus = if token == 9999999 { 9999998 } else { 9999999 };
    let (status, _) = ctx
        .rpc(
            "DeleteAccount",
            json!({ "session_token": bogus, "password": "tr33tr33" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .rpc(
            "DeleteAccount",
            json!({ "session_token": token, "password": "tr33tr33" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_password_login_issues_additional_session() {
    let ctx = TestContext::new();
    let first = ctx.create_account("Alice", "hunter2").await;

    let (_, body) = ctx
        .rpc("Authenticate", json!({ "session_token": first }))
        .await;
    let account_id = body["account_id"].as_i64().unwrap();

    let (status, body) = ctx
        .rpc(
            "Authenticate",
            json!({ "account_id": account_id, "password": "hunter2" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["account_id"], account_id);
    let second = body["session_token"].as_i64().unwrap();
    assert_ne!(first, second);
    assert_eq!(ctx.store.session_count(AccountId(account_id)).await, 2);

    for token in [first, second] {
        let (status, _) = ctx
            .rpc("Authenticate", json!({ "session_token": token }))
            .await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_login_alias() {
    let ctx = TestContext::new();
    let token = ctx.create_account("Bob", "correct horse").await;

    let (_, body) = ctx.rpc("Login", json!({ "session_token": token })).await;
    let account_id = body["account_id"].as_i64().unwrap();

    let (status, _) = ctx
        .rpc(
            "Login",
            json!({ "account_id": account_id, "password": "battery staple" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = ctx
        .rpc(
            "Login",
            json!({ "account_id": account_id, "password": "correct horse" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["session_token"].is_i64());
}

#[tokio::test]
async fn test_unknown_account_login_rejected() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .rpc(
            "Authenticate",
            json!({ "account_id": 12345, "password": "anything" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthenticated");
}

#[tokio::test]
async fn test_game_methods_unimplemented() {
    let ctx = TestContext::new();

    for method in ["ShowGames", "GetGame", "MakeMove"] {
        let (status, body) = ctx.rpc(method, json!({ "game_id": 1 })).await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED, "{}", method);
        assert_eq!(body["error"], "unimplemented");
    }
}

#[tokio::test]
async fn test_unknown_method_not_found() {
    let ctx = TestContext::new();

    let (status, body) = ctx.rpc("Resign", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_every_implemented_method_is_routed() {
    let ctx = TestContext::new();

    for method in METHODS
        .iter()
        .filter(|m| m.capability == Capability::Implemented)
    {
        // An empty object is never a valid body, so a routed handler rejects it
        let (status, body) = ctx.rpc(method.name, json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", method.name);
        assert_eq!(body["error"], "invalid_argument");
    }
}

#[tokio::test]
async fn test_create_account_validation() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .rpc(
            "CreateAccount",
            json!({
                "name": "x".repeat(256),
                "email": "long@example.com",
                "phone": "",
                "password": "",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_argument");

    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"password"));
    assert_eq!(ctx.store.account_count().await, 0);
}

#[tokio::test]
async fn test_password_login_validation() {
    let ctx = TestContext::new();
    let token = ctx.create_account("Erin", "pw").await;
    let (_, body) = ctx
        .rpc("Authenticate", json!({ "session_token": token }))
        .await;
    let account_id = body["account_id"].as_i64().unwrap();

    for method in ["Authenticate", "Login"] {
        let (status, body) = ctx
            .rpc(method, json!({ "account_id": account_id, "password": "" }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", method);
        assert_eq!(body["error"], "invalid_argument");
        assert_eq!(body["details"][0]["field"], "password");
    }

    // Rejected before any session was issued
    assert_eq!(ctx.store.session_count(AccountId(account_id)).await, 1);
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let ctx = TestContext::new();

    let request = Request::builder()
        .method("POST")
        .uri("/rpc/CreateAccount")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = ctx.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_argument");
}

#[tokio::test]
async fn test_create_account_rolls_back_on_failure() {
    let ctx = TestContext::new();
    ctx.store.fail_next(FaultPoint::CreateSession);

    let (status, body) = ctx
        .rpc(
            "CreateAccount",
            json!({
                "name": "Carol",
                "email": "carol@example.com",
                "phone": "555",
                "password": "pw",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal");
    assert_eq!(body["message"], "An internal error occurred");
    assert_eq!(ctx.store.account_count().await, 0);
}

#[tokio::test]
async fn test_grpc_timeout_header() {
    let ctx = TestContext::new();
    let token = ctx.create_account("Dana", "pw").await;

    let (status, body) = ctx
        .rpc_with_headers(
            "Authenticate",
            json!({ "session_token": token }),
            &[("grpc-timeout", "tomorrow")],
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_argument");

    let (status, _) = ctx
        .rpc_with_headers(
            "Authenticate",
            json!({ "session_token": token }),
            &[("grpc-timeout", "10S")],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new();

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let (status, body) = ctx.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "connected");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
