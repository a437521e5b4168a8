// web-server/tests/wallet_flow_test.rs
//! Wallet connection, login challenge and the sign-in view it drives.

#[macro_use]
mod support;

use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::{json, Value};
use role_gate::api::session::SESSION_COOKIE_NAME;
use support::*;
use wiremock::MockServer;

// GET /api/session with the given cookies
macro_rules! session_view {
    ($app:expr, $($cookie:expr),+) => {{
        let req = test::TestRequest::get().uri("/api/session")$(.cookie($cookie))+;
        let context: Value = test::call_and_read_body_json($app, req.to_request()).await;
        context
    }};
}

#[actix_web::test]
async fn test_sign_in_view_walks_through_every_state() {
    let rpc = MockServer::start().await;
    let discord = MockServer::start().await;
    let config = test_config(&rpc, &discord);
    let app = gate_app!(config.clone());

    // Reading the context does not register a browser session
    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/session").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(response_cookie(&resp, SESSION_COOKIE_NAME).is_none());
    let context: Value = test::read_body_json(resp).await;
    assert_eq!(context["view"], "connect-wallet");
    assert_eq!(context["address"], Value::Null);
    assert_eq!(context["isLoggedIn"], false);

    // Connecting does; lowercase input comes back checksummed
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/wallet/connect")
            .set_json(json!({ "address": TEST_ADDRESS.to_lowercase() }))
            .to_request(),
    )
    .await;
    let browser = browser_cookie(&resp);
    let connected: Value = test::read_body_json(resp).await;
    assert_eq!(connected["address"], TEST_ADDRESS);

    let context = session_view!(&app, browser.clone());
    assert_eq!(context["view"], "sign-message");

    let issued: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/api/wallet/login/payload")
            .cookie(browser.clone())
            .to_request(),
    )
    .await;
    let message = issued["message"].as_str().unwrap();
    assert!(message.starts_with("example.com wants you to sign in with your Ethereum account:"));
    assert_eq!(issued["payload"]["address"], TEST_ADDRESS);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/wallet/login")
            .cookie(browser.clone())
            .set_json(json!({ "payload": issued["payload"], "signature": sign(message, &TEST_KEY) }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let context = session_view!(&app, browser.clone());
    assert_eq!(context["view"], "connect-discord");
    assert_eq!(context["isLoggedIn"], true);

    let user: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/wallet/user")
            .cookie(browser.clone())
            .to_request(),
    )
    .await;
    assert_eq!(user["address"], TEST_ADDRESS);

    let context = session_view!(&app, browser.clone(), discord_cookie(&config));
    assert_eq!(context["view"], "authenticated");
    assert_eq!(context["session"]["userId"], DISCORD_USER_ID);
}

#[actix_web::test]
async fn test_login_payload_cannot_be_replayed() {
    let rpc = MockServer::start().await;
    let discord = MockServer::start().await;
    let app = gate_app!(test_config(&rpc, &discord));

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/wallet/connect")
            .set_json(json!({ "address": TEST_ADDRESS }))
            .to_request(),
    )
    .await;
    let browser = browser_cookie(&resp);

    let issued: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/api/wallet/login/payload")
            .cookie(browser.clone())
            .to_request(),
    )
    .await;
    let login = json!({
        "payload": issued["payload"],
        "signature": sign(issued["message"].as_str().unwrap(), &TEST_KEY),
    });

    let first = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/wallet/login")
            .cookie(browser.clone())
            .set_json(login.clone())
            .to_request(),
    )
    .await;
    assert_eq!(first.status(), StatusCode::OK);

    let replay = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/wallet/login")
            .cookie(browser)
            .set_json(login)
            .to_request(),
    )
    .await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_login_payload_requires_a_wallet() {
    let rpc = MockServer::start().await;
    let discord = MockServer::start().await;
    let app = gate_app!(test_config(&rpc, &discord));

    let resp = test::call_service(
        &app,
        test::TestRequest::post().uri("/api/wallet/login/payload").to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "No wallet connected" }));
}

#[actix_web::test]
async fn test_disconnect_clears_wallet_login() {
    let rpc = MockServer::start().await;
    let discord = MockServer::start().await;
    let app = gate_app!(test_config(&rpc, &discord));

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/wallet/connect")
            .set_json(json!({ "address": TEST_ADDRESS }))
            .to_request(),
    )
    .await;
    let browser = browser_cookie(&resp);

    let disconnected: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/api/wallet/disconnect")
            .cookie(browser.clone())
            .to_request(),
    )
    .await;
    assert_eq!(disconnected, json!({ "address": null, "isLoggedIn": false }));

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/wallet/user").cookie(browser).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_home_page_asks_for_wallet_first() {
    let rpc = MockServer::start().await;
    let discord = MockServer::start().await;
    let app = gate_app!(test_config(&rpc, &discord));

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(response_cookie(&resp, SESSION_COOKIE_NAME).is_none());

    let body = test::read_body(resp).await;
    let page = String::from_utf8(body.to_vec()).unwrap();
    assert!(page.contains("Connect Your Wallet"));
    assert!(!page.contains("Give me the role!"));
}

#[actix_web::test]
async fn test_anonymous_page_views_do_not_grow_registry() {
    let rpc = MockServer::start().await;
    let discord = MockServer::start().await;
    let app = gate_app!(test_config(&rpc, &discord));

    for uri in ["/", "/api/session", "/", "/api/session"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(response_cookie(&resp, SESSION_COOKIE_NAME).is_none());
    }

    // An unknown cookie is not adopted either
    let stale = actix_web::cookie::Cookie::new(SESSION_COOKIE_NAME, "expired-or-forged");
    let context = session_view!(&app, stale);
    assert_eq!(context["view"], "connect-wallet");
}
