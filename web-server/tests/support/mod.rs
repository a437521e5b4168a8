// web-server/tests/support/mod.rs
#![allow(dead_code)]

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use chrono::{Duration, Utc};
use common::models::login::{LoginPayload, LoginPayloadData};
use common::models::session::SessionToken;
use common::{issue_session_token, Config};
use ethers::signers::LocalWallet;
use ethers::utils::{hash_message, hex};
use role_gate::api::session::{DISCORD_SESSION_COOKIE, SESSION_COOKIE_NAME};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Well-known test key; its address is TEST_ADDRESS
pub const TEST_KEY: [u8; 32] = [
    0x4c, 0x08, 0x83, 0xa6, 0x91, 0x02, 0x93, 0x7d, 0x62, 0x31, 0x47, 0x1b, 0x5d, 0xbb, 0x62, 0x04,
    0xfe, 0x51, 0x29, 0x61, 0x70, 0x82, 0x79, 0x2a, 0xe4, 0x68, 0xd0, 0x1a, 0x3f, 0x36, 0x23, 0x18,
];
pub const TEST_ADDRESS: &str = "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23";
pub const OTHER_KEY: [u8; 32] = [0x11; 32];

pub const DISCORD_USER_ID: &str = "80351110224678912";
pub const GUILD_ID: &str = "guild-1";
pub const ROLE_ID: &str = "role-1";
pub const BOT_TOKEN: &str = "test-bot-token";
pub const AUTH_DOMAIN: &str = "example.com";

/// Config pointing every upstream at the given mock servers
pub fn test_config(rpc: &MockServer, discord: &MockServer) -> Config {
    let mut config = Config::default();
    config.session.secret = "integration-secret".to_string();
    config.discord.client_id = "client-id".to_string();
    config.discord.client_secret = "client-secret".to_string();
    config.discord.bot_token = BOT_TOKEN.to_string();
    config.discord.guild_id = GUILD_ID.to_string();
    config.discord.role_id = ROLE_ID.to_string();
    config.discord.api_base = discord.uri();
    config.wallet.auth_domain = AUTH_DOMAIN.to_string();
    config.wallet.rpc_url = rpc.uri();
    config.wallet.edition_drop_address = "0x0000000000000000000000000000000000000abc".to_string();
    config
}

/// Build and initialise the full app for `$config`
macro_rules! gate_app {
    ($config:expr) => {{
        use actix::Actor as _;
        let config: common::Config = $config;
        let registry = role_gate::client_registry::ClientRegistryActor::new().start();
        let services = role_gate::GateServices::from_config(&config).unwrap();
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new(config.clone()))
                .app_data(actix_web::web::Data::new(registry))
                .app_data(actix_web::web::Data::new(services))
                .configure(role_gate::routes(&config)),
        )
        .await
    }};
}

/// `personal_sign` with a raw secret key
pub fn sign(message: &str, key: &[u8; 32]) -> String {
    let wallet = LocalWallet::from_bytes(key).unwrap();
    let signature = wallet.sign_hash(hash_message(message)).unwrap();
    format!("0x{}", hex::encode(signature.to_vec()))
}

/// Connect TEST_ADDRESS in a fresh browser session, have the server issue a
/// login payload and sign it with `$key`. Yields the browser cookie and the
/// `{payload, signature}` body.
#[allow(unused_macros)]
macro_rules! issued_login {
    ($app:expr, $key:expr) => {{
        let resp = actix_web::test::call_service(
            $app,
            actix_web::test::TestRequest::post()
                .uri("/api/wallet/connect")
                .set_json(serde_json::json!({ "address": TEST_ADDRESS }))
                .to_request(),
        )
        .await;
        let browser = browser_cookie(&resp);

        let issued: serde_json::Value = actix_web::test::call_and_read_body_json(
            $app,
            actix_web::test::TestRequest::post()
                .uri("/api/wallet/login/payload")
                .cookie(browser.clone())
                .to_request(),
        )
        .await;
        let signature = sign(issued["message"].as_str().unwrap(), $key);
        (browser, serde_json::json!({ "payload": issued["payload"], "signature": signature }))
    }};
}

/// A login payload for TEST_ADDRESS that no browser session issued, signed
/// with `key`
pub fn signed_payload(key: &[u8; 32]) -> LoginPayload {
    let now = Utc::now();
    let payload = LoginPayloadData {
        domain: AUTH_DOMAIN.to_string(),
        address: TEST_ADDRESS.to_string(),
        statement: String::new(),
        uri: None,
        version: "1".to_string(),
        chain_id: Some(80001),
        nonce: "integration-nonce".to_string(),
        issued_at: now,
        expiration_time: now + Duration::minutes(10),
        invalid_before: now - Duration::minutes(1),
    };
    let signature = sign(&payload.message(), key);
    LoginPayload { payload, signature }
}

/// Signed Discord session cookie for DISCORD_USER_ID
pub fn discord_cookie(config: &Config) -> Cookie<'static> {
    let token = SessionToken {
        sub: DISCORD_USER_ID.to_string(),
        user_id: Some(DISCORD_USER_ID.to_string()),
        name: Some("nelly".to_string()),
        picture: None,
        iat: 0,
        exp: 0,
    };
    let jwt = issue_session_token(token, 3600, config.session.secret.as_bytes()).unwrap();
    Cookie::new(DISCORD_SESSION_COOKIE, jwt)
}

/// The named cookie set by a response
pub fn response_cookie<B>(resp: &ServiceResponse<B>, name: &str) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == name)
        .map(|c| c.into_owned())
}

pub fn browser_cookie<B>(resp: &ServiceResponse<B>) -> Cookie<'static> {
    response_cookie(resp, SESSION_COOKIE_NAME).expect("browser session cookie")
}

/// Mount an `eth_call` answering with `balance`
pub async fn mount_balance(rpc: &MockServer, balance: u128, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({ "method": "eth_call" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": format!("0x{:064x}", balance),
        })))
        .expect(expected_calls)
        .mount(rpc)
        .await;
}

pub fn role_path() -> String {
    format!("/guilds/{}/members/{}/roles/{}", GUILD_ID, DISCORD_USER_ID, ROLE_ID)
}
