// web-server/src/api/wallet.rs
//! Wallet connection and sign-in-with-wallet endpoints.

use actix::Addr;
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use chrono::{Duration, Utc};
use common::models::login::{LoginPayload, LoginPayloadData};
use common::models::session::{BrowserSession, SessionResult};
use common::wallet::{normalize_address, verify_login_payload};
use common::Config;
use serde::Deserialize;
use serde_json::json;

use crate::api::session::{browser_session, ensure_browser_session};
use crate::client_registry::{
    ClientRegistryActor,
    CompleteWalletLogin,
    ConnectWallet,
    DisconnectWallet,
    IssueLoginNonce,
    LogoutWallet,
};
use crate::error::ApiError;
use crate::utils::token::generate_nonce;

// How far back `invalid_before` is set, to absorb clock skew
const CLOCK_SKEW_SECONDS: i64 = 60;

#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    pub address: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PayloadRequest {
    #[serde(default)]
    pub address: Option<String>,
}

fn session_or_error(result: SessionResult) -> Result<BrowserSession, ApiError> {
    match result {
        SessionResult::Success(session) => Ok(session),
        SessionResult::Invalid => Err(ApiError::WalletNotAuthorized),
        other => Err(ApiError::BadRequest(format!("Browser session unavailable: {:?}", other))),
    }
}

fn wallet_state(session: &BrowserSession) -> serde_json::Value {
    json!({
        "address": session.connected_address,
        "isLoggedIn": session.is_wallet_logged_in(),
    })
}

/// Record the address the browser wallet connected with
#[post("/wallet/connect")]
pub async fn connect_wallet(
    req: HttpRequest,
    body: web::Json<ConnectRequest>,
    registry: web::Data<Addr<ClientRegistryActor>>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let address = normalize_address(&body.address)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let (session, cookie) = ensure_browser_session(&req, &registry, &config).await?;

    let session = session_or_error(
        registry
            .send(ConnectWallet { session_token: session.session_token, address })
            .await?,
    )?;

    let mut response = HttpResponse::Ok();
    if let Some(cookie) = cookie {
        response.cookie(cookie);
    }
    Ok(response.json(wallet_state(&session)))
}

#[post("/wallet/disconnect")]
pub async fn disconnect_wallet(
    req: HttpRequest,
    registry: web::Data<Addr<ClientRegistryActor>>,
) -> Result<HttpResponse, ApiError> {
    let Some(session) = browser_session(&req, &registry).await? else {
        return Ok(HttpResponse::Ok().json(json!({ "address": null, "isLoggedIn": false })));
    };

    let session = session_or_error(
        registry
            .send(DisconnectWallet { session_token: session.session_token })
            .await?,
    )?;
    Ok(HttpResponse::Ok().json(wallet_state(&session)))
}

/// Issue a login payload for the connected wallet. The response carries the
/// exact message the wallet has to sign.
#[post("/wallet/login/payload")]
pub async fn login_payload(
    req: HttpRequest,
    body: Option<web::Json<PayloadRequest>>,
    registry: web::Data<Addr<ClientRegistryActor>>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let (session, cookie) = ensure_browser_session(&req, &registry, &config).await?;

    let requested = body.and_then(|b| b.into_inner().address);
    let address = match requested.or_else(|| session.connected_address.clone()) {
        Some(address) => normalize_address(&address).map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => return Err(ApiError::BadRequest("No wallet connected".to_string())),
    };

    let now = Utc::now();
    let payload = LoginPayloadData {
        domain: config.wallet.auth_domain.clone(),
        address,
        statement: config.wallet.statement.clone(),
        uri: None,
        version: "1".to_string(),
        chain_id: Some(config.wallet.chain_id),
        nonce: generate_nonce(),
        issued_at: now,
        expiration_time: now + Duration::seconds(config.wallet.login_ttl),
        invalid_before: now - Duration::seconds(CLOCK_SKEW_SECONDS),
    };

    session_or_error(
        registry
            .send(IssueLoginNonce {
                session_token: session.session_token,
                nonce: payload.nonce.clone(),
            })
            .await?,
    )?;

    let mut response = HttpResponse::Ok();
    if let Some(cookie) = cookie {
        response.cookie(cookie);
    }
    Ok(response.json(json!({
        "message": payload.message(),
        "payload": payload,
    })))
}

/// Verify a signed login payload issued to this browser session
#[post("/wallet/login")]
pub async fn login(
    req: HttpRequest,
    body: web::Json<LoginPayload>,
    registry: web::Data<Addr<ClientRegistryActor>>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let session = browser_session(&req, &registry)
        .await?
        .ok_or(ApiError::WalletNotAuthorized)?;

    let login = body.into_inner();
    let address = verify_login_payload(&login, &config.wallet.auth_domain, Utc::now())?;

    let session = session_or_error(
        registry
            .send(CompleteWalletLogin {
                session_token: session.session_token,
                address: address.clone(),
                nonce: login.payload.nonce,
            })
            .await?,
    )?;

    tracing::info!("Wallet {} logged in for client {}", address, session.client_id);
    Ok(HttpResponse::Ok().json(wallet_state(&session)))
}

/// The verified wallet of this browser session
#[get("/wallet/user")]
pub async fn wallet_user(
    req: HttpRequest,
    registry: web::Data<Addr<ClientRegistryActor>>,
) -> Result<HttpResponse, ApiError> {
    let session = browser_session(&req, &registry).await?;
    match session.filter(BrowserSession::is_wallet_logged_in) {
        Some(session) => Ok(HttpResponse::Ok().json(json!({ "address": session.verified_address }))),
        None => Err(ApiError::WalletNotAuthorized),
    }
}

#[post("/wallet/logout")]
pub async fn logout(
    req: HttpRequest,
    registry: web::Data<Addr<ClientRegistryActor>>,
) -> Result<HttpResponse, ApiError> {
    if let Some(session) = browser_session(&req, &registry).await? {
        session_or_error(
            registry
                .send(LogoutWallet { session_token: session.session_token })
                .await?,
        )?;
    }
    Ok(HttpResponse::Ok().json(json!({ "status": "success" })))
}
