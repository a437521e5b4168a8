// web-server/src/api/session.rs
use actix::Addr;
use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::{get, web, HttpRequest, HttpResponse};
use common::models::session::{BrowserSession, SessionContext, SessionResult, SessionToken};
use common::{validate_session_token, Config};
use serde_json::json;

use crate::client_registry::{ClientRegistryActor, GetBrowserSession, RegisterBrowserSession};
use crate::error::ApiError;
use crate::oauth::materialize_session;
use crate::views::SignInState;

// Cookie tracking the anonymous browser session
pub const SESSION_COOKIE_NAME: &str = "gate_session";
// Cookie carrying the signed Discord session token
pub const DISCORD_SESSION_COOKIE: &str = "gate.session-token";
// Browser session cookie max age in seconds (24 hours)
const COOKIE_MAX_AGE: i64 = 86400;

pub fn is_secure(config: &Config) -> bool {
    config.public_url.starts_with("https://")
}

pub fn build_cookie(name: &'static str, value: String, max_age: i64, secure: bool) -> Cookie<'static> {
    Cookie::build(name, value)
        .path("/")
        .secure(secure)
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(max_age))
        .finish()
}

pub fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build(name, "")
        .path("/")
        .max_age(CookieDuration::seconds(0))
        .finish()
}

/// The caller's browser session, if the cookie names a live one
pub async fn browser_session(
    req: &HttpRequest,
    registry: &Addr<ClientRegistryActor>,
) -> Result<Option<BrowserSession>, ApiError> {
    let Some(cookie) = req.cookie(SESSION_COOKIE_NAME) else {
        return Ok(None);
    };

    let session_token = cookie.value().to_string();
    match registry.send(GetBrowserSession { session_token }).await? {
        SessionResult::Success(session) => Ok(Some(session)),
        SessionResult::Expired => {
            tracing::info!("Browser session expired");
            Ok(None)
        },
        _ => Ok(None),
    }
}

/// The caller's browser session, registering a new one when needed. The
/// cookie is returned only when a session was created.
pub async fn ensure_browser_session(
    req: &HttpRequest,
    registry: &Addr<ClientRegistryActor>,
    config: &Config,
) -> Result<(BrowserSession, Option<Cookie<'static>>), ApiError> {
    if let Some(session) = browser_session(req, registry).await? {
        return Ok((session, None));
    }

    let (client_id, session_token) = registry.send(RegisterBrowserSession).await?;
    let cookie = build_cookie(
        SESSION_COOKIE_NAME,
        session_token.clone(),
        COOKIE_MAX_AGE,
        is_secure(config),
    );

    match registry.send(GetBrowserSession { session_token }).await? {
        SessionResult::Success(session) => Ok((session, Some(cookie))),
        other => Err(ApiError::Internal(format!(
            "session {} vanished after registration: {:?}",
            client_id, other
        ))),
    }
}

/// Decoded Discord session token, if the cookie holds a valid one
pub fn discord_session(req: &HttpRequest, config: &Config) -> Option<SessionToken> {
    let cookie = req.cookie(DISCORD_SESSION_COOKIE)?;
    match validate_session_token(cookie.value(), config.session.secret.as_bytes()) {
        Ok(token) => Some(token),
        Err(e) => {
            tracing::debug!("Ignoring invalid Discord session token: {}", e);
            None
        }
    }
}

/// Everything the views need: wallet address, wallet login and Discord
/// session. Read-only; a browser session is only created by the wallet
/// endpoints.
pub async fn load_context(
    req: &HttpRequest,
    registry: &Addr<ClientRegistryActor>,
    config: &Config,
) -> Result<SessionContext, ApiError> {
    let browser = browser_session(req, registry).await?;
    let session = discord_session(req, config).map(|token| materialize_session(&token));
    Ok(SessionContext::new(browser.as_ref(), session))
}

/// Provider context as JSON
#[get("/session")]
pub async fn get_session_context(
    req: HttpRequest,
    registry: web::Data<Addr<ClientRegistryActor>>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let context = load_context(&req, &registry, &config).await?;
    let view = SignInState::from_context(&context);

    Ok(HttpResponse::Ok().json(json!({
        "address": context.address,
        "isLoggedIn": context.is_logged_in,
        "session": context.session,
        "view": view,
    })))
}
