// web-server/src/api/auth.rs
//! Discord OAuth endpoints under `/api/auth`.

use actix_web::http::header;
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use common::issue_session_token;
use common::models::session::ProviderAccount;
use common::Config;
use serde::Deserialize;
use serde_json::json;

use crate::api::session::{
    build_cookie, discord_session, is_secure, removal_cookie, DISCORD_SESSION_COOKIE,
};
use crate::error::ApiError;
use crate::oauth::{jwt_callback, materialize_session, token_for_user, DiscordProvider, PROVIDER_ID};
use crate::utils::token::generate_oauth_state;
use crate::GateServices;

// Cookie binding the OAuth redirect to the browser that started it
pub const OAUTH_STATE_COOKIE: &str = "gate.oauth-state";
// The user has this long to finish the Discord consent screen
const OAUTH_STATE_MAX_AGE: i64 = 900;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.to_string()))
        .finish()
}

/// Start the authorization code flow
#[get("/auth/signin/discord")]
pub async fn signin_discord(config: web::Data<Config>) -> Result<HttpResponse, ApiError> {
    let state = generate_oauth_state();
    let provider = DiscordProvider::from_config(&config.discord);
    let url = provider
        .authorization_url(&config.discord_redirect_uri(), &state)
        .map_err(|e| ApiError::Internal(format!("invalid Discord authorize URL: {}", e)))?;

    Ok(HttpResponse::Found()
        .cookie(build_cookie(OAUTH_STATE_COOKIE, state, OAUTH_STATE_MAX_AGE, is_secure(&config)))
        .insert_header((header::LOCATION, url.to_string()))
        .finish())
}

/// Discord redirects here with the authorization code
#[get("/auth/callback/discord")]
pub async fn callback_discord(
    req: HttpRequest,
    query: web::Query<CallbackQuery>,
    config: web::Data<Config>,
    services: web::Data<GateServices>,
) -> Result<HttpResponse, ApiError> {
    if let Some(error) = &query.error {
        tracing::warn!("Discord authorization denied: {}", error);
        return Ok(redirect("/"));
    }

    let expected_state = req.cookie(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    match (&query.state, &expected_state) {
        (Some(got), Some(expected)) if got == expected => {},
        _ => {
            tracing::warn!("OAuth state mismatch on Discord callback");
            return Err(ApiError::NotLoggedIn);
        }
    }

    let code = query
        .code
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("Missing authorization code".to_string()))?;

    let tokens = services
        .discord
        .exchange_code(code, &config.discord_redirect_uri())
        .await
        .map_err(ApiError::OAuth)?;
    let user = services
        .discord
        .current_user(&tokens.access_token)
        .await
        .map_err(ApiError::OAuth)?;

    let account = ProviderAccount {
        provider: PROVIDER_ID.to_string(),
        provider_account_id: user.id.clone(),
        access_token: tokens.access_token,
        token_type: tokens.token_type,
        scope: tokens.scope,
    };
    let token = jwt_callback(token_for_user(&user), Some(&account));

    let jwt = issue_session_token(token, config.session.max_age, config.session.secret.as_bytes())
        .map_err(|e| ApiError::Internal(format!("failed to sign session token: {}", e)))?;

    tracing::info!("Discord user {} signed in", user.id);

    Ok(HttpResponse::Found()
        .cookie(build_cookie(
            DISCORD_SESSION_COOKIE,
            jwt,
            config.session.max_age,
            is_secure(&config),
        ))
        .cookie(removal_cookie(OAUTH_STATE_COOKIE))
        .insert_header((header::LOCATION, "/"))
        .finish())
}

/// Current session, `{}` when signed out
#[get("/auth/session")]
pub async fn get_session(req: HttpRequest, config: web::Data<Config>) -> HttpResponse {
    match discord_session(&req, &config) {
        Some(token) => HttpResponse::Ok().json(materialize_session(&token)),
        None => HttpResponse::Ok().json(json!({})),
    }
}

#[post("/auth/signout")]
pub async fn signout() -> HttpResponse {
    tracing::info!("Discord session signed out");
    HttpResponse::SeeOther()
        .cookie(removal_cookie(DISCORD_SESSION_COOKIE))
        .insert_header((header::LOCATION, "/"))
        .finish()
}
