// web-server/src/api/grant_role.rs
use actix::Addr;
use actix_web::{post, web, HttpRequest, HttpResponse};
use chrono::Utc;
use common::models::login::LoginPayload;
use common::models::session::SessionResult;
use common::wallet::verify_login_payload;
use common::Config;
use serde::Deserialize;
use serde_json::json;

use crate::api::session::{browser_session, discord_session};
use crate::client_registry::{ClientRegistryActor, CompleteWalletLogin};
use crate::error::ApiError;
use crate::GateServices;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantRoleRequest {
    #[serde(default)]
    pub login_payload: Option<LoginPayload>,
}

/// The body is optional and sent without a JSON content type by some
/// clients, so it is parsed by hand. Anything unreadable counts as absent.
fn parse_request(body: &[u8]) -> GrantRoleRequest {
    if body.iter().all(u8::is_ascii_whitespace) {
        return GrantRoleRequest::default();
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        tracing::debug!("Ignoring unreadable grant-role body: {}", e);
        GrantRoleRequest::default()
    })
}

/// Verify a signed payload and spend its nonce. The payload must have been
/// issued to the caller's browser session.
async fn redeem_login_payload(
    req: &HttpRequest,
    registry: &Addr<ClientRegistryActor>,
    config: &Config,
    login: &LoginPayload,
) -> Result<String, ApiError> {
    let address = verify_login_payload(login, &config.wallet.auth_domain, Utc::now())?;

    let session = browser_session(req, registry)
        .await?
        .ok_or(ApiError::WalletNotAuthorized)?;

    let result = registry
        .send(CompleteWalletLogin {
            session_token: session.session_token,
            address: address.clone(),
            nonce: login.payload.nonce.clone(),
        })
        .await?;

    match result {
        SessionResult::Success(_) => Ok(address),
        _ => Err(ApiError::WalletNotAuthorized),
    }
}

/// Grant the configured Discord role to a signed-in holder of the NFT
#[post("/grant-role")]
pub async fn grant_role(
    req: HttpRequest,
    body: web::Bytes,
    registry: web::Data<Addr<ClientRegistryActor>>,
    config: web::Data<Config>,
    services: web::Data<GateServices>,
) -> Result<HttpResponse, ApiError> {
    let request = parse_request(&body);

    // Wallet first: an explicit signed payload, else the browser session's login
    let address = match &request.login_payload {
        Some(login) => redeem_login_payload(&req, &registry, &config, login).await?,
        None => browser_session(&req, &registry)
            .await?
            .filter(|s| s.is_wallet_logged_in())
            .and_then(|s| s.verified_address)
            .ok_or(ApiError::WalletNotAuthorized)?,
    };

    let token = discord_session(&req, &config).ok_or(ApiError::NotLoggedIn)?;
    let user_id = token.user_id.unwrap_or(token.sub);

    let balance = services
        .edition_drop
        .balance_of(&address, config.wallet.token_id)
        .await?;
    tracing::info!(
        "Wallet {} holds {} of token {}",
        address,
        balance,
        config.wallet.token_id
    );

    if balance.is_zero() {
        return Err(ApiError::NotEligible);
    }

    tracing::info!("Granting role {} to Discord user {}", config.discord.role_id, user_id);
    services
        .discord
        .add_member_role(&config.discord.guild_id, &user_id, &config.discord.role_id)
        .await
        .map_err(ApiError::RoleGrantFailed)?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Role granted" })))
}
