// web-server/src/views.rs
//! Server-rendered pages. Wallet interaction happens in `static/app.js`,
//! which posts to the wallet endpoints and reloads the page.

use actix::Addr;
use actix_web::{get, web, HttpRequest, HttpResponse};
use common::models::session::SessionContext;
use common::Config;
use serde::Serialize;

use crate::api::session::load_context;
use crate::client_registry::ClientRegistryActor;
use crate::error::ApiError;

/// The four mutually exclusive states of the sign-in flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignInState {
    /// Discord session and wallet both present
    Authenticated,
    ConnectWallet,
    /// Wallet connected but the login challenge is unsigned
    SignMessage,
    ConnectDiscord,
}

impl SignInState {
    /// Evaluated in priority order: authenticated, connect wallet, sign
    /// message, connect Discord.
    pub fn select(has_session: bool, has_address: bool, is_logged_in: bool) -> Self {
        if has_session && has_address {
            SignInState::Authenticated
        } else if !has_address {
            SignInState::ConnectWallet
        } else if !is_logged_in {
            SignInState::SignMessage
        } else {
            SignInState::ConnectDiscord
        }
    }

    pub fn from_context(context: &SessionContext) -> Self {
        Self::select(
            context.session.is_some(),
            context.address.is_some(),
            context.is_logged_in,
        )
    }
}

pub fn render_sign_in(state: SignInState) -> String {
    match state {
        SignInState::Authenticated => r#"<div class="bigSpacerTop">
  <form method="post" action="/api/auth/signout">
    <button type="submit" class="secondaryButton">Sign out of Discord</button>
  </form>
</div>"#
            .to_string(),
        SignInState::ConnectWallet => r#"<div class="main">
  <h2 class="noGapBottom">Connect Your Wallet</h2>
  <p>Connect your wallet to check eligibility.</p>
  <button class="mainButton" data-action="connect-wallet">Connect Wallet</button>
</div>"#
            .to_string(),
        SignInState::SignMessage => r#"<div class="main">
  <h2 class="noGapBottom">Sign using your wallet</h2>
  <p>This proves that you really own the wallet that you&apos;ve claimed to be connected.</p>
  <button class="mainButton spacerTop" data-action="sign-message">Sign message!</button>
</div>"#
            .to_string(),
        SignInState::ConnectDiscord => r#"<div class="main">
  <h2 class="noGapBottom">Sign In with Discord</h2>
  <p>Sign In with Discord to check your eligibility for the NFT!</p>
  <a class="mainButton spacerTop" href="/api/auth/signin/discord">Connect Discord</a>
</div>"#
            .to_string(),
    }
}

/// Home page: the sign-in flow plus the role grant action once both the
/// wallet and the Discord session are present
pub fn render_home(context: &SessionContext) -> String {
    let state = SignInState::from_context(context);
    let sign_in = render_sign_in(state);

    let grant = if context.address.is_some() && context.session.is_some() {
        r#"<div class="collectionContainer">
  <button class="mainButton" data-action="grant-role">Give me the role!</button>
</div>"#
    } else {
        ""
    };

    let disconnect = if context.address.is_some() {
        r#"<button class="secondaryButton" data-action="disconnect-wallet">Disconnect wallet</button>"#
    } else {
        ""
    };

    let address = context.address.as_deref().unwrap_or("");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>NFT Role Gate</title>
  <link rel="stylesheet" href="/static/style.css">
</head>
<body data-address="{address}" data-state="{state}">
  <div class="container">
    {sign_in}
    {grant}
    {disconnect}
  </div>
  <script src="/static/app.js"></script>
</body>
</html>"#,
        address = address,
        state = state_name(state),
        sign_in = sign_in,
        grant = grant,
        disconnect = disconnect,
    )
}

fn state_name(state: SignInState) -> &'static str {
    match state {
        SignInState::Authenticated => "authenticated",
        SignInState::ConnectWallet => "connect-wallet",
        SignInState::SignMessage => "sign-message",
        SignInState::ConnectDiscord => "connect-discord",
    }
}

#[get("/")]
pub async fn index(
    req: HttpRequest,
    registry: web::Data<Addr<ClientRegistryActor>>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let context = load_context(&req, &registry, &config).await?;

    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(render_home(&context)))
}
