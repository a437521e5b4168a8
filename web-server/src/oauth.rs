// web-server/src/oauth.rs
//! Discord OAuth provider registration and the two session callbacks.

use common::models::session::{ProviderAccount, Session, SessionToken};
use common::DiscordConfig;
use url::Url;

use crate::discord::DiscordUser;

pub const PROVIDER_ID: &str = "discord";

/// The one OAuth provider this server signs users in with
#[derive(Debug, Clone)]
pub struct DiscordProvider {
    pub client_id: String,
    pub authorize_url: String,
    pub scopes: String,
}

impl DiscordProvider {
    pub fn from_config(config: &DiscordConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            authorize_url: config.authorize_url.clone(),
            scopes: config.scopes.clone(),
        }
    }

    /// Where to send the browser to start the authorization code flow
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> Result<Url, url::ParseError> {
        Url::parse_with_params(
            &self.authorize_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("scope", self.scopes.as_str()),
                ("state", state),
                ("prompt", "consent"),
            ],
        )
    }
}

/// Initial token for a freshly signed-in user
pub fn token_for_user(user: &DiscordUser) -> SessionToken {
    SessionToken {
        sub: user.id.clone(),
        user_id: None,
        name: Some(user.display_name().to_string()),
        picture: user.avatar_url(),
        iat: 0,
        exp: 0,
    }
}

/// Runs when a token is issued. On sign-in the provider account id is
/// persisted into the token.
pub fn jwt_callback(mut token: SessionToken, account: Option<&ProviderAccount>) -> SessionToken {
    if let Some(account) = account {
        tracing::debug!("Signed in {} account {}", account.provider, account.provider_account_id);
        token.user_id = Some(account.provider_account_id.clone());
    }
    token
}

/// Runs whenever a session is read: exposes the token's user id on the session
pub fn session_callback(mut session: Session, token: &SessionToken) -> Session {
    session.user_id = token.user_id.clone();
    session
}

pub fn materialize_session(token: &SessionToken) -> Session {
    session_callback(Session::from_token(token), token)
}
