// web-server/src/discord.rs
//! Discord REST client: OAuth2 code exchange, the current user, and guild
//! member role assignment with the bot credential.

use std::time::Duration;

use common::DiscordConfig;
use reqwest::header;
use serde::Deserialize;
use thiserror::Error;

const AUDIT_LOG_REASON: &str = "NFT ownership verified";

#[derive(Debug, Error)]
pub enum DiscordError {
    #[error("request to Discord failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Discord returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Response of the OAuth2 token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Subset of the `/users/@me` object
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl DiscordUser {
    pub fn display_name(&self) -> &str {
        self.global_name.as_deref().unwrap_or(&self.username)
    }

    pub fn avatar_url(&self) -> Option<String> {
        self.avatar.as_ref().map(|hash| {
            let ext = if hash.starts_with("a_") { "gif" } else { "png" };
            format!("https://cdn.discordapp.com/avatars/{}/{}.{}", self.id, hash, ext)
        })
    }
}

#[derive(Clone)]
pub struct DiscordClient {
    http: reqwest::Client,
    api_base: String,
    bot_token: String,
    client_id: String,
    client_secret: String,
}

impl DiscordClient {
    pub fn new(config: &DiscordConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        })
    }

    pub fn member_role_url(&self, guild_id: &str, user_id: &str, role_id: &str) -> String {
        format!(
            "{}/guilds/{}/members/{}/roles/{}",
            self.api_base, guild_id, user_id, role_id
        )
    }

    /// `PUT /guilds/{guild}/members/{user}/roles/{role}`. Assigning a role the
    /// member already holds is a no-op on Discord's side.
    pub async fn add_member_role(
        &self,
        guild_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<(), DiscordError> {
        let url = self.member_role_url(guild_id, user_id, role_id);
        tracing::debug!("PUT {}", url);

        let response = self
            .http
            .put(&url)
            .header(header::AUTHORIZATION, format!("Bot {}", self.bot_token))
            .header(header::CONTENT_LENGTH, "0")
            .header("X-Audit-Log-Reason", AUDIT_LOG_REASON)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(DiscordError::Rejected { status, body })
    }

    /// Exchange an authorization code for an access token
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, DiscordError> {
        let form = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];

        let response = self
            .http
            .post(format!("{}/oauth2/token", self.api_base))
            .form(&form)
            .send()
            .await?;

        Self::json_or_rejected(response).await
    }

    /// The user the access token belongs to
    pub async fn current_user(&self, access_token: &str) -> Result<DiscordUser, DiscordError> {
        let response = self
            .http
            .get(format!("{}/users/@me", self.api_base))
            .bearer_auth(access_token)
            .send()
            .await?;

        Self::json_or_rejected(response).await
    }

    async fn json_or_rejected<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, DiscordError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(DiscordError::Rejected { status, body });
        }
        Ok(response.json::<T>().await?)
    }
}
