// common/src/models/session.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

/// Anonymous per-browser session holding the wallet connection state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserSession {
    /// Unique client identifier
    pub client_id: Uuid,
    /// Secure session token used for cookie-based tracking
    pub session_token: String,
    /// Timestamp when the session was created
    pub created_at: DateTime<Utc>,
    /// Timestamp of last client activity
    pub last_active: DateTime<Utc>,
    /// Address reported by the browser wallet, checksummed
    pub connected_address: Option<String>,
    /// Address that signed a login challenge issued to this session
    pub verified_address: Option<String>,
    /// Nonce of the outstanding login payload, consumed on login
    pub pending_nonce: Option<String>,
}

impl BrowserSession {
    pub fn new(client_id: Uuid, session_token: String) -> Self {
        let now = Utc::now();
        Self {
            client_id,
            session_token,
            created_at: now,
            last_active: now,
            connected_address: None,
            verified_address: None,
            pending_nonce: None,
        }
    }

    /// Update session activity timestamp
    pub fn update_activity(&mut self) {
        self.last_active = Utc::now();
    }

    /// Check if the session has expired based on TTL
    pub fn is_expired(&self, ttl_seconds: i64) -> bool {
        let age = Utc::now().signed_duration_since(self.last_active);
        age.num_seconds() > ttl_seconds
    }

    /// Record the wallet the browser is connected with. A different address
    /// drops the previous wallet login.
    pub fn connect_wallet(&mut self, address: String) {
        let switched = self
            .connected_address
            .as_deref()
            .map_or(true, |current| !current.eq_ignore_ascii_case(&address));
        if switched {
            self.verified_address = None;
            self.pending_nonce = None;
        }
        self.connected_address = Some(address);
        self.update_activity();
    }

    pub fn disconnect_wallet(&mut self) {
        self.connected_address = None;
        self.verified_address = None;
        self.pending_nonce = None;
        self.update_activity();
    }

    /// Mark the wallet as logged in with the signed address
    pub fn authenticate(&mut self, wallet_address: String) {
        self.verified_address = Some(wallet_address);
        self.pending_nonce = None;
        self.update_activity();
    }

    pub fn logout_wallet(&mut self) {
        self.verified_address = None;
        self.update_activity();
    }

    /// True once the connected wallet has signed a login challenge
    pub fn is_wallet_logged_in(&self) -> bool {
        match (&self.connected_address, &self.verified_address) {
            (Some(connected), Some(verified)) => connected.eq_ignore_ascii_case(verified),
            _ => false,
        }
    }
}

/// Result of session operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionResult {
    Success(BrowserSession),
    NotFound,
    Expired,
    Invalid,
}

/// Claims of the signed Discord session cookie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionToken {
    /// Subject; the Discord account id
    pub sub: String,
    /// Copied from the provider account by the jwt callback
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub iat: usize,
    pub exp: usize,
}

/// Account returned by the OAuth provider after a completed sign-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAccount {
    pub provider: String,
    pub provider_account_id: String,
    pub access_token: String,
    pub token_type: String,
    pub scope: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub name: Option<String>,
    pub image: Option<String>,
}

/// Session object as exposed to views and `/api/auth/session`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: SessionUser,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub expires: DateTime<Utc>,
}

impl Session {
    /// Session object before any callback has touched it
    pub fn from_token(token: &SessionToken) -> Self {
        let expires = DateTime::<Utc>::from_timestamp(token.exp as i64, 0)
            .unwrap_or_else(Utc::now);
        Self {
            user: SessionUser {
                name: token.name.clone(),
                image: token.picture.clone(),
            },
            user_id: None,
            expires,
        }
    }
}

/// Provider context handed to views: wallet address, wallet login state and
/// Discord session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub address: Option<String>,
    pub is_logged_in: bool,
    pub session: Option<Session>,
}

impl SessionContext {
    pub fn new(browser: Option<&BrowserSession>, session: Option<Session>) -> Self {
        Self {
            address: browser.and_then(|b| b.connected_address.clone()),
            is_logged_in: browser.map_or(false, BrowserSession::is_wallet_logged_in),
            session,
        }
    }
}
