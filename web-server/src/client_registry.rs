// web-server/src/client_registry.rs
use actix::{Actor, Context, Handler, Message, AsyncContext, MessageResult};
use common::models::session::{BrowserSession, SessionResult};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use crate::utils::token::create_session_token;

// Default browser session TTL in seconds (24 hours)
const DEFAULT_SESSION_TTL: i64 = 86400;

/// Actor message: Register a new anonymous browser session
#[derive(Message)]
#[rtype(result = "(Uuid, String)")]
pub struct RegisterBrowserSession;

/// Actor message: Get a browser session by session token
#[derive(Message)]
#[rtype(result = "SessionResult")]
pub struct GetBrowserSession {
    pub session_token: String,
}

/// Actor message: Record the address the browser wallet connected with
#[derive(Message)]
#[rtype(result = "SessionResult")]
pub struct ConnectWallet {
    pub session_token: String,
    pub address: String,
}

/// Actor message: Forget the wallet connection entirely
#[derive(Message)]
#[rtype(result = "SessionResult")]
pub struct DisconnectWallet {
    pub session_token: String,
}

/// Actor message: Remember the nonce of a freshly issued login payload
#[derive(Message)]
#[rtype(result = "SessionResult")]
pub struct IssueLoginNonce {
    pub session_token: String,
    pub nonce: String,
}

/// Actor message: Complete a wallet login. The pending nonce is consumed
/// whether or not it matches.
#[derive(Message)]
#[rtype(result = "SessionResult")]
pub struct CompleteWalletLogin {
    pub session_token: String,
    pub address: String,
    pub nonce: String,
}

/// Actor message: Drop the wallet login but keep the connection
#[derive(Message)]
#[rtype(result = "SessionResult")]
pub struct LogoutWallet {
    pub session_token: String,
}

/// Actor message: Clean up expired sessions
#[derive(Message)]
#[rtype(result = "usize")]
pub struct CleanupExpiredSessions;

/// Registry of anonymous browser sessions and their wallet state
pub struct ClientRegistryActor {
    // Map from session token to session data
    sessions: Arc<DashMap<String, BrowserSession>>,
    // Session TTL in seconds
    session_ttl: i64,
    // Cleanup interval in seconds
    cleanup_interval: u64,
    // Sessions expired over the actor's lifetime
    expired_count: usize,
}

impl Default for ClientRegistryActor {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientRegistryActor {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            session_ttl: DEFAULT_SESSION_TTL,
            cleanup_interval: 3600, // Run cleanup every hour
            expired_count: 0,
        }
    }

    pub fn with_ttl(mut self, ttl_seconds: i64) -> Self {
        self.session_ttl = ttl_seconds;
        self
    }

    pub fn with_cleanup_interval(mut self, interval_seconds: u64) -> Self {
        self.cleanup_interval = interval_seconds.max(1);
        self
    }

    /// Apply `update` to a live session. `update` returning false marks the
    /// request invalid; changes it made are kept.
    fn update_session<F>(&self, session_token: &str, update: F) -> SessionResult
    where
        F: FnOnce(&mut BrowserSession) -> bool,
    {
        let Some(mut entry) = self.sessions.get_mut(session_token) else {
            tracing::debug!("Session not found for token");
            return SessionResult::NotFound;
        };

        let session = entry.value_mut();
        if session.is_expired(self.session_ttl) {
            tracing::debug!("Session expired: {}", session.client_id);
            return SessionResult::Expired;
        }

        session.update_activity();
        if update(session) {
            SessionResult::Success(session.clone())
        } else {
            SessionResult::Invalid
        }
    }

    /// Remove expired sessions
    fn cleanup_sessions(&mut self) -> usize {
        let ttl = self.session_ttl;
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_expired(ttl));
        let expired = before.saturating_sub(self.sessions.len());

        self.expired_count += expired;
        expired
    }
}

impl Actor for ClientRegistryActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!("ClientRegistryActor started with TTL: {}s", self.session_ttl);

        // Schedule periodic session cleanup
        ctx.run_interval(Duration::from_secs(self.cleanup_interval), |act, _ctx| {
            let expired_count = act.cleanup_sessions();
            if expired_count > 0 {
                tracing::info!("Cleaned up {} expired sessions", expired_count);
            }
        });
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(
            "ClientRegistryActor stopped. {} live sessions, {} expired during lifetime",
            self.sessions.len(),
            self.expired_count
        );
    }
}

impl Handler<RegisterBrowserSession> for ClientRegistryActor {
    type Result = MessageResult<RegisterBrowserSession>;

    fn handle(&mut self, _msg: RegisterBrowserSession, _ctx: &mut Self::Context) -> Self::Result {
        let client_id = Uuid::new_v4();
        let session_token = create_session_token();

        let session = BrowserSession::new(client_id, session_token.clone());
        self.sessions.insert(session_token.clone(), session);

        tracing::info!("Registered new browser session: {}", client_id);

        MessageResult((client_id, session_token))
    }
}

impl Handler<GetBrowserSession> for ClientRegistryActor {
    type Result = MessageResult<GetBrowserSession>;

    fn handle(&mut self, msg: GetBrowserSession, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.update_session(&msg.session_token, |_| true))
    }
}

impl Handler<ConnectWallet> for ClientRegistryActor {
    type Result = MessageResult<ConnectWallet>;

    fn handle(&mut self, msg: ConnectWallet, _ctx: &mut Self::Context) -> Self::Result {
        let result = self.update_session(&msg.session_token, |session| {
            session.connect_wallet(msg.address);
            tracing::info!(
                "Wallet {:?} connected for client: {}",
                session.connected_address,
                session.client_id
            );
            true
        });
        MessageResult(result)
    }
}

impl Handler<DisconnectWallet> for ClientRegistryActor {
    type Result = MessageResult<DisconnectWallet>;

    fn handle(&mut self, msg: DisconnectWallet, _ctx: &mut Self::Context) -> Self::Result {
        let result = self.update_session(&msg.session_token, |session| {
            session.disconnect_wallet();
            tracing::info!("Wallet disconnected for client: {}", session.client_id);
            true
        });
        MessageResult(result)
    }
}

impl Handler<IssueLoginNonce> for ClientRegistryActor {
    type Result = MessageResult<IssueLoginNonce>;

    fn handle(&mut self, msg: IssueLoginNonce, _ctx: &mut Self::Context) -> Self::Result {
        let result = self.update_session(&msg.session_token, |session| {
            session.pending_nonce = Some(msg.nonce);
            true
        });
        MessageResult(result)
    }
}

impl Handler<CompleteWalletLogin> for ClientRegistryActor {
    type Result = MessageResult<CompleteWalletLogin>;

    fn handle(&mut self, msg: CompleteWalletLogin, _ctx: &mut Self::Context) -> Self::Result {
        let result = self.update_session(&msg.session_token, |session| {
            let pending = session.pending_nonce.take();
            if pending.as_deref() != Some(msg.nonce.as_str()) {
                tracing::warn!("Login nonce mismatch for client: {}", session.client_id);
                return false;
            }

            // Signing implies the wallet is connected, even if the connect
            // call never reached us
            if session.connected_address.is_none() {
                session.connected_address = Some(msg.address.clone());
            }
            session.authenticate(msg.address);
            tracing::info!("Wallet login completed for client: {}", session.client_id);
            true
        });
        MessageResult(result)
    }
}

impl Handler<LogoutWallet> for ClientRegistryActor {
    type Result = MessageResult<LogoutWallet>;

    fn handle(&mut self, msg: LogoutWallet, _ctx: &mut Self::Context) -> Self::Result {
        let result = self.update_session(&msg.session_token, |session| {
            session.logout_wallet();
            true
        });
        MessageResult(result)
    }
}

impl Handler<CleanupExpiredSessions> for ClientRegistryActor {
    type Result = MessageResult<CleanupExpiredSessions>;

    fn handle(&mut self, _msg: CleanupExpiredSessions, _ctx: &mut Self::Context) -> Self::Result {
        let expired_count = self.cleanup_sessions();
        tracing::info!("Cleaned up {} expired sessions", expired_count);
        MessageResult(expired_count)
    }
}
