//! Client-side session
//!
//! Holds the logged-in user's credentials in memory and mirrors them to
//! durable storage under three independent keys. The storage is
//! best-effort: when it is missing or fails, the session keeps working in
//! memory and the problem is logged.

use parking_lot::RwLock;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::model::User;
use crate::storage::{DurableStorage, PASSWORD_KEY, SESSION_KEYS, TOKEN_KEY, USERNAME_KEY};
use crate::token::{self, TokenClaims};

#[derive(Default)]
struct SessionState {
    username: String,
    password: Option<SecretString>,
    token: String,
    user: Option<Value>,
}

/// Shared handle on the current session
///
/// Cloning is cheap and every clone sees the same state, so the same
/// session can be held by the user service and every resource client.
#[derive(Clone)]
pub struct Session {
    state: Arc<RwLock<SessionState>>,
    storage: Option<Arc<dyn DurableStorage>>,
    // Held across a whole persist or logout so their key writes never interleave
    write_lock: Arc<Mutex<()>>,
}

impl Session {
    /// Create an empty session mirrored to the given storage
    pub fn new(storage: Arc<dyn DurableStorage>) -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState::default())),
            storage: Some(storage),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Create an empty session with no durable storage
    pub fn in_memory() -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState::default())),
            storage: None,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Create an empty session, with storage if any is available
    pub fn with_optional_storage(storage: Option<Arc<dyn DurableStorage>>) -> Self {
        match storage {
            Some(storage) => Self::new(storage),
            None => Self::in_memory(),
        }
    }

    /// Whether a durable storage is attached
    pub fn has_storage(&self) -> bool {
        self.storage.is_some()
    }

    /// Set the username in memory
    pub fn set_username<S: Into<String>>(&self, username: S) {
        self.state.write().username = username.into();
    }

    /// Set the password in memory
    pub fn set_password<S: Into<String>>(&self, password: S) {
        self.state.write().password = Some(SecretString::from(password.into()));
    }

    /// Set the token in memory
    pub fn set_token<S: Into<String>>(&self, token: S) {
        self.state.write().token = token.into();
    }

    /// The in-memory username
    ///
    /// Unlike [`Session::password`] this never falls back to durable storage;
    /// use [`Session::logged_username`] for the stored one.
    pub fn username(&self) -> String {
        self.state.read().username.clone()
    }

    /// The in-memory token
    pub fn token(&self) -> String {
        self.state.read().token.clone()
    }

    /// The in-memory password if non-empty, otherwise the stored one
    ///
    /// Returns an empty string when neither exists.
    pub async fn password(&self) -> String {
        let in_memory = self
            .state
            .read()
            .password
            .as_ref()
            .map(|p| p.expose_secret().to_string())
            .filter(|p| !p.is_empty());

        match in_memory {
            Some(password) => password,
            None => self.stored(PASSWORD_KEY).await.unwrap_or_default(),
        }
    }

    /// The username last persisted to durable storage, ignoring memory
    pub async fn logged_username(&self) -> Option<String> {
        self.stored(USERNAME_KEY).await
    }

    /// The token last persisted to durable storage, ignoring memory
    pub async fn stored_token(&self) -> Option<String> {
        self.stored(TOKEN_KEY).await
    }

    /// The raw user object cached at login
    pub fn cached_user(&self) -> Option<Value> {
        self.state.read().user.clone()
    }

    /// The cached user object decoded into [`User`]
    pub fn user(&self) -> Option<User> {
        self.cached_user_as()
    }

    /// The cached user object decoded into any shape
    pub fn cached_user_as<T: for<'de> Deserialize<'de>>(&self) -> Option<T> {
        let user = self.state.read().user.clone()?;
        serde_json::from_value(user).ok()
    }

    /// Claims of the in-memory token, if it is a readable JWT
    pub fn token_claims(&self) -> Option<TokenClaims> {
        let token = self.token();
        if token.is_empty() {
            return None;
        }
        token::decode_claims(&token).ok()
    }

    /// Whether a non-empty token is held in memory
    pub fn is_authenticated(&self) -> bool {
        !self.state.read().token.is_empty()
    }

    /// Apply a successful login in one step
    pub(crate) fn apply_login(&self, username: String, password: &str, token: String, user: Value) {
        let mut state = self.state.write();
        state.username = username;
        state.password = Some(SecretString::from(password.to_string()));
        state.token = token;
        state.user = Some(user);
    }

    /// Write username, password and token to durable storage
    ///
    /// Each key is written independently. Failures are logged, never returned.
    /// Overlapping calls run one at a time and each writes the in-memory
    /// state as it stands once its turn comes, so the stored keys always
    /// come from a single login.
    pub async fn persist(&self) {
        let Some(storage) = &self.storage else {
            tracing::warn!("No durable storage available, session kept in memory only");
            return;
        };

        let _guard = self.write_lock.lock().await;
        let username = self.username();
        let password = self.password().await;
        let token = self.token();

        for (key, value) in [
            (USERNAME_KEY, username.as_str()),
            (PASSWORD_KEY, password.as_str()),
            (TOKEN_KEY, token.as_str()),
        ] {
            if let Err(e) = storage.set(key, value).await {
                tracing::error!("Failed to persist session key {}: {}", key, e);
            }
        }
    }

    /// Clear the in-memory state, leaving durable storage untouched
    pub fn reset(&self) {
        *self.state.write() = SessionState::default();
    }

    /// Clear the in-memory state and remove the stored credentials
    pub async fn logout(&self) {
        self.reset();

        let Some(storage) = &self.storage else {
            return;
        };
        let _guard = self.write_lock.lock().await;
        for key in SESSION_KEYS {
            if let Err(e) = storage.remove(key).await {
                tracing::error!("Failed to remove session key {}: {}", key, e);
            }
        }
    }

    async fn stored(&self, key: &str) -> Option<String> {
        let storage = self.storage.as_ref()?;
        match storage.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to read session key {}: {}", key, e);
                None
            }
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("Session")
            .field("username", &state.username)
            .field("password", &state.password.as_ref().map(|_| "[REDACTED]"))
            .field("token", &(!state.token.is_empty()).then_some("[REDACTED]"))
            .field("has_storage", &self.storage.is_some())
            .finish()
    }
}
