//! User service: login, logout and account endpoints

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::model::{Created, Credentials, LoginResponse, RegisterRequest, User};
use crate::resource::{ResourceClient, ResourceType};
use crate::session::Session;
use crate::token;
use crate::transport::{ApiRequest, Transport};

/// Authentication capability
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Log in and update the session; the session is untouched on error
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ClientError>;

    /// Forget the session in memory and in durable storage
    async fn logout(&self);
}

/// Client for the `users` resource plus the login flow
pub struct UserService<T: Transport> {
    config: Arc<ClientConfig>,
    transport: Arc<T>,
    session: Session,
    users: ResourceClient<T>,
}

impl<T: Transport> UserService<T> {
    pub fn new(config: Arc<ClientConfig>, transport: Arc<T>, session: Session) -> Self {
        let users = ResourceClient::new(
            ResourceType::Users,
            Arc::clone(&config),
            Arc::clone(&transport),
            session.clone(),
        );
        Self {
            config,
            transport,
            session,
            users,
        }
    }

    /// The session this service updates
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Generic access to the `users` collection
    pub fn resource(&self) -> &ResourceClient<T> {
        &self.users
    }

    /// Register a new account
    pub async fn register(&self, request: &RegisterRequest) -> Result<Created, ClientError> {
        self.users.create_as(request).await
    }

    /// Fetch a user by id
    pub async fn get_user(&self, id: &str) -> Result<User, ClientError> {
        self.users.get_as(id).await
    }

    /// Check the login body and pull out what the session needs
    fn accept_login(&self, body: &Value) -> Result<(LoginResponse, Value, String, String), ClientError> {
        let response: LoginResponse = serde_json::from_value(body.clone())?;

        if let Some(err) = response.err.as_deref().filter(|e| !e.is_empty()) {
            return Err(ClientError::Decode(format!("login rejected: {}", err)));
        }
        let user = response
            .user
            .clone()
            .ok_or_else(|| ClientError::Decode("login response has no user".to_string()))?;
        let token = response
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ClientError::Decode("login response has no token".to_string()))?;
        let username = user
            .get("username")
            .and_then(Value::as_str)
            .ok_or_else(|| ClientError::Decode("login user has no username".to_string()))?
            .to_string();

        if let Some(secret) = &self.config.token_secret {
            let claims = token::verify_hs256(&token, secret)?;
            if claims.is_expired() {
                return Err(ClientError::InvalidToken("token already expired".to_string()));
            }
        }

        Ok((response, user, token, username))
    }
}

impl<T: Transport> Clone for UserService<T> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            transport: Arc::clone(&self.transport),
            session: self.session.clone(),
            users: self.users.clone(),
        }
    }
}

#[async_trait]
impl<T: Transport> Authenticator for UserService<T> {
    #[tracing::instrument(skip(self, password))]
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let url = self.config.endpoint("users/login")?;
        let body = serde_json::to_value(Credentials { username, password })?;

        let response = self
            .transport
            .send(ApiRequest::post(url, body))
            .await
            .map_err(|e| {
                tracing::warn!("Login request failed: {}", e);
                e
            })?;

        if !response.is_success() {
            tracing::warn!(status = response.status, "Login rejected by backend");
            return Err(ClientError::UnexpectedStatus {
                status: response.status,
                body: response.body,
            });
        }

        let (login, user, token, confirmed_username) = self.accept_login(&response.body)?;

        self.session
            .apply_login(confirmed_username, password, token, user);
        self.session.persist().await;

        tracing::info!(username = %self.session.username(), "Logged in");
        Ok(login)
    }

    async fn logout(&self) {
        let username = self.session.username();
        self.session.logout().await;
        tracing::info!(username = %username, "Logged out");
    }
}
