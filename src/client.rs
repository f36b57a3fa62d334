//! Console client facade

use std::sync::Arc;

use crate::auth::UserService;
use crate::config::{ClientConfig, StorageBackend};
use crate::error::ClientError;
use crate::resource::{ResourceClient, ResourceType};
use crate::session::Session;
use crate::storage::{DurableStorage, FileStorage, MemoryStorage};
use crate::transport::{ReqwestTransport, Transport};

/// Entry point: one configuration, one transport, one session
///
/// Every service handed out shares the same session, so a login through
/// [`ConsoleClient::users`] authorizes later calls on the other resources.
pub struct ConsoleClient<T: Transport = ReqwestTransport> {
    config: Arc<ClientConfig>,
    transport: Arc<T>,
    session: Session,
}

impl ConsoleClient<ReqwestTransport> {
    /// Open the configured storage and build an HTTP client
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        let storage = open_storage(&config.storage).await?;
        let transport = ReqwestTransport::new(&config)?;
        tracing::debug!(base_url = %config.base_url(), storage = ?config.storage, "Console client ready");
        Ok(Self::with_transport(
            config,
            transport,
            Session::with_optional_storage(storage),
        ))
    }

    /// [`ConsoleClient::connect`] with configuration from the environment
    pub async fn from_env() -> Result<Self, ClientError> {
        Self::connect(ClientConfig::from_env()?).await
    }
}

impl<T: Transport> ConsoleClient<T> {
    /// Assemble a client from parts
    pub fn with_transport(config: ClientConfig, transport: T, session: Session) -> Self {
        Self {
            config: Arc::new(config),
            transport: Arc::new(transport),
            session,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Login flow and the `users` collection
    pub fn users(&self) -> UserService<T> {
        UserService::new(
            Arc::clone(&self.config),
            Arc::clone(&self.transport),
            self.session.clone(),
        )
    }

    pub fn orders(&self) -> ResourceClient<T> {
        self.resource(ResourceType::Orders)
    }

    pub fn products(&self) -> ResourceClient<T> {
        self.resource(ResourceType::Products)
    }

    /// Client for any resource type
    pub fn resource(&self, resource: ResourceType) -> ResourceClient<T> {
        ResourceClient::new(
            resource,
            Arc::clone(&self.config),
            Arc::clone(&self.transport),
            self.session.clone(),
        )
    }
}

/// Open the durable storage named by the configuration
pub async fn open_storage(
    backend: &StorageBackend,
) -> Result<Option<Arc<dyn DurableStorage>>, ClientError> {
    let storage: Arc<dyn DurableStorage> = match backend {
        StorageBackend::None => return Ok(None),
        StorageBackend::Memory => Arc::new(MemoryStorage::new()),
        StorageBackend::File(path) => Arc::new(FileStorage::new(path.clone())),
        #[cfg(feature = "redis-store")]
        StorageBackend::Redis(url) => Arc::new(crate::storage::RedisStorage::from_url(url).await?),
        #[cfg(not(feature = "redis-store"))]
        StorageBackend::Redis(_) => {
            return Err(ClientError::InvalidConfig(
                "redis storage requires the redis-store feature".to_string(),
            ))
        }
    };
    Ok(Some(storage))
}
