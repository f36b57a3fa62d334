//! # console-client
//!
//! Session and REST resource layer for the storefront admin console.
//!
//! The console's views never talk HTTP themselves. They log in through the
//! [`UserService`], browse orders, products and users through a
//! [`ResourceClient`] per collection, and render what comes back.
//!
//! ## Features
//!
//! - **Session with durable mirror**: username, password and token are held in
//!   memory and persisted to a pluggable [`DurableStorage`] (memory, JSON file, Redis)
//! - **Typed outcomes**: every call returns `Result<_, ClientError>`; success and
//!   failure are never folded into one value
//! - **Generic resource client**: one implementation, parameterized by [`ResourceType`]
//! - **Token inspection**: optional HS256 verification of the backend's tokens
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use console_client::{Authenticator, ClientConfig, ConsoleClient, ListQuery, ResourceService};
//! use console_client::model::OrdersPage;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), console_client::ClientError> {
//!     let config = ClientConfig::new("http://localhost:8000/api/v1/")?
//!         .with_storage("file:/var/lib/console/session.json".parse()?);
//!     let client = ConsoleClient::connect(config).await?;
//!
//!     client.users().login("alice", "secret").await?;
//!
//!     let page: OrdersPage = client
//!         .orders()
//!         .list_as(&ListQuery::for_user("59f05169668b9bcc7d442355").page(0, 10))
//!         .await?;
//!     println!("{} orders", page.orders.count);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod resource;
pub mod session;
pub mod storage;
pub mod token;
pub mod transport;

pub use auth::{Authenticator, UserService};
pub use client::ConsoleClient;
pub use config::{ClientConfig, StorageBackend};
pub use error::{ClientError, StorageError};
pub use resource::{ListQuery, ResourceClient, ResourceService, ResourceType, Scope};
pub use session::Session;
pub use storage::{DurableStorage, FileStorage, MemoryStorage};
pub use transport::{ApiRequest, ApiResponse, FilePart, ReqwestTransport, Transport};

#[cfg(feature = "redis-store")]
pub use storage::RedisStorage;
