//! Durable storage backends for the session

mod file;
mod memory;
mod traits;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use traits::DurableStorage;

#[cfg(feature = "redis-store")]
mod redis_store;

#[cfg(feature = "redis-store")]
pub use redis_store::RedisStorage;

/// Storage key for the logged-in username
pub const USERNAME_KEY: &str = "username";
/// Storage key for the password
pub const PASSWORD_KEY: &str = "password";
/// Storage key for the access token
pub const TOKEN_KEY: &str = "token";

/// Every key the session mirrors to durable storage
pub const SESSION_KEYS: [&str; 3] = [USERNAME_KEY, PASSWORD_KEY, TOKEN_KEY];
