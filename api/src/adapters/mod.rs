//! Adapters layer
//!
//! Implementations of port traits for external systems.

pub mod mysql;
pub mod redis;
pub mod vista;

pub use mysql::{MySqlDatabase, MySqlSemdRepository};
pub use self::redis::RedisCache;
pub use vista::VistaClientImpl;
