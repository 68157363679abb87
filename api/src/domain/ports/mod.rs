//! Domain ports (traits)
//!
//! Port traits define interfaces that the domain layer requires.
//! Adapters provide concrete implementations of these traits.

pub mod cache;
pub mod database;
pub mod repositories;
pub mod vista;

pub use cache::{CacheDriver, DEFAULT_TTL};
pub use database::Database;
pub use repositories::SemdRepository;
pub use vista::VistaClient;
