//! MySQL adapters
//!
//! Implementations of the database and repository ports using SeaORM and MySQL.

pub mod connection;
pub mod semd_repo;

pub use connection::MySqlDatabase;
pub use semd_repo::MySqlSemdRepository;
