//! Domain layer
//!
//! Contains the SEMD monitoring model with no knowledge of MySQL, Redis or HTTP.
//! - `entities`: Domain models and raw query descriptions
//! - `ports`: Trait definitions for the database, cache and Vista3 client

pub mod entities;
pub mod ports;
