//! Domain entities
//!
//! Pure domain models representing core business concepts.
//! These are separate from the SeaORM entities in the `entity` module.

pub mod query;
pub mod semd;

pub use query::{Row, SqlQuery};
pub use semd::{MonitoringReport, MseInfoRequest, SemdInfo, SemdStatusRecord};
