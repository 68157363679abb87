//! Repository port traits
//!
//! These traits define the interface for data persistence.
//! Implementations are provided by adapters (e.g., MySQL).

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::domain::entities::{SemdInfo, SemdStatusRecord};
use crate::error::DomainError;

/// Repository for SEMD candidates and their status log
#[async_trait]
pub trait SemdRepository: Send + Sync {
    /// SEMDs produced by finished Actions started within the window
    async fn collect_action_semds(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<SemdInfo>, DomainError>;

    /// SEMDs produced by Events executed within the window
    async fn collect_event_semds(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<SemdInfo>, DomainError>;

    /// Append a row to the status log
    async fn insert_status(&self, record: &SemdStatusRecord) -> Result<(), DomainError>;
}
