//! Vista3 client port trait
//!
//! Defines the interface for interacting with the Vista3 service, which
//! knows the registration status of SEMDs and serves MSE data.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::entities::{MseInfoRequest, SemdInfo};
use crate::error::VistaError;

#[async_trait]
pub trait VistaClient: Send + Sync {
    /// Registration status of one SEMD
    async fn get_semd_info(&self, semd: &SemdInfo) -> Result<SemdInfo, VistaError>;

    /// Registration status of many SEMDs, in input order
    ///
    /// An item whose request failed after all retries is `None`.
    async fn get_semd_info_batch(
        &self,
        semds: &[SemdInfo],
    ) -> Result<Vec<Option<SemdInfo>>, VistaError>;

    /// Disability examination (MSE) info, passed through as-is
    async fn get_mse_info(&self, request: &MseInfoRequest) -> Result<Value, VistaError>;
}
