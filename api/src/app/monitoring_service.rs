//! SEMD monitoring service
//!
//! Collects SEMD candidates from the medical database, asks Vista3 for the
//! registration status of each one and appends the answers to the status log.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDateTime;
use futures::future::join_all;
use serde_json::Value;
use tokio::sync::Semaphore;

use crate::domain::entities::{MonitoringReport, MseInfoRequest, SemdInfo, SemdStatusRecord};
use crate::domain::ports::{CacheDriver, SemdRepository, VistaClient, DEFAULT_TTL};
use crate::error::AppError;

/// The service as held by the application state
pub type DynMonitoringService =
    MonitoringService<dyn SemdRepository, dyn VistaClient, dyn CacheDriver>;

/// Service for the SEMD monitoring job
pub struct MonitoringService<SR, VC, CD>
where
    SR: SemdRepository + ?Sized,
    VC: VistaClient + ?Sized,
    CD: CacheDriver + ?Sized,
{
    semds: Arc<SR>,
    vista: Arc<VC>,
    cache: Arc<CD>,
    /// Bounds Vista3 calls and inserts in flight
    semaphore: Semaphore,
}

impl<SR, VC, CD> MonitoringService<SR, VC, CD>
where
    SR: SemdRepository + ?Sized,
    VC: VistaClient + ?Sized,
    CD: CacheDriver + ?Sized,
{
    pub fn new(semds: Arc<SR>, vista: Arc<VC>, cache: Arc<CD>, concurrency: usize) -> Self {
        Self {
            semds,
            vista,
            cache,
            semaphore: Semaphore::new(concurrency.max(1)),
        }
    }

    /// MSE info, served from the cache when present
    pub async fn get_mse_info(&self, request: MseInfoRequest) -> Result<Value, AppError> {
        let key = request.cache_key();

        if let Some(cached) = self.cache.get(&key).await {
            match serde_json::from_str(&cached) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Discarding malformed cached MSE info")
                }
            }
        }

        let value = self.vista.get_mse_info(&request).await?;
        self.cache.set(&key, &value.to_string(), DEFAULT_TTL).await;

        Ok(value)
    }

    /// SEMDs from both Actions and Events in the window, Actions first
    pub async fn collect_semd_all_info(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<SemdInfo>, AppError> {
        let (mut actions, events) = tokio::try_join!(
            self.semds.collect_action_semds(start, end),
            self.semds.collect_event_semds(start, end),
        )?;

        actions.extend(events);
        tracing::info!(total = actions.len(), %start, %end, "Collected SEMD candidates");

        Ok(actions)
    }

    /// Check and store every SEMD; failures are counted, not fatal
    pub async fn insert_semd_all_info(&self, semds: Vec<SemdInfo>) -> MonitoringReport {
        let collected = semds.len();
        let outcomes = join_all(semds.into_iter().map(|semd| self.process_semd(semd))).await;

        let mut report = MonitoringReport {
            collected,
            ..Default::default()
        };
        let mut statuses = HashMap::new();

        for outcome in outcomes {
            match outcome {
                Some((key, status)) => {
                    report.inserted += 1;
                    statuses.insert(key, status);
                }
                None => report.failed += 1,
            }
        }

        self.cache.set_many(&statuses, DEFAULT_TTL).await;
        tracing::info!(
            collected = report.collected,
            inserted = report.inserted,
            failed = report.failed,
            "SEMD statuses stored"
        );

        report
    }

    /// Returns the cache entry for the stored status on success
    async fn process_semd(&self, semd: SemdInfo) -> Option<(String, String)> {
        let _permit = self.semaphore.acquire().await.ok()?;

        let checked = match self.vista.get_semd_info(&semd).await {
            Ok(info) => info,
            Err(e) => {
                tracing::error!(
                    event_id = semd.event_id,
                    template_id = semd.template_id,
                    error = %e,
                    "Vista3 status request failed"
                );
                return None;
            }
        };

        let key = checked.status_key();
        let record = SemdStatusRecord::from(checked);

        if let Err(e) = self.semds.insert_status(&record).await {
            tracing::error!(
                event_id = record.event_id,
                template_id = record.template_id,
                error = %e,
                "Failed to store SEMD status"
            );
            return None;
        }

        Some((key, serde_json::to_string(&record).unwrap_or_default()))
    }

    /// Collect the window, then check and store everything found
    pub async fn run(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<MonitoringReport, AppError> {
        let semds = self.collect_semd_all_info(start, end).await?;
        Ok(self.insert_semd_all_info(semds).await)
    }

    /// Vista3 status of every SEMD, without storing anything
    pub async fn check_semd_batch(
        &self,
        semds: &[SemdInfo],
    ) -> Result<Vec<Option<SemdInfo>>, AppError> {
        Ok(self.vista.get_semd_info_batch(semds).await?)
    }
}
