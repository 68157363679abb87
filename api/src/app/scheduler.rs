//! Periodic SEMD monitoring

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime, TimeDelta};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::app::monitoring_service::DynMonitoringService;
use crate::app::pid_task::run_exclusive;

const TASK_NAME: &str = "semd_monitoring";

/// The window checked by each tick: the hour ending at `now`
pub fn last_hour(now: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    (now - TimeDelta::hours(1), now)
}

/// Start the polling loop; `None` when polling is disabled
pub fn spawn_monitoring_loop(
    service: Arc<DynMonitoringService>,
    interval_secs: u64,
    pid_dir: PathBuf,
) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        return None;
    }

    tracing::info!(interval_secs, pid_dir = %pid_dir.display(), "SEMD monitoring loop started");

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let (start, end) = last_hour(Local::now().naive_local());

            if let Some(report) =
                run_exclusive(&pid_dir, None, TASK_NAME, service.run(start, end)).await
            {
                tracing::info!(?report, "SEMD monitoring tick finished");
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::test_utils::test_monitoring_service;

    #[test]
    fn window_is_the_previous_hour() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(0, 30, 0)
            .unwrap();
        let (start, end) = last_hour(now);

        assert_eq!(end, now);
        assert_eq!(start.to_string(), "2024-03-14 23:30:00");
    }

    #[tokio::test]
    async fn zero_interval_disables_the_loop() {
        let handle = spawn_monitoring_loop(test_monitoring_service(), 0, std::env::temp_dir());
        assert!(handle.is_none());
    }

    #[tokio::test]
    async fn loop_runs_until_aborted() {
        let dir = std::env::temp_dir().join(format!("vista-api-loop-{}", std::process::id()));
        let handle = spawn_monitoring_loop(test_monitoring_service(), 3600, dir.clone())
            .expect("loop should start");

        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
