//! Vista3 handlers
//!
//! SEMD monitoring and MSE lookups under `/vista3`.

use axum::{
    extract::{Query, State},
    response::Response,
    Json,
};
use chrono::{Local, NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::app::CsvExporter;
use crate::domain::entities::{MonitoringReport, MseInfoRequest, SemdInfo};
use crate::error::AppError;
use crate::AppState;

/// Distance of the default window end from now
const DEFAULT_END_LAG_HOURS: i64 = 16;
const DEFAULT_WINDOW_HOURS: i64 = 1;

/// Accepts `YYYY-MM-DDTHH:MM:SS`, the same with a space, or a bare date
fn deserialize_optional_datetime<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    parse_datetime(raw)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid datetime '{}'", raw)))
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub start_date: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub end_date: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize)]
pub struct SemdListQuery {
    /// Accepted for compatibility; the window comes from the dates
    #[serde(default = "default_period")]
    pub period: i64,
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub start_date: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub end_date: Option<NaiveDateTime>,
}

impl SemdListQuery {
    fn window(&self) -> WindowQuery {
        WindowQuery {
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

fn default_period() -> i64 {
    2
}

#[derive(Debug, Deserialize)]
pub struct MseQuery {
    pub mse_id: i64,
}

/// Fill in a missing window end (now minus 16 hours) and start (end minus 1 hour)
pub fn resolve_window(
    now: NaiveDateTime,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
) -> (NaiveDateTime, NaiveDateTime) {
    let end = end.unwrap_or(now - TimeDelta::hours(DEFAULT_END_LAG_HOURS));
    let start = start.unwrap_or(end - TimeDelta::hours(DEFAULT_WINDOW_HOURS));
    (start, end)
}

fn window_from(query: &WindowQuery) -> Result<(NaiveDateTime, NaiveDateTime), AppError> {
    let (start, end) = resolve_window(
        Local::now().naive_local(),
        query.start_date,
        query.end_date,
    );
    if start > end {
        return Err(AppError::BadRequest(
            "start_date must not be after end_date".to_string(),
        ));
    }
    Ok((start, end))
}

/// GET /vista3/get_mse_info
pub async fn get_mse_info(
    State(state): State<AppState>,
    Query(query): Query<MseQuery>,
) -> Result<Json<Value>, AppError> {
    let value = state
        .monitoring_service
        .get_mse_info(MseInfoRequest { id: query.mse_id })
        .await?;
    Ok(Json(value))
}

/// GET /vista3/semd_info_list
///
/// Runs the monitoring job for the window and reports what was stored.
pub async fn semd_info_list(
    State(state): State<AppState>,
    Query(query): Query<SemdListQuery>,
) -> Result<Json<MonitoringReport>, AppError> {
    let (start, end) = window_from(&query.window())?;
    tracing::debug!(period = query.period, %start, %end, "SEMD monitoring requested");
    let report = state.monitoring_service.run(start, end).await?;
    Ok(Json(report))
}

/// GET /vista3/semd_export
///
/// The SEMD candidates of the window as a CSV attachment.
pub async fn semd_export(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Result<Response, AppError> {
    let (start, end) = window_from(&query)?;
    let semds = state
        .monitoring_service
        .collect_semd_all_info(start, end)
        .await?;

    let filename = format!(
        "semd_{}_{}",
        start.format("%Y%m%d%H%M"),
        end.format("%Y%m%d%H%M")
    );
    Ok(CsvExporter::default().into_response(&semds, &filename))
}

/// POST /vista3/semd_info_batch
///
/// Vista3 status of each posted SEMD, in order; `null` where the lookup failed.
pub async fn semd_info_batch(
    State(state): State<AppState>,
    Json(semds): Json<Vec<SemdInfo>>,
) -> Result<Json<Vec<Option<SemdInfo>>>, AppError> {
    Ok(Json(
        state.monitoring_service.check_semd_batch(&semds).await?,
    ))
}
