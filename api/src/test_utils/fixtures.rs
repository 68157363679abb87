//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.
//! Each fixture function creates a valid entity that can be customized.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use super::mocks::{InMemoryCache, InMemoryDatabase, InMemorySemdRepository, MockVistaClient};
use crate::app::{DynMonitoringService, MonitoringService};
use crate::config::Config;
use crate::domain::entities::SemdInfo;
use crate::AppState;

/// Create a test SEMD for the given event
pub fn test_semd(event_id: i64, action_id: Option<i64>) -> SemdInfo {
    SemdInfo {
        event_id,
        client_id: 100,
        doc_oid: 37,
        template_id: 5,
        semd_name: "Protocol".to_string(),
        semd_code: "PROT".to_string(),
        date_start: "2024-03-15 09:30:00".to_string(),
        person_id: None,
        action_id,
        error_description: None,
    }
}

/// A one-hour collection window
pub fn window() -> (NaiveDateTime, NaiveDateTime) {
    let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    (
        day.and_hms_opt(8, 0, 0).unwrap(),
        day.and_hms_opt(9, 0, 0).unwrap(),
    )
}

/// Development config that trusts every host
pub fn test_config() -> Config {
    Config {
        development: true,
        trusted_hosts: vec![".*".to_string()],
        banned_routes: vec!["/admin".to_string()],
        timeout: 0,
        ..Config::default()
    }
}

pub fn test_monitoring_service() -> Arc<DynMonitoringService> {
    Arc::new(MonitoringService::new(
        Arc::new(InMemorySemdRepository::new()),
        Arc::new(MockVistaClient::new()),
        Arc::new(InMemoryCache::new()),
        2,
    ))
}

/// State backed by empty in-memory adapters
pub fn test_state() -> AppState {
    test_state_with(
        test_config(),
        InMemoryDatabase::new(),
        InMemorySemdRepository::new(),
        MockVistaClient::new(),
    )
}

pub fn test_state_with(
    config: Config,
    database: InMemoryDatabase,
    semds: InMemorySemdRepository,
    vista: MockVistaClient,
) -> AppState {
    AppState::new(
        config,
        Arc::new(database),
        Arc::new(semds),
        Arc::new(vista),
        Arc::new(InMemoryCache::new()),
    )
    .expect("test config has valid trusted host patterns")
}
