//! Application layer
//!
//! Contains use cases and service orchestration.
//! Services coordinate between domain entities, ports, and external systems.

pub mod csv_export;
pub mod monitoring_service;
pub mod pid_task;
pub mod scheduler;

pub use csv_export::CsvExporter;
pub use monitoring_service::{DynMonitoringService, MonitoringService};
pub use scheduler::spawn_monitoring_loop;
