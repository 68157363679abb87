//! HTTP handlers
//!
//! Axum request handlers for the API endpoints.

pub mod admin;
pub mod default;
pub mod semd;

pub use default::{favicon, health, index};
pub use semd::{get_mse_info, semd_export, semd_info_batch, semd_info_list};
