pub mod admin;
pub mod ai;
pub mod attendance;
pub mod employee;
pub mod envelope;
pub mod leave;
pub mod payroll;

use crate::error::ApiError;
use actix_web::web;

/// Malformed bodies, paths and query strings answer with the envelope as a
/// validation error instead of actix's plain-text default.
pub fn extractor_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::validation(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::validation(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| ApiError::validation(err.to_string()).into()),
    );
}
