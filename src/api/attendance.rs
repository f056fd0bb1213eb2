use crate::api::envelope;
use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{AttendanceStore, StoreError};
use actix_web::{Responder, web};
use chrono::{Datelike, Local, NaiveDate};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AttendanceQuery {
    /// Whose records; defaults to the caller (HR/Admin only for others)
    pub user_id: Option<u64>,
    /// First day, defaults to the first of the current month
    #[param(value_type = Option<String>, format = Date)]
    pub from: Option<NaiveDate>,
    /// Last day, defaults to today
    #[param(value_type = Option<String>, format = Date)]
    pub to: Option<NaiveDate>,
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    responses(
        (status = 201, description = "Checked in; status is late after office start", body = crate::model::attendance::AttendanceRecord),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Already checked in today")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let now = Local::now().naive_local();
    let late = now.time() > state.config.office_start;

    let record = state
        .store
        .check_in(auth.user_id, now, late)
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => ApiError::Conflict("Already checked in today".into()),
            other => other.into(),
        })?;

    info!(user_id = auth.user_id, status = %record.status, "Checked in");
    Ok(envelope::created(record))
}

/// Check-out endpoint
#[utoipa::path(
    put,
    path = "/api/attendance/check-out",
    responses(
        (status = 200, description = "Checked out; workedMinutes recorded", body = crate::model::attendance::AttendanceRecord),
        (status = 400, description = "No active check-in found for today"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let record = state
        .store
        .check_out(auth.user_id, Local::now().naive_local())
        .await
        .map_err(|e| match e {
            StoreError::NotFound(_) => ApiError::validation("No active check-in found for today"),
            other => other.into(),
        })?;

    info!(user_id = auth.user_id, worked_minutes = ?record.worked_minutes, "Checked out");
    Ok(envelope::ok(record))
}

/// Attendance records in a date range
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Records ordered by date", body = [crate::model::attendance::AttendanceRecord]),
        (status = 400, description = "from is after to"),
        (status = 403, description = "Another user's records requested by an employee")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<AttendanceQuery>,
) -> Result<impl Responder, ApiError> {
    let user_id = query.user_id.unwrap_or(auth.user_id);
    auth.require_self_or_manager(user_id)?;

    let today = Local::now().date_naive();
    let to = query.to.unwrap_or(today);
    let from = query
        .from
        .or_else(|| NaiveDate::from_ymd_opt(to.year(), to.month(), 1))
        .unwrap_or(to);
    if from > to {
        return Err(ApiError::validation("from cannot be after to"));
    }

    let records = state.store.list_attendance(user_id, from, to).await?;
    Ok(envelope::ok(records))
}
