use crate::api::envelope;
use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::ledger::LeaveApplication;
use crate::model::leave::{LeaveFilter, LeaveStatus, LeaveType};
use crate::state::AppState;
use crate::store::Page;
use actix_web::{Responder, web};
use chrono::{Datelike, Local, NaiveDate};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplyLeave {
    #[schema(example = "casual")]
    pub leave_type: LeaveType,
    #[schema(example = "2026-03-02", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-03-04", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family function")]
    pub reason: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RejectLeave {
    #[schema(example = "Release week, please pick other dates")]
    pub reason: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LeaveQuery {
    /// Filter by applicant (HR/Admin only; employees always see their own)
    pub employee_id: Option<u64>,
    /// Filter by status
    pub status: Option<LeaveStatus>,
    /// Filter by leave type
    pub leave_type: Option<LeaveType>,
    /// Requests starting in this year
    pub year: Option<i32>,
    /// 1-based page number
    pub page: Option<u32>,
    /// Items per page, at most 100
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BalanceQuery {
    /// Whose balances; defaults to the caller
    pub user_id: Option<u64>,
    /// Defaults to the current year
    pub year: Option<i32>,
}

/// Apply for leave; the days are held against the balance until decided
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body = ApplyLeave,
    responses(
        (status = 201, description = "Leave request submitted", body = crate::model::leave::LeaveRequest),
        (status = 400, description = "Invalid dates, overlap or insufficient balance"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn apply_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<ApplyLeave>,
) -> Result<impl Responder, ApiError> {
    let ApplyLeave {
        leave_type,
        start_date,
        end_date,
        reason,
    } = payload.into_inner();

    let request = state
        .ledger
        .apply_leave(
            auth.user_id,
            LeaveApplication {
                leave_type,
                start_date,
                end_date,
                reason,
            },
            Local::now().naive_local(),
        )
        .await?;
    Ok(envelope::created(request))
}

/// List leave requests, newest first
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveQuery),
    responses(
        (status = 200, description = "Paginated leave requests", body = [crate::model::leave::LeaveRequest]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn list_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<LeaveQuery>,
) -> Result<impl Responder, ApiError> {
    let query = query.into_inner();
    let page = Page::new(query.page, query.per_page);
    let filter = LeaveFilter {
        employee_id: query.employee_id,
        status: query.status,
        leave_type: query.leave_type,
        year: query.year,
    };

    let result = state.ledger.list_leave(auth.actor(), filter, page).await?;
    Ok(envelope::paged(result, page))
}

/// Leave balances of a user for a year, with the remaining days
#[utoipa::path(
    get,
    path = "/api/leave/balances",
    params(BalanceQuery),
    responses(
        (status = 200, description = "One entry per leave type", body = [crate::model::leave::BalanceView]),
        (status = 403, description = "Another user's balances requested by an employee")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_balances(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<BalanceQuery>,
) -> Result<impl Responder, ApiError> {
    let user_id = query.user_id.unwrap_or(auth.user_id);
    let year = query.year.unwrap_or_else(|| Local::now().year());
    let balances = state.ledger.balances(auth.actor(), user_id, year).await?;
    Ok(envelope::ok(balances))
}

#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(("leave_id" = u64, Path, description = "ID of the leave request")),
    responses(
        (status = 200, description = "Leave request found", body = crate::model::leave::LeaveRequest),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    let request = state
        .ledger
        .get_leave(auth.actor(), path.into_inner())
        .await?;
    Ok(envelope::ok(request))
}

/// Approve a pending request (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(("leave_id" = u64, Path, description = "ID of the leave request to approve")),
    responses(
        (status = 200, description = "Leave approved", body = crate::model::leave::LeaveRequest),
        (status = 403, description = "Not HR/Admin, or own request"),
        (status = 404, description = "Leave request not found or already processed")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    let request = state
        .ledger
        .approve_leave(auth.actor(), path.into_inner(), Local::now().naive_local())
        .await?;
    Ok(envelope::ok(request))
}

/// Reject a pending request with a reason (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(("leave_id" = u64, Path, description = "ID of the leave request to reject")),
    request_body = RejectLeave,
    responses(
        (status = 200, description = "Leave rejected", body = crate::model::leave::LeaveRequest),
        (status = 400, description = "Missing reason"),
        (status = 403, description = "Not HR/Admin, or own request"),
        (status = 404, description = "Leave request not found or already processed")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<RejectLeave>,
) -> Result<impl Responder, ApiError> {
    let request = state
        .ledger
        .reject_leave(
            auth.actor(),
            path.into_inner(),
            &payload.reason,
            Local::now().naive_local(),
        )
        .await?;
    Ok(envelope::ok(request))
}

/// Withdraw a pending request (applicant or HR/Admin)
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/cancel",
    params(("leave_id" = u64, Path, description = "ID of the leave request to cancel")),
    responses(
        (status = 200, description = "Leave cancelled", body = crate::model::leave::LeaveRequest),
        (status = 404, description = "Not found, already processed, or someone else's request")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    let request = state
        .ledger
        .cancel_leave(auth.actor(), path.into_inner(), Local::now().naive_local())
        .await?;
    Ok(envelope::ok(request))
}
