use crate::api::envelope;
use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::payroll::{NewPayroll, month_start};
use crate::model::role::Role;
use crate::state::AppState;
use crate::store::{DirectoryStore, Page, PayrollStore, StoreError};
use actix_web::{Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePayroll {
    #[schema(example = 3)]
    pub user_id: u64,

    /// Any day of the month; stored as the first day
    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub month: NaiveDate,

    #[schema(example = 50000.0)]
    pub base_salary: f64,

    #[schema(example = 5000.0)]
    #[serde(default)]
    pub bonus: f64,

    #[schema(example = 2000.0)]
    #[serde(default)]
    pub deductions: f64,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePayroll {
    #[schema(example = 52000.0)]
    pub base_salary: Option<f64>,

    #[schema(example = 6000.0)]
    pub bonus: Option<f64>,

    #[schema(example = 2500.0)]
    pub deductions: Option<f64>,
}

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PayrollQuery {
    /// Admin only; employees always get their own rows
    pub user_id: Option<u64>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

fn check_amount(field: &str, value: f64) -> Result<(), ApiError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ApiError::validation(format!(
            "{field} must be a non-negative number"
        )))
    }
}

/// Create a payroll row (Admin)
#[utoipa::path(
    post,
    path = "/api/payroll",
    request_body = CreatePayroll,
    responses(
        (status = 201, description = "Payroll created, netSalary computed", body = crate::model::payroll::Payroll),
        (status = 400, description = "Invalid amounts"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Payroll already exists for this month")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn create_payroll(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<CreatePayroll>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin()?;

    check_amount("baseSalary", payload.base_salary)?;
    check_amount("bonus", payload.bonus)?;
    check_amount("deductions", payload.deductions)?;

    state.store.get_user(payload.user_id).await.map_err(|e| match e {
        StoreError::NotFound(_) => ApiError::not_found("Employee not found"),
        other => other.into(),
    })?;

    let payroll = state
        .store
        .create_payroll(NewPayroll {
            user_id: payload.user_id,
            month: month_start(payload.month),
            base_salary: payload.base_salary,
            bonus: payload.bonus,
            deductions: payload.deductions,
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => {
                ApiError::Conflict("Payroll already exists for this employee and month".into())
            }
            other => other.into(),
        })?;

    info!(payroll_id = payroll.id, user_id = payroll.user_id, month = %payroll.month, "Payroll created");
    Ok(envelope::created(payroll))
}

/// Update amounts of a payroll row (Admin); netSalary is recomputed
#[utoipa::path(
    put,
    path = "/api/payroll/{id}",
    params(("id" = u64, Path, description = "Payroll ID")),
    request_body = UpdatePayroll,
    responses(
        (status = 200, description = "Payroll updated", body = crate::model::payroll::Payroll),
        (status = 400, description = "Nothing to update or invalid amounts"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Payroll not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn update_payroll(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<UpdatePayroll>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin()?;

    let UpdatePayroll {
        base_salary,
        bonus,
        deductions,
    } = payload.into_inner();
    if base_salary.is_none() && bonus.is_none() && deductions.is_none() {
        return Err(ApiError::validation("No fields to update"));
    }
    for (field, value) in [
        ("baseSalary", base_salary),
        ("bonus", bonus),
        ("deductions", deductions),
    ] {
        if let Some(v) = value {
            check_amount(field, v)?;
        }
    }

    let id = path.into_inner();
    let payroll = state
        .store
        .update_payroll(id, base_salary, bonus, deductions)
        .await
        .map_err(|e| match e {
            StoreError::NotFound(_) => ApiError::not_found("Payroll not found"),
            other => other.into(),
        })?;

    info!(payroll_id = id, "Payroll updated");
    Ok(envelope::ok(payroll))
}

#[utoipa::path(
    get,
    path = "/api/payroll/{id}",
    params(("id" = u64, Path, description = "Payroll ID")),
    responses(
        (status = 200, description = "Payroll found", body = crate::model::payroll::Payroll),
        (status = 404, description = "Payroll not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn get_payroll(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    let not_found = || ApiError::not_found("Payroll not found");

    let payroll = state
        .store
        .get_payroll(path.into_inner())
        .await
        .map_err(|e| match e {
            StoreError::NotFound(_) => not_found(),
            other => other.into(),
        })?;

    // other people's salaries stay invisible to non-admins
    if payroll.user_id != auth.user_id && auth.role != Role::Admin {
        return Err(not_found());
    }
    Ok(envelope::ok(payroll))
}

/// Paginated payroll rows, newest month first
#[utoipa::path(
    get,
    path = "/api/payroll",
    params(PayrollQuery),
    responses(
        (status = 200, description = "Paginated payroll list", body = [crate::model::payroll::Payroll]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn list_payrolls(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<PayrollQuery>,
) -> Result<impl Responder, ApiError> {
    let page = Page::new(query.page, query.per_page);
    let user_id = match auth.role {
        Role::Admin => query.user_id,
        Role::Hr | Role::Employee => Some(auth.user_id),
    };

    let result = state.store.list_payrolls(user_id, page).await?;
    Ok(envelope::paged(result, page))
}
