use crate::api::envelope;
use crate::auth::auth::AuthUser;
use crate::auth::password::hash_password;
use crate::error::ApiError;
use crate::model::leave::{BalanceKey, LeaveType};
use crate::model::role::Role;
use crate::model::user::{NewUser, Profile, UserFilter};
use crate::state::AppState;
use crate::store::{DirectoryStore, LeaveStore, Page, Paged, StoreError};
use actix_web::{Responder, web};
use chrono::{Datelike, Local, NaiveDate};
use serde::Deserialize;
use strum::IntoEnumIterator;
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployee {
    #[schema(example = "EMP-010")]
    pub employee_code: String,
    #[schema(example = "Rahul Verma")]
    pub name: String,
    #[schema(example = "rahul@hrm.local", format = "email")]
    pub email: String,
    #[schema(example = "Password@123")]
    pub password: String,
    /// Defaults to `employee`; only admins may create HR or admin accounts
    #[schema(example = "employee")]
    pub role: Option<Role>,
    #[schema(example = 1)]
    pub department_id: Option<u64>,
    #[schema(example = 4)]
    pub designation_id: Option<u64>,
    #[schema(example = "+91 98765 43210")]
    pub phone: Option<String>,
    /// Defaults to today
    #[schema(example = "2026-01-05", format = "date", value_type = Option<String>)]
    pub joined_on: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EmployeeQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub department_id: Option<u64>,
    pub role: Option<Role>,
    /// Matches name, email or employee code
    pub search: Option<String>,
}

fn required_field(name: &str, value: &str) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::validation(format!("{name} is required")));
    }
    Ok(value.to_string())
}

/// Create Employee and allocate the current year's leave balances
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = Profile),
        (status = 400, description = "Missing or invalid fields, or unknown department/designation"),
        (status = 403, description = "HR/Admin only"),
        (status = 409, description = "Email or employee code already in use")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn create_employee(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<CreateEmployee>,
) -> Result<impl Responder, ApiError> {
    auth.require_hr_or_admin()?;
    let payload = payload.into_inner();

    let role = payload.role.unwrap_or(Role::Employee);
    if role != Role::Employee {
        auth.require_admin()?;
    }

    let employee_code = required_field("employeeCode", &payload.employee_code)?;
    let name = required_field("name", &payload.name)?;
    let email = required_field("email", &payload.email)?.to_lowercase();
    if !email.contains('@') {
        return Err(ApiError::validation("email is not a valid address"));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if let Some(id) = payload.department_id {
        state.store.get_department(id).await.map_err(|e| match e {
            StoreError::NotFound(_) => {
                ApiError::validation(format!("Department {id} does not exist"))
            }
            other => other.into(),
        })?;
    }
    if let Some(id) = payload.designation_id {
        state.store.get_designation(id).await.map_err(|e| match e {
            StoreError::NotFound(_) => {
                ApiError::validation(format!("Designation {id} does not exist"))
            }
            other => other.into(),
        })?;
    }

    debug!("Hashing password");
    let password_hash = hash_password(&payload.password)
        .map_err(|e| ApiError::internal(&e, "Failed to hash password"))?;

    let today = Local::now().date_naive();
    let user = state
        .store
        .create_user(NewUser {
            employee_code,
            name,
            email,
            password_hash,
            role,
            department_id: payload.department_id,
            designation_id: payload.designation_id,
            phone: payload.phone.filter(|p| !p.trim().is_empty()),
            joined_on: payload.joined_on.unwrap_or(today),
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => {
                ApiError::Conflict("Email or employee code already in use".into())
            }
            other => other.into(),
        })?;

    for leave_type in LeaveType::iter() {
        let key = BalanceKey {
            user_id: user.id,
            leave_type,
            year: today.year(),
        };
        state
            .store
            .upsert_leave_balance(key, leave_type.default_allocation())
            .await?;
    }

    info!(user_id = user.id, role = %user.role, created_by = auth.user_id, "Employee created");
    Ok(envelope::created(Profile::from(user)))
}

/// Paginated employee search (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = [Profile]),
        (status = 403, description = "HR/Admin only")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn list_employees(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<EmployeeQuery>,
) -> Result<impl Responder, ApiError> {
    auth.require_hr_or_admin()?;
    let query = query.into_inner();

    let page = Page::new(query.page, query.per_page);
    let filter = UserFilter {
        department_id: query.department_id,
        role: query.role,
        search: query
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
    };

    let result = state.store.list_users(&filter, page).await?;
    let total = result.total;
    let items = result.items.into_iter().map(Profile::from).collect();
    Ok(envelope::paged(Paged { items, total }, page))
}

#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    params(("id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee profile", body = Profile),
        (status = 403, description = "Another employee's profile"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn get_employee(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    let id = path.into_inner();
    auth.require_self_or_manager(id)?;

    let user = state.store.get_user(id).await.map_err(|e| match e {
        StoreError::NotFound(_) => ApiError::not_found("Employee not found"),
        other => other.into(),
    })?;
    Ok(envelope::ok(Profile::from(user)))
}

/// Profile of the caller
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Own profile", body = Profile),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn me(auth: AuthUser, state: web::Data<AppState>) -> Result<impl Responder, ApiError> {
    let user = state.store.get_user(auth.user_id).await?;
    Ok(envelope::ok(Profile::from(user)))
}
