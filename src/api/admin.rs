//! Reference data: roles, departments, designations, holidays and
//! announcements. Reads are open to every signed-in user.
use crate::api::envelope;
use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::announcement::NewAnnouncement;
use crate::model::holiday::NewHoliday;
use crate::model::role::Role;
use crate::state::AppState;
use crate::store::{CalendarStore, DirectoryStore, Page, StoreError};
use actix_web::{Responder, web};
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

#[derive(Serialize, ToSchema)]
pub struct RoleView {
    #[schema(example = "hr")]
    pub value: Role,
    #[schema(example = "HR Manager")]
    pub label: &'static str,
}

#[derive(Deserialize, ToSchema)]
pub struct UpsertDepartment {
    #[schema(example = "Engineering")]
    pub name: String,
    #[schema(example = "Product and platform teams")]
    pub description: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpsertDesignation {
    #[schema(example = "Senior Software Engineer")]
    pub title: String,
    #[schema(example = 3)]
    pub level: i32,
}

#[derive(Deserialize, ToSchema)]
pub struct UpsertAnnouncement {
    #[schema(example = "Office closed on Friday")]
    pub title: String,
    #[schema(example = "The office will be closed for maintenance.")]
    pub body: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct YearQuery {
    /// Defaults to the current year
    pub year: Option<i32>,
}

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

fn non_empty(field: &str, value: &str) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ApiError::validation(format!("{field} is required")))
    } else {
        Ok(value.to_string())
    }
}

#[utoipa::path(
    get,
    path = "/api/roles",
    responses((status = 200, description = "Every role with its display label", body = [RoleView])),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_roles(_auth: AuthUser) -> Result<impl Responder, ApiError> {
    let roles: Vec<RoleView> = Role::iter()
        .map(|role| RoleView {
            value: role,
            label: role.label(),
        })
        .collect();
    Ok(envelope::ok(roles))
}

#[utoipa::path(
    get,
    path = "/api/departments",
    responses((status = 200, description = "Departments by name", body = [crate::model::department::Department])),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_departments(
    _auth: AuthUser,
    state: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    Ok(envelope::ok(state.store.list_departments().await?))
}

/// Create a department, or update the description of an existing one (Admin)
#[utoipa::path(
    post,
    path = "/api/departments",
    request_body = UpsertDepartment,
    responses(
        (status = 200, description = "Department stored", body = crate::model::department::Department),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn upsert_department(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<UpsertDepartment>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin()?;
    let name = non_empty("name", &payload.name)?;
    let description = payload
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());

    let department = state.store.upsert_department(&name, description).await?;
    info!(department_id = department.id, "Department stored");
    Ok(envelope::ok(department))
}

#[utoipa::path(
    get,
    path = "/api/designations",
    responses((status = 200, description = "Designations by level", body = [crate::model::designation::Designation])),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_designations(
    _auth: AuthUser,
    state: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    Ok(envelope::ok(state.store.list_designations().await?))
}

/// Create a designation, or update the level of an existing one (Admin)
#[utoipa::path(
    post,
    path = "/api/designations",
    request_body = UpsertDesignation,
    responses(
        (status = 200, description = "Designation stored", body = crate::model::designation::Designation),
        (status = 400, description = "Level below 1"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn upsert_designation(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<UpsertDesignation>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin()?;
    let title = non_empty("title", &payload.title)?;
    if payload.level < 1 {
        return Err(ApiError::validation("level must be at least 1"));
    }

    let designation = state.store.upsert_designation(&title, payload.level).await?;
    info!(designation_id = designation.id, "Designation stored");
    Ok(envelope::ok(designation))
}

#[utoipa::path(
    get,
    path = "/api/holidays",
    params(YearQuery),
    responses((status = 200, description = "Holidays of the year by date", body = [crate::model::holiday::Holiday])),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_holidays(
    _auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<YearQuery>,
) -> Result<impl Responder, ApiError> {
    let year = query.year.unwrap_or_else(|| Local::now().year());
    Ok(envelope::ok(state.store.list_holidays(year).await?))
}

/// Create or rename the holiday on a date (HR/Admin)
#[utoipa::path(
    post,
    path = "/api/holidays",
    request_body = NewHoliday,
    responses(
        (status = 200, description = "Holiday stored", body = crate::model::holiday::Holiday),
        (status = 403, description = "HR/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn upsert_holiday(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<NewHoliday>,
) -> Result<impl Responder, ApiError> {
    auth.require_hr_or_admin()?;
    let mut holiday = payload.into_inner();
    holiday.name = non_empty("name", &holiday.name)?;

    let stored = state.store.upsert_holiday(holiday).await?;
    state.ledger.calendar().invalidate_year(stored.date.year()).await;
    info!(date = %stored.date, "Holiday stored");
    Ok(envelope::ok(stored))
}

#[utoipa::path(
    delete,
    path = "/api/holidays/{date}",
    params(("date" = String, Path, description = "Holiday date, YYYY-MM-DD")),
    responses(
        (status = 200, description = "Holiday deleted"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "No holiday on that date")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_holiday(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<impl Responder, ApiError> {
    auth.require_hr_or_admin()?;
    let date = NaiveDate::parse_from_str(&path, "%Y-%m-%d")
        .map_err(|_| ApiError::validation("date must be YYYY-MM-DD"))?;

    state.store.delete_holiday(date).await.map_err(|e| match e {
        StoreError::NotFound(_) => ApiError::not_found("Holiday not found"),
        other => other.into(),
    })?;
    state.ledger.calendar().invalidate_year(date.year()).await;
    info!(%date, "Holiday deleted");
    Ok(envelope::ok(serde_json::json!({ "date": date })))
}

#[utoipa::path(
    get,
    path = "/api/announcements",
    params(PageQuery),
    responses((status = 200, description = "Newest announcements first", body = [crate::model::announcement::Announcement])),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_announcements(
    _auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<impl Responder, ApiError> {
    let page = Page::new(query.page, query.per_page);
    let result = state.store.list_announcements(page).await?;
    Ok(envelope::paged(result, page))
}

/// Publish an announcement, or replace the body of one with the same title (HR/Admin)
#[utoipa::path(
    post,
    path = "/api/announcements",
    request_body = UpsertAnnouncement,
    responses(
        (status = 200, description = "Announcement stored", body = crate::model::announcement::Announcement),
        (status = 403, description = "HR/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn upsert_announcement(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<UpsertAnnouncement>,
) -> Result<impl Responder, ApiError> {
    auth.require_hr_or_admin()?;
    let announcement = NewAnnouncement {
        title: non_empty("title", &payload.title)?,
        body: non_empty("body", &payload.body)?,
        created_by: Some(auth.user_id),
    };

    let stored = state.store.upsert_announcement(announcement).await?;
    info!(announcement_id = stored.id, "Announcement stored");
    Ok(envelope::ok(stored))
}
