use crate::api::admin::{RoleView, UpsertAnnouncement, UpsertDepartment, UpsertDesignation};
use crate::api::employee::CreateEmployee;
use crate::api::envelope::{ErrorBody, Meta};
use crate::api::leave::{ApplyLeave, RejectLeave};
use crate::api::payroll::{CreatePayroll, UpdatePayroll};
use crate::auth::handlers::{LoginRequest, TokenResponse};
use crate::model::announcement::Announcement;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::department::Department;
use crate::model::designation::Designation;
use crate::model::holiday::{Holiday, HolidayType, NewHoliday};
use crate::model::leave::{BalanceView, LeaveBalance, LeaveRequest, LeaveStatus, LeaveType};
use crate::model::payroll::Payroll;
use crate::model::role::Role;
use crate::model::user::Profile;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Portal API",
        version = "1.0.0",
        description = r#"
## Human Resource Management portal

### Key Features
- **Leave Management**
  - Apply for leave; the days are held against the yearly balance until HR approves, rejects or the applicant cancels
  - Balances always satisfy `totalDays = usedDays + pendingDays + remaining`
- **Employee Directory**
  - Departments, designations and employee profiles
- **Attendance**
  - Daily check-in and check-out, late marking after office start
- **Payroll**
  - Monthly payroll rows with server-computed net salary
- **Calendar**
  - Holidays and announcements

### Security
Every endpoint except `/auth/*` requires a **JWT Bearer** access token.
Roles are `employee`, `hr` and `admin`.

### Response Format
`{ success, data?, error?: { message }, meta?: { total, totalPages } }` with camelCase fields.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,

        crate::api::leave::apply_leave,
        crate::api::leave::list_leave,
        crate::api::leave::leave_balances,
        crate::api::leave::get_leave,
        crate::api::leave::approve_leave,
        crate::api::leave::reject_leave,
        crate::api::leave::cancel_leave,

        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::me,

        crate::api::admin::list_roles,
        crate::api::admin::list_departments,
        crate::api::admin::upsert_department,
        crate::api::admin::list_designations,
        crate::api::admin::upsert_designation,
        crate::api::admin::list_holidays,
        crate::api::admin::upsert_holiday,
        crate::api::admin::delete_holiday,
        crate::api::admin::list_announcements,
        crate::api::admin::upsert_announcement,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::list_attendance,

        crate::api::payroll::create_payroll,
        crate::api::payroll::update_payroll,
        crate::api::payroll::get_payroll,
        crate::api::payroll::list_payrolls,

        crate::api::ai::attrition,
        crate::api::ai::resume_score
    ),
    components(
        schemas(
            LoginRequest,
            TokenResponse,
            Profile,
            Role,
            RoleView,
            ErrorBody,
            Meta,
            ApplyLeave,
            RejectLeave,
            LeaveRequest,
            LeaveBalance,
            BalanceView,
            LeaveType,
            LeaveStatus,
            CreateEmployee,
            Department,
            Designation,
            UpsertDepartment,
            UpsertDesignation,
            Holiday,
            HolidayType,
            NewHoliday,
            Announcement,
            UpsertAnnouncement,
            AttendanceRecord,
            AttendanceStatus,
            Payroll,
            CreatePayroll,
            UpdatePayroll
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and token rotation"),
        (name = "Leave", description = "Leave requests and balances"),
        (name = "Employee", description = "Employee directory"),
        (name = "Admin", description = "Roles, departments, designations, holidays and announcements"),
        (name = "Attendance", description = "Daily attendance"),
        (name = "Payroll", description = "Monthly payroll"),
        (name = "AI", description = "Insights from the external AI service"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_protected_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/leave/{leave_id}/approve"));
        assert!(doc.paths.paths.contains_key("/auth/login"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
