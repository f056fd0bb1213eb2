//! Data-access port.
//!
//! Handlers and the leave ledger only talk to [`HrStore`]. `MySqlStore` is the
//! production backend; `InMemoryStore` backs tests and local demos.
//!
//! Balance-mutating operations (`create_leave_request`,
//! `settle_leave_request`) are atomic in every backend: the request row and
//! its balance row change together or not at all.
use crate::model::announcement::{Announcement, NewAnnouncement};
use crate::model::attendance::AttendanceRecord;
use crate::model::department::Department;
use crate::model::designation::Designation;
use crate::model::holiday::{Holiday, NewHoliday};
use crate::model::leave::{
    BalanceError, BalanceKey, LeaveBalance, LeaveDecision, LeaveFilter, LeaveRequest,
    NewLeaveRequest,
};
use crate::model::payroll::{NewPayroll, Payroll};
use crate::model::user::{NewUser, User, UserFilter};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use derive_more::Display;

pub mod memory;
pub mod mysql;

#[derive(Debug, Display)]
pub enum StoreError {
    #[display(fmt = "not found: {}", _0)]
    NotFound(String),
    #[display(fmt = "conflict: {}", _0)]
    Conflict(String),
    #[display(fmt = "{}", _0)]
    Balance(BalanceError),
    #[display(fmt = "{}", _0)]
    Unexpected(anyhow::Error),
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound("row not found".into()),
            // ER_DUP_ENTRY; foreign-key failures share SQLSTATE 23000 and stay unexpected
            sqlx::Error::Database(db_err) if is_duplicate_key(db_err.as_ref()) => {
                StoreError::Conflict(db_err.message().to_string())
            }
            other => StoreError::Unexpected(anyhow::Error::new(other)),
        }
    }
}

const MYSQL_DUPLICATE_ENTRY: u16 = 1062;

fn is_duplicate_key(err: &dyn sqlx::error::DatabaseError) -> bool {
    err.try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>()
        .is_some_and(|e| e.number() == MYSQL_DUPLICATE_ENTRY)
}

impl From<anyhow::Error> for StoreError {
    fn from(e: anyhow::Error) -> Self {
        StoreError::Unexpected(e)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub per_page: u32,
}

impl Page {
    pub const DEFAULT_PER_PAGE: u32 = 10;
    pub const MAX_PER_PAGE: u32 = 100;

    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page
                .unwrap_or(Self::DEFAULT_PER_PAGE)
                .clamp(1, Self::MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.per_page)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// Row counts per table, used by the seed routine's summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub departments: u64,
    pub designations: u64,
    pub users: u64,
    pub leave_balances: u64,
    pub leave_requests: u64,
    pub holidays: u64,
    pub announcements: u64,
}

#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Insert or update by `name`.
    async fn upsert_department(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> StoreResult<Department>;
    async fn list_departments(&self) -> StoreResult<Vec<Department>>;
    async fn get_department(&self, id: u64) -> StoreResult<Department>;

    /// Insert or update by `title`.
    async fn upsert_designation(&self, title: &str, level: i32) -> StoreResult<Designation>;
    async fn list_designations(&self) -> StoreResult<Vec<Designation>>;
    async fn get_designation(&self, id: u64) -> StoreResult<Designation>;

    /// Fails with `Conflict` when the email or employee code is taken.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    /// Insert or update by `email`; an existing password is kept.
    async fn upsert_user(&self, user: NewUser) -> StoreResult<User>;
    async fn get_user(&self, id: u64) -> StoreResult<User>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn list_users(&self, filter: &UserFilter, page: Page) -> StoreResult<Paged<User>>;
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    /// Insert or set `total_days`; used and pending days are never rewritten.
    async fn upsert_leave_balance(
        &self,
        key: BalanceKey,
        total_days: i32,
    ) -> StoreResult<LeaveBalance>;
    async fn get_leave_balance(&self, key: BalanceKey) -> StoreResult<Option<LeaveBalance>>;
    async fn list_leave_balances(&self, user_id: u64, year: i32)
    -> StoreResult<Vec<LeaveBalance>>;

    /// Place a hold of `request.days` on the matching balance and insert the
    /// request as `pending`. A missing balance counts as zero days; a hold
    /// larger than the remaining balance fails with `StoreError::Balance`.
    async fn create_leave_request(&self, request: NewLeaveRequest) -> StoreResult<LeaveRequest>;

    /// Move a pending request to its terminal state and settle its hold.
    /// Absent or already-settled requests fail with `NotFound`.
    async fn settle_leave_request(
        &self,
        id: u64,
        decision: &LeaveDecision,
        now: NaiveDateTime,
    ) -> StoreResult<LeaveRequest>;

    async fn get_leave_request(&self, id: u64) -> StoreResult<LeaveRequest>;
    async fn list_leave_requests(
        &self,
        filter: &LeaveFilter,
        page: Page,
    ) -> StoreResult<Paged<LeaveRequest>>;

    /// First pending or approved request of `employee_id` overlapping the range.
    async fn find_overlapping_leave(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Option<LeaveRequest>>;
}

#[async_trait]
pub trait CalendarStore: Send + Sync {
    /// Insert or update by `date`.
    async fn upsert_holiday(&self, holiday: NewHoliday) -> StoreResult<Holiday>;
    async fn delete_holiday(&self, date: NaiveDate) -> StoreResult<()>;
    async fn list_holidays(&self, year: i32) -> StoreResult<Vec<Holiday>>;

    /// Insert or update by `title`.
    async fn upsert_announcement(&self, announcement: NewAnnouncement)
    -> StoreResult<Announcement>;
    async fn list_announcements(&self, page: Page) -> StoreResult<Paged<Announcement>>;
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Fails with `Conflict` when the user already checked in on that date.
    async fn check_in(
        &self,
        user_id: u64,
        at: NaiveDateTime,
        late: bool,
    ) -> StoreResult<AttendanceRecord>;
    /// Fails with `NotFound` when there is no open check-in on that date.
    async fn check_out(&self, user_id: u64, at: NaiveDateTime) -> StoreResult<AttendanceRecord>;
    async fn list_attendance(
        &self,
        user_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<AttendanceRecord>>;
}

#[async_trait]
pub trait PayrollStore: Send + Sync {
    /// Fails with `Conflict` when the user already has a row for that month.
    async fn create_payroll(&self, payroll: NewPayroll) -> StoreResult<Payroll>;
    async fn update_payroll(
        &self,
        id: u64,
        base_salary: Option<f64>,
        bonus: Option<f64>,
        deductions: Option<f64>,
    ) -> StoreResult<Payroll>;
    async fn get_payroll(&self, id: u64) -> StoreResult<Payroll>;
    async fn list_payrolls(&self, user_id: Option<u64>, page: Page)
    -> StoreResult<Paged<Payroll>>;
}

/// Everything the application needs from persistence.
#[async_trait]
pub trait HrStore:
    DirectoryStore + LeaveStore + CalendarStore + AttendanceStore + PayrollStore
{
    async fn table_counts(&self) -> StoreResult<TableCounts>;
    async fn health_check(&self) -> StoreResult<()>;
    fn backend_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_clamps() {
        assert_eq!(Page::new(None, None), Page { page: 1, per_page: 10 });
        assert_eq!(Page::new(Some(0), Some(0)), Page { page: 1, per_page: 1 });
        assert_eq!(Page::new(Some(3), Some(500)).per_page, 100);
        assert_eq!(Page::new(Some(3), Some(20)).offset(), 40);
    }
}
