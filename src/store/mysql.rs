//! MySQL implementation of the HR store (sqlx).
//!
//! Leave operations that touch a balance run inside one transaction and lock
//! the rows they read (`SELECT ... FOR UPDATE`): the request row first, then
//! the balance row. Concurrent approvals of the same request serialize on the
//! request row; the loser sees a settled status and gets `NotFound`.
use super::{
    AttendanceStore, CalendarStore, DirectoryStore, HrStore, LeaveStore, Page, Paged,
    PayrollStore, StoreError, StoreResult, TableCounts,
};
use crate::model::announcement::{Announcement, NewAnnouncement};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::department::Department;
use crate::model::designation::Designation;
use crate::model::holiday::{Holiday, HolidayType, NewHoliday};
use crate::model::leave::{
    BalanceKey, LeaveBalance, LeaveDecision, LeaveFilter, LeaveRequest, LeaveStatus, LeaveType,
    NewLeaveRequest, SettleError,
};
use crate::model::payroll::{NewPayroll, Payroll, net_salary};
use crate::model::role::Role;
use crate::model::user::{NewUser, User, UserFilter};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{FromRow, MySqlPool};
use std::str::FromStr;

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

fn parse_column<T: FromStr>(column: &str, value: &str) -> StoreResult<T> {
    value
        .parse()
        .map_err(|_| StoreError::Unexpected(anyhow!("invalid {column} value in database: {value}")))
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    I32(i32),
    Str(String),
}

macro_rules! bind_filters {
    ($query:expr, $args:expr) => {{
        let mut q = $query;
        for arg in $args {
            q = match arg {
                FilterValue::U64(v) => q.bind(*v),
                FilterValue::I32(v) => q.bind(*v),
                FilterValue::Str(s) => q.bind(s.as_str()),
            };
        }
        q
    }};
}

/* =========================
Row types
========================= */

#[derive(FromRow)]
struct UserRow {
    id: u64,
    employee_code: String,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    department_id: Option<u64>,
    designation_id: Option<u64>,
    phone: Option<String>,
    joined_on: NaiveDate,
    is_active: bool,
    created_at: NaiveDateTime,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> StoreResult<Self> {
        Ok(User {
            role: parse_column::<Role>("role", &row.role)?,
            id: row.id,
            employee_code: row.employee_code,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            department_id: row.department_id,
            designation_id: row.designation_id,
            phone: row.phone,
            joined_on: row.joined_on,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

const USER_COLUMNS: &str = "id, employee_code, name, email, password_hash, role, department_id, \
     designation_id, phone, joined_on, is_active, created_at";

#[derive(FromRow)]
struct BalanceRow {
    user_id: u64,
    leave_type: String,
    year: i32,
    total_days: i32,
    used_days: i32,
    pending_days: i32,
}

impl TryFrom<BalanceRow> for LeaveBalance {
    type Error = StoreError;

    fn try_from(row: BalanceRow) -> StoreResult<Self> {
        Ok(LeaveBalance {
            leave_type: parse_column::<LeaveType>("leave_type", &row.leave_type)?,
            user_id: row.user_id,
            year: row.year,
            total_days: row.total_days,
            used_days: row.used_days,
            pending_days: row.pending_days,
        })
    }
}

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: u64,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    days: i32,
    reason: String,
    status: String,
    applied_at: NaiveDateTime,
    approved_by: Option<u64>,
    reject_reason: Option<String>,
    decided_at: Option<NaiveDateTime>,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = StoreError;

    fn try_from(row: LeaveRow) -> StoreResult<Self> {
        Ok(LeaveRequest {
            leave_type: parse_column::<LeaveType>("leave_type", &row.leave_type)?,
            status: parse_column::<LeaveStatus>("status", &row.status)?,
            id: row.id,
            employee_id: row.employee_id,
            start_date: row.start_date,
            end_date: row.end_date,
            days: row.days,
            reason: row.reason,
            applied_at: row.applied_at,
            approved_by: row.approved_by,
            reject_reason: row.reject_reason,
            decided_at: row.decided_at,
        })
    }
}

const LEAVE_COLUMNS: &str = "id, employee_id, leave_type, start_date, end_date, days, reason, \
     status, applied_at, approved_by, reject_reason, decided_at";

#[derive(FromRow)]
struct HolidayRow {
    id: u64,
    date: NaiveDate,
    name: String,
    holiday_type: String,
}

impl TryFrom<HolidayRow> for Holiday {
    type Error = StoreError;

    fn try_from(row: HolidayRow) -> StoreResult<Self> {
        Ok(Holiday {
            holiday_type: parse_column::<HolidayType>("holiday_type", &row.holiday_type)?,
            id: row.id,
            date: row.date,
            name: row.name,
        })
    }
}

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    user_id: u64,
    date: NaiveDate,
    check_in_at: NaiveDateTime,
    check_out_at: Option<NaiveDateTime>,
    status: String,
    worked_minutes: Option<i64>,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = StoreError;

    fn try_from(row: AttendanceRow) -> StoreResult<Self> {
        Ok(AttendanceRecord {
            status: parse_column::<AttendanceStatus>("status", &row.status)?,
            id: row.id,
            user_id: row.user_id,
            date: row.date,
            check_in_at: row.check_in_at,
            check_out_at: row.check_out_at,
            worked_minutes: row.worked_minutes,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/* =========================
Directory
========================= */

#[async_trait]
impl DirectoryStore for MySqlStore {
    async fn upsert_department(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> StoreResult<Department> {
        sqlx::query(
            r#"
            INSERT INTO departments (name, description)
            VALUES (?, ?)
            ON DUPLICATE KEY UPDATE description = VALUES(description)
            "#,
        )
        .bind(name)
        .bind(description)
        .execute(&self.pool)
        .await?;

        let dept = sqlx::query_as::<_, Department>(
            "SELECT id, name, description FROM departments WHERE name = ?",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(dept)
    }

    async fn list_departments(&self) -> StoreResult<Vec<Department>> {
        let rows = sqlx::query_as::<_, Department>(
            "SELECT id, name, description FROM departments ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_department(&self, id: u64) -> StoreResult<Department> {
        sqlx::query_as::<_, Department>(
            "SELECT id, name, description FROM departments WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("department {id}")))
    }

    async fn upsert_designation(&self, title: &str, level: i32) -> StoreResult<Designation> {
        sqlx::query(
            r#"
            INSERT INTO designations (title, level)
            VALUES (?, ?)
            ON DUPLICATE KEY UPDATE level = VALUES(level)
            "#,
        )
        .bind(title)
        .bind(level)
        .execute(&self.pool)
        .await?;

        let designation = sqlx::query_as::<_, Designation>(
            "SELECT id, title, level FROM designations WHERE title = ?",
        )
        .bind(title)
        .fetch_one(&self.pool)
        .await?;
        Ok(designation)
    }

    async fn list_designations(&self) -> StoreResult<Vec<Designation>> {
        let rows = sqlx::query_as::<_, Designation>(
            "SELECT id, title, level FROM designations ORDER BY level, title",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_designation(&self, id: u64) -> StoreResult<Designation> {
        sqlx::query_as::<_, Designation>("SELECT id, title, level FROM designations WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("designation {id}")))
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let result = sqlx::query(
            r#"
            INSERT INTO users
                (employee_code, name, email, password_hash, role,
                 department_id, designation_id, phone, joined_on)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.employee_code)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_ref())
        .bind(user.department_id)
        .bind(user.designation_id)
        .bind(&user.phone)
        .bind(user.joined_on)
        .execute(&self.pool)
        .await?;

        self.get_user(result.last_insert_id()).await
    }

    async fn upsert_user(&self, user: NewUser) -> StoreResult<User> {
        sqlx::query(
            r#"
            INSERT INTO users
                (employee_code, name, email, password_hash, role,
                 department_id, designation_id, phone, joined_on)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                employee_code = VALUES(employee_code),
                name = VALUES(name),
                role = VALUES(role),
                department_id = VALUES(department_id),
                designation_id = VALUES(designation_id),
                phone = VALUES(phone),
                joined_on = VALUES(joined_on)
            "#,
        )
        .bind(&user.employee_code)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_ref())
        .bind(user.department_id)
        .bind(user.designation_id)
        .bind(&user.phone)
        .bind(user.joined_on)
        .execute(&self.pool)
        .await?;

        self.find_user_by_email(&user.email)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user {}", user.email)))
    }

    async fn get_user(&self, id: u64) -> StoreResult<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))?;
        row.try_into()
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn list_users(&self, filter: &UserFilter, page: Page) -> StoreResult<Paged<User>> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(dept) = filter.department_id {
            where_sql.push_str(" AND department_id = ?");
            args.push(FilterValue::U64(dept));
        }
        if let Some(role) = filter.role {
            where_sql.push_str(" AND role = ?");
            args.push(FilterValue::Str(role.to_string()));
        }
        if let Some(search) = filter.search.as_deref() {
            let pattern = format!("%{}%", search.to_lowercase());
            where_sql.push_str(
                " AND (LOWER(name) LIKE ? OR LOWER(email) LIKE ? OR LOWER(employee_code) LIKE ?)",
            );
            for _ in 0..3 {
                args.push(FilterValue::Str(pattern.clone()));
            }
        }

        let count_sql = format!("SELECT COUNT(*) FROM users{where_sql}");
        let total = bind_filters!(sqlx::query_scalar::<_, i64>(&count_sql), &args)
            .fetch_one(&self.pool)
            .await?;

        let data_sql = format!("SELECT {USER_COLUMNS} FROM users{where_sql} ORDER BY id LIMIT ? OFFSET ?");
        let rows = bind_filters!(sqlx::query_as::<_, UserRow>(&data_sql), &args)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Paged {
            items: convert_all(rows)?,
            total: total.max(0) as u64,
        })
    }
}

/* =========================
Leave ledger
========================= */

const SELECT_BALANCE_FOR_UPDATE: &str = r#"
    SELECT user_id, leave_type, year, total_days, used_days, pending_days
    FROM leave_balances
    WHERE user_id = ? AND leave_type = ? AND year = ?
    FOR UPDATE
"#;

const UPDATE_BALANCE: &str = r#"
    UPDATE leave_balances
    SET used_days = ?, pending_days = ?
    WHERE user_id = ? AND leave_type = ? AND year = ?
"#;

#[async_trait]
impl LeaveStore for MySqlStore {
    async fn upsert_leave_balance(
        &self,
        key: BalanceKey,
        total_days: i32,
    ) -> StoreResult<LeaveBalance> {
        sqlx::query(
            r#"
            INSERT INTO leave_balances (user_id, leave_type, year, total_days)
            VALUES (?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE total_days = VALUES(total_days)
            "#,
        )
        .bind(key.user_id)
        .bind(key.leave_type.as_ref())
        .bind(key.year)
        .bind(total_days)
        .execute(&self.pool)
        .await?;

        self.get_leave_balance(key)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("balance for user {}", key.user_id)))
    }

    async fn get_leave_balance(&self, key: BalanceKey) -> StoreResult<Option<LeaveBalance>> {
        sqlx::query_as::<_, BalanceRow>(
            r#"
            SELECT user_id, leave_type, year, total_days, used_days, pending_days
            FROM leave_balances
            WHERE user_id = ? AND leave_type = ? AND year = ?
            "#,
        )
        .bind(key.user_id)
        .bind(key.leave_type.as_ref())
        .bind(key.year)
        .fetch_optional(&self.pool)
        .await?
        .map(LeaveBalance::try_from)
        .transpose()
    }

    async fn list_leave_balances(
        &self,
        user_id: u64,
        year: i32,
    ) -> StoreResult<Vec<LeaveBalance>> {
        let rows = sqlx::query_as::<_, BalanceRow>(
            r#"
            SELECT user_id, leave_type, year, total_days, used_days, pending_days
            FROM leave_balances
            WHERE user_id = ? AND year = ?
            ORDER BY leave_type
            "#,
        )
        .bind(user_id)
        .bind(year)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn create_leave_request(&self, request: NewLeaveRequest) -> StoreResult<LeaveRequest> {
        let key = request.balance_key();
        let mut tx = self.pool.begin().await?;

        let mut balance = match sqlx::query_as::<_, BalanceRow>(SELECT_BALANCE_FOR_UPDATE)
            .bind(key.user_id)
            .bind(key.leave_type.as_ref())
            .bind(key.year)
            .fetch_optional(&mut *tx)
            .await?
        {
            Some(row) => LeaveBalance::try_from(row)?,
            None => LeaveBalance::empty(key),
        };
        // dropping `tx` on any early return rolls back
        balance.hold(request.days).map_err(StoreError::Balance)?;

        sqlx::query(UPDATE_BALANCE)
            .bind(balance.used_days)
            .bind(balance.pending_days)
            .bind(key.user_id)
            .bind(key.leave_type.as_ref())
            .bind(key.year)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, leave_type, start_date, end_date, days, reason, status, applied_at)
            VALUES (?, ?, ?, ?, ?, ?, 'pending', ?)
            "#,
        )
        .bind(request.employee_id)
        .bind(request.leave_type.as_ref())
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.days)
        .bind(&request.reason)
        .bind(request.applied_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.get_leave_request(result.last_insert_id()).await
    }

    async fn settle_leave_request(
        &self,
        id: u64,
        decision: &LeaveDecision,
        now: NaiveDateTime,
    ) -> StoreResult<LeaveRequest> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ? FOR UPDATE");
        let mut request: LeaveRequest = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("leave request {id}")))?
            .try_into()?;

        let key = request.balance_key();
        let mut balance = match sqlx::query_as::<_, BalanceRow>(SELECT_BALANCE_FOR_UPDATE)
            .bind(key.user_id)
            .bind(key.leave_type.as_ref())
            .bind(key.year)
            .fetch_optional(&mut *tx)
            .await?
        {
            Some(row) => LeaveBalance::try_from(row)?,
            None => LeaveBalance::empty(key),
        };

        match request.settle(&mut balance, decision, now) {
            Ok(()) => {}
            Err(SettleError::NotPending(status)) => {
                return Err(StoreError::NotFound(format!(
                    "leave request {id} is already {status}"
                )));
            }
            Err(SettleError::Balance(e)) => return Err(StoreError::Balance(e)),
        }

        sqlx::query(UPDATE_BALANCE)
            .bind(balance.used_days)
            .bind(balance.pending_days)
            .bind(key.user_id)
            .bind(key.leave_type.as_ref())
            .bind(key.year)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?, approved_by = ?, reject_reason = ?, decided_at = ?
            WHERE id = ?
            "#,
        )
        .bind(request.status.as_ref())
        .bind(request.approved_by)
        .bind(&request.reject_reason)
        .bind(request.decided_at)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(request)
    }

    async fn get_leave_request(&self, id: u64) -> StoreResult<LeaveRequest> {
        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?");
        sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("leave request {id}")))?
            .try_into()
    }

    async fn list_leave_requests(
        &self,
        filter: &LeaveFilter,
        page: Page,
    ) -> StoreResult<Paged<LeaveRequest>> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(emp_id) = filter.employee_id {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::U64(emp_id));
        }
        if let Some(status) = filter.status {
            where_sql.push_str(" AND status = ?");
            args.push(FilterValue::Str(status.to_string()));
        }
        if let Some(leave_type) = filter.leave_type {
            where_sql.push_str(" AND leave_type = ?");
            args.push(FilterValue::Str(leave_type.to_string()));
        }
        if let Some(year) = filter.year {
            where_sql.push_str(" AND YEAR(start_date) = ?");
            args.push(FilterValue::I32(year));
        }

        let count_sql = format!("SELECT COUNT(*) FROM leave_requests{where_sql}");
        let total = bind_filters!(sqlx::query_scalar::<_, i64>(&count_sql), &args)
            .fetch_one(&self.pool)
            .await?;

        let data_sql = format!(
            r#"
            SELECT {LEAVE_COLUMNS}
            FROM leave_requests
            {where_sql}
            ORDER BY applied_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#
        );
        let rows = bind_filters!(sqlx::query_as::<_, LeaveRow>(&data_sql), &args)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Paged {
            items: convert_all(rows)?,
            total: total.max(0) as u64,
        })
    }

    async fn find_overlapping_leave(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Option<LeaveRequest>> {
        let sql = format!(
            r#"
            SELECT {LEAVE_COLUMNS}
            FROM leave_requests
            WHERE employee_id = ?
              AND status IN ('pending', 'approved')
              AND start_date <= ?
              AND end_date >= ?
            LIMIT 1
            "#
        );
        sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(employee_id)
            .bind(end)
            .bind(start)
            .fetch_optional(&self.pool)
            .await?
            .map(LeaveRequest::try_from)
            .transpose()
    }
}

/* =========================
Holidays and announcements
========================= */

#[async_trait]
impl CalendarStore for MySqlStore {
    async fn upsert_holiday(&self, holiday: NewHoliday) -> StoreResult<Holiday> {
        sqlx::query(
            r#"
            INSERT INTO holidays (date, name, holiday_type)
            VALUES (?, ?, ?)
            ON DUPLICATE KEY UPDATE name = VALUES(name), holiday_type = VALUES(holiday_type)
            "#,
        )
        .bind(holiday.date)
        .bind(&holiday.name)
        .bind(holiday.holiday_type.as_ref())
        .execute(&self.pool)
        .await?;

        sqlx::query_as::<_, HolidayRow>(
            "SELECT id, date, name, holiday_type FROM holidays WHERE date = ?",
        )
        .bind(holiday.date)
        .fetch_one(&self.pool)
        .await?
        .try_into()
    }

    async fn delete_holiday(&self, date: NaiveDate) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM holidays WHERE date = ?")
            .bind(date)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("holiday on {date}")));
        }
        Ok(())
    }

    async fn list_holidays(&self, year: i32) -> StoreResult<Vec<Holiday>> {
        let rows = sqlx::query_as::<_, HolidayRow>(
            r#"
            SELECT id, date, name, holiday_type
            FROM holidays
            WHERE YEAR(date) = ?
            ORDER BY date
            "#,
        )
        .bind(year)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn upsert_announcement(
        &self,
        announcement: NewAnnouncement,
    ) -> StoreResult<Announcement> {
        sqlx::query(
            r#"
            INSERT INTO announcements (title, body, created_by)
            VALUES (?, ?, ?)
            ON DUPLICATE KEY UPDATE body = VALUES(body), created_by = VALUES(created_by)
            "#,
        )
        .bind(&announcement.title)
        .bind(&announcement.body)
        .bind(announcement.created_by)
        .execute(&self.pool)
        .await?;

        let stored = sqlx::query_as::<_, Announcement>(
            "SELECT id, title, body, created_by, created_at FROM announcements WHERE title = ?",
        )
        .bind(&announcement.title)
        .fetch_one(&self.pool)
        .await?;
        Ok(stored)
    }

    async fn list_announcements(&self, page: Page) -> StoreResult<Paged<Announcement>> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM announcements")
            .fetch_one(&self.pool)
            .await?;
        let items = sqlx::query_as::<_, Announcement>(
            r#"
            SELECT id, title, body, created_by, created_at
            FROM announcements
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok(Paged {
            items,
            total: total.max(0) as u64,
        })
    }
}

/* =========================
Attendance
========================= */

const ATTENDANCE_COLUMNS: &str =
    "id, user_id, date, check_in_at, check_out_at, status, worked_minutes";

#[async_trait]
impl AttendanceStore for MySqlStore {
    async fn check_in(
        &self,
        user_id: u64,
        at: NaiveDateTime,
        late: bool,
    ) -> StoreResult<AttendanceRecord> {
        let status = if late {
            AttendanceStatus::Late
        } else {
            AttendanceStatus::Present
        };
        // uq_attendance_user_date turns a second check-in into a Conflict
        let result = sqlx::query(
            r#"
            INSERT INTO attendance (user_id, date, check_in_at, status)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(at.date())
        .bind(at)
        .bind(status.as_ref())
        .execute(&self.pool)
        .await?;

        let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE id = ?");
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(result.last_insert_id())
            .fetch_one(&self.pool)
            .await?
            .try_into()
    }

    async fn check_out(&self, user_id: u64, at: NaiveDateTime) -> StoreResult<AttendanceRecord> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_out_at = ?,
                worked_minutes = GREATEST(TIMESTAMPDIFF(MINUTE, check_in_at, ?), 0)
            WHERE user_id = ?
              AND date = ?
              AND check_out_at IS NULL
            "#,
        )
        .bind(at)
        .bind(at)
        .bind(user_id)
        .bind(at.date())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!(
                "open check-in for user {user_id}"
            )));
        }

        let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE user_id = ? AND date = ?");
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(user_id)
            .bind(at.date())
            .fetch_one(&self.pool)
            .await?
            .try_into()
    }

    async fn list_attendance(
        &self,
        user_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance \
             WHERE user_id = ? AND date BETWEEN ? AND ? ORDER BY date"
        );
        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(user_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }
}

/* =========================
Payroll
========================= */

const PAYROLL_COLUMNS: &str = "id, user_id, month, base_salary, bonus, deductions, net_salary";

#[async_trait]
impl PayrollStore for MySqlStore {
    async fn create_payroll(&self, payroll: NewPayroll) -> StoreResult<Payroll> {
        let net = net_salary(payroll.base_salary, payroll.bonus, payroll.deductions);
        let result = sqlx::query(
            r#"
            INSERT INTO payroll
            (user_id, month, base_salary, bonus, deductions, net_salary)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(payroll.user_id)
        .bind(payroll.month)
        .bind(payroll.base_salary)
        .bind(payroll.bonus)
        .bind(payroll.deductions)
        .bind(net)
        .execute(&self.pool)
        .await?;

        self.get_payroll(result.last_insert_id()).await
    }

    async fn update_payroll(
        &self,
        id: u64,
        base_salary: Option<f64>,
        bonus: Option<f64>,
        deductions: Option<f64>,
    ) -> StoreResult<Payroll> {
        let mut tx = self.pool.begin().await?;
        let sql = format!("SELECT {PAYROLL_COLUMNS} FROM payroll WHERE id = ? FOR UPDATE");
        let current = sqlx::query_as::<_, Payroll>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("payroll {id}")))?;

        let base_salary = base_salary.unwrap_or(current.base_salary);
        let bonus = bonus.unwrap_or(current.bonus);
        let deductions = deductions.unwrap_or(current.deductions);
        let net = net_salary(base_salary, bonus, deductions);

        sqlx::query(
            r#"
            UPDATE payroll
            SET base_salary = ?, bonus = ?, deductions = ?, net_salary = ?
            WHERE id = ?
            "#,
        )
        .bind(base_salary)
        .bind(bonus)
        .bind(deductions)
        .bind(net)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(Payroll {
            base_salary,
            bonus,
            deductions,
            net_salary: net,
            ..current
        })
    }

    async fn get_payroll(&self, id: u64) -> StoreResult<Payroll> {
        let sql = format!("SELECT {PAYROLL_COLUMNS} FROM payroll WHERE id = ?");
        sqlx::query_as::<_, Payroll>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("payroll {id}")))
    }

    async fn list_payrolls(&self, user_id: Option<u64>, page: Page) -> StoreResult<Paged<Payroll>> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();
        if let Some(user_id) = user_id {
            where_sql.push_str(" AND user_id = ?");
            args.push(FilterValue::U64(user_id));
        }

        let count_sql = format!("SELECT COUNT(*) FROM payroll{where_sql}");
        let total = bind_filters!(sqlx::query_scalar::<_, i64>(&count_sql), &args)
            .fetch_one(&self.pool)
            .await?;

        let data_sql = format!(
            "SELECT {PAYROLL_COLUMNS} FROM payroll{where_sql} ORDER BY month DESC LIMIT ? OFFSET ?"
        );
        let items = bind_filters!(sqlx::query_as::<_, Payroll>(&data_sql), &args)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Paged {
            items,
            total: total.max(0) as u64,
        })
    }
}

#[async_trait]
impl HrStore for MySqlStore {
    async fn table_counts(&self) -> StoreResult<TableCounts> {
        async fn count(pool: &MySqlPool, table: &str) -> StoreResult<u64> {
            let sql = format!("SELECT COUNT(*) FROM {table}");
            let n = sqlx::query_scalar::<_, i64>(&sql).fetch_one(pool).await?;
            Ok(n.max(0) as u64)
        }

        Ok(TableCounts {
            departments: count(&self.pool, "departments").await?,
            designations: count(&self.pool, "designations").await?,
            users: count(&self.pool, "users").await?,
            leave_balances: count(&self.pool, "leave_balances").await?,
            leave_requests: count(&self.pool, "leave_requests").await?,
            holidays: count(&self.pool, "holidays").await?,
            announcements: count(&self.pool, "announcements").await?,
        })
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "mysql"
    }
}
