//! In-memory implementation of the HR store.
//!
//! All tables live in one `State` behind a single mutex, so every trait call
//! is atomic with respect to every other. Not durable: state is lost when the
//! process exits. Used by the test suites and for running the API without a
//! database.
use super::{
    AttendanceStore, CalendarStore, DirectoryStore, HrStore, LeaveStore, Page, Paged,
    PayrollStore, StoreError, StoreResult, TableCounts,
};
use crate::model::announcement::{Announcement, NewAnnouncement};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::department::Department;
use crate::model::designation::Designation;
use crate::model::holiday::{Holiday, NewHoliday};
use crate::model::leave::{
    BalanceKey, LeaveBalance, LeaveDecision, LeaveFilter, LeaveRequest, LeaveStatus,
    NewLeaveRequest, SettleError,
};
use crate::model::payroll::{NewPayroll, Payroll, net_salary};
use crate::model::user::{NewUser, User, UserFilter};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct State {
    next_id: u64,
    departments: BTreeMap<u64, Department>,
    designations: BTreeMap<u64, Designation>,
    users: BTreeMap<u64, User>,
    balances: HashMap<BalanceKey, LeaveBalance>,
    leave_requests: BTreeMap<u64, LeaveRequest>,
    holidays: BTreeMap<NaiveDate, Holiday>,
    announcements: BTreeMap<u64, Announcement>,
    attendance: BTreeMap<u64, AttendanceRecord>,
    payrolls: BTreeMap<u64, Payroll>,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unexpected(anyhow::anyhow!("in-memory store poisoned")))
    }
}

fn paginate<T: Clone>(items: Vec<T>, page: Page) -> Paged<T> {
    let total = items.len() as u64;
    let items = items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();
    Paged { items, total }
}

#[async_trait]
impl DirectoryStore for InMemoryStore {
    async fn upsert_department(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> StoreResult<Department> {
        let mut state = self.lock()?;
        if let Some(existing) = state.departments.values_mut().find(|d| d.name == name) {
            existing.description = description.map(str::to_string);
            return Ok(existing.clone());
        }
        let id = state.next_id();
        let dept = Department {
            id,
            name: name.to_string(),
            description: description.map(str::to_string),
        };
        state.departments.insert(id, dept.clone());
        Ok(dept)
    }

    async fn list_departments(&self) -> StoreResult<Vec<Department>> {
        let state = self.lock()?;
        let mut items: Vec<_> = state.departments.values().cloned().collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn get_department(&self, id: u64) -> StoreResult<Department> {
        self.lock()?
            .departments
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("department {id}")))
    }

    async fn upsert_designation(&self, title: &str, level: i32) -> StoreResult<Designation> {
        let mut state = self.lock()?;
        if let Some(existing) = state.designations.values_mut().find(|d| d.title == title) {
            existing.level = level;
            return Ok(existing.clone());
        }
        let id = state.next_id();
        let designation = Designation {
            id,
            title: title.to_string(),
            level,
        };
        state.designations.insert(id, designation.clone());
        Ok(designation)
    }

    async fn list_designations(&self) -> StoreResult<Vec<Designation>> {
        let state = self.lock()?;
        let mut items: Vec<_> = state.designations.values().cloned().collect();
        items.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.title.cmp(&b.title)));
        Ok(items)
    }

    async fn get_designation(&self, id: u64) -> StoreResult<Designation> {
        self.lock()?
            .designations
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("designation {id}")))
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut state = self.lock()?;
        if state
            .users
            .values()
            .any(|u| u.email == user.email || u.employee_code == user.employee_code)
        {
            return Err(StoreError::Conflict(format!(
                "user {} already exists",
                user.email
            )));
        }
        let id = state.next_id();
        let created = User {
            id,
            employee_code: user.employee_code,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            department_id: user.department_id,
            designation_id: user.designation_id,
            phone: user.phone,
            joined_on: user.joined_on,
            is_active: true,
            created_at: Utc::now().naive_utc(),
        };
        state.users.insert(id, created.clone());
        Ok(created)
    }

    async fn upsert_user(&self, user: NewUser) -> StoreResult<User> {
        {
            let mut state = self.lock()?;
            if let Some(existing) = state.users.values_mut().find(|u| u.email == user.email) {
                existing.employee_code = user.employee_code;
                existing.name = user.name;
                existing.role = user.role;
                existing.department_id = user.department_id;
                existing.designation_id = user.designation_id;
                existing.phone = user.phone;
                existing.joined_on = user.joined_on;
                return Ok(existing.clone());
            }
        }
        self.create_user(user).await
    }

    async fn get_user(&self, id: u64) -> StoreResult<User> {
        self.lock()?
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_users(&self, filter: &UserFilter, page: Page) -> StoreResult<Paged<User>> {
        let state = self.lock()?;
        let needle = filter.search.as_deref().map(str::to_lowercase);
        let items: Vec<User> = state
            .users
            .values()
            .filter(|u| filter.department_id.is_none_or(|d| u.department_id == Some(d)))
            .filter(|u| filter.role.is_none_or(|r| u.role == r))
            .filter(|u| {
                needle.as_deref().is_none_or(|n| {
                    u.name.to_lowercase().contains(n)
                        || u.email.to_lowercase().contains(n)
                        || u.employee_code.to_lowercase().contains(n)
                })
            })
            .cloned()
            .collect();
        Ok(paginate(items, page))
    }
}

#[async_trait]
impl LeaveStore for InMemoryStore {
    async fn upsert_leave_balance(
        &self,
        key: BalanceKey,
        total_days: i32,
    ) -> StoreResult<LeaveBalance> {
        let mut state = self.lock()?;
        let balance = state
            .balances
            .entry(key)
            .or_insert_with(|| LeaveBalance::empty(key));
        balance.total_days = total_days;
        Ok(balance.clone())
    }

    async fn get_leave_balance(&self, key: BalanceKey) -> StoreResult<Option<LeaveBalance>> {
        Ok(self.lock()?.balances.get(&key).cloned())
    }

    async fn list_leave_balances(
        &self,
        user_id: u64,
        year: i32,
    ) -> StoreResult<Vec<LeaveBalance>> {
        let state = self.lock()?;
        let mut items: Vec<_> = state
            .balances
            .values()
            .filter(|b| b.user_id == user_id && b.year == year)
            .cloned()
            .collect();
        items.sort_by_key(|b| b.leave_type.to_string());
        Ok(items)
    }

    async fn create_leave_request(&self, request: NewLeaveRequest) -> StoreResult<LeaveRequest> {
        let mut state = self.lock()?;
        let key = request.balance_key();
        let mut balance = state
            .balances
            .get(&key)
            .cloned()
            .unwrap_or_else(|| LeaveBalance::empty(key));
        balance.hold(request.days).map_err(StoreError::Balance)?;

        let id = state.next_id();
        let created = LeaveRequest {
            id,
            employee_id: request.employee_id,
            leave_type: request.leave_type,
            start_date: request.start_date,
            end_date: request.end_date,
            days: request.days,
            reason: request.reason,
            status: LeaveStatus::Pending,
            applied_at: request.applied_at,
            approved_by: None,
            reject_reason: None,
            decided_at: None,
        };
        state.balances.insert(key, balance);
        state.leave_requests.insert(id, created.clone());
        Ok(created)
    }

    async fn settle_leave_request(
        &self,
        id: u64,
        decision: &LeaveDecision,
        now: NaiveDateTime,
    ) -> StoreResult<LeaveRequest> {
        let mut state = self.lock()?;
        let mut request = state
            .leave_requests
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("leave request {id}")))?;
        let key = request.balance_key();
        let mut balance = state
            .balances
            .get(&key)
            .cloned()
            .unwrap_or_else(|| LeaveBalance::empty(key));

        match request.settle(&mut balance, decision, now) {
            Ok(()) => {}
            Err(SettleError::NotPending(status)) => {
                return Err(StoreError::NotFound(format!(
                    "leave request {id} is already {status}"
                )));
            }
            Err(SettleError::Balance(e)) => return Err(StoreError::Balance(e)),
        }

        state.balances.insert(key, balance);
        state.leave_requests.insert(id, request.clone());
        Ok(request)
    }

    async fn get_leave_request(&self, id: u64) -> StoreResult<LeaveRequest> {
        self.lock()?
            .leave_requests
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("leave request {id}")))
    }

    async fn list_leave_requests(
        &self,
        filter: &LeaveFilter,
        page: Page,
    ) -> StoreResult<Paged<LeaveRequest>> {
        let state = self.lock()?;
        let mut items: Vec<_> = state
            .leave_requests
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        // newest first
        items.sort_by(|a, b| b.applied_at.cmp(&a.applied_at).then(b.id.cmp(&a.id)));
        Ok(paginate(items, page))
    }

    async fn find_overlapping_leave(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Option<LeaveRequest>> {
        Ok(self
            .lock()?
            .leave_requests
            .values()
            .find(|r| {
                r.employee_id == employee_id
                    && matches!(r.status, LeaveStatus::Pending | LeaveStatus::Approved)
                    && r.overlaps(start, end)
            })
            .cloned())
    }
}

#[async_trait]
impl CalendarStore for InMemoryStore {
    async fn upsert_holiday(&self, holiday: NewHoliday) -> StoreResult<Holiday> {
        let mut state = self.lock()?;
        let id = match state.holidays.get(&holiday.date) {
            Some(existing) => existing.id,
            None => state.next_id(),
        };
        let stored = Holiday {
            id,
            date: holiday.date,
            name: holiday.name,
            holiday_type: holiday.holiday_type,
        };
        state.holidays.insert(stored.date, stored.clone());
        Ok(stored)
    }

    async fn delete_holiday(&self, date: NaiveDate) -> StoreResult<()> {
        self.lock()?
            .holidays
            .remove(&date)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("holiday on {date}")))
    }

    async fn list_holidays(&self, year: i32) -> StoreResult<Vec<Holiday>> {
        Ok(self
            .lock()?
            .holidays
            .values()
            .filter(|h| h.date.year() == year)
            .cloned()
            .collect())
    }

    async fn upsert_announcement(
        &self,
        announcement: NewAnnouncement,
    ) -> StoreResult<Announcement> {
        let mut state = self.lock()?;
        if let Some(existing) = state
            .announcements
            .values_mut()
            .find(|a| a.title == announcement.title)
        {
            existing.body = announcement.body;
            existing.created_by = announcement.created_by;
            return Ok(existing.clone());
        }
        let id = state.next_id();
        let stored = Announcement {
            id,
            title: announcement.title,
            body: announcement.body,
            created_by: announcement.created_by,
            created_at: Utc::now().naive_utc(),
        };
        state.announcements.insert(id, stored.clone());
        Ok(stored)
    }

    async fn list_announcements(&self, page: Page) -> StoreResult<Paged<Announcement>> {
        let state = self.lock()?;
        let items: Vec<_> = state.announcements.values().rev().cloned().collect();
        Ok(paginate(items, page))
    }
}

#[async_trait]
impl AttendanceStore for InMemoryStore {
    async fn check_in(
        &self,
        user_id: u64,
        at: NaiveDateTime,
        late: bool,
    ) -> StoreResult<AttendanceRecord> {
        let mut state = self.lock()?;
        let date = at.date();
        if state
            .attendance
            .values()
            .any(|r| r.user_id == user_id && r.date == date)
        {
            return Err(StoreError::Conflict(format!(
                "user {user_id} already checked in on {date}"
            )));
        }
        let id = state.next_id();
        let record = AttendanceRecord {
            id,
            user_id,
            date,
            check_in_at: at,
            check_out_at: None,
            status: if late {
                AttendanceStatus::Late
            } else {
                AttendanceStatus::Present
            },
            worked_minutes: None,
        };
        state.attendance.insert(id, record.clone());
        Ok(record)
    }

    async fn check_out(&self, user_id: u64, at: NaiveDateTime) -> StoreResult<AttendanceRecord> {
        let mut state = self.lock()?;
        let date = at.date();
        let record = state
            .attendance
            .values_mut()
            .find(|r| r.user_id == user_id && r.date == date && r.check_out_at.is_none())
            .ok_or_else(|| StoreError::NotFound(format!("open check-in for user {user_id}")))?;
        record.check_out_at = Some(at);
        record.worked_minutes = Some((at - record.check_in_at).num_minutes().max(0));
        Ok(record.clone())
    }

    async fn list_attendance(
        &self,
        user_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        let state = self.lock()?;
        let mut items: Vec<_> = state
            .attendance
            .values()
            .filter(|r| r.user_id == user_id && r.date >= from && r.date <= to)
            .cloned()
            .collect();
        items.sort_by_key(|r| r.date);
        Ok(items)
    }
}

#[async_trait]
impl PayrollStore for InMemoryStore {
    async fn create_payroll(&self, payroll: NewPayroll) -> StoreResult<Payroll> {
        let mut state = self.lock()?;
        if state
            .payrolls
            .values()
            .any(|p| p.user_id == payroll.user_id && p.month == payroll.month)
        {
            return Err(StoreError::Conflict(format!(
                "payroll for user {} in {} already exists",
                payroll.user_id, payroll.month
            )));
        }
        let id = state.next_id();
        let stored = Payroll {
            id,
            user_id: payroll.user_id,
            month: payroll.month,
            base_salary: payroll.base_salary,
            bonus: payroll.bonus,
            deductions: payroll.deductions,
            net_salary: net_salary(payroll.base_salary, payroll.bonus, payroll.deductions),
        };
        state.payrolls.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_payroll(
        &self,
        id: u64,
        base_salary: Option<f64>,
        bonus: Option<f64>,
        deductions: Option<f64>,
    ) -> StoreResult<Payroll> {
        let mut state = self.lock()?;
        let payroll = state
            .payrolls
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("payroll {id}")))?;
        payroll.base_salary = base_salary.unwrap_or(payroll.base_salary);
        payroll.bonus = bonus.unwrap_or(payroll.bonus);
        payroll.deductions = deductions.unwrap_or(payroll.deductions);
        payroll.net_salary = net_salary(payroll.base_salary, payroll.bonus, payroll.deductions);
        Ok(payroll.clone())
    }

    async fn get_payroll(&self, id: u64) -> StoreResult<Payroll> {
        self.lock()?
            .payrolls
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("payroll {id}")))
    }

    async fn list_payrolls(&self, user_id: Option<u64>, page: Page) -> StoreResult<Paged<Payroll>> {
        let state = self.lock()?;
        let mut items: Vec<_> = state
            .payrolls
            .values()
            .filter(|p| user_id.is_none_or(|u| p.user_id == u))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.month.cmp(&a.month));
        Ok(paginate(items, page))
    }
}

#[async_trait]
impl HrStore for InMemoryStore {
    async fn table_counts(&self) -> StoreResult<TableCounts> {
        let state = self.lock()?;
        Ok(TableCounts {
            departments: state.departments.len() as u64,
            designations: state.designations.len() as u64,
            users: state.users.len() as u64,
            leave_balances: state.balances.len() as u64,
            leave_requests: state.leave_requests.len() as u64,
            holidays: state.holidays.len() as u64,
            announcements: state.announcements.len() as u64,
        })
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.lock().map(|_| ())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
