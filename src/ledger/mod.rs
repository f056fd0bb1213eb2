//! Leave-balance ledger.
//!
//! Applying places a hold on the employee's balance for the request's year;
//! approving turns the hold into used days; rejecting or cancelling gives it
//! back. After every operation, for every balance,
//! `total_days == used_days + pending_days + remaining`.
pub mod calendar;

use crate::model::leave::{
    BalanceError, BalanceView, LeaveDecision, LeaveFilter, LeaveRequest, LeaveType,
    NewLeaveRequest,
};
use crate::model::role::Role;
use crate::store::{HrStore, LeaveStore, Page, Paged, StoreError};
use calendar::WorkCalendar;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use derive_more::Display;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub const MAX_REASON_LEN: usize = 500;

/// The authenticated user on whose behalf an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: u64,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct LeaveApplication {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
}

#[derive(Debug, Display)]
pub enum LedgerError {
    #[display(fmt = "{}", _0)]
    Validation(String),
    #[display(
        fmt = "insufficient leave balance: requested {} day(s), {} available",
        requested,
        available
    )]
    InsufficientBalance { requested: i32, available: i32 },
    #[display(fmt = "{}", _0)]
    NotFound(String),
    #[display(fmt = "{}", _0)]
    Forbidden(String),
    #[display(fmt = "{}", _0)]
    Store(StoreError),
}

impl std::error::Error for LedgerError {}

const NOT_FOUND_OR_PROCESSED: &str = "Leave request not found or already processed";

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => LedgerError::NotFound(NOT_FOUND_OR_PROCESSED.into()),
            StoreError::Balance(BalanceError::Insufficient {
                requested,
                available,
            }) => LedgerError::InsufficientBalance {
                requested,
                available,
            },
            other => LedgerError::Store(other),
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Clone)]
pub struct LeaveLedger {
    store: Arc<dyn HrStore>,
    calendar: Arc<WorkCalendar>,
}

impl LeaveLedger {
    pub fn new(store: Arc<dyn HrStore>, calendar: Arc<WorkCalendar>) -> Self {
        Self { store, calendar }
    }

    pub fn calendar(&self) -> &WorkCalendar {
        &self.calendar
    }

    /// Validate, count days and place the hold. Nothing is written when
    /// the balance cannot cover the request.
    #[instrument(name = "leave_apply", skip(self, application), fields(leave_type = %application.leave_type))]
    pub async fn apply_leave(
        &self,
        employee_id: u64,
        application: LeaveApplication,
        now: NaiveDateTime,
    ) -> LedgerResult<LeaveRequest> {
        let LeaveApplication {
            leave_type,
            start_date,
            end_date,
            reason,
        } = application;

        if start_date > end_date {
            return Err(LedgerError::Validation(
                "startDate cannot be after endDate".into(),
            ));
        }
        if start_date.year() != end_date.year() {
            return Err(LedgerError::Validation(
                "A leave request cannot span two calendar years; split it at Dec 31".into(),
            ));
        }
        let reason = reason.trim().to_string();
        if reason.is_empty() {
            return Err(LedgerError::Validation("reason is required".into()));
        }
        if reason.chars().count() > MAX_REASON_LEN {
            return Err(LedgerError::Validation(format!(
                "reason must be at most {MAX_REASON_LEN} characters"
            )));
        }

        if let Some(existing) = self
            .store
            .find_overlapping_leave(employee_id, start_date, end_date)
            .await
            .map_err(LedgerError::Store)?
        {
            return Err(LedgerError::Validation(format!(
                "Overlaps leave request {} ({} to {}, {})",
                existing.id, existing.start_date, existing.end_date, existing.status
            )));
        }

        let days = self
            .calendar
            .count_days(start_date, end_date)
            .await
            .map_err(LedgerError::Store)?;
        if days < 1 {
            return Err(LedgerError::Validation(
                "The selected range contains no working days".into(),
            ));
        }

        let created = self
            .store
            .create_leave_request(NewLeaveRequest {
                employee_id,
                leave_type,
                start_date,
                end_date,
                days,
                reason,
                applied_at: now,
            })
            .await
            .map_err(|e| {
                if let StoreError::Balance(b) = &e {
                    warn!(%b, "Leave application refused");
                }
                LedgerError::from(e)
            })?;

        info!(leave_id = created.id, days, "Leave request submitted");
        Ok(created)
    }

    #[instrument(name = "leave_approve", skip(self, now))]
    pub async fn approve_leave(
        &self,
        actor: Actor,
        request_id: u64,
        now: NaiveDateTime,
    ) -> LedgerResult<LeaveRequest> {
        self.require_manager(actor)?;
        self.require_not_own(actor, request_id).await?;
        let settled = self
            .store
            .settle_leave_request(request_id, &LeaveDecision::Approve { by: actor.user_id }, now)
            .await?;
        info!(days = settled.days, "Leave approved");
        Ok(settled)
    }

    #[instrument(name = "leave_reject", skip(self, reason, now))]
    pub async fn reject_leave(
        &self,
        actor: Actor,
        request_id: u64,
        reason: &str,
        now: NaiveDateTime,
    ) -> LedgerResult<LeaveRequest> {
        self.require_manager(actor)?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(LedgerError::Validation("A rejection reason is required".into()));
        }
        if reason.chars().count() > MAX_REASON_LEN {
            return Err(LedgerError::Validation(format!(
                "reason must be at most {MAX_REASON_LEN} characters"
            )));
        }
        self.require_not_own(actor, request_id).await?;
        let decision = LeaveDecision::Reject {
            by: actor.user_id,
            reason: reason.to_string(),
        };
        let settled = self
            .store
            .settle_leave_request(request_id, &decision, now)
            .await?;
        info!(days = settled.days, "Leave rejected");
        Ok(settled)
    }

    /// Owners cancel their own pending requests; HR/Admin may cancel any.
    #[instrument(name = "leave_cancel", skip(self, now))]
    pub async fn cancel_leave(
        &self,
        actor: Actor,
        request_id: u64,
        now: NaiveDateTime,
    ) -> LedgerResult<LeaveRequest> {
        let request = self.store.get_leave_request(request_id).await?;
        // answer like a missing id so other employees' requests stay hidden
        if request.employee_id != actor.user_id && !actor.role.is_manager() {
            return Err(LedgerError::NotFound(NOT_FOUND_OR_PROCESSED.into()));
        }
        let settled = self
            .store
            .settle_leave_request(request_id, &LeaveDecision::Cancel { by: actor.user_id }, now)
            .await?;
        info!(days = settled.days, "Leave cancelled");
        Ok(settled)
    }

    pub async fn get_leave(&self, actor: Actor, request_id: u64) -> LedgerResult<LeaveRequest> {
        let request = self
            .store
            .get_leave_request(request_id)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => LedgerError::NotFound("Leave request not found".into()),
                other => LedgerError::Store(other),
            })?;
        // employees only see their own requests; hide the others' existence
        if request.employee_id != actor.user_id && !actor.role.is_manager() {
            return Err(LedgerError::NotFound("Leave request not found".into()));
        }
        Ok(request)
    }

    /// Employees are always restricted to their own requests.
    pub async fn list_leave(
        &self,
        actor: Actor,
        mut filter: LeaveFilter,
        page: Page,
    ) -> LedgerResult<Paged<LeaveRequest>> {
        if !actor.role.is_manager() {
            filter.employee_id = Some(actor.user_id);
        }
        self.store
            .list_leave_requests(&filter, page)
            .await
            .map_err(LedgerError::Store)
    }

    pub async fn balances(
        &self,
        actor: Actor,
        user_id: u64,
        year: i32,
    ) -> LedgerResult<Vec<BalanceView>> {
        if user_id != actor.user_id && !actor.role.is_manager() {
            return Err(LedgerError::Forbidden(
                "You can only view your own leave balance".into(),
            ));
        }
        let balances = self
            .store
            .list_leave_balances(user_id, year)
            .await
            .map_err(LedgerError::Store)?;
        Ok(balances.into_iter().map(BalanceView::from).collect())
    }

    fn require_manager(&self, actor: Actor) -> LedgerResult<()> {
        if actor.role.is_manager() {
            Ok(())
        } else {
            Err(LedgerError::Forbidden("HR/Admin only".into()))
        }
    }

    async fn require_not_own(&self, actor: Actor, request_id: u64) -> LedgerResult<()> {
        let request = self.store.get_leave_request(request_id).await?;
        if request.employee_id == actor.user_id {
            return Err(LedgerError::Forbidden(
                "You cannot decide on your own leave request".into(),
            ));
        }
        Ok(())
    }
}
