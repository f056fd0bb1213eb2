use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    Casual,
    Sick,
    Earned,
}

impl LeaveType {
    /// Days allocated per year when an account is created or seeded.
    pub fn default_allocation(&self) -> i32 {
        match self {
            LeaveType::Casual => 12,
            LeaveType::Sick => 10,
            LeaveType::Earned => 15,
        }
    }
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    /// `pending` is the only state a request can leave.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LeaveStatus::Pending)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": 1,
    "employeeId": 3,
    "leaveType": "casual",
    "startDate": "2026-03-02",
    "endDate": "2026-03-04",
    "days": 3,
    "reason": "Family function",
    "status": "pending",
    "appliedAt": "2026-02-20T10:15:00",
    "approvedBy": null,
    "rejectReason": null,
    "decidedAt": null
}))]
pub struct LeaveRequest {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type: LeaveType,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub days: i32,
    pub reason: String,
    pub status: LeaveStatus,
    #[schema(value_type = String, format = "date-time")]
    pub applied_at: NaiveDateTime,
    pub approved_by: Option<u64>,
    pub reject_reason: Option<String>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub decided_at: Option<NaiveDateTime>,
}

impl LeaveRequest {
    pub fn balance_key(&self) -> BalanceKey {
        BalanceKey {
            user_id: self.employee_id,
            leave_type: self.leave_type,
            year: chrono::Datelike::year(&self.start_date),
        }
    }

    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && start <= self.end_date
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleError {
    NotPending(LeaveStatus),
    Balance(BalanceError),
}

impl LeaveRequest {
    /// Apply `decision` to this request and the balance holding its days.
    /// Neither is modified when an error is returned.
    pub fn settle(
        &mut self,
        balance: &mut LeaveBalance,
        decision: &LeaveDecision,
        now: NaiveDateTime,
    ) -> Result<(), SettleError> {
        if self.status.is_terminal() {
            return Err(SettleError::NotPending(self.status));
        }
        match decision {
            LeaveDecision::Approve { by } => {
                balance.commit(self.days).map_err(SettleError::Balance)?;
                self.approved_by = Some(*by);
            }
            LeaveDecision::Reject { by, reason } => {
                balance.release(self.days).map_err(SettleError::Balance)?;
                self.approved_by = Some(*by);
                self.reject_reason = Some(reason.clone());
            }
            LeaveDecision::Cancel { .. } => {
                balance.release(self.days).map_err(SettleError::Balance)?;
            }
        }
        self.status = decision.target_status();
        self.decided_at = Some(now);
        Ok(())
    }
}

/// A validated application, ready to be stored together with its hold.
#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: i32,
    pub reason: String,
    pub applied_at: NaiveDateTime,
}

impl NewLeaveRequest {
    pub fn balance_key(&self) -> BalanceKey {
        BalanceKey {
            user_id: self.employee_id,
            leave_type: self.leave_type,
            year: chrono::Datelike::year(&self.start_date),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BalanceKey {
    pub user_id: u64,
    pub leave_type: LeaveType,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveBalance {
    pub user_id: u64,
    pub leave_type: LeaveType,
    pub year: i32,
    pub total_days: i32,
    pub used_days: i32,
    pub pending_days: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum BalanceError {
    #[display(
        fmt = "insufficient leave balance: requested {} day(s), {} available",
        requested,
        available
    )]
    Insufficient { requested: i32, available: i32 },
    /// The balance does not carry the hold being released or committed.
    #[display(fmt = "balance holds {} pending day(s), cannot settle {}", pending, days)]
    HoldMissing { days: i32, pending: i32 },
}

impl std::error::Error for BalanceError {}

impl LeaveBalance {
    pub fn empty(key: BalanceKey) -> Self {
        Self {
            user_id: key.user_id,
            leave_type: key.leave_type,
            year: key.year,
            total_days: 0,
            used_days: 0,
            pending_days: 0,
        }
    }

    pub fn key(&self) -> BalanceKey {
        BalanceKey {
            user_id: self.user_id,
            leave_type: self.leave_type,
            year: self.year,
        }
    }

    /// `total - used - pending`.
    pub fn remaining(&self) -> i32 {
        self.total_days - self.used_days - self.pending_days
    }

    /// Reserve `days` for a pending request.
    pub fn hold(&mut self, days: i32) -> Result<(), BalanceError> {
        let available = self.remaining();
        if days > available {
            return Err(BalanceError::Insufficient {
                requested: days,
                available,
            });
        }
        self.pending_days += days;
        Ok(())
    }

    /// Move a hold from pending to used.
    pub fn commit(&mut self, days: i32) -> Result<(), BalanceError> {
        self.take_hold(days)?;
        self.used_days += days;
        Ok(())
    }

    /// Give a hold back to the available balance.
    pub fn release(&mut self, days: i32) -> Result<(), BalanceError> {
        self.take_hold(days)
    }

    fn take_hold(&mut self, days: i32) -> Result<(), BalanceError> {
        if days > self.pending_days {
            return Err(BalanceError::HoldMissing {
                days,
                pending: self.pending_days,
            });
        }
        self.pending_days -= days;
        Ok(())
    }
}

/// Balance as returned by the API, with the derived remaining days.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "userId": 3,
    "leaveType": "casual",
    "year": 2026,
    "totalDays": 12,
    "usedDays": 5,
    "pendingDays": 0,
    "remaining": 7
}))]
pub struct BalanceView {
    pub user_id: u64,
    pub leave_type: LeaveType,
    pub year: i32,
    pub total_days: i32,
    pub used_days: i32,
    pub pending_days: i32,
    pub remaining: i32,
}

impl From<LeaveBalance> for BalanceView {
    fn from(b: LeaveBalance) -> Self {
        Self {
            remaining: b.remaining(),
            user_id: b.user_id,
            leave_type: b.leave_type,
            year: b.year,
            total_days: b.total_days,
            used_days: b.used_days,
            pending_days: b.pending_days,
        }
    }
}

/// HR/Admin or owner decision on a pending request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveDecision {
    Approve { by: u64 },
    Reject { by: u64, reason: String },
    Cancel { by: u64 },
}

impl LeaveDecision {
    pub fn target_status(&self) -> LeaveStatus {
        match self {
            LeaveDecision::Approve { .. } => LeaveStatus::Approved,
            LeaveDecision::Reject { .. } => LeaveStatus::Rejected,
            LeaveDecision::Cancel { .. } => LeaveStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LeaveFilter {
    pub employee_id: Option<u64>,
    pub status: Option<LeaveStatus>,
    pub leave_type: Option<LeaveType>,
    /// Matches on the year of `start_date`.
    pub year: Option<i32>,
}

impl LeaveFilter {
    pub fn matches(&self, req: &LeaveRequest) -> bool {
        self.employee_id.is_none_or(|id| req.employee_id == id)
            && self.status.is_none_or(|s| req.status == s)
            && self.leave_type.is_none_or(|t| req.leave_type == t)
            && self
                .year
                .is_none_or(|y| chrono::Datelike::year(&req.start_date) == y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn casual(total: i32, used: i32, pending: i32) -> LeaveBalance {
        LeaveBalance {
            user_id: 7,
            leave_type: LeaveType::Casual,
            year: 2026,
            total_days: total,
            used_days: used,
            pending_days: pending,
        }
    }

    #[test]
    fn hold_then_commit_moves_days_to_used() {
        let mut b = casual(12, 2, 0);
        b.hold(3).unwrap();
        assert_eq!((b.used_days, b.pending_days, b.remaining()), (2, 3, 7));
        b.commit(3).unwrap();
        assert_eq!((b.used_days, b.pending_days, b.remaining()), (5, 0, 7));
    }

    #[test]
    fn hold_beyond_remaining_leaves_balance_untouched() {
        let mut b = casual(12, 10, 1);
        let err = b.hold(2).unwrap_err();
        assert_eq!(
            err,
            BalanceError::Insufficient {
                requested: 2,
                available: 1
            }
        );
        assert_eq!(b, casual(12, 10, 1));
    }

    #[test]
    fn hold_of_exact_remaining_is_allowed() {
        let mut b = casual(12, 10, 0);
        b.hold(2).unwrap();
        assert_eq!(b.remaining(), 0);
    }

    #[test]
    fn release_restores_pending_exactly() {
        let mut b = casual(12, 0, 4);
        b.hold(3).unwrap();
        b.release(3).unwrap();
        assert_eq!(b.pending_days, 4);
    }

    #[test]
    fn settling_more_than_held_fails() {
        let mut b = casual(12, 0, 1);
        assert!(matches!(b.commit(2), Err(BalanceError::HoldMissing { .. })));
        assert_eq!(b.used_days, 0);
    }

    #[test]
    fn balance_errors_describe_the_shortfall() {
        let short = BalanceError::Insufficient {
            requested: 11,
            available: 10,
        };
        assert_eq!(
            short.to_string(),
            "insufficient leave balance: requested 11 day(s), 10 available"
        );
        let missing = BalanceError::HoldMissing {
            days: 3,
            pending: 1,
        };
        assert_eq!(
            missing.to_string(),
            "balance holds 1 pending day(s), cannot settle 3"
        );
    }

    fn pending_request(days: i32) -> LeaveRequest {
        let start = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        LeaveRequest {
            id: 1,
            employee_id: 7,
            leave_type: LeaveType::Casual,
            start_date: start,
            end_date: start + chrono::Duration::days(i64::from(days) - 1),
            days,
            reason: "trip".into(),
            status: LeaveStatus::Pending,
            applied_at: start.and_hms_opt(9, 0, 0).unwrap(),
            approved_by: None,
            reject_reason: None,
            decided_at: None,
        }
    }

    #[test]
    fn settle_approve_commits_and_records_approver() {
        let mut req = pending_request(3);
        let mut b = casual(12, 2, 3);
        let now = req.applied_at;
        req.settle(&mut b, &LeaveDecision::Approve { by: 2 }, now)
            .unwrap();
        assert_eq!(req.status, LeaveStatus::Approved);
        assert_eq!(req.approved_by, Some(2));
        assert_eq!((b.used_days, b.pending_days), (5, 0));
    }

    #[test]
    fn settle_twice_is_refused_without_touching_balance() {
        let mut req = pending_request(3);
        let mut b = casual(12, 2, 3);
        let now = req.applied_at;
        req.settle(&mut b, &LeaveDecision::Approve { by: 2 }, now)
            .unwrap();
        let err = req
            .settle(&mut b, &LeaveDecision::Approve { by: 2 }, now)
            .unwrap_err();
        assert_eq!(err, SettleError::NotPending(LeaveStatus::Approved));
        assert_eq!((b.used_days, b.pending_days), (5, 0));
    }

    #[test]
    fn settle_reject_stores_reason_and_releases() {
        let mut req = pending_request(2);
        let mut b = casual(12, 0, 2);
        let now = req.applied_at;
        let decision = LeaveDecision::Reject {
            by: 2,
            reason: "Quarter close".into(),
        };
        req.settle(&mut b, &decision, now).unwrap();
        assert_eq!(req.status, LeaveStatus::Rejected);
        assert_eq!(req.reject_reason.as_deref(), Some("Quarter close"));
        assert_eq!(b.pending_days, 0);
        assert_eq!(b.remaining(), 12);
    }

    #[test]
    fn only_pending_is_open() {
        assert!(!LeaveStatus::Pending.is_terminal());
        assert!(LeaveStatus::Approved.is_terminal());
        assert!(LeaveStatus::Rejected.is_terminal());
        assert!(LeaveStatus::Cancelled.is_terminal());
    }
}
