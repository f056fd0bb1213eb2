use chrono::{NaiveDate, NaiveDateTime};
use hrm_portal::config::DayCountPolicy;
use hrm_portal::ledger::calendar::WorkCalendar;
use hrm_portal::ledger::{Actor, LeaveApplication, LeaveLedger, LedgerError};
use hrm_portal::model::holiday::{HolidayType, NewHoliday};
use hrm_portal::model::leave::{BalanceKey, LeaveBalance, LeaveFilter, LeaveStatus, LeaveType};
use hrm_portal::model::role::Role;
use hrm_portal::store::memory::InMemoryStore;
use hrm_portal::store::{CalendarStore, HrStore, LeaveStore, Page};
use std::sync::Arc;

const EMPLOYEE: Actor = Actor {
    user_id: 3,
    role: Role::Employee,
};
const COLLEAGUE: Actor = Actor {
    user_id: 4,
    role: Role::Employee,
};
const HR: Actor = Actor {
    user_id: 2,
    role: Role::Hr,
};

fn day(month: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, month, d).unwrap()
}

fn now() -> NaiveDateTime {
    day(1, 5).and_hms_opt(10, 0, 0).unwrap()
}

fn casual_key(user_id: u64) -> BalanceKey {
    BalanceKey {
        user_id,
        leave_type: LeaveType::Casual,
        year: 2026,
    }
}

fn application(start: NaiveDate, end: NaiveDate) -> LeaveApplication {
    LeaveApplication {
        leave_type: LeaveType::Casual,
        start_date: start,
        end_date: end,
        reason: "Personal work".to_string(),
    }
}

async fn setup(policy: DayCountPolicy) -> (Arc<dyn HrStore>, LeaveLedger) {
    let store: Arc<dyn HrStore> = Arc::new(InMemoryStore::new());
    let calendar = Arc::new(WorkCalendar::new(store.clone(), policy));
    (store.clone(), LeaveLedger::new(store, calendar))
}

async fn balance(store: &Arc<dyn HrStore>, key: BalanceKey) -> LeaveBalance {
    store.get_leave_balance(key).await.unwrap().unwrap()
}

fn assert_consistent(b: &LeaveBalance) {
    assert!(b.used_days >= 0 && b.pending_days >= 0, "{b:?}");
    assert!(b.remaining() >= 0, "{b:?}");
    assert_eq!(b.total_days, b.used_days + b.pending_days + b.remaining());
}

#[actix_web::test]
async fn apply_then_approve_moves_days_from_pending_to_used() {
    let (store, ledger) = setup(DayCountPolicy::Calendar).await;
    let key = casual_key(EMPLOYEE.user_id);
    store.upsert_leave_balance(key, 12).await.unwrap();

    // two days already taken earlier in the year
    let earlier = ledger
        .apply_leave(EMPLOYEE.user_id, application(day(1, 12), day(1, 13)), now())
        .await
        .unwrap();
    ledger.approve_leave(HR, earlier.id, now()).await.unwrap();
    let b = balance(&store, key).await;
    assert_eq!((b.total_days, b.used_days, b.pending_days), (12, 2, 0));

    let request = ledger
        .apply_leave(EMPLOYEE.user_id, application(day(3, 2), day(3, 4)), now())
        .await
        .unwrap();
    assert_eq!(request.days, 3);
    assert_eq!(request.status, LeaveStatus::Pending);
    let b = balance(&store, key).await;
    assert_eq!((b.used_days, b.pending_days), (2, 3));
    assert_consistent(&b);

    let approved = ledger.approve_leave(HR, request.id, now()).await.unwrap();
    assert_eq!(approved.status, LeaveStatus::Approved);
    assert_eq!(approved.approved_by, Some(HR.user_id));
    let b = balance(&store, key).await;
    assert_eq!((b.used_days, b.pending_days, b.remaining()), (5, 0, 7));
    assert_consistent(&b);
}

#[actix_web::test]
async fn over_balance_application_is_refused_without_side_effects() {
    let (store, ledger) = setup(DayCountPolicy::Calendar).await;
    let key = casual_key(EMPLOYEE.user_id);
    store.upsert_leave_balance(key, 2).await.unwrap();

    let err = ledger
        .apply_leave(EMPLOYEE.user_id, application(day(2, 2), day(2, 4)), now())
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            LedgerError::InsufficientBalance {
                requested: 3,
                available: 2
            }
        ),
        "{err:?}"
    );

    let b = balance(&store, key).await;
    assert_eq!((b.used_days, b.pending_days), (0, 0));
    let listed = store
        .list_leave_requests(&LeaveFilter::default(), Page::default())
        .await
        .unwrap();
    assert_eq!(listed.total, 0);
}

#[actix_web::test]
async fn missing_balance_counts_as_zero() {
    let (_store, ledger) = setup(DayCountPolicy::Calendar).await;
    let err = ledger
        .apply_leave(EMPLOYEE.user_id, application(day(2, 2), day(2, 2)), now())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InsufficientBalance {
            requested: 1,
            available: 0
        }
    ));
}

#[actix_web::test]
async fn second_approval_is_not_found_and_does_not_double_count() {
    let (store, ledger) = setup(DayCountPolicy::Calendar).await;
    let key = casual_key(EMPLOYEE.user_id);
    store.upsert_leave_balance(key, 12).await.unwrap();

    let request = ledger
        .apply_leave(EMPLOYEE.user_id, application(day(4, 6), day(4, 7)), now())
        .await
        .unwrap();
    ledger.approve_leave(HR, request.id, now()).await.unwrap();

    let err = ledger.approve_leave(HR, request.id, now()).await.unwrap_err();
    match err {
        LedgerError::NotFound(message) => {
            assert_eq!(message, "Leave request not found or already processed")
        }
        other => panic!("expected NotFound, got {other:?}"),
    }

    let b = balance(&store, key).await;
    assert_eq!((b.used_days, b.pending_days), (2, 0));
}

#[actix_web::test]
async fn rejection_restores_pending_exactly() {
    let (store, ledger) = setup(DayCountPolicy::Calendar).await;
    let key = casual_key(EMPLOYEE.user_id);
    store.upsert_leave_balance(key, 12).await.unwrap();

    let kept = ledger
        .apply_leave(EMPLOYEE.user_id, application(day(5, 4), day(5, 5)), now())
        .await
        .unwrap();
    let before = balance(&store, key).await;

    let request = ledger
        .apply_leave(EMPLOYEE.user_id, application(day(6, 1), day(6, 4)), now())
        .await
        .unwrap();
    assert_eq!(balance(&store, key).await.pending_days, before.pending_days + 4);

    let rejected = ledger
        .reject_leave(HR, request.id, "Quarter close", now())
        .await
        .unwrap();
    assert_eq!(rejected.status, LeaveStatus::Rejected);
    assert_eq!(rejected.reject_reason.as_deref(), Some("Quarter close"));
    assert_eq!(balance(&store, key).await, before);

    // the other pending request is untouched
    let kept = store.get_leave_request(kept.id).await.unwrap();
    assert_eq!(kept.status, LeaveStatus::Pending);
}

#[actix_web::test]
async fn rejection_requires_a_reason() {
    let (store, ledger) = setup(DayCountPolicy::Calendar).await;
    store
        .upsert_leave_balance(casual_key(EMPLOYEE.user_id), 12)
        .await
        .unwrap();
    let request = ledger
        .apply_leave(EMPLOYEE.user_id, application(day(6, 1), day(6, 1)), now())
        .await
        .unwrap();

    let err = ledger
        .reject_leave(HR, request.id, "   ", now())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
}

#[actix_web::test]
async fn cancel_is_limited_to_owner_and_managers() {
    let (store, ledger) = setup(DayCountPolicy::Calendar).await;
    let key = casual_key(EMPLOYEE.user_id);
    store.upsert_leave_balance(key, 12).await.unwrap();
    let request = ledger
        .apply_leave(EMPLOYEE.user_id, application(day(7, 6), day(7, 8)), now())
        .await
        .unwrap();

    // a colleague gets the same answer as for an id that does not exist
    let err = ledger
        .cancel_leave(COLLEAGUE, request.id, now())
        .await
        .unwrap_err();
    let missing = ledger
        .cancel_leave(COLLEAGUE, request.id + 1000, now())
        .await
        .unwrap_err();
    match (&err, &missing) {
        (LedgerError::NotFound(a), LedgerError::NotFound(b)) => assert_eq!(a, b),
        other => panic!("expected NotFound twice, got {other:?}"),
    }
    assert_eq!(balance(&store, key).await.pending_days, 3);

    let cancelled = ledger.cancel_leave(EMPLOYEE, request.id, now()).await.unwrap();
    assert_eq!(cancelled.status, LeaveStatus::Cancelled);
    assert_eq!(balance(&store, key).await.pending_days, 0);

    // cancelled is terminal
    let err = ledger.approve_leave(HR, request.id, now()).await.unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)));
}

#[actix_web::test]
async fn managers_cannot_decide_their_own_requests() {
    let (store, ledger) = setup(DayCountPolicy::Calendar).await;
    store
        .upsert_leave_balance(casual_key(HR.user_id), 12)
        .await
        .unwrap();
    let own = ledger
        .apply_leave(HR.user_id, application(day(8, 3), day(8, 3)), now())
        .await
        .unwrap();

    let err = ledger.approve_leave(HR, own.id, now()).await.unwrap_err();
    assert!(matches!(err, LedgerError::Forbidden(_)));

    let err = ledger.approve_leave(EMPLOYEE, own.id, now()).await.unwrap_err();
    assert!(matches!(err, LedgerError::Forbidden(_)));
}

#[actix_web::test]
async fn invalid_applications_are_validation_errors() {
    let (store, ledger) = setup(DayCountPolicy::Calendar).await;
    store
        .upsert_leave_balance(casual_key(EMPLOYEE.user_id), 12)
        .await
        .unwrap();

    let reversed = ledger
        .apply_leave(EMPLOYEE.user_id, application(day(3, 5), day(3, 4)), now())
        .await
        .unwrap_err();
    assert!(matches!(reversed, LedgerError::Validation(_)));

    let across_years = ledger
        .apply_leave(
            EMPLOYEE.user_id,
            application(day(12, 30), NaiveDate::from_ymd_opt(2027, 1, 2).unwrap()),
            now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(across_years, LedgerError::Validation(_)));

    let mut blank = application(day(3, 2), day(3, 2));
    blank.reason = "  ".to_string();
    let blank = ledger
        .apply_leave(EMPLOYEE.user_id, blank, now())
        .await
        .unwrap_err();
    assert!(matches!(blank, LedgerError::Validation(_)));

    ledger
        .apply_leave(EMPLOYEE.user_id, application(day(3, 2), day(3, 4)), now())
        .await
        .unwrap();
    let overlap = ledger
        .apply_leave(EMPLOYEE.user_id, application(day(3, 4), day(3, 6)), now())
        .await
        .unwrap_err();
    assert!(matches!(overlap, LedgerError::Validation(_)));
}

#[actix_web::test]
async fn working_day_policy_skips_weekends_and_holidays() {
    let (store, ledger) = setup(DayCountPolicy::Working).await;
    store
        .upsert_leave_balance(casual_key(EMPLOYEE.user_id), 12)
        .await
        .unwrap();

    // Mon 2 March .. Sun 8 March
    assert_eq!(
        ledger.calendar().count_days(day(3, 2), day(3, 8)).await.unwrap(),
        5
    );

    store
        .upsert_holiday(NewHoliday {
            date: day(3, 4),
            name: "Holi".to_string(),
            holiday_type: HolidayType::National,
        })
        .await
        .unwrap();
    ledger.calendar().invalidate_year(2026).await;

    let request = ledger
        .apply_leave(EMPLOYEE.user_id, application(day(3, 2), day(3, 8)), now())
        .await
        .unwrap();
    assert_eq!(request.days, 4);

    // a weekend-only range holds nothing
    let err = ledger
        .apply_leave(EMPLOYEE.user_id, application(day(3, 14), day(3, 15)), now())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
}

#[actix_web::test]
async fn balance_matches_request_history_after_mixed_operations() {
    let (store, ledger) = setup(DayCountPolicy::Calendar).await;
    let key = casual_key(EMPLOYEE.user_id);
    store.upsert_leave_balance(key, 12).await.unwrap();

    let mut ids = Vec::new();
    for (i, month) in (1..=6).enumerate() {
        let len = (i as u32 % 3) + 1;
        match ledger
            .apply_leave(EMPLOYEE.user_id, application(day(month, 10), day(month, 9 + len)), now())
            .await
        {
            Ok(r) => ids.push(r.id),
            Err(LedgerError::InsufficientBalance { .. }) => {}
            Err(e) => panic!("unexpected {e:?}"),
        }
        assert_consistent(&balance(&store, key).await);
    }

    for (i, id) in ids.iter().enumerate() {
        let decided = match i % 3 {
            0 => ledger.approve_leave(HR, *id, now()).await,
            1 => ledger.reject_leave(HR, *id, "Busy", now()).await,
            _ => ledger.cancel_leave(EMPLOYEE, *id, now()).await,
        };
        assert!(decided.is_ok(), "decision on {id} failed: {decided:?}");
        // repeat decisions must fail and change nothing
        assert!(ledger.approve_leave(HR, *id, now()).await.is_err());
        assert_consistent(&balance(&store, key).await);
    }

    let all = store
        .list_leave_requests(&LeaveFilter::default(), Page::new(Some(1), Some(100)))
        .await
        .unwrap()
        .items;
    let sum = |status: LeaveStatus| -> i32 {
        all.iter()
            .filter(|r| r.status == status)
            .map(|r| r.days)
            .sum()
    };
    let b = balance(&store, key).await;
    assert_eq!(b.used_days, sum(LeaveStatus::Approved));
    assert_eq!(b.pending_days, sum(LeaveStatus::Pending));
    assert_consistent(&b);
}

#[actix_web::test]
async fn employees_only_list_and_see_their_own_requests() {
    let (store, ledger) = setup(DayCountPolicy::Calendar).await;
    for actor in [EMPLOYEE, COLLEAGUE] {
        store
            .upsert_leave_balance(casual_key(actor.user_id), 12)
            .await
            .unwrap();
    }
    let mine = ledger
        .apply_leave(EMPLOYEE.user_id, application(day(9, 1), day(9, 1)), now())
        .await
        .unwrap();
    let theirs = ledger
        .apply_leave(COLLEAGUE.user_id, application(day(9, 1), day(9, 2)), now())
        .await
        .unwrap();

    let filter = LeaveFilter {
        employee_id: Some(COLLEAGUE.user_id),
        ..LeaveFilter::default()
    };
    let listed = ledger
        .list_leave(EMPLOYEE, filter, Page::default())
        .await
        .unwrap();
    assert_eq!(listed.total, 1);
    assert_eq!(listed.items[0].id, mine.id);

    let all = ledger
        .list_leave(HR, LeaveFilter::default(), Page::default())
        .await
        .unwrap();
    assert_eq!(all.total, 2);

    assert!(matches!(
        ledger.get_leave(EMPLOYEE, theirs.id).await,
        Err(LedgerError::NotFound(_))
    ));
    assert!(ledger.get_leave(HR, theirs.id).await.is_ok());

    assert!(matches!(
        ledger.balances(EMPLOYEE, COLLEAGUE.user_id, 2026).await,
        Err(LedgerError::Forbidden(_))
    ));
    let views = ledger.balances(HR, COLLEAGUE.user_id, 2026).await.unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].remaining, 10);
}
