use chrono::{Local, NaiveDate};
use hrm_portal::auth::password::verify_password;
use hrm_portal::ledger::calendar::WorkCalendar;
use hrm_portal::ledger::{LeaveApplication, LeaveLedger};
use hrm_portal::config::DayCountPolicy;
use hrm_portal::model::leave::{BalanceKey, LeaveType};
use hrm_portal::model::role::Role;
use hrm_portal::seed::{DEFAULT_SEED_PASSWORD, run_seed};
use hrm_portal::store::memory::InMemoryStore;
use hrm_portal::store::{DirectoryStore, HrStore, LeaveStore, TableCounts};
use std::sync::Arc;

const YEAR: i32 = 2026;

#[actix_web::test]
async fn seeding_twice_yields_identical_counts() {
    let store = InMemoryStore::new();

    let first = run_seed(&store, DEFAULT_SEED_PASSWORD, YEAR).await.unwrap();
    assert_eq!(
        first,
        TableCounts {
            departments: 5,
            designations: 6,
            users: 4,
            leave_balances: 12,
            leave_requests: 0,
            holidays: 6,
            announcements: 1,
        }
    );

    let second = run_seed(&store, DEFAULT_SEED_PASSWORD, YEAR).await.unwrap();
    assert_eq!(first, second);
}

#[actix_web::test]
async fn seeded_users_have_roles_and_allocations() {
    let store = InMemoryStore::new();
    run_seed(&store, DEFAULT_SEED_PASSWORD, YEAR).await.unwrap();

    let admin = store
        .find_user_by_email("admin@hrm.local")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(admin.role, Role::Admin);
    assert!(admin.department_id.is_some());
    verify_password(DEFAULT_SEED_PASSWORD, &admin.password_hash).unwrap();

    let hr = store.find_user_by_email("hr@hrm.local").await.unwrap().unwrap();
    assert_eq!(hr.role, Role::Hr);

    let balances = store.list_leave_balances(admin.id, YEAR).await.unwrap();
    let mut totals: Vec<(LeaveType, i32)> = balances
        .iter()
        .map(|b| (b.leave_type, b.total_days))
        .collect();
    totals.sort_by_key(|(t, _)| t.to_string());
    assert_eq!(
        totals,
        vec![
            (LeaveType::Casual, 12),
            (LeaveType::Earned, 15),
            (LeaveType::Sick, 10)
        ]
    );
}

#[actix_web::test]
async fn reseeding_keeps_passwords_and_balance_usage() {
    let store: Arc<dyn HrStore> = Arc::new(InMemoryStore::new());
    run_seed(store.as_ref(), DEFAULT_SEED_PASSWORD, YEAR)
        .await
        .unwrap();

    let priya = store
        .find_user_by_email("priya@hrm.local")
        .await
        .unwrap()
        .unwrap();
    let calendar = Arc::new(WorkCalendar::new(store.clone(), DayCountPolicy::Calendar));
    let ledger = LeaveLedger::new(store.clone(), calendar);
    ledger
        .apply_leave(
            priya.id,
            LeaveApplication {
                leave_type: LeaveType::Sick,
                start_date: NaiveDate::from_ymd_opt(YEAR, 2, 9).unwrap(),
                end_date: NaiveDate::from_ymd_opt(YEAR, 2, 10).unwrap(),
                reason: "Fever".to_string(),
            },
            Local::now().naive_local(),
        )
        .await
        .unwrap();

    let counts = run_seed(store.as_ref(), "Another@Password1", YEAR)
        .await
        .unwrap();
    assert_eq!(counts.users, 4);
    assert_eq!(counts.leave_requests, 1);

    let priya = store.get_user(priya.id).await.unwrap();
    verify_password(DEFAULT_SEED_PASSWORD, &priya.password_hash).unwrap();

    let sick = store
        .get_leave_balance(BalanceKey {
            user_id: priya.id,
            leave_type: LeaveType::Sick,
            year: YEAR,
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!((sick.total_days, sick.pending_days), (10, 2));
}
