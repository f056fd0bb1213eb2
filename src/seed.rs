//! Demo data. Every write is an upsert on a unique key, so running the
//! routine again leaves the row counts unchanged.
use crate::auth::password::hash_password;
use crate::model::announcement::NewAnnouncement;
use crate::model::holiday::{HolidayType, NewHoliday};
use crate::model::leave::{BalanceKey, LeaveType};
use crate::model::role::Role;
use crate::model::user::NewUser;
use crate::store::{CalendarStore, DirectoryStore, HrStore, LeaveStore, TableCounts};
use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use std::collections::HashMap;
use strum::IntoEnumIterator;
use tracing::info;

pub const DEFAULT_SEED_PASSWORD: &str = "Password@123";

const DEPARTMENTS: &[(&str, &str)] = &[
    ("Engineering", "Product development and platform"),
    ("Human Resources", "People operations, hiring and policy"),
    ("Finance", "Accounting, payroll and budgeting"),
    ("Sales", "Customer acquisition and accounts"),
    ("Operations", "Facilities, IT and administration"),
];

const DESIGNATIONS: &[(&str, i32)] = &[
    ("Intern", 1),
    ("Software Engineer", 2),
    ("Senior Software Engineer", 3),
    ("HR Executive", 2),
    ("HR Manager", 4),
    ("Director", 5),
];

struct DemoUser {
    code: &'static str,
    name: &'static str,
    email: &'static str,
    role: Role,
    department: &'static str,
    designation: &'static str,
    joined: (i32, u32, u32),
}

const USERS: &[DemoUser] = &[
    DemoUser {
        code: "ADM-001",
        name: "Anita Desai",
        email: "admin@hrm.local",
        role: Role::Admin,
        department: "Operations",
        designation: "Director",
        joined: (2020, 1, 6),
    },
    DemoUser {
        code: "HR-001",
        name: "Kavya Nair",
        email: "hr@hrm.local",
        role: Role::Hr,
        department: "Human Resources",
        designation: "HR Manager",
        joined: (2021, 3, 1),
    },
    DemoUser {
        code: "EMP-001",
        name: "Priya Sharma",
        email: "priya@hrm.local",
        role: Role::Employee,
        department: "Engineering",
        designation: "Senior Software Engineer",
        joined: (2022, 7, 18),
    },
    DemoUser {
        code: "EMP-002",
        name: "Arjun Mehta",
        email: "arjun@hrm.local",
        role: Role::Employee,
        department: "Sales",
        designation: "Software Engineer",
        joined: (2024, 4, 1),
    },
];

const HOLIDAYS: &[((u32, u32), &str, HolidayType)] = &[
    ((1, 1), "New Year's Day", HolidayType::Company),
    ((1, 26), "Republic Day", HolidayType::National),
    ((5, 1), "Labour Day", HolidayType::State),
    ((8, 15), "Independence Day", HolidayType::National),
    ((10, 2), "Gandhi Jayanti", HolidayType::National),
    ((12, 25), "Christmas Day", HolidayType::National),
];

const WELCOME_TITLE: &str = "Welcome to the HRM portal";
const WELCOME_BODY: &str = "Apply for leave, check your balances and mark attendance from the portal. \
Reach out to HR for anything that looks wrong.";

fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| anyhow!("invalid date {year}-{month:02}-{day:02}"))
}

/// Seed `store` with demo data for `year` and return the resulting counts.
pub async fn run_seed(store: &dyn HrStore, password: &str, year: i32) -> Result<TableCounts> {
    info!(backend = store.backend_name(), year, "Seeding database");

    let mut departments = HashMap::new();
    for (name, description) in DEPARTMENTS {
        let department = store
            .upsert_department(name, Some(*description))
            .await
            .with_context(|| format!("seeding department {name}"))?;
        departments.insert(*name, department.id);
    }
    info!(count = departments.len(), "Departments seeded");

    let mut designations = HashMap::new();
    for (title, level) in DESIGNATIONS {
        let designation = store
            .upsert_designation(title, *level)
            .await
            .with_context(|| format!("seeding designation {title}"))?;
        designations.insert(*title, designation.id);
    }
    info!(count = designations.len(), "Designations seeded");

    // one hash for every demo account; existing accounts keep theirs
    let password_hash =
        hash_password(password).map_err(|e| anyhow!("hashing seed password: {e}"))?;

    let mut user_ids = Vec::with_capacity(USERS.len());
    for demo in USERS {
        let (y, m, d) = demo.joined;
        let user = store
            .upsert_user(NewUser {
                employee_code: demo.code.to_string(),
                name: demo.name.to_string(),
                email: demo.email.to_string(),
                password_hash: password_hash.clone(),
                role: demo.role,
                department_id: departments.get(demo.department).copied(),
                designation_id: designations.get(demo.designation).copied(),
                phone: None,
                joined_on: date(y, m, d)?,
            })
            .await
            .with_context(|| format!("seeding user {}", demo.email))?;
        user_ids.push(user.id);
    }
    info!(count = user_ids.len(), "Users seeded");

    for user_id in &user_ids {
        for leave_type in LeaveType::iter() {
            let key = BalanceKey {
                user_id: *user_id,
                leave_type,
                year,
            };
            store
                .upsert_leave_balance(key, leave_type.default_allocation())
                .await
                .with_context(|| format!("seeding {leave_type} balance of user {user_id}"))?;
        }
    }
    info!(year, "Leave balances seeded");

    for ((month, day), name, holiday_type) in HOLIDAYS {
        store
            .upsert_holiday(NewHoliday {
                date: date(year, *month, *day)?,
                name: name.to_string(),
                holiday_type: *holiday_type,
            })
            .await
            .with_context(|| format!("seeding holiday {name}"))?;
    }
    info!(count = HOLIDAYS.len(), "Holidays seeded");

    store
        .upsert_announcement(NewAnnouncement {
            title: WELCOME_TITLE.to_string(),
            body: WELCOME_BODY.to_string(),
            created_by: user_ids.first().copied(),
        })
        .await
        .context("seeding welcome announcement")?;

    let counts = store.table_counts().await.context("counting rows")?;
    info!(?counts, "Seed complete");
    Ok(counts)
}
