//! One-shot: apply migrations, then upsert the demo data set.
use anyhow::Context;
use chrono::{Datelike, Local};
use hrm_portal::config::Config;
use hrm_portal::db::{init_db, run_migrations};
use hrm_portal::seed::{DEFAULT_SEED_PASSWORD, run_seed};
use hrm_portal::store::mysql::MySqlStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let pool = init_db(&config.database_url, config.db_max_connections).await?;
    run_migrations(&pool).await?;

    let password =
        std::env::var("SEED_PASSWORD").unwrap_or_else(|_| DEFAULT_SEED_PASSWORD.to_string());
    let store = MySqlStore::new(pool);
    let year = Local::now().year();

    let counts = run_seed(&store, &password, year)
        .await
        .context("Seeding failed")?;

    info!(
        departments = counts.departments,
        designations = counts.designations,
        users = counts.users,
        leave_balances = counts.leave_balances,
        leave_requests = counts.leave_requests,
        holidays = counts.holidays,
        announcements = counts.announcements,
        "Row counts after seeding"
    );
    Ok(())
}
