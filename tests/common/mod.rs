#![allow(dead_code)]

use chrono::{Datelike, Local, NaiveTime};
use hrm_portal::auth::jwt::generate_access_token;
use hrm_portal::config::{Config, DayCountPolicy};
use hrm_portal::model::user::User;
use hrm_portal::seed::{DEFAULT_SEED_PASSWORD, run_seed};
use hrm_portal::state::AppState;
use hrm_portal::store::DirectoryStore;
use hrm_portal::store::memory::InMemoryStore;
use std::sync::Arc;

pub const JWT_SECRET: &str = "integration-test-secret";

pub fn test_config() -> Config {
    Config {
        database_url: "mysql://unused".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        server_addr: "127.0.0.1:0".to_string(),
        access_token_ttl: 900,
        refresh_token_ttl: 3600,
        db_max_connections: 1,
        rate_login_per_min: 1000,
        rate_refresh_per_min: 1000,
        rate_protected_per_min: 10_000,
        api_prefix: "/api".to_string(),
        leave_day_count: DayCountPolicy::Calendar,
        office_start: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
        ai_service_url: None,
        ai_timeout_secs: 1,
        log_dir: "logs".to_string(),
    }
}

pub struct Seeded {
    pub state: AppState,
    pub config: Config,
    pub admin: User,
    pub hr: User,
    pub priya: User,
    pub arjun: User,
}

impl Seeded {
    pub fn token(&self, user: &User) -> String {
        generate_access_token(user.id, &user.email, user.role, JWT_SECRET, 900).unwrap()
    }
}

pub fn this_year() -> i32 {
    Local::now().year()
}

/// In-memory store seeded with the demo data set for the current year.
pub async fn seeded() -> Seeded {
    let store = Arc::new(InMemoryStore::new());
    run_seed(store.as_ref(), DEFAULT_SEED_PASSWORD, this_year())
        .await
        .unwrap();

    let user = |email: &'static str| {
        let store = store.clone();
        async move { store.find_user_by_email(email).await.unwrap().unwrap() }
    };
    let admin = user("admin@hrm.local").await;
    let hr = user("hr@hrm.local").await;
    let priya = user("priya@hrm.local").await;
    let arjun = user("arjun@hrm.local").await;

    let config = test_config();
    let state = AppState::new(store, config.clone()).unwrap();
    Seeded {
        state,
        config,
        admin,
        hr,
        priya,
        arjun,
    }
}

/// Builds the full application around `$seeded` the way `main` does.
#[macro_export]
macro_rules! test_app {
    ($seeded:expr) => {{
        let state = $seeded.state.clone();
        let config = $seeded.config.clone();
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new(state))
                .configure(hrm_portal::api::extractor_config)
                .configure(move |cfg| hrm_portal::routes::configure(cfg, &config)),
        )
        .await
    }};
}

/// A request from a fixed peer address; the rate limiter keys on it.
pub fn request(method: actix_web::http::Method, uri: &str, token: Option<&str>) -> actix_web::test::TestRequest {
    let mut req = actix_web::test::TestRequest::default()
        .method(method)
        .uri(uri)
        .peer_addr("127.0.0.1:40000".parse().unwrap());
    if let Some(token) = token {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    req
}

/// Sends a `TestRequest` through `$app`; yields `(status, json body)`.
#[macro_export]
macro_rules! call {
    ($app:expr, $req:expr) => {{
        let resp = actix_web::test::call_service(&$app, $req.to_request()).await;
        let status = resp.status();
        let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
        (status, body)
    }};
}
