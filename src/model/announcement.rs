use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: u64,
    #[schema(example = "Welcome to the HRM portal")]
    pub title: String,
    pub body: String,
    #[schema(nullable = true)]
    pub created_by: Option<u64>,
    #[schema(example = "2026-01-01T09:00:00", value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewAnnouncement {
    pub title: String,
    pub body: String,
    pub created_by: Option<u64>,
}
