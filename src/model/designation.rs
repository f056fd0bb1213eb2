use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Designation {
    #[schema(example = 3)]
    pub id: u64,
    #[schema(example = "Senior Software Engineer")]
    pub title: String,
    /// Seniority band, 1 being the most junior.
    #[schema(example = 3)]
    pub level: i32,
}
