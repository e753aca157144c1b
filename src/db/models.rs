use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

/// A cloud upload job id recorded for a user
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserUploadJobRow {
    pub id: i32,
    pub user_id: i32,
    pub job_id: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
