use sqlx::{Pool, Postgres};
use tracing::debug;

use crate::db::models::UserUploadJobRow;
use crate::upload_job::UploadJobOwner;

/// Repository for the cloud upload job ids owned by users
pub struct UserUploadJobRepository;

impl UserUploadJobRepository {
    /// Record `job_id` as owned by `user_id` and return the stored row
    pub async fn create(
        pool: &Pool<Postgres>,
        user_id: i32,
        job_id: &str,
    ) -> Result<UserUploadJobRow, sqlx::Error> {
        debug!("Recording cloud upload job: user_id={}, job_id={}", user_id, job_id);

        let row = sqlx::query_as::<_, UserUploadJobRow>(
            r#"
            INSERT INTO cloud_user_upload_jobs (user_id, job_id)
            VALUES ($1, $2)
            RETURNING id, user_id, job_id, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(job_id)
        .fetch_one(pool)
        .await?;

        debug!("Cloud upload job recorded with id={}", row.id);
        Ok(row)
    }

    /// Job ids of `user_id`, oldest first
    pub async fn job_ids_for_user(
        pool: &Pool<Postgres>,
        user_id: i32,
    ) -> Result<Vec<String>, sqlx::Error> {
        let job_ids = sqlx::query_scalar::<_, String>(
            r#"
            SELECT job_id FROM cloud_user_upload_jobs
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        debug!("Loaded {} cloud upload job ids for user_id={}", job_ids.len(), user_id);
        Ok(job_ids)
    }
}

/// A user together with the ids of the cloud upload jobs they started
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloudUser {
    pub id: i32,
    pub upload_job_ids: Vec<String>,
}

impl CloudUser {
    pub async fn load(pool: &Pool<Postgres>, user_id: i32) -> Result<Self, sqlx::Error> {
        let upload_job_ids = UserUploadJobRepository::job_ids_for_user(pool, user_id).await?;
        Ok(Self {
            id: user_id,
            upload_job_ids,
        })
    }
}

impl UploadJobOwner for CloudUser {
    fn upload_job_ids(&self) -> Vec<String> {
        self.upload_job_ids.clone()
    }
}
