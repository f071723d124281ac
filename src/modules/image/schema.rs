use serde::Serialize;
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserImageEntity {
    pub user_id: Uuid,
    pub slot: i16,
    pub url: String,
    pub storage_path: String,
    pub mime_type: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
