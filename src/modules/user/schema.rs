use serde::{Deserialize, Serialize};
use sqlx::prelude::{FromRow, Type};
use uuid::Uuid;

#[derive(Debug, PartialEq, Clone, Type, Serialize, Deserialize)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
pub enum UserRole {
    #[sqlx(rename = "ADMIN")]
    Admin,
    #[sqlx(rename = "USER")]
    User,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Type, Serialize, Deserialize)]
#[sqlx(type_name = "gender", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub gender: Gender,
    pub bio: Option<String>,
    pub university_id: Option<Uuid>,
    pub degree: Option<String>,
    pub year: Option<i16>,
    pub interests: Vec<String>,
    pub role: UserRole,
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
