use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::modules::{
    image::model::ImageResponse,
    university::schema::UniversityEntity,
    user::schema::{Gender, UserEntity},
};
use crate::utils::double_option;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileModel {
    #[validate(length(min = 1, max = 80, message = "Name must be between 1 and 80 characters"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 500, message = "Bio must be at most 500 characters"))]
    pub bio: Option<Option<String>>,
    pub gender: Option<Gender>,
    #[serde(default, deserialize_with = "double_option")]
    pub university_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(min = 1, max = 120, message = "Degree must be between 1 and 120 characters"))]
    pub degree: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(range(min = 1, max = 8, message = "Year must be between 1 and 8"))]
    pub year: Option<Option<i16>>,
    #[validate(length(max = 15, message = "At most 15 interests are allowed"))]
    pub interests: Option<Vec<String>>,
}

impl UpdateProfileModel {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.bio.is_none()
            && self.gender.is_none()
            && self.university_id.is_none()
            && self.degree.is_none()
            && self.year.is_none()
            && self.interests.is_none()
    }
}

pub struct InsertUser {
    pub email: String,
    pub name: String,
    pub gender: Gender,
    pub bio: Option<String>,
    pub university_id: Option<Uuid>,
    pub degree: Option<String>,
    pub year: Option<i16>,
}

/// Outer `Option` = field present in the request, inner = new value (may clear).
pub struct UpdateUser {
    pub name: Option<String>,
    pub bio: Option<Option<String>>,
    pub gender: Option<Gender>,
    pub university_id: Option<Option<Uuid>>,
    pub degree: Option<Option<String>>,
    pub year: Option<Option<i16>>,
    pub interests: Option<Vec<String>>,
}

impl From<UpdateProfileModel> for UpdateUser {
    fn from(model: UpdateProfileModel) -> Self {
        UpdateUser {
            name: model.name.map(|n| n.trim().to_string()),
            bio: model.bio,
            gender: model.gender,
            university_id: model.university_id,
            degree: model.degree,
            year: model.year,
            interests: model.interests.map(|items| {
                items.into_iter().map(|i| i.trim().to_string()).filter(|i| !i.is_empty()).collect()
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniversitySummary {
    pub id: Uuid,
    pub name: String,
    pub country: String,
}

impl From<UniversityEntity> for UniversitySummary {
    fn from(entity: UniversityEntity) -> Self {
        UniversitySummary { id: entity.id, name: entity.name, country: entity.country }
    }
}

/// Cached part of a profile; images are loaded separately on every read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileCore {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub gender: Gender,
    pub bio: Option<String>,
    pub university: Option<UniversitySummary>,
    pub degree: Option<String>,
    pub year: Option<i16>,
    pub interests: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl ProfileCore {
    pub fn new(entity: UserEntity, university: Option<UniversityEntity>) -> Self {
        ProfileCore {
            id: entity.id,
            email: entity.email,
            name: entity.name,
            gender: entity.gender,
            bio: entity.bio,
            university: university.map(UniversitySummary::from),
            degree: entity.degree,
            year: entity.year,
            interests: entity.interests,
            created_at: entity.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub name: String,
    pub gender: Gender,
    pub bio: Option<String>,
    pub university: Option<UniversitySummary>,
    pub degree: Option<String>,
    pub year: Option<i16>,
    pub interests: Vec<String>,
    pub images: Vec<ImageResponse>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl ProfileResponse {
    pub fn from_core(core: ProfileCore, images: Vec<ImageResponse>, include_email: bool) -> Self {
        ProfileResponse {
            id: core.id,
            email: include_email.then_some(core.email),
            name: core.name,
            gender: core.gender,
            bio: core.bio,
            university: core.university,
            degree: core.degree,
            year: core.year,
            interests: core.interests,
            images,
            created_at: core.created_at,
        }
    }
}

/// Compact user card used by lists (connections, matches, notifications, attendees).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub gender: Gender,
    pub university_name: Option<String>,
    pub degree: Option<String>,
    pub year: Option<i16>,
    pub avatar_url: Option<String>,
}
