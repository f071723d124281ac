use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::modules::{
    connection::model::ConnectionState,
    explore::scoring::ScoringAttributes,
    image::model::ImageResponse,
    user::{model::UniversitySummary, schema::Gender},
};

pub const DEFAULT_EXPLORE_LIMIT: usize = 20;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ExploreQuery {
    #[validate(range(min = 1, max = 50, message = "Limit must be between 1 and 50"))]
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub gender: Option<Gender>,
    pub university_id: Option<Uuid>,
    #[validate(length(max = 120))]
    pub degree: Option<String>,
    #[validate(range(min = 1, max = 8, message = "Year must be between 1 and 8"))]
    pub year: Option<i16>,
    #[validate(length(max = 100))]
    pub search: Option<String>,
}

/// Candidate filters with blank strings already dropped.
#[derive(Debug, Clone, Default)]
pub struct CandidateFilter {
    pub gender: Option<Gender>,
    pub university_id: Option<Uuid>,
    pub degree: Option<String>,
    pub year: Option<i16>,
    pub search: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl From<ExploreQuery> for CandidateFilter {
    fn from(query: ExploreQuery) -> Self {
        CandidateFilter {
            gender: query.gender,
            university_id: query.university_id,
            degree: non_blank(query.degree),
            year: query.year,
            search: non_blank(query.search),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ExploreCandidate {
    pub id: Uuid,
    pub name: String,
    pub gender: Gender,
    pub bio: Option<String>,
    pub university_id: Option<Uuid>,
    pub university_name: Option<String>,
    pub country: Option<String>,
    pub degree: Option<String>,
    pub year: Option<i16>,
    pub interests: Vec<String>,
}

impl ExploreCandidate {
    pub fn attributes(&self) -> ScoringAttributes {
        ScoringAttributes {
            university_id: self.university_id,
            country: self.country.clone(),
            degree: self.degree.clone(),
            year: self.year,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExploreProfile {
    pub id: Uuid,
    pub name: String,
    pub gender: Gender,
    pub bio: Option<String>,
    pub university: Option<UniversitySummary>,
    pub degree: Option<String>,
    pub year: Option<i16>,
    pub interests: Vec<String>,
    pub images: Vec<ImageResponse>,
}

impl ExploreProfile {
    pub fn new(candidate: ExploreCandidate, images: Vec<ImageResponse>) -> Self {
        let university = match (candidate.university_id, candidate.university_name) {
            (Some(id), Some(name)) => Some(UniversitySummary {
                id,
                name,
                country: candidate.country.unwrap_or_default(),
            }),
            _ => None,
        };

        ExploreProfile {
            id: candidate.id,
            name: candidate.name,
            gender: candidate.gender,
            bio: candidate.bio,
            university,
            degree: candidate.degree,
            year: candidate.year,
            interests: candidate.interests,
            images,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExploreItem {
    pub profile: ExploreProfile,
    pub match_score: f64,
    pub connection_state: ConnectionState,
}

#[derive(Debug, Serialize)]
pub struct ExploreResponse {
    pub profiles: Vec<ExploreItem>,
    pub total: usize,
    pub has_more: bool,
}
