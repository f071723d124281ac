//! Explore feed ranking.
//!
//! Scores come from a first-match-wins cascade over university, year, degree and
//! country. Ranking sorts by score, shuffles each equal-score group so the feed
//! does not look the same on every visit, and pushes already connected profiles
//! to the end.

use rand::{Rng, seq::SliceRandom};
use uuid::Uuid;

/// Attributes the score is computed from. `None` never equals anything.
#[derive(Debug, Clone, Default)]
pub struct ScoringAttributes {
    pub university_id: Option<Uuid>,
    pub country: Option<String>,
    pub degree: Option<String>,
    pub year: Option<i16>,
}

fn same_text(a: Option<&str>, b: Option<&str>) -> bool {
    match (a.map(str::trim), b.map(str::trim)) {
        (Some(a), Some(b)) if !a.is_empty() => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

fn same<T: PartialEq>(a: Option<&T>, b: Option<&T>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}

pub fn calculate_match_score(a: &ScoringAttributes, b: &ScoringAttributes) -> f64 {
    let university = same(a.university_id.as_ref(), b.university_id.as_ref());
    let year = same(a.year.as_ref(), b.year.as_ref());
    let degree = same_text(a.degree.as_deref(), b.degree.as_deref());
    let country = same_text(a.country.as_deref(), b.country.as_deref());

    if university && year && degree {
        1.0
    } else if university && (year || degree) {
        0.7
    } else if university {
        0.4
    } else if country && degree {
        0.3
    } else if country && year {
        0.2
    } else if country {
        0.1
    } else {
        0.0
    }
}

#[derive(Debug, Clone)]
pub struct Ranked<T> {
    pub item: T,
    pub score: f64,
    pub connected: bool,
}

pub fn rank_profiles<T, R: Rng + ?Sized>(profiles: Vec<Ranked<T>>, rng: &mut R) -> Vec<Ranked<T>> {
    let (mut connected, mut others): (Vec<_>, Vec<_>) =
        profiles.into_iter().partition(|p| p.connected);

    others.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut start = 0;
    while start < others.len() {
        let score = others[start].score;
        let end = others[start..]
            .iter()
            .position(|p| p.score != score)
            .map_or(others.len(), |offset| start + offset);
        others[start..end].shuffle(rng);
        start = end;
    }

    connected.shuffle(rng);
    others.extend(connected);
    others
}

/// Returns the page plus the total length and whether more items follow it.
pub fn paginate<T>(items: Vec<T>, offset: usize, limit: usize) -> (Vec<T>, usize, bool) {
    let total = items.len();
    let page: Vec<T> = items.into_iter().skip(offset).take(limit).collect();
    let has_more = offset.saturating_add(page.len()) < total;
    (page, total, has_more)
}
