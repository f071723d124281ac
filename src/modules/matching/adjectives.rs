use rand::{Rng, seq::SliceRandom};

use crate::modules::user::schema::Gender;

const COMMON: &[&str] = &[
    "Smart",
    "Kind",
    "Funny",
    "Creative",
    "Ambitious",
    "Thoughtful",
    "Adventurous",
    "Curious",
    "Genuine",
    "Witty",
    "Calm",
    "Confident",
];

const FOR_MALE: &[&str] = &["Charming", "Gentlemanly", "Rugged", "Chivalrous"];
const FOR_FEMALE: &[&str] = &["Graceful", "Elegant", "Radiant", "Bubbly"];
const FOR_OTHER: &[&str] = &["Vibrant", "Unique", "Expressive", "Free-spirited"];

/// Only offered when viewer and target genders differ.
const ATTRACTION: &[&str] = &["Attractive", "Cute", "Stunning", "Flirty"];

const PROMPTS: &[&str] = &[
    "You both picked \"{adjective}\". What is the most {adjective} thing you have done this semester?",
    "\"{adjective}\" it is! Who is the most {adjective} person you know, apart from each other?",
    "Mutual \"{adjective}\". Share a moment that made you think the other was {adjective}.",
    "You matched on \"{adjective}\". Plan a campus hangout that fits the word.",
];

/// Words the viewer may pick for the target: the common set, the target's gender set,
/// and attraction words for mixed-gender pairs.
pub fn adjective_pool(viewer: Gender, target: Gender) -> Vec<&'static str> {
    let gendered = match target {
        Gender::Male => FOR_MALE,
        Gender::Female => FOR_FEMALE,
        Gender::Other => FOR_OTHER,
    };

    let mut pool: Vec<&'static str> = COMMON.iter().chain(gendered).copied().collect();
    if viewer != target {
        pool.extend_from_slice(ATTRACTION);
    }
    pool
}

/// Canonical spelling of `adjective` if it belongs to the pool (case-insensitive).
pub fn resolve_adjective(pool: &[&'static str], adjective: &str) -> Option<&'static str> {
    let wanted = adjective.trim();
    pool.iter().copied().find(|a| a.eq_ignore_ascii_case(wanted))
}

pub fn ice_breaking_prompt<R: Rng + ?Sized>(adjective: &str, rng: &mut R) -> String {
    let template = PROMPTS.choose(rng).copied().unwrap_or(PROMPTS[0]);
    template.replace("{adjective}", &adjective.to_lowercase())
}
