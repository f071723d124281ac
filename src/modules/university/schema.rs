use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UniversityEntity {
    pub id: Uuid,
    pub name: String,
    pub country: String,
    pub city: Option<String>,
    pub email_domain: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl UniversityEntity {
    /// Universities without a configured domain accept any address.
    pub fn accepts_email(&self, email: &str) -> bool {
        match &self.email_domain {
            Some(domain) => email
                .rsplit_once('@')
                .map(|(_, host)| {
                    let host = host.to_lowercase();
                    let domain = domain.trim_start_matches('@').to_lowercase();
                    host == domain || host.ends_with(&format!(".{domain}"))
                })
                .unwrap_or(false),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn university(domain: Option<&str>) -> UniversityEntity {
        UniversityEntity {
            id: Uuid::now_v7(),
            name: "Test University".into(),
            country: "India".into(),
            city: None,
            email_domain: domain.map(str::to_string),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_accepts_email_matches_domain_and_subdomains() {
        let uni = university(Some("iitb.ac.in"));
        assert!(uni.accepts_email("student@iitb.ac.in"));
        assert!(uni.accepts_email("student@CSE.IITB.AC.IN"));
        assert!(!uni.accepts_email("student@gmail.com"));
        assert!(!uni.accepts_email("student@notiitb.ac.in"));
        assert!(!uni.accepts_email("no-at-sign"));
    }

    #[test]
    fn test_accepts_any_email_without_domain() {
        assert!(university(None).accepts_email("anyone@example.com"));
    }
}
