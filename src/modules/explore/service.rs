use std::{collections::HashMap, sync::Arc};

use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        connection::{model::ConnectionState, repository::ConnectionRepo},
        explore::{
            model::{
                CandidateFilter, DEFAULT_EXPLORE_LIMIT, ExploreCandidate, ExploreItem,
                ExploreProfile, ExploreQuery, ExploreResponse,
            },
            repository::ExploreRepository,
            scoring::{Ranked, calculate_match_score, paginate, rank_profiles},
        },
        image::{repository::ImageRepository, service::ImageService},
    },
};

#[derive(Clone)]
pub struct ExploreService<E, C, I>
where
    E: ExploreRepository + Send + Sync,
    C: ConnectionRepo + Send + Sync,
    I: ImageRepository + Send + Sync,
{
    explore_repo: Arc<E>,
    connection_repo: Arc<C>,
    images: ImageService<I>,
    candidate_cap: i64,
}

impl<E, C, I> ExploreService<E, C, I>
where
    E: ExploreRepository + Send + Sync,
    C: ConnectionRepo + Send + Sync,
    I: ImageRepository + Send + Sync,
{
    pub fn with_dependencies(
        explore_repo: Arc<E>,
        connection_repo: Arc<C>,
        images: ImageService<I>,
        candidate_cap: i64,
    ) -> Self {
        ExploreService { explore_repo, connection_repo, images, candidate_cap }
    }

    async fn viewer(&self, viewer_id: &Uuid) -> Result<ExploreCandidate, error::SystemError> {
        self.explore_repo
            .find_candidate(viewer_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("User not found"))
    }

    pub async fn explore(
        &self,
        viewer_id: Uuid,
        query: ExploreQuery,
    ) -> Result<ExploreResponse, error::SystemError> {
        let limit = query.limit.unwrap_or(DEFAULT_EXPLORE_LIMIT).clamp(1, 50);
        let offset = query.offset.unwrap_or(0);
        let filter = CandidateFilter::from(query);

        let viewer = self.viewer(&viewer_id).await?;
        let (candidates, relations) = tokio::try_join!(
            self.explore_repo.find_candidates(&viewer_id, &filter, self.candidate_cap),
            self.connection_repo.find_relations(&viewer_id),
        )?;

        let states: HashMap<Uuid, ConnectionState> = relations
            .iter()
            .map(|c| (c.other(&viewer_id), ConnectionState::derive(&viewer_id, Some(c), None)))
            .collect();

        let viewer_attrs = viewer.attributes();
        let scored: Vec<Ranked<ExploreCandidate>> = candidates
            .into_iter()
            .filter(|c| !states.get(&c.id).is_some_and(ConnectionState::is_blocked))
            .map(|c| Ranked {
                score: calculate_match_score(&viewer_attrs, &c.attributes()),
                connected: states.get(&c.id) == Some(&ConnectionState::Connected),
                item: c,
            })
            .collect();

        let ranked = rank_profiles(scored, &mut rand::thread_rng());
        let (page, total, has_more) = paginate(ranked, offset, limit);

        let ids: Vec<Uuid> = page.iter().map(|r| r.item.id).collect();
        let mut images = self.images.list_for_users(&ids).await?;

        let profiles = page
            .into_iter()
            .map(|r| {
                let state = states.get(&r.item.id).copied().unwrap_or(ConnectionState::None);
                let user_images = images.remove(&r.item.id).unwrap_or_default();
                ExploreItem {
                    profile: ExploreProfile::new(r.item, user_images),
                    match_score: r.score,
                    connection_state: state,
                }
            })
            .collect();

        Ok(ExploreResponse { profiles, total, has_more })
    }

    pub async fn get_profile(
        &self,
        viewer_id: Uuid,
        target_id: Uuid,
    ) -> Result<ExploreItem, error::SystemError> {
        let (viewer, target, connection) = tokio::try_join!(
            self.viewer(&viewer_id),
            self.explore_repo.find_candidate(&target_id),
            self.connection_repo.find_connection(&viewer_id, &target_id),
        )?;

        let target = target.ok_or_else(|| error::SystemError::not_found("User not found"))?;

        let state = if viewer_id == target_id {
            ConnectionState::None
        } else {
            ConnectionState::derive(&viewer_id, connection.as_ref(), None)
        };
        if state.is_blocked() {
            return Err(error::SystemError::not_found("User not found"));
        }

        let match_score = calculate_match_score(&viewer.attributes(), &target.attributes());
        let images = self.images.list(target_id).await?;

        Ok(ExploreItem {
            profile: ExploreProfile::new(target, images),
            match_score,
            connection_state: state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        modules::{
            connection::schema::ConnectionStatus,
            image::model::UploadConfig,
            user::schema::Gender,
        },
        test::{InMemoryConnectionRepository, InMemoryExploreRepository, InMemoryImageRepository},
    };

    struct Fixture {
        service: ExploreService<
            InMemoryExploreRepository,
            InMemoryConnectionRepository,
            InMemoryImageRepository,
        >,
        explore: Arc<InMemoryExploreRepository>,
        connections: Arc<InMemoryConnectionRepository>,
    }

    fn fixture() -> Fixture {
        let explore = Arc::new(InMemoryExploreRepository::default());
        let connections = Arc::new(InMemoryConnectionRepository::default());
        let images = ImageService::new(
            Arc::new(InMemoryImageRepository::default()),
            UploadConfig::new(std::env::temp_dir().to_string_lossy(), "/media", 1024),
        );
        let service =
            ExploreService::with_dependencies(explore.clone(), connections.clone(), images, 500);
        Fixture { service, explore, connections }
    }

    fn candidate(name: &str, university_id: Option<Uuid>, degree: &str, year: i16) -> ExploreCandidate {
        ExploreCandidate {
            id: Uuid::now_v7(),
            name: name.to_string(),
            gender: Gender::Other,
            bio: None,
            university_id,
            university_name: university_id.map(|_| "Campus".to_string()),
            country: Some("India".to_string()),
            degree: Some(degree.to_string()),
            year: Some(year),
            interests: vec![],
        }
    }

    #[actix_web::test]
    async fn test_explore_ranks_and_hides_blocked() {
        let f = fixture();
        let uni = Some(Uuid::now_v7());

        let me = f.explore.insert(candidate("Me", uni, "CS", 2));
        let twin = f.explore.insert(candidate("Twin", uni, "CS", 2));
        let classmate = f.explore.insert(candidate("Classmate", uni, "Law", 4));
        let friend = f.explore.insert(candidate("Friend", uni, "CS", 2));
        let blocked = f.explore.insert(candidate("Blocked", uni, "CS", 2));

        f.connections.set(me, friend, ConnectionStatus::Connected);
        f.connections.set(blocked, me, ConnectionStatus::Blocked);

        let res = f.service.explore(me, ExploreQuery::default()).await.unwrap();
        let ids: Vec<Uuid> = res.profiles.iter().map(|p| p.profile.id).collect();

        assert_eq!(res.total, 3);
        assert!(!res.has_more);
        assert_eq!(ids, vec![twin, classmate, friend]);
        assert_eq!(res.profiles[0].match_score, 1.0);
        assert_eq!(res.profiles[1].match_score, 0.4);
        assert_eq!(res.profiles[2].connection_state, ConnectionState::Connected);
    }

    #[actix_web::test]
    async fn test_explore_paginates() {
        let f = fixture();
        let me = f.explore.insert(candidate("Me", None, "CS", 1));
        for i in 0..5 {
            f.explore.insert(candidate(&format!("User {i}"), None, "Art", 3));
        }

        let query = ExploreQuery { limit: Some(2), offset: Some(4), ..Default::default() };
        let res = f.service.explore(me, query).await.unwrap();
        assert_eq!(res.profiles.len(), 1);
        assert_eq!(res.total, 5);
        assert!(!res.has_more);

        let query = ExploreQuery { limit: Some(2), ..Default::default() };
        let res = f.service.explore(me, query).await.unwrap();
        assert_eq!(res.profiles.len(), 2);
        assert!(res.has_more);
    }

    #[actix_web::test]
    async fn test_get_profile_hides_blocked_users() {
        let f = fixture();
        let me = f.explore.insert(candidate("Me", None, "CS", 1));
        let other = f.explore.insert(candidate("Other", None, "CS", 3));

        let item = f.service.get_profile(me, other).await.unwrap();
        assert_eq!(item.match_score, 0.3);
        assert_eq!(item.connection_state, ConnectionState::None);

        f.connections.set(me, other, ConnectionStatus::Blocked);
        assert!(matches!(
            f.service.get_profile(other, me).await,
            Err(error::SystemError::NotFound(_))
        ));
        assert!(matches!(
            f.service.get_profile(me, Uuid::now_v7()).await,
            Err(error::SystemError::NotFound(_))
        ));
    }
}
