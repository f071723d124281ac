use std::{collections::HashMap, sync::Arc};

use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        connection::model::{ConnectionEvent, ConnectionState},
        matching::{
            adjectives::{adjective_pool, ice_breaking_prompt, resolve_adjective},
            model::{
                AdjectiveOptions, ConnectOutcome, MatchData, MatchResponse, SelectAdjectiveResponse,
                SelectionOutcome,
            },
            repository::MatchingRepo,
            schema::MatchEntity,
        },
        user::{repository::UserRepository, schema::UserEntity},
        websocket::notifier::Notifier,
    },
};

#[derive(Clone)]
pub struct MatchingService<M, U>
where
    M: MatchingRepo + Send + Sync,
    U: UserRepository + Send + Sync,
{
    matching_repo: Arc<M>,
    user_repo: Arc<U>,
    notifier: Notifier,
}

impl<M, U> MatchingService<M, U>
where
    M: MatchingRepo + Send + Sync,
    U: UserRepository + Send + Sync,
{
    pub fn with_dependencies(matching_repo: Arc<M>, user_repo: Arc<U>, notifier: Notifier) -> Self {
        MatchingService { matching_repo, user_repo, notifier }
    }

    async fn pair(
        &self,
        viewer_id: Uuid,
        target_id: Uuid,
    ) -> Result<(UserEntity, UserEntity), error::SystemError> {
        if viewer_id == target_id {
            return Err(error::SystemError::bad_request("Cannot select an adjective for yourself"));
        }

        let (viewer, target) = tokio::try_join!(
            self.user_repo.find_by_id(&viewer_id),
            self.user_repo.find_by_id(&target_id),
        )?;

        let viewer = viewer.ok_or_else(|| error::SystemError::not_found("User not found"))?;
        let target = target.ok_or_else(|| error::SystemError::not_found("User not found"))?;
        Ok((viewer, target))
    }

    pub async fn get_adjectives(
        &self,
        viewer_id: Uuid,
        target_id: Uuid,
    ) -> Result<AdjectiveOptions, error::SystemError> {
        let (viewer, target) = self.pair(viewer_id, target_id).await?;
        let selection = self.matching_repo.find_selection(&viewer_id, &target_id).await?;

        Ok(AdjectiveOptions {
            adjectives: adjective_pool(viewer.gender, target.gender),
            is_matched: selection.as_ref().is_some_and(|s| s.is_matched),
            selected: selection.map(|s| s.adjective),
        })
    }

    pub async fn select_adjective(
        &self,
        viewer_id: Uuid,
        target_id: Uuid,
        adjective: &str,
    ) -> Result<SelectAdjectiveResponse, error::SystemError> {
        let (viewer, target) = self.pair(viewer_id, target_id).await?;

        let pool = adjective_pool(viewer.gender, target.gender);
        let adjective = resolve_adjective(&pool, adjective).ok_or_else(|| {
            error::SystemError::bad_request("Adjective is not available for this user")
        })?;

        let prompt = ice_breaking_prompt(adjective, &mut rand::thread_rng());
        let outcome = self
            .matching_repo
            .select_adjective_atomic(&viewer_id, &target_id, adjective, &prompt)
            .await?;

        let matched = match outcome {
            SelectionOutcome::Pending => {
                return Ok(SelectAdjectiveResponse { matched: false, match_data: None });
            }
            SelectionOutcome::ExistingMatch(matched) => matched,
            SelectionOutcome::NewMatch(matched) => {
                log::info!("Users {viewer_id} and {target_id} matched on '{adjective}'");
                self.notify_match(&matched);
                matched
            }
        };

        Ok(SelectAdjectiveResponse {
            matched: true,
            match_data: Some(MatchData::for_viewer(&matched, &viewer_id)),
        })
    }

    fn notify_match(&self, matched: &MatchEntity) {
        for user_id in [matched.user_id_1, matched.user_id_2] {
            self.notifier.emit_to_user(
                user_id,
                "adjectiveMatch",
                &MatchData::for_viewer(matched, &user_id),
            );
        }
    }

    pub async fn get_matches(&self, user_id: Uuid) -> Result<Vec<MatchResponse>, error::SystemError> {
        let matches = self.matching_repo.find_matches(&user_id).await?;
        let ids: Vec<Uuid> = matches.iter().map(|m| m.other(&user_id)).collect();
        let users: HashMap<_, _> = self
            .user_repo
            .find_summaries(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(matches
            .into_iter()
            .filter_map(|m| {
                users.get(&m.other(&user_id)).cloned().map(|user| MatchResponse {
                    id: m.id,
                    user,
                    mutual_adjective: m.mutual_adjective,
                    is_connected: m.is_connected,
                    ice_breaking_prompt: m.ice_breaking_prompt,
                    matched_at: m.matched_at,
                })
            })
            .collect())
    }

    pub async fn connect_after_match(
        &self,
        user_id: Uuid,
        other_id: Uuid,
    ) -> Result<MatchData, error::SystemError> {
        if user_id == other_id {
            return Err(error::SystemError::bad_request("Cannot connect with yourself"));
        }

        match self.matching_repo.connect_after_match_atomic(&user_id, &other_id).await? {
            ConnectOutcome::NoMatch => Err(error::SystemError::not_found("Match not found")),
            ConnectOutcome::AlreadyConnected => Err(error::SystemError::conflict("Already connected")),
            ConnectOutcome::Connected(matched) => {
                log::info!("User {user_id} connected with match {other_id}");
                self.notifier.emit_to_user(
                    other_id,
                    "connectionAccepted",
                    &ConnectionEvent { user_id, state: ConnectionState::Connected },
                );
                Ok(MatchData::for_viewer(&matched, &user_id))
            }
        }
    }
}
