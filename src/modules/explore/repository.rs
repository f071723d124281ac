use uuid::Uuid;

use crate::{
    api::error,
    modules::explore::model::{CandidateFilter, ExploreCandidate},
};

#[async_trait::async_trait]
pub trait ExploreRepository {
    /// Active users other than the viewer with no block between them and the viewer.
    async fn find_candidates(
        &self,
        viewer_id: &Uuid,
        filter: &CandidateFilter,
        cap: i64,
    ) -> Result<Vec<ExploreCandidate>, error::SystemError>;

    async fn find_candidate(&self, id: &Uuid) -> Result<Option<ExploreCandidate>, error::SystemError>;
}
