use async_graphql::{EmptyMutation, EmptySubscription, Schema};

use super::queries::QueryRoot;
use crate::profiles::ProfileService;
use crate::social::SocialGraphService;
use crate::videos::VideoService;

/// GraphQL Schema type
pub type PaddockSchema = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

/// Build the read-only schema over the shared services
pub fn build_schema(
    profiles: ProfileService,
    social: SocialGraphService,
    videos: VideoService,
) -> PaddockSchema {
    Schema::build(QueryRoot, EmptyMutation, EmptySubscription)
        .data(profiles)
        .data(social)
        .data(videos)
        .finish()
}
