use serde::Serialize;

use crate::db::models::Profile;
use crate::error::{AppError, AppResult};
use crate::profiles::DynProfileRepository;
use crate::social::repository::{DynFollowRepository, ListWindow};

/// Edge state returned by follow/unfollow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowState {
    pub follower_id: String,
    pub followee_id: String,
    pub following: bool,
    pub since: Option<String>,
}

#[derive(Clone)]
pub struct SocialGraphService {
    follows: DynFollowRepository,
    profiles: DynProfileRepository,
}

impl SocialGraphService {
    pub fn new(follows: DynFollowRepository, profiles: DynProfileRepository) -> Self {
        Self { follows, profiles }
    }

    pub async fn follow(&self, follower_id: &str, followee_id: &str) -> AppResult<FollowState> {
        check_pair(follower_id, followee_id)?;

        let (edge, created) = self.follows.insert_edge(follower_id, followee_id).await?;
        if created {
            tracing::info!("{} now follows {}", follower_id, followee_id);
        }

        Ok(FollowState {
            follower_id: edge.follower_id,
            followee_id: edge.followee_id,
            following: true,
            since: Some(edge.created_at),
        })
    }

    pub async fn unfollow(&self, follower_id: &str, followee_id: &str) -> AppResult<FollowState> {
        check_pair(follower_id, followee_id)?;

        if self.follows.delete_edge(follower_id, followee_id).await? {
            tracing::info!("{} unfollowed {}", follower_id, followee_id);
        }

        Ok(FollowState {
            follower_id: follower_id.to_string(),
            followee_id: followee_id.to_string(),
            following: false,
            since: None,
        })
    }

    pub async fn is_following(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        Ok(self
            .follows
            .find_edge(follower_id, followee_id)
            .await?
            .is_some())
    }

    pub async fn list_followers(&self, user_id: &str, window: ListWindow) -> AppResult<Vec<Profile>> {
        let ids = self.follows.follower_ids(user_id, window).await?;
        self.profiles_for(ids).await
    }

    pub async fn list_following(&self, user_id: &str, window: ListWindow) -> AppResult<Vec<Profile>> {
        let ids = self.follows.following_ids(user_id, window).await?;
        self.profiles_for(ids).await
    }

    pub async fn is_mutual(&self, a: &str, b: &str) -> AppResult<bool> {
        if a == b {
            return Ok(false);
        }
        Ok(self.follows.is_mutual(a, b).await?)
    }

    /// Members without a profile row yet are left out.
    async fn profiles_for(&self, ids: Vec<String>) -> AppResult<Vec<Profile>> {
        let mut profiles = self.profiles.find_many_by_user_ids(&ids).await?;
        profiles.sort_by_key(|p| ids.iter().position(|id| *id == p.user_id));
        Ok(profiles)
    }
}

fn check_pair(follower_id: &str, followee_id: &str) -> AppResult<()> {
    if follower_id.trim().is_empty() {
        return Err(AppError::NotAuthenticated);
    }
    if followee_id.trim().is_empty() {
        return Err(AppError::BadRequest("Missing member to follow".into()));
    }
    if follower_id == followee_id {
        return Err(AppError::SelfFollow);
    }
    Ok(())
}
