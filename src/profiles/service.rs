use crate::config::MediaConfig;
use crate::db::models::Profile;
use crate::db::RepositoryError;
use crate::error::{AppError, AppResult};
use crate::profiles::domain::{self, lower_key, Handle, ProfileExtras, ProfilePatch};
use crate::profiles::repository::DynProfileRepository;

#[derive(Clone)]
pub struct ProfileService {
    profiles: DynProfileRepository,
    media: MediaConfig,
    founder_member_id: Option<String>,
}

impl ProfileService {
    pub fn new(
        profiles: DynProfileRepository,
        media: MediaConfig,
        founder_member_id: Option<String>,
    ) -> Self {
        Self {
            profiles,
            media,
            founder_member_id,
        }
    }

    /// Profile for `user_id`, created with defaults on first contact.
    pub async fn ensure_profile(&self, user_id: &str) -> AppResult<Profile> {
        require_member(user_id)?;

        if let Some(profile) = self.profiles.find_by_user_id(user_id).await? {
            return self.normalized(profile).await;
        }

        let created = self
            .profiles
            .insert_default(
                user_id,
                &self.media.default_avatar_url,
                &self.media.default_cover_url,
                self.founder_member_id.as_deref(),
            )
            .await?;

        let profile = self
            .profiles
            .find_by_user_id(user_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("profile for {} missing after insert", user_id)))?;

        if created {
            tracing::info!("Created profile {} for member {}", profile.id, user_id);
            if let Some(founder) = self.founder_member_id.as_deref().filter(|f| *f != user_id) {
                tracing::info!("Member {} and founder {} now follow each other", user_id, founder);
            }
        }

        self.normalized(profile).await
    }

    pub async fn get_profile(&self, user_id: &str) -> AppResult<Profile> {
        let profile = self
            .profiles
            .find_by_user_id(user_id)
            .await?
            .ok_or(AppError::NotFound)?;
        self.normalized(profile).await
    }

    pub async fn get_profile_by_id(&self, profile_id: &str) -> AppResult<Profile> {
        let profile = self
            .profiles
            .find_by_id(profile_id)
            .await?
            .ok_or(AppError::NotFound)?;
        self.normalized(profile).await
    }

    /// Public lookup, case-insensitive.
    pub async fn get_profile_by_handle(&self, handle: &str) -> AppResult<Profile> {
        let profile = self
            .profiles
            .find_by_handle_lower(&lower_key(handle))
            .await?
            .ok_or(AppError::NotFound)?;
        self.normalized(profile).await
    }

    pub async fn is_handle_available(
        &self,
        handle: &str,
        excluding_user_id: Option<&str>,
    ) -> AppResult<bool> {
        let owner = self.profiles.handle_owner(&lower_key(handle)).await?;
        Ok(match owner {
            None => true,
            Some(owner) => excluding_user_id == Some(owner.as_str()),
        })
    }

    pub async fn is_display_name_available(
        &self,
        display_name: &str,
        excluding_user_id: Option<&str>,
    ) -> AppResult<bool> {
        let key = lower_key(display_name);
        if key.is_empty() {
            return Ok(true);
        }
        Ok(!self
            .profiles
            .display_name_in_use(&key, excluding_user_id)
            .await?)
    }

    pub async fn claim_handle(
        &self,
        user_id: &str,
        handle: &str,
        extras: ProfileExtras,
    ) -> AppResult<Profile> {
        require_member(user_id)?;
        let handle = Handle::parse(handle)?;

        self.ensure_profile(user_id).await?;

        let profile = self
            .profiles
            .claim_handle(user_id, &handle, &extras)
            .await
            .map_err(|e| handle_conflict(e, &handle))?
            .ok_or(AppError::NotFound)?;

        tracing::info!("Member {} claimed handle {}", user_id, handle);
        Ok(profile)
    }

    pub async fn update_profile(&self, user_id: &str, patch: ProfilePatch) -> AppResult<Profile> {
        require_member(user_id)?;
        let current = self.ensure_profile(user_id).await?;
        if patch.is_empty() {
            return Ok(current);
        }

        let handle = patch.handle.as_deref().map(Handle::parse).transpose()?;
        if let Some(handle) = &handle {
            if !self.is_handle_available(handle.as_str(), Some(user_id)).await? {
                return Err(AppError::HandleTaken);
            }
        }
        if let Some(name) = &patch.display_name {
            if !self.is_display_name_available(name, Some(user_id)).await? {
                return Err(AppError::DisplayNameTaken);
            }
        }

        // The unique index settles races the checks above miss
        let saved = match self
            .profiles
            .update_owned_fields(user_id, &patch, handle.as_ref())
            .await
        {
            Ok(saved) => saved,
            Err(RepositoryError::Conflict(msg)) if handle.is_some() => {
                tracing::warn!("Handle write for {} lost a race: {}", user_id, msg);
                return Err(AppError::HandleTaken);
            }
            Err(e) => return Err(e.into()),
        };

        saved.ok_or(AppError::NotFound)
    }

    /// Backfill defaults on read and persist them if anything was missing.
    async fn normalized(&self, mut profile: Profile) -> AppResult<Profile> {
        if !domain::normalize(&mut profile, &self.media) {
            return Ok(profile);
        }

        tracing::debug!("Backfilling profile defaults for {}", profile.user_id);
        match self
            .profiles
            .backfill_defaults(&profile.user_id, &self.media)
            .await
        {
            Ok(Some(saved)) => Ok(saved),
            Ok(None) => Err(AppError::NotFound),
            Err(RepositoryError::Conflict(msg)) => {
                // Serve the normalized copy; the stored row stays as it was
                tracing::warn!("Could not backfill profile {}: {}", profile.id, msg);
                Ok(profile)
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn require_member(user_id: &str) -> AppResult<()> {
    if user_id.trim().is_empty() {
        return Err(AppError::NotAuthenticated);
    }
    Ok(())
}

fn handle_conflict(e: RepositoryError, handle: &Handle) -> AppError {
    match e {
        RepositoryError::Conflict(msg) => {
            tracing::warn!("Handle {} unavailable: {}", handle, msg);
            AppError::HandleTaken
        }
        other => other.into(),
    }
}
