// Profile rules - pure, no store access
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::sync::LazyLock;

use crate::config::MediaConfig;
use crate::db::models::Profile;
use crate::error::AppError;

/// Letters, digits, dot and underscore; 3 to 24 characters.
static HANDLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_.]{3,24}$").expect("handle pattern compiles"));

/// A handle that passed validation, with its lowercase projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handle {
    value: String,
    lower: String,
}

impl Handle {
    /// Validate user input. Surrounding whitespace is ignored.
    pub fn parse(input: &str) -> Result<Self, AppError> {
        let value = input.trim();
        if !HANDLE_PATTERN.is_match(value) {
            return Err(AppError::InvalidHandle(
                "Handle must be 3-24 characters of letters, numbers, '.' or '_'".into(),
            ));
        }
        Ok(Self {
            value: value.to_string(),
            lower: value.to_lowercase(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn lower(&self) -> &str {
        &self.lower
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Case-insensitive lookup key for handles and display names.
pub fn lower_key(input: &str) -> String {
    input.trim().to_lowercase()
}

/// Settings a member picks alongside their handle.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileExtras {
    pub marketing_opt_in: Option<bool>,
    pub comments_require_approval: Option<bool>,
    pub comments_friends_only: Option<bool>,
}

/// Owner-editable fields. `None` leaves a field untouched; an empty display
/// name clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    pub handle: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
    pub marketing_opt_in: Option<bool>,
    pub comments_require_approval: Option<bool>,
    pub comments_friends_only: Option<bool>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.handle.is_none()
            && self.display_name.is_none()
            && self.avatar_url.is_none()
            && self.cover_url.is_none()
            && self.marketing_opt_in.is_none()
            && self.comments_require_approval.is_none()
            && self.comments_friends_only.is_none()
    }
}

/// Apply a patch to a profile, re-deriving the lowercase projections.
/// The handle must already be validated by the caller.
pub fn apply_patch(profile: &mut Profile, patch: &ProfilePatch, handle: Option<&Handle>) {
    if let Some(handle) = handle {
        profile.handle = Some(handle.as_str().to_string());
        profile.handle_lower = Some(handle.lower().to_string());
    }
    if let Some(name) = &patch.display_name {
        let name = name.trim();
        if name.is_empty() {
            profile.display_name = None;
            profile.display_name_lower = None;
        } else {
            profile.display_name = Some(name.to_string());
            profile.display_name_lower = Some(lower_key(name));
        }
    }
    if let Some(url) = &patch.avatar_url {
        profile.avatar_url = Some(url.trim().to_string());
    }
    if let Some(url) = &patch.cover_url {
        profile.cover_url = Some(url.trim().to_string());
    }
    apply_extras(
        profile,
        &ProfileExtras {
            marketing_opt_in: patch.marketing_opt_in,
            comments_require_approval: patch.comments_require_approval,
            comments_friends_only: patch.comments_friends_only,
        },
    );
}

pub fn apply_extras(profile: &mut Profile, extras: &ProfileExtras) {
    if let Some(v) = extras.marketing_opt_in {
        profile.marketing_opt_in = v;
    }
    if let Some(v) = extras.comments_require_approval {
        profile.comments_require_approval = v;
    }
    if let Some(v) = extras.comments_friends_only {
        profile.comments_friends_only = v;
    }
}

/// Fill in fields that rows created before their defaults existed may lack.
/// Returns true when anything changed.
pub fn normalize(profile: &mut Profile, media: &MediaConfig) -> bool {
    let mut dirty = false;

    if profile.avatar_url.as_deref().map_or(true, str::is_empty) {
        profile.avatar_url = Some(media.default_avatar_url.clone());
        dirty = true;
    }
    if profile.cover_url.as_deref().map_or(true, str::is_empty) {
        profile.cover_url = Some(media.default_cover_url.clone());
        dirty = true;
    }

    let handle_lower = profile.handle.as_deref().map(lower_key);
    if profile.handle_lower != handle_lower {
        profile.handle_lower = handle_lower;
        dirty = true;
    }
    let name_lower = profile.display_name.as_deref().map(lower_key);
    if profile.display_name_lower != name_lower {
        profile.display_name_lower = name_lower;
        dirty = true;
    }

    dirty
}
