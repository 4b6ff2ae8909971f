use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::Config;
use crate::graphql::{build_schema, PaddockSchema};
use crate::identity::{DynIdentityProvider, SessionIdentityProvider};
use crate::profiles::{ProfileService, SqliteProfileRepository};
use crate::races::{DynRaceResults, HttpRaceResults};
use crate::social::{SocialGraphService, SqliteFollowRepository};
use crate::videos::{SqliteCommentRepository, SqliteVideoRepository, VideoService};

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub identity: DynIdentityProvider,
    pub profiles: ProfileService,
    pub social: SocialGraphService,
    pub videos: VideoService,
    pub races: DynRaceResults,
    pub graphql_schema: PaddockSchema,
}

impl AppState {
    /// Wire the SQLite-backed stores and services over one pool.
    pub fn new(db: DbPool, config: Config) -> anyhow::Result<Self> {
        let races = Arc::new(HttpRaceResults::new(&config.races)?);
        Ok(Self::with_races(db, config, races))
    }

    pub fn with_races(db: DbPool, config: Config, races: DynRaceResults) -> Self {
        let profile_repo = Arc::new(SqliteProfileRepository::new(db.clone()));
        let follow_repo = Arc::new(SqliteFollowRepository::new(db.clone()));

        let profiles = ProfileService::new(
            profile_repo.clone(),
            config.media.clone(),
            config.community.founder_member_id.clone(),
        );
        let social = SocialGraphService::new(follow_repo.clone(), profile_repo.clone());
        let videos = VideoService::new(
            Arc::new(SqliteVideoRepository::new(db.clone())),
            Arc::new(SqliteCommentRepository::new(db.clone())),
            profile_repo,
            follow_repo,
        );
        let graphql_schema = build_schema(profiles.clone(), social.clone(), videos.clone());

        Self {
            identity: Arc::new(SessionIdentityProvider::new(db.clone())),
            db,
            config,
            profiles,
            social,
            videos,
            races,
            graphql_schema,
        }
    }
}
