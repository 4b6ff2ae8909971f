pub mod repository;
pub mod service;

pub use repository::{DynFollowRepository, FollowRepository, ListWindow, SqliteFollowRepository};
pub use service::{FollowState, SocialGraphService};
