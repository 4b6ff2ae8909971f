pub mod domain;
pub mod repository;
pub mod service;

pub use domain::{Handle, ProfileExtras, ProfilePatch};
pub use repository::{DynProfileRepository, ProfileRepository, SqliteProfileRepository};
pub use service::ProfileService;
