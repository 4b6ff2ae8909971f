pub mod comments;
pub mod domain;
pub mod repository;
pub mod service;

pub use comments::{CommentRepository, DynCommentRepository, SqliteCommentRepository};
pub use domain::{CommentLikes, Cursor, LikeState, NewVideo, VideoPage};
pub use repository::{DynVideoRepository, SqliteVideoRepository, VideoRepository};
pub use service::VideoService;
