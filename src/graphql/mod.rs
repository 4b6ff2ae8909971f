pub mod queries;
pub mod schema;
pub mod types;

pub use schema::{build_schema, PaddockSchema};

/// Member id of the caller, attached to each request
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<String>);
