// Library exports for Paddock
// This allows integration tests and the server binary to share modules

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod graphql;
pub mod identity;
pub mod profiles;
pub mod races;
pub mod routes;
pub mod social;
pub mod state;
pub mod videos;
