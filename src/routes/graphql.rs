use async_graphql::http::{playground_source, GraphQLPlaygroundConfig};
use axum::extract::State;
use axum::response::{Html, IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;

use crate::extractors::MaybeMember;
use crate::graphql::Viewer;
use crate::state::AppState;

/// GraphQL endpoint handler; anonymous callers see public data only
async fn graphql_handler(
    State(state): State<AppState>,
    member: MaybeMember,
    Json(req): Json<async_graphql::Request>,
) -> Json<async_graphql::Response> {
    let viewer = Viewer(member.0.map(|m| m.id));
    let response = state.graphql_schema.execute(req.data(viewer)).await;
    Json(response)
}

/// GraphQL Playground UI (development tool)
async fn graphql_playground() -> impl IntoResponse {
    Html(playground_source(GraphQLPlaygroundConfig::new("/graphql")))
}

/// GraphQL router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/graphql", post(graphql_handler))
        .route("/graphql/playground", get(graphql_playground))
}
