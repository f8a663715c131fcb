//! Project endpoints

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use super::AppState;
use super::error::ApiError;
use super::extractors::{JsonBody, ProjectId};
use crate::models::{Project, ProjectInput};

/// GET /projects - every stored project, `[]` when there are none
async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<Project>>, ApiError> {
    let projects = state.store().list_all().await?;
    Ok(Json(projects))
}

/// GET /projects/{id}
async fn get_project(
    State(state): State<AppState>,
    ProjectId(id): ProjectId,
) -> Result<Json<Project>, ApiError> {
    let project = state.store().get_by_id(id).await?;
    Ok(Json(project))
}

/// POST /projects - responds with the project including its new id
async fn create_project(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<ProjectInput>,
) -> Result<Json<Project>, ApiError> {
    let project = state.store().create(&input).await?;
    tracing::info!(id = project.id, "created project");
    Ok(Json(project))
}

/// PUT /projects/{id} - overwrites all fields, echoing them back under the path id
///
/// The body is decoded before the id is looked at, so a bad body is a 400 even on a bad id.
async fn update_project(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    JsonBody(input): JsonBody<ProjectInput>,
) -> Result<Json<Project>, ApiError> {
    let ProjectId(id) = ProjectId::parse(&raw_id)?;
    let project = state.store().update(id, &input).await?;
    tracing::info!(id, "updated project");
    Ok(Json(project))
}

/// DELETE /projects/{id}
async fn delete_project(
    State(state): State<AppState>,
    ProjectId(id): ProjectId,
) -> Result<Json<&'static str>, ApiError> {
    state.store().delete(id).await?;
    tracing::info!(id, "deleted project");
    Ok(Json("Project deleted"))
}

/// Project routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/{id}",
            get(get_project).put(update_project).delete(delete_project),
        )
}
