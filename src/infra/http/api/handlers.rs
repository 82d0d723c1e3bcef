use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::application::pagination::Paginated;
use crate::application::resources::Resource;

use super::error::ApiError;
use super::models::ListQuery;
use super::state::ApiState;

pub async fn list_resources<E: Resource>(
    State(state): State<ApiState<E>>,
    page: Result<Query<ListQuery>, QueryRejection>,
    filter: Result<Query<E::Filter>, QueryRejection>,
) -> Result<Json<Paginated<E>>, ApiError> {
    let Query(page) = page?;
    let Query(filter) = filter?;

    let result = state
        .service
        .search(&filter, page.page, page.page_size)
        .await?;
    Ok(Json(result))
}

pub async fn get_resource<E: Resource>(
    State(state): State<ApiState<E>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<E>, ApiError> {
    let Path(id) = id?;
    let entity = state.service.read(id).await?;
    Ok(Json(entity))
}

pub async fn create_resource<E: Resource>(
    State(state): State<ApiState<E>>,
    payload: Result<Json<E::Draft>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(draft) = payload?;
    let created = state.service.create(draft).await?;

    let location = format!("/{}/{}", E::KIND.collection(), created.id());
    let mut response = (StatusCode::CREATED, Json(created)).into_response();
    if let Ok(value) = HeaderValue::from_str(&location) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    Ok(response)
}

pub async fn update_resource<E: Resource>(
    State(state): State<ApiState<E>>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<E::Patch>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    let Json(patch) = payload?;
    state.service.update(id, patch).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_resource<E: Resource>(
    State(state): State<ApiState<E>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    state.service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
