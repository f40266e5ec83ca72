use std::collections::BTreeMap;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json,
};
use http::StatusCode;
use sneakers_dal::sneaker::{CreateSneaker, SneakerRepository};
use sneakers_types::claim::ApiClaim;
use tracing::debug;

use crate::{
    auth::acting_user,
    error::ApiResult,
    repository_from_request,
    rest_api::{
        catalog::{CatalogQueryBuilder, DEFAULT_LIMIT},
        Message,
    },
    state::AppState,
    validate::{validate, Valid},
};
#[cfg(feature = "openapi")]
use sneakers_dal::sneaker::Sneaker;

repository_from_request!(SneakerRepository);

#[cfg(feature = "openapi")]
#[derive(utoipa::OpenApi)]
#[openapi(paths(list, show, create, update, destroy))]
struct ModuleDocs;

#[cfg(feature = "openapi")]
pub fn api_docs() -> utoipa::openapi::OpenApi {
    use utoipa::OpenApi as _;
    ModuleDocs::openapi()
}

/// Documentation only, handler takes all query parameters as a map
#[cfg(feature = "openapi")]
#[allow(dead_code)]
#[derive(utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
struct CatalogParams {
    /// Page number, starting at 1
    _page: Option<u32>,
    /// Page size, 0 means everything
    _limit: Option<u32>,
    /// Case insensitive substring of name
    _search: Option<String>,
    /// Exact type, case insensitive
    _type: Option<String>,
    /// Case insensitive substring of publisher
    _publisher: Option<String>,
    /// One of latest_publication, latest_added, title_asc, title_desc, price_asc, price_desc
    _sort_by: Option<String>,
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "", tag = "Sneaker", operation_id = "listSneakers",
    params(CatalogParams),
    responses((status = StatusCode::OK, description = "Filtered and paginated catalog", body = crate::rest_api::catalog::CatalogPage),
        (status = StatusCode::BAD_REQUEST, description = "Invalid query parameters", body = Message))))]
pub async fn list(
    repository: SneakerRepository,
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> ApiResult<impl IntoResponse> {
    let default_limit = match state.config().default_limit {
        0 => DEFAULT_LIMIT,
        limit => limit,
    };
    let page = CatalogQueryBuilder::new(&repository, default_limit)
        .run(params)
        .await?;
    Ok((StatusCode::OK, Json(page)))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/{id}", tag = "Sneaker", operation_id = "getSneaker",
    responses((status = StatusCode::OK, description = "Get one", body = Sneaker),
        (status = StatusCode::NOT_FOUND, description = "No such sneaker", body = Message))))]
pub async fn show(
    Path(id): Path<i64>,
    repository: SneakerRepository,
) -> ApiResult<impl IntoResponse> {
    let record = repository.get(id).await?;
    Ok((StatusCode::OK, Json(record)))
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "", tag = "Sneaker", operation_id = "createSneaker",
    security(("bearer" = [])),
    responses((status = StatusCode::CREATED, description = "Created sneaker", body = Sneaker),
        (status = StatusCode::BAD_REQUEST, description = "Validation failed", body = Message),
        (status = StatusCode::UNAUTHORIZED, description = "Missing or invalid token", body = Message))))]
pub async fn create(
    claim: ApiClaim,
    repository: SneakerRepository,
    Valid(Json(payload)): Valid<Json<CreateSneaker>>,
) -> ApiResult<impl IntoResponse> {
    let user_id = acting_user(&claim)?;
    let record = repository.create(payload, user_id).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[cfg_attr(feature = "openapi", utoipa::path(put, path = "/{id}", tag = "Sneaker", operation_id = "updateSneaker",
    security(("bearer" = [])),
    responses((status = StatusCode::OK, description = "Updated", body = Message),
        (status = StatusCode::NOT_FOUND, description = "No such sneaker", body = Message),
        (status = StatusCode::BAD_REQUEST, description = "Validation failed", body = Message))))]
pub async fn update(
    Path(id): Path<i64>,
    claim: ApiClaim,
    repository: SneakerRepository,
    payload: Result<Json<CreateSneaker>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let user_id = acting_user(&claim)?;
    // missing record wins over invalid body
    repository.get(id).await?;
    let Json(payload) = payload?;
    validate(&payload)?;
    repository.update(id, payload, user_id).await?;
    debug!("Sneaker {id} updated by {user_id}");
    Ok((StatusCode::OK, Json(Message::new("Updated successfully"))))
}

#[cfg_attr(feature = "openapi", utoipa::path(delete, path = "/{id}", tag = "Sneaker", operation_id = "deleteSneaker",
    security(("bearer" = [])),
    responses((status = StatusCode::OK, description = "Deleted", body = Message),
        (status = StatusCode::NOT_FOUND, description = "No such sneaker", body = Message))))]
pub async fn destroy(
    Path(id): Path<i64>,
    claim: ApiClaim,
    repository: SneakerRepository,
) -> ApiResult<impl IntoResponse> {
    let user_id = acting_user(&claim)?;
    repository.soft_delete(id, user_id).await?;
    Ok((StatusCode::OK, Json(Message::new("Deleted successfully"))))
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).put(update).delete(destroy))
}
