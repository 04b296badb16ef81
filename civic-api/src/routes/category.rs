//! Category REST API Routes

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use civic_core::CategoryId;

use crate::{
    error::{ApiError, ApiResult},
    extractors::{ApiJson, PathId},
    middleware::PrincipalExtractor,
    services::CategoryService,
    state::AppState,
    types::{CategoryResponse, CreateCategoryRequest},
};

/// GET /api/v1/categories - All categories with live complaint counts
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    tag = "Categories",
    responses(
        (status = 200, description = "Categories ordered by name", body = Vec<CategoryResponse>),
    ),
    security((), ("bearer_auth" = []))
)]
pub async fn list_categories(
    State(service): State<CategoryService>,
) -> ApiResult<Json<Vec<CategoryResponse>>> {
    let categories = service.list().await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/categories/{id} - One category
#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}",
    tag = "Categories",
    params(
        ("id" = uuid::Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category", body = CategoryResponse),
        (status = 404, description = "Category not found", body = ApiError),
    ),
    security((), ("bearer_auth" = []))
)]
pub async fn get_category(
    State(service): State<CategoryService>,
    PathId(id): PathId<CategoryId>,
) -> ApiResult<Json<CategoryResponse>> {
    Ok(Json(service.get(id).await?.into()))
}

/// POST /api/v1/categories - Register a category
#[utoipa::path(
    post,
    path = "/api/v1/categories",
    tag = "Categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 403, description = "Not a super administrator", body = ApiError),
        (status = 409, description = "Name already taken", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_category(
    State(service): State<CategoryService>,
    principal: PrincipalExtractor,
    ApiJson(req): ApiJson<CreateCategoryRequest>,
) -> ApiResult<impl IntoResponse> {
    let created = service.create(&principal, req.into()).await?;
    Ok((StatusCode::CREATED, Json(CategoryResponse::from(created))))
}

/// DELETE /api/v1/categories/{id} - Remove an unused category
#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}",
    tag = "Categories",
    params(
        ("id" = uuid::Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 403, description = "Not a super administrator", body = ApiError),
        (status = 404, description = "Category not found", body = ApiError),
        (status = 409, description = "Category still has complaints", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_category(
    State(service): State<CategoryService>,
    principal: PrincipalExtractor,
    PathId(id): PathId<CategoryId>,
) -> ApiResult<StatusCode> {
    service.delete(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/:id", get(get_category).delete(delete_category))
}
