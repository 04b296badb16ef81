//! Complaint REST API Routes
//!
//! Submission, listing, detail, administrative updates, deletion, feedback,
//! the proximity query and statistics. Handlers parse and render; policy and
//! persistence live in [`ComplaintService`].

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use civic_core::{ComplaintDetail, ComplaintId, ComplaintStatistics};

use crate::{
    config::ApiConfig,
    error::{ApiError, ApiResult},
    extractors::{ApiJson, ApiQuery, PathId},
    middleware::PrincipalExtractor,
    services::{ComplaintListing, ComplaintService},
    state::AppState,
    types::{
        ComplaintDetailResponse, ComplaintListItem, CreateComplaintRequest, FeedbackResponse,
        ListComplaintsQuery, ListComplaintsResponse, NearbyQuery, SubmitFeedbackRequest,
        UpdateComplaintRequest,
    },
};

fn render_detail(config: &ApiConfig, detail: ComplaintDetail) -> ComplaintDetailResponse {
    let photo_url = config.photo_url(detail.complaint.photo_ref.as_deref());
    ComplaintDetailResponse::from_detail(detail, photo_url)
}

fn render_items(listing: ComplaintListing) -> Vec<ComplaintListItem> {
    let ComplaintListing {
        complaints,
        categories,
        ..
    } = listing;
    complaints
        .into_iter()
        .map(|c| ComplaintListItem::from_complaint(c, &categories))
        .collect()
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/complaints - Submit a complaint
#[utoipa::path(
    post,
    path = "/api/v1/complaints",
    tag = "Complaints",
    request_body = CreateComplaintRequest,
    responses(
        (status = 201, description = "Complaint submitted", body = ComplaintDetailResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 409, description = "Reference number collision", body = ApiError),
    ),
    security((), ("bearer_auth" = []))
)]
pub async fn create_complaint(
    State(service): State<ComplaintService>,
    State(config): State<Arc<ApiConfig>>,
    principal: PrincipalExtractor,
    ApiJson(req): ApiJson<CreateComplaintRequest>,
) -> ApiResult<impl IntoResponse> {
    let detail = service.submit(&principal, req.into()).await?;
    Ok((StatusCode::CREATED, Json(render_detail(&config, detail))))
}

/// GET /api/v1/complaints - List complaints visible to the caller
#[utoipa::path(
    get,
    path = "/api/v1/complaints",
    tag = "Complaints",
    params(ListComplaintsQuery),
    responses(
        (status = 200, description = "Page of complaints", body = ListComplaintsResponse),
        (status = 400, description = "Invalid filter", body = ApiError),
    ),
    security((), ("bearer_auth" = []))
)]
pub async fn list_complaints(
    State(service): State<ComplaintService>,
    State(config): State<Arc<ApiConfig>>,
    principal: PrincipalExtractor,
    ApiQuery(params): ApiQuery<ListComplaintsQuery>,
) -> ApiResult<Json<ListComplaintsResponse>> {
    let filter = params.to_filter()?;
    let page = params.page(config.page_size);
    let listing = service.list(&principal, filter, page).await?;
    let total = listing.total;

    Ok(Json(ListComplaintsResponse {
        complaints: render_items(listing),
        total,
    }))
}

/// GET /api/v1/complaints/{id} - Complaint detail
#[utoipa::path(
    get,
    path = "/api/v1/complaints/{id}",
    tag = "Complaints",
    params(
        ("id" = uuid::Uuid, Path, description = "Complaint ID")
    ),
    responses(
        (status = 200, description = "Complaint detail", body = ComplaintDetailResponse),
        (status = 404, description = "Complaint not found", body = ApiError),
    ),
    security((), ("bearer_auth" = []))
)]
pub async fn get_complaint(
    State(service): State<ComplaintService>,
    State(config): State<Arc<ApiConfig>>,
    principal: PrincipalExtractor,
    PathId(id): PathId<ComplaintId>,
) -> ApiResult<Json<ComplaintDetailResponse>> {
    let detail = service.detail(&principal, id).await?;
    Ok(Json(render_detail(&config, detail)))
}

/// PATCH /api/v1/complaints/{id} - Administrative update
#[utoipa::path(
    patch,
    path = "/api/v1/complaints/{id}",
    tag = "Complaints",
    params(
        ("id" = uuid::Uuid, Path, description = "Complaint ID")
    ),
    request_body = UpdateComplaintRequest,
    responses(
        (status = 200, description = "Complaint updated", body = ComplaintDetailResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Invalid credentials", body = ApiError),
        (status = 403, description = "Not an administrator", body = ApiError),
        (status = 404, description = "Complaint not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_complaint(
    State(service): State<ComplaintService>,
    State(config): State<Arc<ApiConfig>>,
    principal: PrincipalExtractor,
    PathId(id): PathId<ComplaintId>,
    ApiJson(req): ApiJson<UpdateComplaintRequest>,
) -> ApiResult<Json<ComplaintDetailResponse>> {
    let detail = service.update(&principal, id, req.into()).await?;
    Ok(Json(render_detail(&config, detail)))
}

/// DELETE /api/v1/complaints/{id} - Remove a complaint
#[utoipa::path(
    delete,
    path = "/api/v1/complaints/{id}",
    tag = "Complaints",
    params(
        ("id" = uuid::Uuid, Path, description = "Complaint ID")
    ),
    responses(
        (status = 204, description = "Complaint deleted"),
        (status = 403, description = "Not a super administrator", body = ApiError),
        (status = 404, description = "Complaint not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_complaint(
    State(service): State<ComplaintService>,
    principal: PrincipalExtractor,
    PathId(id): PathId<ComplaintId>,
) -> ApiResult<StatusCode> {
    service.delete(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/complaints/{id}/submit_feedback - Rate a resolved complaint
#[utoipa::path(
    post,
    path = "/api/v1/complaints/{id}/submit_feedback",
    tag = "Complaints",
    params(
        ("id" = uuid::Uuid, Path, description = "Complaint ID")
    ),
    request_body = SubmitFeedbackRequest,
    responses(
        (status = 201, description = "Feedback recorded", body = FeedbackResponse),
        (status = 400, description = "Not resolved, already rated or invalid rating", body = ApiError),
        (status = 404, description = "Complaint not found", body = ApiError),
    ),
    security((), ("bearer_auth" = []))
)]
pub async fn submit_feedback(
    State(service): State<ComplaintService>,
    principal: PrincipalExtractor,
    PathId(id): PathId<ComplaintId>,
    ApiJson(req): ApiJson<SubmitFeedbackRequest>,
) -> ApiResult<impl IntoResponse> {
    let feedback = service.submit_feedback(&principal, id, req.into()).await?;
    Ok((StatusCode::CREATED, Json(FeedbackResponse::from(feedback))))
}

/// GET /api/v1/complaints/nearby - Complaints within a radius of a point
#[utoipa::path(
    get,
    path = "/api/v1/complaints/nearby",
    tag = "Complaints",
    params(NearbyQuery),
    responses(
        (status = 200, description = "Complaints within the radius", body = Vec<ComplaintListItem>),
        (status = 400, description = "Missing or malformed coordinates", body = ApiError),
    ),
    security((), ("bearer_auth" = []))
)]
pub async fn nearby_complaints(
    State(service): State<ComplaintService>,
    principal: PrincipalExtractor,
    ApiQuery(params): ApiQuery<NearbyQuery>,
) -> ApiResult<Json<Vec<ComplaintListItem>>> {
    let (lat, lng, radius) = params.parse()?;
    let listing = service.nearby(&principal, lat, lng, radius).await?;
    Ok(Json(render_items(listing)))
}

/// GET /api/v1/complaints/statistics - Counts by status and category
#[utoipa::path(
    get,
    path = "/api/v1/complaints/statistics",
    tag = "Complaints",
    params(ListComplaintsQuery),
    responses(
        (status = 200, description = "Aggregate counts", body = ComplaintStatistics),
        (status = 400, description = "Invalid filter", body = ApiError),
    ),
    security((), ("bearer_auth" = []))
)]
pub async fn complaint_statistics(
    State(service): State<ComplaintService>,
    principal: PrincipalExtractor,
    ApiQuery(params): ApiQuery<ListComplaintsQuery>,
) -> ApiResult<Json<ComplaintStatistics>> {
    let filter = params.to_filter()?;
    Ok(Json(service.statistics(&principal, filter).await?))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_complaint).get(list_complaints))
        .route("/nearby", get(nearby_complaints))
        .route("/statistics", get(complaint_statistics))
        .route(
            "/:id",
            get(get_complaint)
                .patch(update_complaint)
                .delete(delete_complaint),
        )
        .route("/:id/submit_feedback", post(submit_feedback))
}
