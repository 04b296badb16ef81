//! HTTP-level tests for the complaint and category routes.
//!
//! Every test drives the full router (auth layer, extractors, services and
//! the in-memory repository) through `tower::ServiceExt::oneshot`.

mod support;

use axum::http::{Method, StatusCode};
use civic_core::{is_valid_reference_number, Principal};
use civic_test_utils::fixtures::{
    admin, roads_category_id, superuser, water_category_id, water_department_user,
};
use serde_json::json;
use support::{complaint_body, TestApp};

fn id_of(detail: &serde_json::Value) -> String {
    detail["id"].as_str().expect("detail has an id").to_string()
}

// ============================================================================
// SUBMISSION
// ============================================================================

#[tokio::test]
async fn test_submission_creates_pending_complaint_and_notifies_admin() {
    let app = TestApp::new().await;
    let detail = app.submit(complaint_body(water_category_id(), "Burst main")).await;

    let reference = detail["reference_number"].as_str().unwrap();
    assert!(is_valid_reference_number(reference), "bad reference {}", reference);
    assert_eq!(detail["status"], "pending");
    assert_eq!(detail["priority"], "medium");
    assert_eq!(detail["department"], "Water Department");
    assert_eq!(detail["category"]["name"], "Water Supply");
    assert_eq!(detail["category"]["complaint_count"], 1);

    let history = detail["status_history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["old_status"], "");
    assert_eq!(history[0]["new_status"], "pending");
    assert_eq!(history[0]["changed_by_name"], "System");
    assert!(detail["feedback"].is_null());

    let sent = app.wait_for_messages(1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, "submitted");
    assert_eq!(sent[0].to, "admin@complaints.local");
    assert_eq!(sent[0].subject, format!("New Complaint Submitted: {}", reference));
}

#[tokio::test]
async fn test_submission_rejects_invalid_input() {
    let app = TestApp::new().await;

    let mut missing_title = complaint_body(water_category_id(), "x");
    missing_title["title"] = json!("   ");
    let (status, body) = app.post("/api/v1/complaints", None, missing_title).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);

    let unknown_category = complaint_body(uuid::Uuid::nil(), "Stray dogs");
    let (status, _) = app.post("/api/v1/complaints", None, unknown_category).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut half_location = complaint_body(water_category_id(), "Leak");
    half_location["latitude"] = json!(12.97);
    let (status, _) = app.post("/api/v1/complaints", None, half_location).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post("/api/v1/complaints", None, json!({ "title": 42 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["code"].is_string());

    assert!(app.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_malformed_bearer_token_is_unauthorized() {
    let app = TestApp::new().await;
    let request = axum::http::Request::builder()
        .uri("/api/v1/complaints")
        .header("authorization", "Bearer not-a-token")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.router.clone(), request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// LISTING AND DETAIL
// ============================================================================

#[tokio::test]
async fn test_department_user_only_sees_own_department() {
    let app = TestApp::new().await;
    let water = app.submit(complaint_body(water_category_id(), "No water")).await;
    let roads = app.submit(complaint_body(roads_category_id(), "Pothole")).await;
    let water_user = water_department_user();

    let (status, body) = app.get("/api/v1/complaints", Some(&water_user)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["complaints"][0]["id"], water["id"]);
    assert_eq!(body["complaints"][0]["category_name"], "Water Supply");

    let (status, body) = app.get("/api/v1/complaints", Some(&admin())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);

    let uri = format!("/api/v1/complaints/{}", id_of(&roads));
    let (status, body) = app.get(&uri, Some(&water_user)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "COMPLAINT_NOT_FOUND");

    let (status, _) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_list_filters_and_pagination() {
    let app = TestApp::new().await;
    for title in ["Leak one", "Leak two", "Leak three"] {
        app.submit(complaint_body(water_category_id(), title)).await;
    }
    app.submit(complaint_body(roads_category_id(), "Broken kerb"))
        .await;

    let uri = format!("/api/v1/complaints?category={}", water_category_id());
    let (_, body) = app.get(&uri, None).await;
    assert_eq!(body["total"], 3);

    let (_, body) = app.get("/api/v1/complaints?search=kerb", None).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["complaints"][0]["title"], "Broken kerb");

    let (_, body) = app.get("/api/v1/complaints?search=leak%20market", None).await;
    assert_eq!(body["total"], 3);
    let (_, body) = app.get("/api/v1/complaints?search=kerb,market", None).await;
    assert_eq!(body["total"], 1);
    let (_, body) = app.get("/api/v1/complaints?search=kerb%20leak", None).await;
    assert_eq!(body["total"], 0);

    let (_, body) = app.get("/api/v1/complaints?limit=2&offset=1", None).await;
    assert_eq!(body["total"], 4);
    assert_eq!(body["complaints"].as_array().unwrap().len(), 2);

    let (status, _) = app.get("/api/v1/complaints?status=bogus", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_complaint_and_malformed_id() {
    let app = TestApp::new().await;
    let uri = format!("/api/v1/complaints/{}", uuid::Uuid::now_v7());
    let (status, _) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.get("/api/v1/complaints/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_FORMAT");
}

// ============================================================================
// ADMINISTRATIVE UPDATES
// ============================================================================

#[tokio::test]
async fn test_update_requires_administrator() {
    let app = TestApp::new().await;
    let detail = app.submit(complaint_body(water_category_id(), "Low pressure")).await;
    let uri = format!("/api/v1/complaints/{}", id_of(&detail));
    let patch = json!({ "status": "in_progress" });

    let (status, body) = app
        .send(Method::PATCH, &uri, None, Some(patch.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, _) = app.patch(&uri, &water_department_user(), patch.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let missing = format!("/api/v1/complaints/{}", uuid::Uuid::now_v7());
    let (status, _) = app.patch(&missing, &admin(), patch).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_status_change_appends_history_and_notifies_citizen() {
    let app = TestApp::new().await;
    let detail = app.submit(complaint_body(water_category_id(), "Contaminated tap")).await;
    let uri = format!("/api/v1/complaints/{}", id_of(&detail));

    let (status, updated) = app
        .patch(
            &uri,
            &admin(),
            json!({ "status": "in_progress", "priority": "critical", "assigned_to": "crew-7" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert_eq!(updated["status"], "in_progress");
    assert_eq!(updated["priority"], "critical");
    assert_eq!(updated["assigned_to"], "crew-7");

    let history = updated["status_history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["old_status"], "pending");
    assert_eq!(history[0]["new_status"], "in_progress");
    assert_eq!(history[0]["changed_by"], "admin-1");

    let (_, unassigned) = app
        .patch(&uri, &admin(), json!({ "assigned_to": null }))
        .await;
    assert!(unassigned["assigned_to"].is_null());
    assert_eq!(unassigned["status_history"].as_array().unwrap().len(), 2);

    let sent = app.wait_for_messages(2).await;
    let update = sent
        .iter()
        .find(|m| m.kind == "status_changed")
        .expect("status change was announced");
    assert_eq!(update.to, "amina@example.org");
    assert!(update.body.contains("Work has begun"));
}

#[tokio::test]
async fn test_delete_requires_superuser() {
    let app = TestApp::new().await;
    let detail = app.submit(complaint_body(roads_category_id(), "Fallen sign")).await;
    let uri = format!("/api/v1/complaints/{}", id_of(&detail));

    let (status, _) = app.send(Method::DELETE, &uri, Some(&admin()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(Method::DELETE, &uri, Some(&superuser()), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// FEEDBACK
// ============================================================================

#[tokio::test]
async fn test_feedback_flow() {
    let app = TestApp::new().await;
    let detail = app.submit(complaint_body(water_category_id(), "Meter broken")).await;
    let id = id_of(&detail);
    let feedback_uri = format!("/api/v1/complaints/{}/submit_feedback", id);
    let rating = |r: i64| json!({ "rating": r, "comments": "Quick fix", "would_recommend": true });

    let (status, body) = app.post(&feedback_uri, None, rating(5)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_STATE");

    let (status, resolved) = app
        .patch(
            &format!("/api/v1/complaints/{}", id),
            &admin(),
            json!({ "status": "resolved" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(resolved["resolved_at"].is_string());

    let (status, _) = app.post(&feedback_uri, None, rating(6)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.post(&feedback_uri, None, rating(5)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["rating"], 5);
    assert_eq!(body["would_recommend"], true);

    let (status, body) = app.post(&feedback_uri, None, rating(4)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "FEEDBACK_ALREADY_SUBMITTED");

    let (_, detail) = app.get(&format!("/api/v1/complaints/{}", id), None).await;
    assert_eq!(detail["feedback"]["rating"], 5);

    let sent = app.wait_for_messages(3).await;
    assert!(sent.iter().any(|m| m.kind == "feedback_requested"
        && m.subject.starts_with("Please Share Your Feedback")));
}

// ============================================================================
// NEARBY AND STATISTICS
// ============================================================================

#[tokio::test]
async fn test_nearby_query() {
    let app = TestApp::new().await;
    let mut central = complaint_body(roads_category_id(), "Pothole on MG Road");
    central["latitude"] = json!(12.9716);
    central["longitude"] = json!(77.5946);
    let mut distant = complaint_body(roads_category_id(), "Pothole in Chennai");
    distant["latitude"] = json!(13.0827);
    distant["longitude"] = json!(80.2707);
    let mut same_spot = complaint_body(water_category_id(), "Burst main on MG Road");
    same_spot["latitude"] = json!(12.9716);
    same_spot["longitude"] = json!(77.5946);
    app.submit(central).await;
    app.submit(same_spot).await;
    app.submit(distant).await;
    app.submit(complaint_body(roads_category_id(), "No location")).await;

    let (status, body) = app
        .get("/api/v1/complaints/nearby?lat=12.97&lng=77.59", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    let mut titles: Vec<_> = items.iter().map(|c| c["title"].as_str().unwrap()).collect();
    titles.sort_unstable();
    assert_eq!(titles, vec!["Burst main on MG Road", "Pothole on MG Road"]);

    let (status, body) = app
        .get("/api/v1/complaints/nearby?lat=12.9716&lng=77.5946&radius=0", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = app
        .get(
            "/api/v1/complaints/nearby?lat=12.9716&lng=77.5946&radius=0",
            Some(&water_department_user()),
        )
        .await;
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Burst main on MG Road");

    let (_, body) = app
        .get("/api/v1/complaints/nearby?lat=12.97&lng=77.59&radius=500", None)
        .await;
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (status, body) = app.get("/api/v1/complaints/nearby?lng=77.59", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");

    let (status, body) = app
        .get("/api/v1/complaints/nearby?lat=north&lng=77.59", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_FORMAT");

    let (status, _) = app
        .get("/api/v1/complaints/nearby?lat=12.97&lng=77.59&radius=-1", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_statistics_are_zero_filled_and_scoped() {
    let app = TestApp::new().await;
    app.submit(complaint_body(water_category_id(), "Leak")).await;
    app.submit(complaint_body(water_category_id(), "Leak again")).await;
    app.submit(complaint_body(roads_category_id(), "Crack")).await;

    let (status, body) = app.get("/api/v1/complaints/statistics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_complaints"], 3);
    assert_eq!(body["by_status"]["pending"], 3);
    assert_eq!(body["by_status"]["resolved"], 0);
    assert_eq!(body["by_status"].as_object().unwrap().len(), 6);
    assert_eq!(body["by_category"]["Water Supply"], 2);
    assert_eq!(body["by_category"]["Roads & Infrastructure"], 1);
    assert!(body["by_category"].get("Electricity").is_none());

    let (_, body) = app
        .get("/api/v1/complaints/statistics", Some(&water_department_user()))
        .await;
    assert_eq!(body["total_complaints"], 2);
}

// ============================================================================
// CATEGORIES
// ============================================================================

#[tokio::test]
async fn test_category_catalogue_and_management() {
    let app = TestApp::new().await;
    app.submit(complaint_body(water_category_id(), "Leak")).await;

    let (status, body) = app.get("/api/v1/categories", None).await;
    assert_eq!(status, StatusCode::OK);
    let categories = body.as_array().unwrap();
    assert_eq!(categories.len(), 8);
    let water = categories
        .iter()
        .find(|c| c["name"] == "Water Supply")
        .unwrap();
    assert_eq!(water["complaint_count"], 1);

    let noise = json!({
        "name": "Noise",
        "description": "Loudspeakers and construction at night",
        "department": "Environment Department",
    });
    let (status, _) = app
        .post("/api/v1/categories", Some(&admin()), noise.clone())
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = app
        .post("/api/v1/categories", Some(&superuser()), noise)
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert_eq!(created["color"], "#3B82F6");
    assert_eq!(created["complaint_count"], 0);

    let in_use = format!("/api/v1/categories/{}", water_category_id());
    let (status, _) = app
        .send(Method::DELETE, &in_use, Some(&superuser()), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let unused = format!("/api/v1/categories/{}", created["id"].as_str().unwrap());
    let (status, _) = app
        .send(Method::DELETE, &unused, Some(&superuser()), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&unused, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// PUBLIC ENDPOINTS
// ============================================================================

#[tokio::test]
async fn test_health_and_documents_are_public() {
    let app = TestApp::new().await;

    let (status, _) = app.get("/health/ping", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get("/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.get("/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/v1/complaints"].is_object());
}

#[tokio::test]
async fn test_list_for_staff_and_anonymous_callers() {
    let app = TestApp::new().await;
    let (status, body) = app
        .get("/api/v1/complaints", Some(&Principal::staff("ops")))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);

    let (status, _) = app.get("/api/v1/complaints", None).await;
    assert_eq!(status, StatusCode::OK);
}
