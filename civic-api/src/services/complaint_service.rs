//! Complaint Service
//!
//! Every operation takes the caller's [`Principal`] explicitly, asks the
//! access policy first, then touches the repository. Outbound events are
//! handed to the dispatcher only after the repository call has returned,
//! i.e. after the change is committed.

use std::collections::HashMap;
use std::sync::Arc;

use civic_core::{
    authorize, stats, within_radius, Action, Category, CategoryId, CivicError, Complaint,
    ComplaintDetail, ComplaintEvent, ComplaintFilter, ComplaintId, ComplaintPatch,
    ComplaintStatistics, EntityType, Feedback, FeedbackSubmission, GeoPoint, NewComplaint, Page,
    Principal,
};
use civic_storage::ComplaintRepository;

use super::ServiceClock;
use crate::error::ApiResult;
use crate::notifications::NotificationDispatcher;
use crate::telemetry::METRICS;

/// A window of complaints plus the categories needed to render them.
#[derive(Debug, Clone, Default)]
pub struct ComplaintListing {
    pub complaints: Vec<Complaint>,
    /// Matches before pagination.
    pub total: usize,
    pub categories: HashMap<CategoryId, Category>,
}

#[derive(Clone)]
pub struct ComplaintService {
    repo: Arc<dyn ComplaintRepository>,
    dispatcher: NotificationDispatcher,
    clock: Arc<dyn ServiceClock>,
}

impl ComplaintService {
    pub fn new(
        repo: Arc<dyn ComplaintRepository>,
        dispatcher: NotificationDispatcher,
        clock: Arc<dyn ServiceClock>,
    ) -> Self {
        Self {
            repo,
            dispatcher,
            clock,
        }
    }

    async fn category_index(&self) -> ApiResult<HashMap<CategoryId, Category>> {
        Ok(self
            .repo
            .category_list()
            .await?
            .into_iter()
            .map(|c| (c.category.category_id, c.category))
            .collect())
    }

    async fn load_detail(&self, id: ComplaintId) -> ApiResult<ComplaintDetail> {
        let detail = self
            .repo
            .complaint_detail(id)
            .await?
            .ok_or_else(|| CivicError::not_found(EntityType::Complaint, id))?;
        Ok(detail)
    }

    /// Scoped snapshot of every complaint matching `filter`, in filter order.
    async fn scoped(&self, principal: &Principal, filter: ComplaintFilter) -> ApiResult<Vec<Complaint>> {
        authorize(principal, Action::Read, None)?;
        let filter = filter.scoped_to(principal.scoped_department());
        Ok(self.repo.complaint_list(&filter).await?)
    }

    // ========================================================================
    // COMMANDS
    // ========================================================================

    /// File a new complaint and announce it to the administrators.
    pub async fn submit(&self, principal: &Principal, input: NewComplaint) -> ApiResult<ComplaintDetail> {
        authorize(principal, Action::Create, None)?;

        let submission = self.repo.complaint_create(input, self.clock.now()).await?;
        let complaint = submission.complaint;

        let detail = self.load_detail(complaint.complaint_id).await?;
        let category_name = detail.category.category.name.clone();

        tracing::info!(
            complaint_id = %complaint.complaint_id,
            reference_number = %complaint.reference_number,
            department = %complaint.department,
            "Complaint submitted"
        );
        if let Ok(metrics) = METRICS.as_ref() {
            metrics.record_submission(&category_name);
        }

        self.dispatcher.dispatch(ComplaintEvent::Submitted {
            complaint,
            category_name,
        });
        Ok(detail)
    }

    /// Apply an administrative patch. Status changes notify the citizen.
    pub async fn update(
        &self,
        principal: &Principal,
        id: ComplaintId,
        patch: ComplaintPatch,
    ) -> ApiResult<ComplaintDetail> {
        authorize(principal, Action::Update, None)?;

        let outcome = self
            .repo
            .complaint_update(id, &patch, principal.id.as_ref(), self.clock.now())
            .await?;

        if outcome.status_changed() {
            tracing::info!(
                complaint_id = %id,
                from = outcome.previous_status.as_db_str(),
                to = outcome.complaint.status.as_db_str(),
                changed_by = principal.id.as_deref().unwrap_or("system"),
                "Complaint status changed"
            );
            if let Ok(metrics) = METRICS.as_ref() {
                metrics.record_transition(
                    outcome.previous_status.as_db_str(),
                    outcome.complaint.status.as_db_str(),
                );
            }
        } else {
            tracing::debug!(complaint_id = %id, "Complaint updated without status change");
        }

        self.dispatcher.dispatch_all(civic_core::events_for_patch(&outcome));
        self.load_detail(id).await
    }

    /// Remove a complaint with its ledger and feedback.
    pub async fn delete(&self, principal: &Principal, id: ComplaintId) -> ApiResult<()> {
        authorize(principal, Action::Delete, None)?;
        self.repo.complaint_delete(id).await?;
        tracing::info!(complaint_id = %id, "Complaint deleted");
        Ok(())
    }

    /// Record the citizen's rating of a resolved or closed complaint.
    pub async fn submit_feedback(
        &self,
        principal: &Principal,
        id: ComplaintId,
        submission: FeedbackSubmission,
    ) -> ApiResult<Feedback> {
        let complaint = self
            .repo
            .complaint_get(id)
            .await?
            .ok_or_else(|| CivicError::not_found(EntityType::Complaint, id))?;
        authorize(principal, Action::SubmitFeedback, Some(&complaint))?;

        let feedback = self
            .repo
            .feedback_submit(id, submission, self.clock.now())
            .await?;

        tracing::info!(complaint_id = %id, rating = feedback.rating, "Feedback recorded");
        if let Ok(metrics) = METRICS.as_ref() {
            metrics.record_feedback(feedback.rating);
        }
        Ok(feedback)
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub async fn detail(&self, principal: &Principal, id: ComplaintId) -> ApiResult<ComplaintDetail> {
        let detail = self.load_detail(id).await?;
        authorize(principal, Action::Read, Some(&detail.complaint))?;
        Ok(detail)
    }

    pub async fn list(
        &self,
        principal: &Principal,
        filter: ComplaintFilter,
        page: Page,
    ) -> ApiResult<ComplaintListing> {
        let matching = self.scoped(principal, filter).await?;
        Ok(ComplaintListing {
            total: matching.len(),
            complaints: page.slice(&matching),
            categories: self.category_index().await?,
        })
    }

    /// Complaints within `radius_km` of a point. Linear scan, input order.
    pub async fn nearby(
        &self,
        principal: &Principal,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
    ) -> ApiResult<ComplaintListing> {
        let center = GeoPoint::new(latitude, longitude)?;
        let radius_km = civic_core::validate_radius(radius_km)?;

        let candidates = self.scoped(principal, ComplaintFilter::default()).await?;
        let complaints = within_radius(&candidates, &center, radius_km);
        Ok(ComplaintListing {
            total: complaints.len(),
            complaints,
            categories: self.category_index().await?,
        })
    }

    pub async fn statistics(
        &self,
        principal: &Principal,
        filter: ComplaintFilter,
    ) -> ApiResult<ComplaintStatistics> {
        let matching = self.scoped(principal, filter).await?;
        let names: HashMap<CategoryId, String> = self
            .category_index()
            .await?
            .into_iter()
            .map(|(id, category)| (id, category.name))
            .collect();
        Ok(stats::compute(&matching, &names))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotifierConfig;
    use crate::error::ErrorCode;
    use crate::notifications::{MemoryNotifier, OutboundMessage};
    use crate::services::{CategoryService, SteppingClock};
    use chrono::{TimeZone, Utc};
    use civic_core::{ComplaintStatus, Priority};
    use civic_storage::InMemoryRepository;
    use std::time::Duration;

    struct Harness {
        complaints: ComplaintService,
        notifier: MemoryNotifier,
    }

    async fn harness() -> Harness {
        let repo: Arc<dyn ComplaintRepository> = Arc::new(InMemoryRepository::new());
        let start = Utc.timestamp_opt(1_704_067_200, 0).single().unwrap();
        let clock: Arc<dyn ServiceClock> = Arc::new(SteppingClock::per_second(start));
        CategoryService::new(repo.clone(), clock.clone())
            .seed_defaults()
            .await
            .unwrap();

        let notifier = MemoryNotifier::new();
        let (dispatcher, _handle) =
            NotificationDispatcher::spawn(Arc::new(notifier.clone()), NotifierConfig::default());
        Harness {
            complaints: ComplaintService::new(repo, dispatcher, clock),
            notifier,
        }
    }

    async fn wait_for(notifier: &MemoryNotifier, count: usize) -> Vec<OutboundMessage> {
        for _ in 0..200 {
            let sent = notifier.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        notifier.sent()
    }

    fn input(category: &str, location: Option<(f64, f64)>) -> NewComplaint {
        NewComplaint {
            title: "Leaking hydrant".to_string(),
            description: "Water pooling on the kerb".to_string(),
            category_id: CategoryId::from_name(category),
            citizen_name: "Ravi".to_string(),
            citizen_email: "ravi@example.org".to_string(),
            citizen_phone: None,
            latitude: location.map(|l| l.0),
            longitude: location.map(|l| l.1),
            address: None,
            photo_ref: None,
        }
    }

    fn admin() -> Principal {
        Principal::staff("admin-1")
    }

    #[tokio::test]
    async fn test_submit_routes_to_category_department() {
        let h = harness().await;
        let detail = h
            .complaints
            .submit(&Principal::anonymous(), input("Water Supply", None))
            .await
            .unwrap();

        assert_eq!(detail.complaint.department, "Water Department");
        assert_eq!(detail.complaint.status, ComplaintStatus::Pending);
        assert!(civic_core::is_valid_reference_number(&detail.complaint.reference_number));
        assert_eq!(detail.history.len(), 1);
        assert_eq!(detail.history[0].old_status, None);
        assert_eq!(detail.history[0].new_status, ComplaintStatus::Pending);

        let sent = wait_for(&h.notifier, 1).await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, "submitted");
    }

    #[tokio::test]
    async fn test_update_requires_staff() {
        let h = harness().await;
        let detail = h
            .complaints
            .submit(&Principal::anonymous(), input("Roads & Infrastructure", None))
            .await
            .unwrap();
        let id = detail.complaint.complaint_id;

        let err = h
            .complaints
            .update(
                &Principal::department_user("u-1", "Public Works Department"),
                id,
                ComplaintPatch::status(ComplaintStatus::Resolved),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn test_resolution_notifies_and_admits_feedback_once() {
        let h = harness().await;
        let id = h
            .complaints
            .submit(&Principal::anonymous(), input("Electricity", None))
            .await
            .unwrap()
            .complaint
            .complaint_id;

        let early = h
            .complaints
            .submit_feedback(
                &Principal::anonymous(),
                id,
                FeedbackSubmission {
                    rating: 4,
                    comments: None,
                    would_recommend: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(early.code, ErrorCode::InvalidState);

        let detail = h
            .complaints
            .update(&admin(), id, ComplaintPatch::status(ComplaintStatus::Resolved))
            .await
            .unwrap();
        assert!(detail.complaint.resolved_at.is_some());
        assert_eq!(detail.history.len(), 2);
        assert_eq!(detail.history[0].changed_by.as_deref(), Some("admin-1"));

        let sent = wait_for(&h.notifier, 3).await;
        let kinds: Vec<_> = sent.iter().map(|m| m.kind.as_str()).collect();
        assert_eq!(kinds, vec!["submitted", "status_changed", "feedback_requested"]);

        let submission = FeedbackSubmission {
            rating: 5,
            comments: Some("Quick fix".to_string()),
            would_recommend: None,
        };
        let feedback = h
            .complaints
            .submit_feedback(&Principal::anonymous(), id, submission.clone())
            .await
            .unwrap();
        assert!(feedback.would_recommend);

        let again = h
            .complaints
            .submit_feedback(&Principal::anonymous(), id, submission)
            .await
            .unwrap_err();
        assert_eq!(again.code, ErrorCode::FeedbackAlreadySubmitted);
    }

    #[tokio::test]
    async fn test_priority_only_patch_appends_nothing() {
        let h = harness().await;
        let id = h
            .complaints
            .submit(&Principal::anonymous(), input("Other", None))
            .await
            .unwrap()
            .complaint
            .complaint_id;
        let patch = ComplaintPatch {
            priority: Some(Priority::Critical),
            ..Default::default()
        };
        let detail = h.complaints.update(&admin(), id, patch).await.unwrap();
        assert_eq!(detail.complaint.priority, Priority::Critical);
        assert_eq!(detail.history.len(), 1);
    }

    #[tokio::test]
    async fn test_department_scoping() {
        let h = harness().await;
        let anon = Principal::anonymous();
        let water = h.complaints.submit(&anon, input("Water Supply", None)).await.unwrap();
        let roads = h
            .complaints
            .submit(&anon, input("Roads & Infrastructure", None))
            .await
            .unwrap();

        let scoped = Principal::department_user("u-2", "Water Department");
        let listing = h
            .complaints
            .list(&scoped, ComplaintFilter::default(), Page::default())
            .await
            .unwrap();
        assert_eq!(listing.total, 1);
        assert_eq!(listing.complaints[0].department, "Water Department");

        let err = h
            .complaints
            .detail(&scoped, roads.complaint.complaint_id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ComplaintNotFound);
        assert!(h
            .complaints
            .detail(&scoped, water.complaint.complaint_id)
            .await
            .is_ok());

        let all = h
            .complaints
            .list(&admin(), ComplaintFilter::default(), Page::default())
            .await
            .unwrap();
        assert_eq!(all.total, 2);

        let stats = h
            .complaints
            .statistics(&scoped, ComplaintFilter::default())
            .await
            .unwrap();
        assert_eq!(stats.total_complaints, 1);
        assert_eq!(stats.by_status.len(), 6);
        assert_eq!(stats.by_category.get("Water Supply"), Some(&1));
        assert!(!stats.by_category.contains_key("Roads & Infrastructure"));
    }

    #[tokio::test]
    async fn test_nearby_radius() {
        let h = harness().await;
        let anon = Principal::anonymous();
        h.complaints
            .submit(&anon, input("Other", Some((12.9716, 77.5946))))
            .await
            .unwrap();
        h.complaints
            .submit(&anon, input("Water Supply", Some((12.9716, 77.5946))))
            .await
            .unwrap();
        // Roughly 10 km north.
        h.complaints
            .submit(&anon, input("Other", Some((13.0615, 77.5946))))
            .await
            .unwrap();
        h.complaints.submit(&anon, input("Other", None)).await.unwrap();

        let at_zero = h.complaints.nearby(&anon, 12.9716, 77.5946, 0.0).await.unwrap();
        assert_eq!(at_zero.total, 2);
        let at_five = h.complaints.nearby(&anon, 12.9716, 77.5946, 5.0).await.unwrap();
        assert_eq!(at_five.total, 2);
        let at_fifteen = h.complaints.nearby(&anon, 12.9716, 77.5946, 15.0).await.unwrap();
        assert_eq!(at_fifteen.total, 3);

        let scoped = Principal::department_user("u-3", "Water Department");
        let water_only = h.complaints.nearby(&scoped, 12.9716, 77.5946, 15.0).await.unwrap();
        assert_eq!(water_only.total, 1);
        assert_eq!(water_only.complaints[0].department, "Water Department");

        assert!(h.complaints.nearby(&anon, 12.0, 77.0, -1.0).await.is_err());
        assert!(h.complaints.nearby(&anon, 95.0, 77.0, 1.0).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_is_superuser_only() {
        let h = harness().await;
        let id = h
            .complaints
            .submit(&Principal::anonymous(), input("Other", None))
            .await
            .unwrap()
            .complaint
            .complaint_id;

        let err = h.complaints.delete(&admin(), id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        h.complaints
            .delete(&Principal::superuser("root"), id)
            .await
            .unwrap();
        let err = h
            .complaints
            .detail(&Principal::anonymous(), id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ComplaintNotFound);
    }
}
