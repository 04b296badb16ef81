//! The persistence seam for complaint records.
//!
//! Every mutating method is atomic: the record change and any ledger append
//! it implies are committed together or not at all.

use async_trait::async_trait;
use civic_core::{
    Category, CategoryId, CategoryWithCount, CivicError, CivicResult, Complaint, ComplaintDetail,
    ComplaintFilter, ComplaintId, ComplaintPatch, EntityType, Feedback, FeedbackSubmission,
    NewComplaint, PatchOutcome, PrincipalId, StatusHistoryEntry, Submission, Timestamp,
};

/// Async repository for categories, complaints, the status ledger and feedback.
#[async_trait]
pub trait ComplaintRepository: Send + Sync {
    // ========================================================================
    // CATEGORY OPERATIONS
    // ========================================================================

    /// All categories with live complaint counts, ordered by name.
    async fn category_list(&self) -> CivicResult<Vec<CategoryWithCount>>;

    async fn category_get(&self, id: CategoryId) -> CivicResult<Option<CategoryWithCount>>;

    /// Insert a category. Fails with a conflict if the name is taken.
    async fn category_insert(&self, category: &Category) -> CivicResult<()>;

    /// Insert or refresh a category keyed by name. Used for seeding.
    ///
    /// Returns `true` when a new row was created.
    async fn category_upsert(&self, category: &Category) -> CivicResult<bool>;

    /// Delete a category. Fails with a conflict while complaints reference it.
    async fn category_delete(&self, id: CategoryId) -> CivicResult<()>;

    // ========================================================================
    // COMPLAINT OPERATIONS
    // ========================================================================

    /// Resolve the category, build the complaint and persist it together with
    /// its initial ledger entry.
    async fn complaint_create(&self, input: NewComplaint, now: Timestamp)
        -> CivicResult<Submission>;

    async fn complaint_get(&self, id: ComplaintId) -> CivicResult<Option<Complaint>>;

    /// Complaints matching `filter`, sorted by its ordering.
    async fn complaint_list(&self, filter: &ComplaintFilter) -> CivicResult<Vec<Complaint>>;

    /// Apply a patch and append the ledger entry it produces, atomically.
    async fn complaint_update(
        &self,
        id: ComplaintId,
        patch: &ComplaintPatch,
        changed_by: Option<&PrincipalId>,
        now: Timestamp,
    ) -> CivicResult<PatchOutcome>;

    /// Delete a complaint together with its ledger and feedback.
    async fn complaint_delete(&self, id: ComplaintId) -> CivicResult<()>;

    // ========================================================================
    // LEDGER AND FEEDBACK
    // ========================================================================

    /// Ledger entries for one complaint, newest first.
    async fn history_list_for(&self, id: ComplaintId) -> CivicResult<Vec<StatusHistoryEntry>>;

    async fn feedback_get(&self, id: ComplaintId) -> CivicResult<Option<Feedback>>;

    /// Check admission rules and store the feedback in one step.
    async fn feedback_submit(
        &self,
        id: ComplaintId,
        submission: FeedbackSubmission,
        now: Timestamp,
    ) -> CivicResult<Feedback>;

    /// Verify the backend is reachable.
    async fn health_check(&self) -> CivicResult<()>;

    // ========================================================================
    // COMPOSED READS
    // ========================================================================

    /// Complaint joined with its category, ledger and feedback.
    async fn complaint_detail(&self, id: ComplaintId) -> CivicResult<Option<ComplaintDetail>> {
        let Some(complaint) = self.complaint_get(id).await? else {
            return Ok(None);
        };
        let category = self
            .category_get(complaint.category_id)
            .await?
            .ok_or_else(|| CivicError::not_found(EntityType::Category, complaint.category_id))?;
        let history = self.history_list_for(id).await?;
        let feedback = self.feedback_get(id).await?;
        Ok(Some(ComplaintDetail {
            complaint,
            category,
            history,
            feedback,
        }))
    }
}
