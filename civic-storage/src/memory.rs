//! In-memory repository backend.
//!
//! All state sits behind a single lock so each operation observes and
//! commits a consistent snapshot, which gives the same atomicity the
//! PostgreSQL backend gets from transactions.

use crate::ComplaintRepository;
use async_trait::async_trait;
use civic_core::{
    admit_feedback, apply_patch, submit, Category, CategoryId, CategoryWithCount, CivicError,
    CivicResult, Complaint, ComplaintFilter, ComplaintId, ComplaintPatch, ConflictError,
    EntityIdType, EntityType, Feedback, FeedbackSubmission, NewComplaint, PatchOutcome,
    PrincipalId, StatusHistoryEntry, StorageError, Submission, Timestamp, ValidationError,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct State {
    categories: HashMap<CategoryId, Category>,
    complaints: HashMap<ComplaintId, Complaint>,
    references: HashMap<String, ComplaintId>,
    history: HashMap<ComplaintId, Vec<StatusHistoryEntry>>,
    feedback: HashMap<ComplaintId, Feedback>,
}

impl State {
    fn count_for(&self, id: CategoryId) -> i64 {
        self.complaints
            .values()
            .filter(|c| c.category_id == id)
            .count() as i64
    }

    fn with_count(&self, category: &Category) -> CategoryWithCount {
        CategoryWithCount {
            category: category.clone(),
            complaint_count: self.count_for(category.category_id),
        }
    }

    fn category_by_name(&self, name: &str) -> Option<&Category> {
        self.categories
            .values()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// Thread-safe in-memory backend for development and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<RwLock<State>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> CivicResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| CivicError::Storage(StorageError::LockPoisoned))
    }

    fn write(&self) -> CivicResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| CivicError::Storage(StorageError::LockPoisoned))
    }

    /// Number of stored complaints.
    pub fn complaint_count(&self) -> CivicResult<usize> {
        Ok(self.read()?.complaints.len())
    }

    /// Total ledger entries across all complaints.
    pub fn history_count(&self) -> CivicResult<usize> {
        Ok(self.read()?.history.values().map(Vec::len).sum())
    }

    /// Drop all data.
    pub fn clear(&self) -> CivicResult<()> {
        *self.write()? = State::default();
        Ok(())
    }
}

#[async_trait]
impl ComplaintRepository for InMemoryRepository {
    async fn category_list(&self) -> CivicResult<Vec<CategoryWithCount>> {
        let state = self.read()?;
        let mut out: Vec<CategoryWithCount> =
            state.categories.values().map(|c| state.with_count(c)).collect();
        out.sort_by(|a, b| a.category.name.cmp(&b.category.name));
        Ok(out)
    }

    async fn category_get(&self, id: CategoryId) -> CivicResult<Option<CategoryWithCount>> {
        let state = self.read()?;
        Ok(state.categories.get(&id).map(|c| state.with_count(c)))
    }

    async fn category_insert(&self, category: &Category) -> CivicResult<()> {
        let mut state = self.write()?;
        if state.category_by_name(&category.name).is_some()
            || state.categories.contains_key(&category.category_id)
        {
            return Err(ConflictError::CategoryNameTaken {
                name: category.name.clone(),
            }
            .into());
        }
        state.categories.insert(category.category_id, category.clone());
        Ok(())
    }

    async fn category_upsert(&self, category: &Category) -> CivicResult<bool> {
        let mut state = self.write()?;
        let existing = state.category_by_name(&category.name).map(|c| c.category_id);
        match existing {
            Some(id) => {
                if let Some(stored) = state.categories.get_mut(&id) {
                    stored.description = category.description.clone();
                    stored.icon = category.icon.clone();
                    stored.color = category.color.clone();
                    stored.department = category.department.clone();
                }
                Ok(false)
            }
            None => {
                state.categories.insert(category.category_id, category.clone());
                Ok(true)
            }
        }
    }

    async fn category_delete(&self, id: CategoryId) -> CivicResult<()> {
        let mut state = self.write()?;
        if !state.categories.contains_key(&id) {
            return Err(CivicError::not_found(EntityType::Category, id));
        }
        let complaints = state.count_for(id);
        if complaints > 0 {
            return Err(ConflictError::CategoryInUse {
                category_id: id.as_uuid(),
                complaints,
            }
            .into());
        }
        state.categories.remove(&id);
        Ok(())
    }

    async fn complaint_create(
        &self,
        input: NewComplaint,
        now: Timestamp,
    ) -> CivicResult<Submission> {
        let mut state = self.write()?;
        let category = state.categories.get(&input.category_id).ok_or(
            ValidationError::UnknownCategory {
                category_id: input.category_id.as_uuid(),
            },
        )?;
        let submission = submit(input, category, now)?;
        let reference = submission.complaint.reference_number.clone();
        if state.references.contains_key(&reference) {
            return Err(ConflictError::ReferenceCollision {
                reference_number: reference,
            }
            .into());
        }

        let id = submission.complaint.complaint_id;
        state.references.insert(reference, id);
        state.complaints.insert(id, submission.complaint.clone());
        state
            .history
            .insert(id, vec![submission.initial_entry.clone()]);
        Ok(submission)
    }

    async fn complaint_get(&self, id: ComplaintId) -> CivicResult<Option<Complaint>> {
        Ok(self.read()?.complaints.get(&id).cloned())
    }

    async fn complaint_list(&self, filter: &ComplaintFilter) -> CivicResult<Vec<Complaint>> {
        let state = self.read()?;
        Ok(filter.apply(state.complaints.values()))
    }

    async fn complaint_update(
        &self,
        id: ComplaintId,
        patch: &ComplaintPatch,
        changed_by: Option<&PrincipalId>,
        now: Timestamp,
    ) -> CivicResult<PatchOutcome> {
        let mut state = self.write()?;
        let current = state
            .complaints
            .get(&id)
            .ok_or_else(|| CivicError::not_found(EntityType::Complaint, id))?;
        let outcome = apply_patch(current, patch, changed_by, now)?;

        state.complaints.insert(id, outcome.complaint.clone());
        if let Some(entry) = &outcome.entry {
            state.history.entry(id).or_default().push(entry.clone());
        }
        Ok(outcome)
    }

    async fn complaint_delete(&self, id: ComplaintId) -> CivicResult<()> {
        let mut state = self.write()?;
        let removed = state
            .complaints
            .remove(&id)
            .ok_or_else(|| CivicError::not_found(EntityType::Complaint, id))?;
        state.references.remove(&removed.reference_number);
        state.history.remove(&id);
        state.feedback.remove(&id);
        Ok(())
    }

    async fn history_list_for(&self, id: ComplaintId) -> CivicResult<Vec<StatusHistoryEntry>> {
        let state = self.read()?;
        let mut entries = state.history.get(&id).cloned().unwrap_or_default();
        // Appended in order; newest first for readers.
        entries.reverse();
        Ok(entries)
    }

    async fn feedback_get(&self, id: ComplaintId) -> CivicResult<Option<Feedback>> {
        Ok(self.read()?.feedback.get(&id).cloned())
    }

    async fn feedback_submit(
        &self,
        id: ComplaintId,
        submission: FeedbackSubmission,
        now: Timestamp,
    ) -> CivicResult<Feedback> {
        let mut state = self.write()?;
        let complaint = state
            .complaints
            .get(&id)
            .ok_or_else(|| CivicError::not_found(EntityType::Complaint, id))?;
        let exists = state.feedback.contains_key(&id);
        let feedback = admit_feedback(complaint, exists, submission, now)?;
        state.feedback.insert(id, feedback.clone());
        Ok(feedback)
    }

    async fn health_check(&self) -> CivicResult<()> {
        self.read().map(|_| ())
    }
}
