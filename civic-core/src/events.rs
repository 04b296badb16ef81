//! Outbound events emitted after a committed state change.
//!
//! The core never performs delivery. Callers hand these to a dispatcher
//! once the owning transaction has committed.

use crate::{Complaint, ComplaintStatus, PatchOutcome};

#[derive(Debug, Clone, PartialEq)]
pub enum ComplaintEvent {
    /// A citizen filed a new complaint. Goes to the administrators.
    Submitted {
        complaint: Complaint,
        category_name: String,
    },
    /// The status moved. Goes to the citizen.
    StatusChanged {
        complaint: Complaint,
        previous_status: ComplaintStatus,
    },
    /// The complaint was just resolved. Goes to the citizen.
    FeedbackRequested { complaint: Complaint },
}

impl ComplaintEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ComplaintEvent::Submitted { .. } => "submitted",
            ComplaintEvent::StatusChanged { .. } => "status_changed",
            ComplaintEvent::FeedbackRequested { .. } => "feedback_requested",
        }
    }

    pub fn complaint(&self) -> &Complaint {
        match self {
            ComplaintEvent::Submitted { complaint, .. }
            | ComplaintEvent::StatusChanged { complaint, .. }
            | ComplaintEvent::FeedbackRequested { complaint } => complaint,
        }
    }
}

/// Events produced by an administrative patch. Empty when the status did not change.
pub fn events_for_patch(outcome: &PatchOutcome) -> Vec<ComplaintEvent> {
    if !outcome.status_changed() {
        return Vec::new();
    }
    let mut events = vec![ComplaintEvent::StatusChanged {
        complaint: outcome.complaint.clone(),
        previous_status: outcome.previous_status,
    }];
    if outcome.entered_resolved() {
        events.push(ComplaintEvent::FeedbackRequested {
            complaint: outcome.complaint.clone(),
        });
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        apply_patch, submit, Category, CategoryId, CivicResult, ComplaintPatch, NewComplaint,
        Priority,
    };
    use chrono::Utc;

    fn pending() -> CivicResult<Complaint> {
        let category = Category {
            category_id: CategoryId::from_name("Other"),
            name: "Other".to_string(),
            description: String::new(),
            icon: String::new(),
            color: crate::DEFAULT_CATEGORY_COLOR.to_string(),
            department: "General Administration".to_string(),
            created_at: Utc::now(),
        };
        let input = NewComplaint {
            title: "t".to_string(),
            description: "d".to_string(),
            category_id: category.category_id,
            citizen_name: "n".to_string(),
            citizen_email: "n@example.org".to_string(),
            citizen_phone: None,
            latitude: None,
            longitude: None,
            address: None,
            photo_ref: None,
        };
        Ok(submit(input, &category, Utc::now())?.complaint)
    }

    #[test]
    fn test_no_events_without_status_change() -> CivicResult<()> {
        let c = pending()?;
        let patch = ComplaintPatch {
            priority: Some(Priority::High),
            ..Default::default()
        };
        let out = apply_patch(&c, &patch, None, Utc::now())?;
        assert!(events_for_patch(&out).is_empty());
        Ok(())
    }

    #[test]
    fn test_resolution_requests_feedback() -> CivicResult<()> {
        let c = pending()?;
        let out = apply_patch(&c, &ComplaintPatch::status(ComplaintStatus::Resolved), None, Utc::now())?;
        let kinds: Vec<_> = events_for_patch(&out).iter().map(ComplaintEvent::kind).collect();
        assert_eq!(kinds, vec!["status_changed", "feedback_requested"]);

        let out = apply_patch(&c, &ComplaintPatch::status(ComplaintStatus::InProgress), None, Utc::now())?;
        let kinds: Vec<_> = events_for_patch(&out).iter().map(ComplaintEvent::kind).collect();
        assert_eq!(kinds, vec!["status_changed"]);
        Ok(())
    }
}
