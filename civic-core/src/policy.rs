//! Access policy: a pure decision over `(principal, action, complaint)`.
//!
//! No other module makes capability checks. The service layer asks
//! [`authorize`] before every operation and applies [`Principal::scoped_department`]
//! to list-shaped reads.

use crate::{CivicError, CivicResult, Complaint, EntityType, Principal};

/// Operations subject to authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    SubmitFeedback,
    ManageCategories,
}

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NotAdministrator,
    NotSuperuser,
    /// Target complaint belongs to another department.
    OutsideDepartment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

pub const UPDATE_DENIED_MESSAGE: &str =
    "Only administrators can update complaints. Staff members have read-only access.";
pub const DELETE_DENIED_MESSAGE: &str = "Only super administrators can delete records.";

fn in_scope(principal: &Principal, target: Option<&Complaint>) -> bool {
    match (principal.scoped_department(), target) {
        (Some(department), Some(complaint)) => complaint.department == department,
        _ => true,
    }
}

/// Decide whether `principal` may perform `action` on `target`.
pub fn decide(principal: &Principal, action: Action, target: Option<&Complaint>) -> Decision {
    match action {
        Action::Create => Decision::Allow,
        Action::Read | Action::SubmitFeedback => {
            if in_scope(principal, target) {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::OutsideDepartment)
            }
        }
        Action::Update => {
            if principal.is_staff {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::NotAdministrator)
            }
        }
        Action::Delete | Action::ManageCategories => {
            if principal.is_superuser {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::NotSuperuser)
            }
        }
    }
}

/// [`decide`], mapped onto the error taxonomy.
///
/// An out-of-department target is reported as not found so that scoped
/// principals cannot probe for other departments' complaints.
pub fn authorize(
    principal: &Principal,
    action: Action,
    target: Option<&Complaint>,
) -> CivicResult<()> {
    match decide(principal, action, target) {
        Decision::Allow => Ok(()),
        Decision::Deny(DenyReason::OutsideDepartment) => match target {
            Some(complaint) => Err(CivicError::not_found(
                EntityType::Complaint,
                complaint.complaint_id,
            )),
            None => Err(CivicError::forbidden("Outside of your department")),
        },
        Decision::Deny(DenyReason::NotAdministrator) => {
            Err(CivicError::forbidden(UPDATE_DENIED_MESSAGE))
        }
        Decision::Deny(DenyReason::NotSuperuser) => Err(CivicError::forbidden(DELETE_DENIED_MESSAGE)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CategoryId, ComplaintId, ComplaintStatus, EntityIdType, Priority};
    use chrono::Utc;

    fn complaint_in(department: &str) -> Complaint {
        let now = Utc::now();
        Complaint {
            complaint_id: ComplaintId::now_v7(),
            reference_number: "CMP20240101000000".to_string(),
            title: "t".to_string(),
            description: "d".to_string(),
            category_id: CategoryId::from_name("Other"),
            citizen_name: "n".to_string(),
            citizen_email: "n@example.org".to_string(),
            citizen_phone: String::new(),
            location: None,
            address: String::new(),
            photo_ref: None,
            status: ComplaintStatus::Pending,
            priority: Priority::Medium,
            assigned_to: None,
            department: department.to_string(),
            created_at: now,
            updated_at: now,
            resolved_at: None,
        }
    }

    #[test]
    fn test_anonymous_can_create_read_and_rate() {
        let anon = Principal::anonymous();
        let c = complaint_in("Roads");
        assert!(decide(&anon, Action::Create, None).is_allowed());
        assert!(decide(&anon, Action::Read, Some(&c)).is_allowed());
        assert!(decide(&anon, Action::SubmitFeedback, Some(&c)).is_allowed());
        assert_eq!(
            decide(&anon, Action::Update, Some(&c)),
            Decision::Deny(DenyReason::NotAdministrator)
        );
    }

    #[test]
    fn test_department_user_is_read_only_and_scoped() {
        let user = Principal::department_user("u1", "Water Department");
        let mine = complaint_in("Water Department");
        let theirs = complaint_in("Roads");
        assert!(decide(&user, Action::Read, Some(&mine)).is_allowed());
        assert_eq!(
            decide(&user, Action::Read, Some(&theirs)),
            Decision::Deny(DenyReason::OutsideDepartment)
        );
        assert!(!decide(&user, Action::Update, Some(&mine)).is_allowed());
    }

    #[test]
    fn test_out_of_scope_maps_to_not_found() {
        let user = Principal::department_user("u1", "Water Department");
        let theirs = complaint_in("Roads");
        let err = authorize(&user, Action::Read, Some(&theirs));
        assert!(matches!(err, Err(CivicError::NotFound { .. })));
    }

    #[test]
    fn test_update_denial_message() {
        let err = authorize(&Principal::anonymous(), Action::Update, None);
        assert_eq!(err, Err(CivicError::forbidden(UPDATE_DENIED_MESSAGE)));
    }

    #[test]
    fn test_admin_and_superuser_capabilities() {
        let admin = Principal::staff("a1");
        let root = Principal::superuser("r1");
        let c = complaint_in("Roads");
        assert!(decide(&admin, Action::Update, Some(&c)).is_allowed());
        assert!(!decide(&admin, Action::Delete, Some(&c)).is_allowed());
        assert!(decide(&root, Action::Delete, Some(&c)).is_allowed());
        assert!(decide(&root, Action::ManageCategories, None).is_allowed());
    }
}
