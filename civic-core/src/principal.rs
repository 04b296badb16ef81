//! The authenticated caller, as seen by the access policy.

use crate::PrincipalId;
use serde::{Deserialize, Serialize};

/// Caller identity and capabilities.
///
/// Constructed once per request from the identity provider's claims and
/// passed explicitly into every policy and store call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// `None` for anonymous callers.
    pub id: Option<PrincipalId>,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub department: Option<String>,
    pub is_department_user: bool,
}

impl Principal {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn staff(id: impl Into<PrincipalId>) -> Self {
        Self {
            id: Some(id.into()),
            is_staff: true,
            ..Self::default()
        }
    }

    pub fn superuser(id: impl Into<PrincipalId>) -> Self {
        Self {
            id: Some(id.into()),
            is_staff: true,
            is_superuser: true,
            ..Self::default()
        }
    }

    pub fn department_user(id: impl Into<PrincipalId>, department: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            department: Some(department.into()),
            is_department_user: true,
            ..Self::default()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.id.is_some()
    }

    /// Department this principal's reads are confined to, if any.
    ///
    /// Administrators are never scoped. A department user with a blank
    /// department is treated as unscoped.
    pub fn scoped_department(&self) -> Option<&str> {
        if self.is_staff || !self.is_department_user {
            return None;
        }
        self.department
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}
