//! List filters, ordering and pagination for complaint reads.

use crate::{CategoryId, Complaint, ComplaintStatus, Priority, ValidationError};
use std::cmp::Ordering as CmpOrdering;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    CreatedAt,
    UpdatedAt,
    Priority,
}

/// Sort order for complaint lists. Defaults to newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
    pub field: OrderField,
    pub descending: bool,
}

impl Default for Ordering {
    fn default() -> Self {
        Self {
            field: OrderField::CreatedAt,
            descending: true,
        }
    }
}

impl FromStr for Ordering {
    type Err = ValidationError;

    /// Parses `created_at`, `updated_at` or `priority`, optionally prefixed with `-`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (descending, name) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let field = match name {
            "created_at" => OrderField::CreatedAt,
            "updated_at" => OrderField::UpdatedAt,
            "priority" => OrderField::Priority,
            _ => {
                return Err(ValidationError::InvalidValue {
                    field: "ordering".to_string(),
                    reason: format!(
                        "'{}' is not one of created_at, updated_at, priority",
                        s
                    ),
                })
            }
        };
        Ok(Self { field, descending })
    }
}

impl fmt::Display for Ordering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.field {
            OrderField::CreatedAt => "created_at",
            OrderField::UpdatedAt => "updated_at",
            OrderField::Priority => "priority",
        };
        if self.descending {
            write!(f, "-{}", name)
        } else {
            write!(f, "{}", name)
        }
    }
}

impl Ordering {
    /// Compare two complaints under this ordering. Ties fall back to id.
    pub fn compare(&self, a: &Complaint, b: &Complaint) -> CmpOrdering {
        let primary = match self.field {
            OrderField::CreatedAt => a.created_at.cmp(&b.created_at),
            OrderField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            OrderField::Priority => a.priority.as_db_str().cmp(b.priority.as_db_str()),
        };
        let ordered = primary.then_with(|| a.complaint_id.cmp(&b.complaint_id));
        if self.descending {
            ordered.reverse()
        } else {
            ordered
        }
    }

    pub fn sort(&self, complaints: &mut [Complaint]) {
        complaints.sort_by(|a, b| self.compare(a, b));
    }
}

/// Filter applied to list, statistics and nearby reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComplaintFilter {
    pub status: Option<ComplaintStatus>,
    pub category_id: Option<CategoryId>,
    pub priority: Option<Priority>,
    pub department: Option<String>,
    /// Terms split on whitespace and commas. Each term must appear, case-insensitively,
    /// in the title, description, reference number or address.
    pub search: Option<String>,
    pub ordering: Ordering,
    /// Set by the access policy for department-scoped principals.
    pub scope_department: Option<String>,
}

impl ComplaintFilter {
    /// Restrict the filter to a department scope, if one applies.
    pub fn scoped_to(mut self, department: Option<&str>) -> Self {
        self.scope_department = department.map(str::to_string);
        self
    }

    pub fn matches(&self, complaint: &Complaint) -> bool {
        if let Some(scope) = &self.scope_department {
            if &complaint.department != scope {
                return false;
            }
        }
        if self.status.is_some_and(|s| s != complaint.status) {
            return false;
        }
        if self.category_id.is_some_and(|c| c != complaint.category_id) {
            return false;
        }
        if self.priority.is_some_and(|p| p != complaint.priority) {
            return false;
        }
        if let Some(department) = &self.department {
            if &complaint.department != department {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let fields = [
                complaint.title.to_lowercase(),
                complaint.description.to_lowercase(),
                complaint.reference_number.to_lowercase(),
                complaint.address.to_lowercase(),
            ];
            let all_terms_hit = search_terms(search)
                .all(|term| fields.iter().any(|field| field.contains(&term)));
            if !all_terms_hit {
                return false;
            }
        }
        true
    }

    /// Filter and sort a snapshot of complaints.
    pub fn apply<'a, I>(&self, complaints: I) -> Vec<Complaint>
    where
        I: IntoIterator<Item = &'a Complaint>,
    {
        let mut out: Vec<Complaint> = complaints
            .into_iter()
            .filter(|c| self.matches(c))
            .cloned()
            .collect();
        self.ordering.sort(&mut out);
        out
    }
}

fn search_terms(search: &str) -> impl Iterator<Item = String> + '_ {
    search
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

/// Limit/offset pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl Page {
    /// Build a page, clamping the limit to `1..=MAX_PAGE_SIZE`.
    pub fn new(limit: Option<usize>, offset: Option<usize>, default_limit: usize) -> Self {
        Self {
            limit: limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE),
            offset: offset.unwrap_or(0),
        }
    }

    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        items
            .iter()
            .skip(self.offset)
            .take(self.limit)
            .cloned()
            .collect()
    }
}
