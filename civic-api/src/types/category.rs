//! Category-related API types

use civic_core::{CategoryId, CategoryWithCount, NewCategory, Timestamp};
use serde::{Deserialize, Serialize};

/// Category with its live complaint count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CategoryResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub icon: String,
    /// Hex colour code
    pub color: String,
    /// Department new complaints in this category are routed to
    pub department: String,
    pub complaint_count: i64,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl From<CategoryWithCount> for CategoryResponse {
    fn from(value: CategoryWithCount) -> Self {
        let CategoryWithCount {
            category,
            complaint_count,
        } = value;
        Self {
            id: category.category_id,
            name: category.name,
            description: category.description,
            icon: category.icon,
            color: category.color,
            department: category.department,
            complaint_count,
            created_at: category.created_at,
        }
    }
}

/// Request to register a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    /// Defaults to `#3B82F6`
    pub color: Option<String>,
    #[serde(default)]
    pub department: String,
}

impl From<CreateCategoryRequest> for NewCategory {
    fn from(req: CreateCategoryRequest) -> Self {
        NewCategory {
            name: req.name,
            description: req.description,
            icon: req.icon,
            color: req.color,
            department: req.department,
        }
    }
}
