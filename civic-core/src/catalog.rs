//! Default category catalogue and category construction.

use crate::{
    Category, CategoryId, NewCategory, Timestamp, ValidationError, DEFAULT_CATEGORY_COLOR,
};
use once_cell::sync::Lazy;
use regex::Regex;

pub const CATEGORY_NAME_MAX_LEN: usize = 100;

static HEX_COLOR_RE: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$"));

fn seed(name: &str, description: &str, icon: &str, color: &str, department: &str) -> NewCategory {
    NewCategory {
        name: name.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        color: Some(color.to_string()),
        department: department.to_string(),
    }
}

/// The eight categories every deployment starts with.
pub fn default_categories() -> Vec<NewCategory> {
    vec![
        seed(
            "Roads & Infrastructure",
            "Potholes, damaged roads, street lights, footpaths",
            "🛣️",
            "#EF4444",
            "Public Works Department",
        ),
        seed(
            "Water Supply",
            "Water shortage, leakage, quality issues",
            "💧",
            "#3B82F6",
            "Water Department",
        ),
        seed(
            "Electricity",
            "Power outages, damaged poles, street light issues",
            "⚡",
            "#F59E0B",
            "Electricity Department",
        ),
        seed(
            "Sanitation & Waste",
            "Garbage collection, drainage, cleanliness",
            "🗑️",
            "#10B981",
            "Sanitation Department",
        ),
        seed(
            "Public Safety",
            "Crime, traffic violations, safety concerns",
            "🚨",
            "#DC2626",
            "Public Safety Department",
        ),
        seed(
            "Parks & Recreation",
            "Park maintenance, playground equipment",
            "🌳",
            "#059669",
            "Parks & Recreation Department",
        ),
        seed(
            "Building & Construction",
            "Illegal construction, building violations",
            "🏗️",
            "#7C3AED",
            "Urban Development Department",
        ),
        seed("Other", "Other municipal issues", "📋", "#6B7280", "General Administration"),
    ]
}

/// Validate a category payload and build the stored record.
///
/// The id is derived from the name so re-seeding is idempotent.
pub fn build_category(input: NewCategory, now: Timestamp) -> Result<Category, ValidationError> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: "name".to_string(),
        });
    }
    if name.chars().count() > CATEGORY_NAME_MAX_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: CATEGORY_NAME_MAX_LEN,
        });
    }
    if input.department.trim().chars().count() > crate::lifecycle::DEPARTMENT_MAX_LEN {
        return Err(ValidationError::TooLong {
            field: "department".to_string(),
            max: crate::lifecycle::DEPARTMENT_MAX_LEN,
        });
    }
    let color = input
        .color
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string());
    let valid_color = match HEX_COLOR_RE.as_ref() {
        Ok(re) => re.is_match(&color),
        Err(_) => true,
    };
    if !valid_color {
        return Err(ValidationError::InvalidValue {
            field: "color".to_string(),
            reason: "expected a hex colour such as #3B82F6".to_string(),
        });
    }

    Ok(Category {
        category_id: CategoryId::from_name(&name),
        name,
        description: input.description,
        icon: input.icon,
        color,
        department: input.department.trim().to_string(),
        created_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashSet;

    #[test]
    fn test_default_catalogue() -> Result<(), ValidationError> {
        let seeds = default_categories();
        assert_eq!(seeds.len(), 8);
        let now = Utc::now();
        let built = seeds
            .into_iter()
            .map(|s| build_category(s, now))
            .collect::<Result<Vec<_>, _>>()?;
        let ids: HashSet<_> = built.iter().map(|c| c.category_id).collect();
        assert_eq!(ids.len(), 8);
        let water = built
            .iter()
            .find(|c| c.name == "Water Supply")
            .map(|c| c.department.as_str());
        assert_eq!(water, Some("Water Department"));
        Ok(())
    }

    #[test]
    fn test_default_color_and_validation() -> Result<(), ValidationError> {
        let input = NewCategory {
            name: "Noise".to_string(),
            description: String::new(),
            icon: String::new(),
            color: None,
            department: "Environment".to_string(),
        };
        let built = build_category(input.clone(), Utc::now())?;
        assert_eq!(built.color, DEFAULT_CATEGORY_COLOR);

        let bad = NewCategory {
            color: Some("blue".to_string()),
            ..input.clone()
        };
        assert!(build_category(bad, Utc::now()).is_err());

        let unnamed = NewCategory {
            name: " ".to_string(),
            ..input
        };
        assert!(build_category(unnamed, Utc::now()).is_err());
        Ok(())
    }
}
