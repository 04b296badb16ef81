//! Aggregate counts over a filtered complaint set.

use crate::{CategoryId, Complaint, ComplaintStatus};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ComplaintStatistics {
    pub total_complaints: i64,
    /// Every status is present, zero-filled.
    pub by_status: BTreeMap<String, i64>,
    /// Keyed by category name; only categories with at least one complaint.
    pub by_category: BTreeMap<String, i64>,
}

/// Count complaints per status and per category.
///
/// `category_names` resolves ids to display names; unknown ids fall back to
/// the id string.
pub fn compute<'a, I>(
    complaints: I,
    category_names: &HashMap<CategoryId, String>,
) -> ComplaintStatistics
where
    I: IntoIterator<Item = &'a Complaint>,
{
    let mut stats = ComplaintStatistics {
        by_status: ComplaintStatus::ALL
            .iter()
            .map(|s| (s.as_db_str().to_string(), 0))
            .collect(),
        ..Default::default()
    };
    for complaint in complaints {
        stats.total_complaints += 1;
        *stats
            .by_status
            .entry(complaint.status.as_db_str().to_string())
            .or_insert(0) += 1;
        let name = category_names
            .get(&complaint.category_id)
            .cloned()
            .unwrap_or_else(|| complaint.category_id.to_string());
        *stats.by_category.entry(name).or_insert(0) += 1;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ComplaintId, EntityIdType, Priority};
    use chrono::Utc;
    use proptest::prelude::*;

    fn complaint(status: ComplaintStatus, category: &str) -> Complaint {
        let now = Utc::now();
        Complaint {
            complaint_id: ComplaintId::now_v7(),
            reference_number: "CMP20240101000000".to_string(),
            title: "t".to_string(),
            description: "d".to_string(),
            category_id: CategoryId::from_name(category),
            citizen_name: "n".to_string(),
            citizen_email: "n@example.org".to_string(),
            citizen_phone: String::new(),
            location: None,
            address: String::new(),
            photo_ref: None,
            status,
            priority: Priority::Medium,
            assigned_to: None,
            department: String::new(),
            created_at: now,
            updated_at: now,
            resolved_at: None,
        }
    }

    fn names() -> HashMap<CategoryId, String> {
        ["Water Supply", "Electricity", "Other"]
            .iter()
            .map(|n| (CategoryId::from_name(n), n.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_set_is_zero_filled() {
        let stats = compute(std::iter::empty(), &names());
        assert_eq!(stats.total_complaints, 0);
        assert_eq!(stats.by_status.len(), 6);
        assert!(stats.by_status.values().all(|v| *v == 0));
        assert!(stats.by_category.is_empty());
    }

    #[test]
    fn test_counts() {
        let items = vec![
            complaint(ComplaintStatus::Pending, "Water Supply"),
            complaint(ComplaintStatus::Resolved, "Water Supply"),
            complaint(ComplaintStatus::Pending, "Electricity"),
        ];
        let stats = compute(&items, &names());
        assert_eq!(stats.total_complaints, 3);
        assert_eq!(stats.by_status.get("pending"), Some(&2));
        assert_eq!(stats.by_status.get("rejected"), Some(&0));
        assert_eq!(stats.by_category.get("Water Supply"), Some(&2));
        assert_eq!(stats.by_category.get("Other"), None);
    }

    proptest! {
        #[test]
        fn prop_status_keys_always_complete(
            picks in prop::collection::vec((0usize..6, 0usize..3), 0..40)
        ) {
            let cats = ["Water Supply", "Electricity", "Other"];
            let items: Vec<Complaint> = picks
                .iter()
                .map(|(s, c)| complaint(ComplaintStatus::ALL[*s], cats[*c]))
                .collect();
            let stats = compute(&items, &names());
            prop_assert_eq!(stats.by_status.len(), 6);
            prop_assert_eq!(stats.by_status.values().sum::<i64>(), items.len() as i64);
            prop_assert_eq!(stats.by_category.values().sum::<i64>(), items.len() as i64);
            prop_assert!(stats.by_category.values().all(|v| *v >= 1));
        }
    }
}
