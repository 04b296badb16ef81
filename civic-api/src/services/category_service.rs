//! Category Service
//!
//! Reads are open to everyone; registering and removing categories is a
//! super-administrative action.

use std::sync::Arc;

use civic_core::{
    authorize, build_category, default_categories, Action, CategoryId, CategoryWithCount,
    CivicError, EntityType, NewCategory, Principal,
};
use civic_storage::ComplaintRepository;

use super::ServiceClock;
use crate::error::ApiResult;

#[derive(Clone)]
pub struct CategoryService {
    repo: Arc<dyn ComplaintRepository>,
    clock: Arc<dyn ServiceClock>,
}

impl CategoryService {
    pub fn new(repo: Arc<dyn ComplaintRepository>, clock: Arc<dyn ServiceClock>) -> Self {
        Self { repo, clock }
    }

    /// Upsert the default catalogue by name. Returns how many were new.
    pub async fn seed_defaults(&self) -> ApiResult<usize> {
        let now = self.clock.now();
        let mut created = 0;
        for seed in default_categories() {
            let category = build_category(seed, now)?;
            if self.repo.category_upsert(&category).await? {
                tracing::debug!(name = %category.name, "Seeded category");
                created += 1;
            }
        }
        tracing::info!(created, "Default categories ensured");
        Ok(created)
    }

    pub async fn list(&self) -> ApiResult<Vec<CategoryWithCount>> {
        Ok(self.repo.category_list().await?)
    }

    pub async fn get(&self, id: CategoryId) -> ApiResult<CategoryWithCount> {
        let category = self
            .repo
            .category_get(id)
            .await?
            .ok_or_else(|| CivicError::not_found(EntityType::Category, id))?;
        Ok(category)
    }

    pub async fn create(&self, principal: &Principal, input: NewCategory) -> ApiResult<CategoryWithCount> {
        authorize(principal, Action::ManageCategories, None)?;
        let category = build_category(input, self.clock.now())?;
        self.repo.category_insert(&category).await?;
        tracing::info!(category_id = %category.category_id, name = %category.name, "Category created");
        Ok(CategoryWithCount {
            category,
            complaint_count: 0,
        })
    }

    /// Refused while any complaint still references the category.
    pub async fn delete(&self, principal: &Principal, id: CategoryId) -> ApiResult<()> {
        authorize(principal, Action::ManageCategories, None)?;
        self.repo.category_delete(id).await?;
        tracing::info!(category_id = %id, "Category deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::WallClock;
    use civic_storage::InMemoryRepository;

    fn service() -> CategoryService {
        CategoryService::new(Arc::new(InMemoryRepository::new()), Arc::new(WallClock))
    }

    #[tokio::test]
    async fn test_seeding_is_idempotent() {
        let service = service();
        assert_eq!(service.seed_defaults().await.unwrap(), 8);
        assert_eq!(service.seed_defaults().await.unwrap(), 0);

        let names: Vec<_> = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.category.name)
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names.len(), 8);
    }

    #[tokio::test]
    async fn test_manage_requires_superuser() {
        let service = service();
        let input = NewCategory {
            name: "Noise".to_string(),
            description: "Noise complaints".to_string(),
            icon: String::new(),
            color: None,
            department: "Environment Department".to_string(),
        };

        let err = service
            .create(&Principal::staff("s-1"), input.clone())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let created = service
            .create(&Principal::superuser("root"), input)
            .await
            .unwrap();
        assert_eq!(created.category.color, civic_core::DEFAULT_CATEGORY_COLOR);
        assert_eq!(service.get(created.category.category_id).await.unwrap().complaint_count, 0);

        service
            .delete(&Principal::superuser("root"), created.category.category_id)
            .await
            .unwrap();
        let err = service.get(created.category.category_id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CategoryNotFound);
    }
}
