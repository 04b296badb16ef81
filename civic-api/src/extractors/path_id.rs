//! Typed entity ids from path parameters.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use civic_core::EntityIdType;
use uuid::Uuid;

use crate::error::ApiError;

/// Extracts the `:id` segment straight into an id newtype.
///
/// ```rust,ignore
/// async fn get_complaint(PathId(id): PathId<ComplaintId>) -> ApiResult<...> { ... }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PathId<T: EntityIdType>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for PathId<T>
where
    S: Send + Sync,
    T: EntityIdType,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(uuid): Path<Uuid> = Path::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                ApiError::invalid_format(&format!("{} id", T::ENTITY_NAME), "a UUID")
                    .with_details(serde_json::json!({
                        "path": parts.uri.path(),
                        "reason": e.body_text(),
                    }))
            })?;
        Ok(PathId(T::new(uuid)))
    }
}
