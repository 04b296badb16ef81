//! Helper macros for the API crate.

/// Implement `FromRef<AppState>` for a cloneable field so handlers can
/// extract it directly.
///
/// ```ignore
/// impl_from_ref!(ComplaintService, complaints);
/// // Expands to:
/// impl axum::extract::FromRef<AppState> for ComplaintService {
///     fn from_ref(state: &AppState) -> Self {
///         state.complaints.clone()
///     }
/// }
/// ```
#[macro_export]
macro_rules! impl_from_ref {
    ($type:ty, $field:ident) => {
        impl axum::extract::FromRef<$crate::state::AppState> for $type {
            fn from_ref(state: &$crate::state::AppState) -> Self {
                state.$field.clone()
            }
        }
    };
}
