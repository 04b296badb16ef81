//! Feedback-related API types

use civic_core::{ComplaintId, Feedback, FeedbackId, FeedbackSubmission, Timestamp};
use serde::{Deserialize, Serialize};

/// Request body for `POST /complaints/{id}/submit_feedback`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SubmitFeedbackRequest {
    /// 1 (poor) to 5 (excellent)
    pub rating: i64,
    pub comments: Option<String>,
    /// Defaults to true
    pub would_recommend: Option<bool>,
}

impl From<SubmitFeedbackRequest> for FeedbackSubmission {
    fn from(req: SubmitFeedbackRequest) -> Self {
        FeedbackSubmission {
            rating: req.rating,
            comments: req.comments,
            would_recommend: req.would_recommend,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FeedbackResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: FeedbackId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub complaint_id: ComplaintId,
    pub rating: i16,
    pub comments: String,
    pub would_recommend: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl From<Feedback> for FeedbackResponse {
    fn from(feedback: Feedback) -> Self {
        Self {
            id: feedback.feedback_id,
            complaint_id: feedback.complaint_id,
            rating: feedback.rating,
            comments: feedback.comments,
            would_recommend: feedback.would_recommend,
            created_at: feedback.created_at,
        }
    }
}
