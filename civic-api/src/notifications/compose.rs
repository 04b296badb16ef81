//! Message composition for outbound complaint notifications.

use crate::config::NotifierConfig;
use civic_core::{ComplaintEvent, ComplaintStatus};
use serde::{Deserialize, Serialize};

const SIGNATURE: &str = "Best regards,\nMunicipal Complaint System";

/// A fully composed e-mail, ready for any delivery adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Event kind that produced the message (`submitted`, `status_changed`, ...)
    pub kind: String,
    pub reference_number: String,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Citizen-facing explanation of a status.
pub fn status_message(status: ComplaintStatus) -> &'static str {
    match status {
        ComplaintStatus::Pending => "Your complaint has been received and is pending review.",
        ComplaintStatus::Acknowledged => {
            "Your complaint has been acknowledged and assigned to the relevant department."
        }
        ComplaintStatus::InProgress => "Work has begun on resolving your complaint.",
        ComplaintStatus::Resolved => {
            "Your complaint has been resolved! Please provide feedback on your experience."
        }
        ComplaintStatus::Closed => "Your complaint has been closed.",
        ComplaintStatus::Rejected => {
            "Your complaint has been reviewed and rejected. Please contact us for more details."
        }
    }
}

fn or_not_provided(value: &str) -> &str {
    if value.trim().is_empty() {
        "Not provided"
    } else {
        value
    }
}

/// Render the message for `event`.
pub fn compose(event: &ComplaintEvent, config: &NotifierConfig) -> OutboundMessage {
    let complaint = event.complaint();
    let reference = complaint.reference_number.clone();

    let (to, subject, body) = match event {
        ComplaintEvent::Submitted { category_name, .. } => {
            let location = match (&complaint.location, complaint.address.trim()) {
                (_, address) if !address.is_empty() => address.to_string(),
                (Some(point), _) => format!("{:.6}, {:.6}", point.latitude, point.longitude),
                (None, _) => "Not provided".to_string(),
            };
            let body = format!(
                "New Complaint Received\n\n\
                 Reference Number: {}\n\
                 Title: {}\n\
                 Category: {}\n\
                 Priority: {}\n\n\
                 Citizen: {}\n\
                 Email: {}\n\
                 Phone: {}\n\n\
                 Description:\n{}\n\n\
                 Location: {}\n\n\
                 View and manage this complaint in the admin panel.\n",
                reference,
                complaint.title,
                category_name,
                complaint.priority.display_name(),
                complaint.citizen_name,
                complaint.citizen_email,
                or_not_provided(&complaint.citizen_phone),
                complaint.description,
                location,
            );
            (
                config.admin_email.clone(),
                format!("New Complaint Submitted: {}", reference),
                body,
            )
        }
        ComplaintEvent::StatusChanged { .. } => {
            let department = if complaint.department.trim().is_empty() {
                String::new()
            } else {
                format!("Assigned to: {}\n\n", complaint.department)
            };
            let body = format!(
                "Dear {},\n\n\
                 {}\n\n\
                 Complaint Details:\n\
                 Reference Number: {}\n\
                 Title: {}\n\
                 Current Status: {}\n\
                 Priority: {}\n\n\
                 {}\
                 Description:\n{}\n\n\
                 Thank you for using our complaint management system.\n\n\
                 {}\n",
                complaint.citizen_name,
                status_message(complaint.status),
                reference,
                complaint.title,
                complaint.status.display_name(),
                complaint.priority.display_name(),
                department,
                complaint.description,
                SIGNATURE,
            );
            (
                complaint.citizen_email.clone(),
                format!("Complaint Status Update: {}", reference),
                body,
            )
        }
        ComplaintEvent::FeedbackRequested { .. } => {
            let resolved_on = complaint
                .resolved_at
                .map(|t| t.format("%B %d, %Y").to_string())
                .unwrap_or_else(|| "Recently".to_string());
            let body = format!(
                "Dear {},\n\n\
                 Your complaint has been resolved! We would greatly appreciate your feedback.\n\n\
                 Complaint Details:\n\
                 Reference Number: {}\n\
                 Title: {}\n\
                 Resolved on: {}\n\n\
                 Please take a moment to rate your experience and help us improve our services.\n\n\
                 Thank you for your cooperation!\n\n\
                 {}\n",
                complaint.citizen_name, reference, complaint.title, resolved_on, SIGNATURE,
            );
            (
                complaint.citizen_email.clone(),
                format!("Please Share Your Feedback: {}", reference),
                body,
            )
        }
    };

    OutboundMessage {
        kind: event.kind().to_string(),
        reference_number: reference,
        from: config.from_email.clone(),
        to,
        subject,
        body,
    }
}
