// src/dtos/ticketdtos.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::ticketmodel::{
    AttachmentRef, Ticket, TicketPriority, TicketStatus, VoteKind,
};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTicketDto {
    #[validate(length(min = 5, max = 200, message = "Subject must be between 5 and 200 characters"))]
    pub subject: String,

    #[validate(length(
        min = 10,
        max = 2000,
        message = "Description must be between 10 and 2000 characters"
    ))]
    pub description: String,

    pub priority: Option<TicketPriority>,

    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,

    #[validate(custom = "validate_tags")]
    pub tags: Option<Vec<String>>,

    pub attachments: Option<Vec<AttachmentRef>>,
}

/// Allowlisted merge patch. Anything not named here (creator, conversations,
/// votes, timestamps) cannot be touched through an update.
#[derive(Debug, Default, Clone, Deserialize, Validate)]
pub struct UpdateTicketDto {
    #[validate(length(min = 5, max = 200, message = "Subject must be between 5 and 200 characters"))]
    pub subject: Option<String>,

    #[validate(length(
        min = 10,
        max = 2000,
        message = "Description must be between 10 and 2000 characters"
    ))]
    pub description: Option<String>,

    pub status: Option<TicketStatus>,

    pub priority: Option<TicketPriority>,

    #[validate(length(min = 1, message = "Category is required"))]
    pub category: Option<String>,

    // Absent field leaves the assignment alone, explicit null clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<Uuid>>,

    #[validate(custom = "validate_tags")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateReplyDto {
    #[validate(length(min = 1, max = 2000, message = "Message must be between 1 and 2000 characters"))]
    pub message: String,

    pub is_internal: Option<bool>,

    pub attachments: Option<Vec<AttachmentRef>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoteTicketDto {
    pub vote: VoteKind,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TicketQueue {
    Mine,
    Unassigned,
    All,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TicketQueryParams {
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<usize>,
    pub status: Option<TicketStatus>,
    pub queue: Option<TicketQueue>,
}

fn validate_tags(tags: &Vec<String>) -> Result<(), ValidationError> {
    for tag in tags {
        if tag.is_empty() || tag.len() > 30 {
            let mut error = ValidationError::new("invalid_tag");
            error.message = Some("Each tag must be between 1 and 30 characters".into());
            return Err(error);
        }
    }
    Ok(())
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Listing row: the thread itself is left out, only its size is reported.
#[derive(Debug, Serialize, Deserialize)]
pub struct TicketListItemDto {
    pub id: String,
    pub subject: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub category: String,
    pub tags: Vec<String>,
    pub created_by: String,
    pub assigned_to: Option<String>,
    pub score: i64,
    pub replies: usize,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl TicketListItemDto {
    pub fn from_ticket(ticket: &Ticket) -> Self {
        TicketListItemDto {
            id: ticket.id.to_string(),
            subject: ticket.subject.to_owned(),
            status: ticket.status,
            priority: ticket.priority,
            category: ticket.category.to_owned(),
            tags: ticket.tags.clone(),
            created_by: ticket.created_by.to_string(),
            assigned_to: ticket.assigned_to.map(|id| id.to_string()),
            score: ticket.score(),
            replies: ticket.conversations.len(),
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
        }
    }

    pub fn from_tickets(tickets: &[Ticket]) -> Vec<TicketListItemDto> {
        tickets.iter().map(TicketListItemDto::from_ticket).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_collects_all_field_errors() {
        let dto = CreateTicketDto {
            subject: "hey".to_string(),
            description: "too short".to_string(),
            priority: None,
            category: String::new(),
            tags: Some(vec!["x".repeat(31)]),
            attachments: None,
        };

        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("subject"));
        assert!(fields.contains_key("description"));
        assert!(fields.contains_key("category"));
        assert!(fields.contains_key("tags"));
    }

    #[test]
    fn update_patch_distinguishes_missing_from_null_assignment() {
        let patch: UpdateTicketDto = serde_json::from_str(r#"{"status":"closed"}"#).unwrap();
        assert!(patch.assigned_to.is_none());

        let patch: UpdateTicketDto =
            serde_json::from_str(r#"{"assigned_to":null}"#).unwrap();
        assert_eq!(patch.assigned_to, Some(None));

        let agent = Uuid::new_v4();
        let patch: UpdateTicketDto =
            serde_json::from_str(&format!(r#"{{"assigned_to":"{}"}}"#, agent)).unwrap();
        assert_eq!(patch.assigned_to, Some(Some(agent)));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let result: Result<UpdateTicketDto, _> =
            serde_json::from_str(r#"{"status":"escalated"}"#);
        assert!(result.is_err());
    }
}
