// src/models/ticketmodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::usermodel::UserRole;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    Up,
    Down,
}

/// Opaque attachment metadata. Storage mechanics live elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttachmentRef {
    pub filename: String,
    pub mimetype: String,
    pub size: i64,
    pub storage_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub message: String,
    pub author: Uuid,
    // Snapshotted at write time, never re-derived later.
    pub author_name: String,
    pub author_role: UserRole,
    pub is_internal: bool,
    pub attachments: Vec<AttachmentRef>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// Internal notes are only visible to agents and admins.
    pub fn visible_to(&self, role: UserRole) -> bool {
        !self.is_internal || matches!(role, UserRole::Agent | UserRole::Admin)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub subject: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub category: String,
    pub tags: Vec<String>,
    pub created_by: Uuid,
    pub assigned_to: Option<Uuid>,
    // Append-only; insertion order is the timeline order.
    pub conversations: Vec<Conversation>,
    pub upvotes: Vec<Uuid>,
    pub downvotes: Vec<Uuid>,
    pub attachments: Vec<AttachmentRef>,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Vote score, recomputed on read.
    pub fn score(&self) -> i64 {
        self.upvotes.len() as i64 - self.downvotes.len() as i64
    }

    /// A user appears in at most one of the two vote sets: the voter is
    /// removed from both sets before being inserted into the chosen one.
    /// Re-voting the same direction is a net no-op, switching direction is a
    /// single move.
    pub fn apply_vote(&mut self, user_id: Uuid, kind: VoteKind) {
        self.upvotes.retain(|id| *id != user_id);
        self.downvotes.retain(|id| *id != user_id);
        match kind {
            VoteKind::Up => self.upvotes.push(user_id),
            VoteKind::Down => self.downvotes.push(user_id),
        }
    }

    /// Copy of the ticket with conversation entries the viewer may not see
    /// stripped out.
    pub fn redacted_for(mut self, role: UserRole) -> Ticket {
        self.conversations.retain(|entry| entry.visible_to(role));
        self
    }
}
