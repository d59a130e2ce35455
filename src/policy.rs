// src/policy.rs
//
// Pure permission decisions. No state, safe to call from anywhere.

use crate::models::{ticketmodel::Ticket, usermodel::User, usermodel::UserRole};

fn is_staff(role: UserRole) -> bool {
    matches!(role, UserRole::Agent | UserRole::Admin)
}

/// Agents and admins see every ticket, end users only their own.
pub fn can_view_ticket(actor: &User, ticket: &Ticket) -> bool {
    is_staff(actor.role) || ticket.created_by == actor.id
}

/// Same rule as viewing: governs status/priority/assignment edits and replies.
pub fn can_mutate_ticket(actor: &User, ticket: &Ticket) -> bool {
    can_view_ticket(actor, ticket)
}

/// A request to mark a note internal from an end user is downgraded to a
/// public note rather than rejected.
pub fn can_create_internal_note(role: UserRole) -> bool {
    is_staff(role)
}

/// Users may request the agent role, agents the admin role. Admins have
/// nothing left to request.
pub fn can_request_role(current: UserRole, requested: UserRole) -> bool {
    match current {
        UserRole::User => requested == UserRole::Agent,
        UserRole::Agent => requested == UserRole::Admin,
        UserRole::Admin => false,
    }
}

pub fn can_review_role_request(role: UserRole) -> bool {
    matches!(role, UserRole::Admin)
}

pub fn can_manage_users(role: UserRole) -> bool {
    matches!(role, UserRole::Admin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ticketmodel::{TicketPriority, TicketStatus};
    use chrono::Utc;
    use uuid::Uuid;

    fn user_with_role(role: UserRole) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: "someone".to_string(),
            email: "someone@example.com".to_string(),
            password: String::new(),
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn ticket_owned_by(owner: Uuid) -> Ticket {
        let now = Utc::now();
        Ticket {
            id: Uuid::new_v4(),
            subject: "VPN drops every hour".to_string(),
            description: "Connection resets at the top of the hour.".to_string(),
            status: TicketStatus::Open,
            priority: TicketPriority::Medium,
            category: "network".to_string(),
            tags: vec![],
            created_by: owner,
            assigned_to: None,
            conversations: vec![],
            upvotes: vec![],
            downvotes: vec![],
            attachments: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn owner_and_staff_can_view() {
        let owner = user_with_role(UserRole::User);
        let other = user_with_role(UserRole::User);
        let agent = user_with_role(UserRole::Agent);
        let admin = user_with_role(UserRole::Admin);
        let ticket = ticket_owned_by(owner.id);

        assert!(can_view_ticket(&owner, &ticket));
        assert!(can_view_ticket(&agent, &ticket));
        assert!(can_view_ticket(&admin, &ticket));
        assert!(!can_view_ticket(&other, &ticket));
    }

    #[test]
    fn mutate_follows_view() {
        let owner = user_with_role(UserRole::User);
        let other = user_with_role(UserRole::User);
        let ticket = ticket_owned_by(owner.id);

        assert!(can_mutate_ticket(&owner, &ticket));
        assert!(!can_mutate_ticket(&other, &ticket));
    }

    #[test]
    fn internal_notes_are_staff_only() {
        assert!(!can_create_internal_note(UserRole::User));
        assert!(can_create_internal_note(UserRole::Agent));
        assert!(can_create_internal_note(UserRole::Admin));
    }

    #[test]
    fn role_upgrade_paths() {
        assert!(can_request_role(UserRole::User, UserRole::Agent));
        assert!(!can_request_role(UserRole::User, UserRole::Admin));
        assert!(can_request_role(UserRole::Agent, UserRole::Admin));
        assert!(!can_request_role(UserRole::Agent, UserRole::Agent));
        assert!(!can_request_role(UserRole::Admin, UserRole::Admin));
        assert!(!can_request_role(UserRole::Admin, UserRole::Agent));
    }

    #[test]
    fn only_admins_review_and_manage() {
        assert!(can_review_role_request(UserRole::Admin));
        assert!(!can_review_role_request(UserRole::Agent));
        assert!(!can_review_role_request(UserRole::User));
        assert!(can_manage_users(UserRole::Admin));
        assert!(!can_manage_users(UserRole::Agent));
    }
}
