// src/service/ticket_service.rs
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{
        db::{DBClient, StoreError},
        ticketdb::{TicketExt, TicketFilter},
    },
    dtos::ticketdtos::{
        CreateReplyDto, CreateTicketDto, TicketQueryParams, TicketQueue, UpdateTicketDto,
        VoteTicketDto,
    },
    models::{
        ticketmodel::{Conversation, Ticket, TicketPriority, TicketStatus},
        usermodel::{User, UserRole},
    },
    policy,
    service::error::ServiceError,
};

// Bounded retries for the read-modify-write cycle before a conflict surfaces.
const MAX_WRITE_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct TicketService {
    db_client: Arc<DBClient>,
}

impl TicketService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    pub async fn create_ticket(
        &self,
        actor: &User,
        dto: CreateTicketDto,
    ) -> Result<Ticket, ServiceError> {
        if !actor.is_active {
            return Err(ServiceError::Forbidden);
        }
        dto.validate()?;

        let now = Utc::now();

        // The thread opens with the description itself, so the conversation
        // reads complete without joining back to the ticket fields.
        let opening_entry = Conversation {
            id: Uuid::new_v4(),
            message: dto.description.clone(),
            author: actor.id,
            author_name: actor.name.clone(),
            author_role: actor.role,
            is_internal: false,
            attachments: vec![],
            created_at: now,
        };

        let ticket = Ticket {
            id: Uuid::new_v4(),
            subject: dto.subject,
            description: dto.description,
            status: TicketStatus::Open,
            priority: dto.priority.unwrap_or(TicketPriority::Medium),
            category: dto.category,
            tags: normalize_tags(dto.tags),
            created_by: actor.id,
            assigned_to: None,
            conversations: vec![opening_entry],
            upvotes: vec![],
            downvotes: vec![],
            attachments: dto.attachments.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };

        let saved = self
            .db_client
            .insert_ticket(ticket)
            .await
            .map_err(ServiceError::Storage)?;

        tracing::info!("ticket {} created by user {}", saved.id, actor.id);
        Ok(saved)
    }

    /// End users only ever see their own tickets, whatever filter they ask
    /// for. Agents and admins may narrow to a queue instead.
    pub async fn list_tickets(
        &self,
        actor: &User,
        query: TicketQueryParams,
    ) -> Result<(Vec<Ticket>, usize), ServiceError> {
        query.validate()?;

        let page = query.page.unwrap_or(1);
        let limit = query.limit.unwrap_or(20);

        let mut filter = TicketFilter {
            status: query.status,
            ..Default::default()
        };

        match actor.role {
            UserRole::User => {
                filter.created_by = Some(actor.id);
            }
            UserRole::Agent | UserRole::Admin => match query.queue {
                Some(TicketQueue::Mine) => filter.assigned_to = Some(actor.id),
                Some(TicketQueue::Unassigned) => filter.unassigned_only = true,
                Some(TicketQueue::All) | None => {}
            },
        }

        let (tickets, total) = self
            .db_client
            .find_tickets(&filter, page, limit)
            .await
            .map_err(ServiceError::Storage)?;

        let visible = tickets
            .into_iter()
            .map(|ticket| ticket.redacted_for(actor.role))
            .collect();
        Ok((visible, total))
    }

    pub async fn get_ticket(&self, actor: &User, ticket_id: Uuid) -> Result<Ticket, ServiceError> {
        let (ticket, _) = self
            .db_client
            .get_ticket(ticket_id)
            .await
            .map_err(ServiceError::Storage)?
            .ok_or(ServiceError::TicketNotFound(ticket_id))?;

        if !policy::can_view_ticket(actor, &ticket) {
            return Err(ServiceError::Forbidden);
        }

        Ok(ticket.redacted_for(actor.role))
    }

    pub async fn update_ticket(
        &self,
        actor: &User,
        ticket_id: Uuid,
        dto: UpdateTicketDto,
    ) -> Result<Ticket, ServiceError> {
        dto.validate()?;

        let ticket = self
            .write_ticket(actor, ticket_id, policy::can_mutate_ticket, |ticket| {
                if let Some(subject) = &dto.subject {
                    ticket.subject = subject.clone();
                }
                if let Some(description) = &dto.description {
                    ticket.description = description.clone();
                }
                if let Some(status) = dto.status {
                    ticket.status = status;
                }
                if let Some(priority) = dto.priority {
                    ticket.priority = priority;
                }
                if let Some(category) = &dto.category {
                    ticket.category = category.clone();
                }
                if let Some(assigned_to) = dto.assigned_to {
                    ticket.assigned_to = assigned_to;
                }
                if let Some(tags) = &dto.tags {
                    ticket.tags = normalize_tags(Some(tags.clone()));
                }
            })
            .await?;

        Ok(ticket.redacted_for(actor.role))
    }

    pub async fn add_reply(
        &self,
        actor: &User,
        ticket_id: Uuid,
        dto: CreateReplyDto,
    ) -> Result<Conversation, ServiceError> {
        dto.validate()?;

        // An internal flag from an end user is clamped to public, not rejected.
        let is_internal =
            dto.is_internal.unwrap_or(false) && policy::can_create_internal_note(actor.role);

        let entry = Conversation {
            id: Uuid::new_v4(),
            message: dto.message.clone(),
            author: actor.id,
            author_name: actor.name.clone(),
            author_role: actor.role,
            is_internal,
            attachments: dto.attachments.clone().unwrap_or_default(),
            created_at: Utc::now(),
        };

        let saved_entry = entry.clone();
        self.write_ticket(actor, ticket_id, policy::can_mutate_ticket, move |ticket| {
            ticket.conversations.push(entry.clone());
        })
        .await?;

        Ok(saved_entry)
    }

    /// Anyone authenticated may vote, the creator included.
    pub async fn vote_ticket(
        &self,
        actor: &User,
        ticket_id: Uuid,
        dto: VoteTicketDto,
    ) -> Result<Ticket, ServiceError> {
        let vote = dto.vote;
        let voter = actor.id;

        let ticket = self
            .write_ticket(actor, ticket_id, |_, _| true, move |ticket| {
                ticket.apply_vote(voter, vote);
            })
            .await?;

        Ok(ticket.redacted_for(actor.role))
    }

    /// Read-modify-write against current persisted state. The permission
    /// gate re-runs on every attempt because the document may have changed
    /// between reads.
    async fn write_ticket<G, M>(
        &self,
        actor: &User,
        ticket_id: Uuid,
        gate: G,
        mutate: M,
    ) -> Result<Ticket, ServiceError>
    where
        G: Fn(&User, &Ticket) -> bool,
        M: Fn(&mut Ticket),
    {
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let (mut ticket, version) = self
                .db_client
                .get_ticket(ticket_id)
                .await
                .map_err(ServiceError::Storage)?
                .ok_or(ServiceError::TicketNotFound(ticket_id))?;

            if !gate(actor, &ticket) {
                return Err(ServiceError::Forbidden);
            }

            mutate(&mut ticket);
            ticket.updated_at = Utc::now();

            match self.db_client.update_ticket(ticket_id, version, ticket).await {
                Ok(saved) => return Ok(saved),
                Err(StoreError::Conflict) => continue,
                Err(StoreError::NotFound) => return Err(ServiceError::TicketNotFound(ticket_id)),
                Err(err) => return Err(ServiceError::Storage(err)),
            }
        }

        tracing::warn!("ticket {} write gave up after {} attempts", ticket_id, MAX_WRITE_ATTEMPTS);
        Err(ServiceError::Conflict)
    }
}

// Tags behave as a set: duplicates dropped, first occurrence order kept.
fn normalize_tags(tags: Option<Vec<String>>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags.unwrap_or_default() {
        if !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::userdb::UserExt;
    use crate::models::ticketmodel::VoteKind;

    async fn seed_user(db: &DBClient, name: &str, role: UserRole) -> User {
        let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
        db.save_user(name.to_string(), email, "hashed".to_string(), role)
            .await
            .unwrap()
    }

    fn service() -> (TicketService, Arc<DBClient>) {
        let db = Arc::new(DBClient::new());
        (TicketService::new(db.clone()), db)
    }

    fn printer_ticket() -> CreateTicketDto {
        CreateTicketDto {
            subject: "Printer not working".to_string(),
            description: "The 2nd floor printer shows an error.".to_string(),
            priority: None,
            category: "hardware".to_string(),
            tags: Some(vec!["printer".to_string(), "printer".to_string()]),
            attachments: None,
        }
    }

    #[tokio::test]
    async fn create_seeds_the_thread_with_the_description() {
        let (svc, db) = service();
        let reporter = seed_user(&db, "Alice", UserRole::User).await;

        let ticket = svc.create_ticket(&reporter, printer_ticket()).await.unwrap();

        assert_eq!(ticket.status, TicketStatus::Open);
        assert_eq!(ticket.priority, TicketPriority::Medium);
        assert_eq!(ticket.created_by, reporter.id);
        assert_eq!(ticket.conversations.len(), 1);
        assert_eq!(ticket.conversations[0].message, ticket.description);
        assert_eq!(ticket.conversations[0].author, reporter.id);
        assert!(!ticket.conversations[0].is_internal);
        // duplicate tag collapsed
        assert_eq!(ticket.tags, vec!["printer".to_string()]);
    }

    #[tokio::test]
    async fn create_rejects_deactivated_accounts() {
        let (svc, db) = service();
        let reporter = seed_user(&db, "Alice", UserRole::User).await;
        let reporter = db.set_user_active(reporter.id, false).await.unwrap();

        let err = svc.create_ticket(&reporter, printer_ticket()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden));
    }

    #[tokio::test]
    async fn create_reports_all_invalid_fields_at_once() {
        let (svc, db) = service();
        let reporter = seed_user(&db, "Alice", UserRole::User).await;

        let dto = CreateTicketDto {
            subject: "hey".to_string(),
            description: "short".to_string(),
            priority: None,
            category: String::new(),
            tags: None,
            attachments: None,
        };

        match svc.create_ticket(&reporter, dto).await.unwrap_err() {
            ServiceError::Validation(errors) => {
                let fields = errors.field_errors();
                assert!(fields.contains_key("subject"));
                assert!(fields.contains_key("description"));
                assert!(fields.contains_key("category"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn internal_notes_are_hidden_from_the_reporter() {
        let (svc, db) = service();
        let reporter = seed_user(&db, "Alice", UserRole::User).await;
        let agent = seed_user(&db, "Bob", UserRole::Agent).await;

        let ticket = svc.create_ticket(&reporter, printer_ticket()).await.unwrap();

        let note = svc
            .add_reply(
                &agent,
                ticket.id,
                CreateReplyDto {
                    message: "checked toner, ordering replacement".to_string(),
                    is_internal: Some(true),
                    attachments: None,
                },
            )
            .await
            .unwrap();
        assert!(note.is_internal);
        assert_eq!(note.author_role, UserRole::Agent);

        let as_reporter = svc.get_ticket(&reporter, ticket.id).await.unwrap();
        assert_eq!(as_reporter.conversations.len(), 1);

        let as_agent = svc.get_ticket(&agent, ticket.id).await.unwrap();
        assert_eq!(as_agent.conversations.len(), 2);
    }

    #[tokio::test]
    async fn end_user_internal_flag_is_clamped_to_public() {
        let (svc, db) = service();
        let reporter = seed_user(&db, "Alice", UserRole::User).await;

        let ticket = svc.create_ticket(&reporter, printer_ticket()).await.unwrap();
        let reply = svc
            .add_reply(
                &reporter,
                ticket.id,
                CreateReplyDto {
                    message: "It now shows error code 42.".to_string(),
                    is_internal: Some(true),
                    attachments: None,
                },
            )
            .await
            .unwrap();

        assert!(!reply.is_internal);
        let as_reporter = svc.get_ticket(&reporter, ticket.id).await.unwrap();
        assert_eq!(as_reporter.conversations.len(), 2);
    }

    #[tokio::test]
    async fn only_owner_and_staff_can_view() {
        let (svc, db) = service();
        let reporter = seed_user(&db, "Alice", UserRole::User).await;
        let stranger = seed_user(&db, "Mallory", UserRole::User).await;
        let agent = seed_user(&db, "Bob", UserRole::Agent).await;
        let admin = seed_user(&db, "Dana", UserRole::Admin).await;

        let ticket = svc.create_ticket(&reporter, printer_ticket()).await.unwrap();

        assert!(svc.get_ticket(&reporter, ticket.id).await.is_ok());
        assert!(svc.get_ticket(&agent, ticket.id).await.is_ok());
        assert!(svc.get_ticket(&admin, ticket.id).await.is_ok());
        assert!(matches!(
            svc.get_ticket(&stranger, ticket.id).await.unwrap_err(),
            ServiceError::Forbidden
        ));
    }

    #[tokio::test]
    async fn user_listing_is_forced_to_own_tickets() {
        let (svc, db) = service();
        let alice = seed_user(&db, "Alice", UserRole::User).await;
        let mallory = seed_user(&db, "Mallory", UserRole::User).await;
        let agent = seed_user(&db, "Bob", UserRole::Agent).await;

        svc.create_ticket(&alice, printer_ticket()).await.unwrap();
        svc.create_ticket(&mallory, printer_ticket()).await.unwrap();

        // Even asking for the whole queue narrows to own tickets.
        let query = TicketQueryParams {
            page: None,
            limit: None,
            status: None,
            queue: Some(TicketQueue::All),
        };
        let (tickets, total) = svc.list_tickets(&alice, query).await.unwrap();
        assert_eq!(total, 1);
        assert!(tickets.iter().all(|t| t.created_by == alice.id));

        let query = TicketQueryParams {
            page: None,
            limit: None,
            status: None,
            queue: None,
        };
        let (_, total) = svc.list_tickets(&agent, query).await.unwrap();
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn queue_views_for_staff() {
        let (svc, db) = service();
        let alice = seed_user(&db, "Alice", UserRole::User).await;
        let agent = seed_user(&db, "Bob", UserRole::Agent).await;

        let mine = svc.create_ticket(&alice, printer_ticket()).await.unwrap();
        svc.create_ticket(&alice, printer_ticket()).await.unwrap();

        let patch: UpdateTicketDto =
            serde_json::from_str(&format!(r#"{{"assigned_to":"{}"}}"#, agent.id)).unwrap();
        svc.update_ticket(&agent, mine.id, patch).await.unwrap();

        let query = TicketQueryParams {
            page: None,
            limit: None,
            status: None,
            queue: Some(TicketQueue::Mine),
        };
        let (tickets, total) = svc.list_tickets(&agent, query).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(tickets[0].id, mine.id);

        let query = TicketQueryParams {
            page: None,
            limit: None,
            status: None,
            queue: Some(TicketQueue::Unassigned),
        };
        let (tickets, _) = svc.list_tickets(&agent, query).await.unwrap();
        assert!(tickets.iter().all(|t| t.assigned_to.is_none()));
    }

    #[tokio::test]
    async fn update_merges_only_supplied_fields() {
        let (svc, db) = service();
        let alice = seed_user(&db, "Alice", UserRole::User).await;
        let agent = seed_user(&db, "Bob", UserRole::Agent).await;

        let ticket = svc.create_ticket(&alice, printer_ticket()).await.unwrap();

        let patch: UpdateTicketDto = serde_json::from_str(r#"{"status":"resolved"}"#).unwrap();
        let updated = svc.update_ticket(&agent, ticket.id, patch).await.unwrap();

        assert_eq!(updated.status, TicketStatus::Resolved);
        assert_eq!(updated.subject, ticket.subject);
        assert_eq!(updated.created_by, alice.id);
        assert!(updated.updated_at >= ticket.updated_at);

        // Explicit null clears the assignment.
        let patch: UpdateTicketDto =
            serde_json::from_str(&format!(r#"{{"assigned_to":"{}"}}"#, agent.id)).unwrap();
        let updated = svc.update_ticket(&agent, ticket.id, patch).await.unwrap();
        assert_eq!(updated.assigned_to, Some(agent.id));

        let patch: UpdateTicketDto = serde_json::from_str(r#"{"assigned_to":null}"#).unwrap();
        let updated = svc.update_ticket(&agent, ticket.id, patch).await.unwrap();
        assert_eq!(updated.assigned_to, None);
    }

    #[tokio::test]
    async fn owner_may_change_status_through_the_generic_update() {
        let (svc, db) = service();
        let alice = seed_user(&db, "Alice", UserRole::User).await;

        let ticket = svc.create_ticket(&alice, printer_ticket()).await.unwrap();
        let patch: UpdateTicketDto = serde_json::from_str(r#"{"status":"closed"}"#).unwrap();
        let updated = svc.update_ticket(&alice, ticket.id, patch).await.unwrap();
        assert_eq!(updated.status, TicketStatus::Closed);
    }

    #[tokio::test]
    async fn strangers_cannot_update_or_reply() {
        let (svc, db) = service();
        let alice = seed_user(&db, "Alice", UserRole::User).await;
        let mallory = seed_user(&db, "Mallory", UserRole::User).await;

        let ticket = svc.create_ticket(&alice, printer_ticket()).await.unwrap();

        let patch: UpdateTicketDto = serde_json::from_str(r#"{"status":"closed"}"#).unwrap();
        assert!(matches!(
            svc.update_ticket(&mallory, ticket.id, patch).await.unwrap_err(),
            ServiceError::Forbidden
        ));

        let reply = CreateReplyDto {
            message: "me too".to_string(),
            is_internal: None,
            attachments: None,
        };
        assert!(matches!(
            svc.add_reply(&mallory, ticket.id, reply).await.unwrap_err(),
            ServiceError::Forbidden
        ));
    }

    #[tokio::test]
    async fn missing_ticket_is_not_found() {
        let (svc, db) = service();
        let alice = seed_user(&db, "Alice", UserRole::User).await;

        let err = svc.get_ticket(&alice, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::TicketNotFound(_)));
    }

    #[tokio::test]
    async fn voting_is_exclusive_and_switchable() {
        let (svc, db) = service();
        let alice = seed_user(&db, "Alice", UserRole::User).await;
        let bob = seed_user(&db, "Bob", UserRole::User).await;

        let ticket = svc.create_ticket(&alice, printer_ticket()).await.unwrap();

        // The creator may vote on their own ticket.
        let after = svc
            .vote_ticket(&alice, ticket.id, VoteTicketDto { vote: VoteKind::Up })
            .await
            .unwrap();
        assert_eq!(after.upvotes, vec![alice.id]);

        // Bob cannot view Alice's ticket but may still vote on it.
        let after = svc
            .vote_ticket(&bob, ticket.id, VoteTicketDto { vote: VoteKind::Down })
            .await
            .unwrap();
        assert_eq!(after.score(), 0);

        let after = svc
            .vote_ticket(&bob, ticket.id, VoteTicketDto { vote: VoteKind::Up })
            .await
            .unwrap();
        assert!(after.upvotes.contains(&bob.id));
        assert!(!after.downvotes.contains(&bob.id));
        assert_eq!(after.score(), 2);
    }

    #[tokio::test]
    async fn concurrent_same_direction_votes_land_exactly_once() {
        let (svc, db) = service();
        let alice = seed_user(&db, "Alice", UserRole::User).await;
        let ticket = svc.create_ticket(&alice, printer_ticket()).await.unwrap();

        let svc = Arc::new(svc);
        let first = {
            let svc = svc.clone();
            let alice = alice.clone();
            let id = ticket.id;
            tokio::spawn(async move {
                svc.vote_ticket(&alice, id, VoteTicketDto { vote: VoteKind::Up }).await
            })
        };
        let second = {
            let svc = svc.clone();
            let alice = alice.clone();
            let id = ticket.id;
            tokio::spawn(async move {
                svc.vote_ticket(&alice, id, VoteTicketDto { vote: VoteKind::Up }).await
            })
        };

        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        let final_state = svc.get_ticket(&alice, ticket.id).await.unwrap();
        let occurrences = final_state
            .upvotes
            .iter()
            .filter(|id| **id == alice.id)
            .count();
        assert_eq!(occurrences, 1);
        assert!(!final_state.downvotes.contains(&alice.id));
    }

    #[tokio::test]
    async fn concurrent_votes_by_different_users_are_not_lost() {
        let (svc, db) = service();
        let alice = seed_user(&db, "Alice", UserRole::User).await;
        let ticket = svc.create_ticket(&alice, printer_ticket()).await.unwrap();

        // Three writers: each can lose the compare-and-swap race at most
        // twice, so the bounded retry always suffices.
        let svc = Arc::new(svc);
        let mut handles = Vec::new();
        for i in 0..3 {
            let voter = seed_user(&db, &format!("Voter{i}"), UserRole::User).await;
            let svc = svc.clone();
            let id = ticket.id;
            handles.push(tokio::spawn(async move {
                svc.vote_ticket(&voter, id, VoteTicketDto { vote: VoteKind::Up }).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let final_state = svc.get_ticket(&alice, ticket.id).await.unwrap();
        assert_eq!(final_state.upvotes.len(), 3);
        assert_eq!(final_state.score(), 3);
    }
}
