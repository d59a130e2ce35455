// src/db/ticketdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::{conditional_replace, insert_new, DBClient, StoreError};
use crate::models::ticketmodel::{Ticket, TicketStatus};

/// Filter for ticket listings. Empty filter matches everything.
#[derive(Debug, Default, Clone)]
pub struct TicketFilter {
    pub created_by: Option<Uuid>,
    pub status: Option<TicketStatus>,
    pub assigned_to: Option<Uuid>,
    pub unassigned_only: bool,
}

impl TicketFilter {
    fn matches(&self, ticket: &Ticket) -> bool {
        if let Some(created_by) = self.created_by {
            if ticket.created_by != created_by {
                return false;
            }
        }
        if let Some(status) = self.status {
            if ticket.status != status {
                return false;
            }
        }
        if let Some(assigned_to) = self.assigned_to {
            if ticket.assigned_to != Some(assigned_to) {
                return false;
            }
        }
        if self.unassigned_only && ticket.assigned_to.is_some() {
            return false;
        }
        true
    }
}

#[async_trait]
pub trait TicketExt {
    async fn insert_ticket(&self, ticket: Ticket) -> Result<Ticket, StoreError>;

    /// Returns the ticket together with its current version, for use in a
    /// read-modify-write cycle.
    async fn get_ticket(&self, ticket_id: Uuid) -> Result<Option<(Ticket, u64)>, StoreError>;

    /// Newest first, with the total match count for pagination.
    async fn find_tickets(
        &self,
        filter: &TicketFilter,
        page: u32,
        limit: usize,
    ) -> Result<(Vec<Ticket>, usize), StoreError>;

    async fn count_tickets(&self, filter: &TicketFilter) -> Result<i64, StoreError>;

    /// Conditional replace: fails with `Conflict` when the document moved on
    /// since `expected_version` was read.
    async fn update_ticket(
        &self,
        ticket_id: Uuid,
        expected_version: u64,
        ticket: Ticket,
    ) -> Result<Ticket, StoreError>;
}

#[async_trait]
impl TicketExt for DBClient {
    async fn insert_ticket(&self, ticket: Ticket) -> Result<Ticket, StoreError> {
        let mut tickets = self.tickets.write().await;
        Ok(insert_new(&mut tickets, ticket.id, ticket))
    }

    async fn get_ticket(&self, ticket_id: Uuid) -> Result<Option<(Ticket, u64)>, StoreError> {
        let tickets = self.tickets.read().await;
        Ok(tickets
            .get(&ticket_id)
            .map(|entry| (entry.doc.clone(), entry.version)))
    }

    async fn find_tickets(
        &self,
        filter: &TicketFilter,
        page: u32,
        limit: usize,
    ) -> Result<(Vec<Ticket>, usize), StoreError> {
        let tickets = self.tickets.read().await;

        let mut matched: Vec<Ticket> = tickets
            .values()
            .filter(|entry| filter.matches(&entry.doc))
            .map(|entry| entry.doc.clone())
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matched.len();
        let offset = (page.saturating_sub(1) as usize) * limit;
        let page_items = matched.into_iter().skip(offset).take(limit).collect();

        Ok((page_items, total))
    }

    async fn count_tickets(&self, filter: &TicketFilter) -> Result<i64, StoreError> {
        let tickets = self.tickets.read().await;
        Ok(tickets
            .values()
            .filter(|entry| filter.matches(&entry.doc))
            .count() as i64)
    }

    async fn update_ticket(
        &self,
        ticket_id: Uuid,
        expected_version: u64,
        ticket: Ticket,
    ) -> Result<Ticket, StoreError> {
        let mut tickets = self.tickets.write().await;
        conditional_replace(&mut tickets, ticket_id, expected_version, ticket)
    }
}
