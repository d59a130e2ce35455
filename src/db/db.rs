// src/db/db.rs
use std::collections::HashMap;

use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{rolerequestmodel::RoleRequest, ticketmodel::Ticket, usermodel::User};

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,

    #[error("document was modified concurrently")]
    Conflict,

    #[error("unique constraint violation: {0}")]
    UniqueViolation(&'static str),
}

/// A stored document together with its version counter. Every successful
/// write bumps the version; conditional updates only apply when the caller's
/// expected version still matches.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub version: u64,
    pub doc: T,
}

impl<T> Versioned<T> {
    fn new(doc: T) -> Self {
        Versioned { version: 1, doc }
    }
}

/// Embedded document store. One collection per aggregate, each guarded by its
/// own lock; a document is the unit of atomic mutation.
pub struct DBClient {
    pub(super) users: RwLock<HashMap<Uuid, Versioned<User>>>,
    pub(super) tickets: RwLock<HashMap<Uuid, Versioned<Ticket>>>,
    pub(super) role_requests: RwLock<HashMap<Uuid, Versioned<RoleRequest>>>,
}

impl std::fmt::Debug for DBClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DBClient").finish_non_exhaustive()
    }
}

impl DBClient {
    pub fn new() -> Self {
        DBClient {
            users: RwLock::new(HashMap::new()),
            tickets: RwLock::new(HashMap::new()),
            role_requests: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for DBClient {
    fn default() -> Self {
        Self::new()
    }
}

pub(super) fn insert_new<T: Clone>(
    map: &mut HashMap<Uuid, Versioned<T>>,
    id: Uuid,
    doc: T,
) -> T {
    map.insert(id, Versioned::new(doc.clone()));
    doc
}

pub(super) fn conditional_replace<T: Clone>(
    map: &mut HashMap<Uuid, Versioned<T>>,
    id: Uuid,
    expected_version: u64,
    doc: T,
) -> Result<T, StoreError> {
    let entry = map.get_mut(&id).ok_or(StoreError::NotFound)?;
    if entry.version != expected_version {
        return Err(StoreError::Conflict);
    }
    entry.version += 1;
    entry.doc = doc.clone();
    Ok(doc)
}
