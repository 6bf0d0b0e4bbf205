//! Ticket storage trait and types.

use thiserror::Error;

use crate::storage::StorageError;
use crate::ticket::{NewTicket, Priority, Ticket, TicketStatus, TicketUpdate, ValidationError};

/// Default page size for list and search.
pub const DEFAULT_LIMIT: i64 = 100;

/// Error type for ticket operations.
#[derive(Debug, Error)]
pub enum TicketError {
    /// Input failed validation; nothing was written.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// No ticket with this id.
    #[error("Ticket not found: {0}")]
    NotFound(i64),

    /// Storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<rusqlite::Error> for TicketError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(StorageError::from(err))
    }
}

/// Filter for searching tickets.
///
/// Every criterion is optional; present criteria are combined with AND.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketFilter {
    /// Exact priority match.
    pub priority: Option<Priority>,
    /// Exact status match.
    pub status: Option<TicketStatus>,
    /// Case-insensitive exact title match.
    pub title: Option<String>,
    /// Case-insensitive exact description match.
    pub description: Option<String>,
    /// Maximum number of results.
    pub limit: i64,
    /// Offset for pagination.
    pub offset: i64,
}

impl Default for TicketFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl TicketFilter {
    /// Create an unconstrained filter with default paging.
    pub fn new() -> Self {
        Self {
            priority: None,
            status: None,
            title: None,
            description: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }

    /// Filter by priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Filter by status.
    pub fn with_status(mut self, status: TicketStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Filter by title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Filter by description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set limit.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Set offset.
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Trait for ticket storage backends.
pub trait TicketStore: Send + Sync {
    /// Store a new ticket and return it with its assigned id.
    fn create(&self, ticket: NewTicket) -> Result<Ticket, TicketError>;

    /// Get a ticket by id.
    fn get(&self, id: i64) -> Result<Ticket, TicketError>;

    /// List tickets in id order.
    fn list(&self, offset: i64, limit: i64) -> Result<Vec<Ticket>, TicketError>;

    /// Tickets matching the filter, in id order.
    fn search(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketError>;

    /// Count tickets matching the filter, ignoring its paging.
    fn count(&self, filter: &TicketFilter) -> Result<i64, TicketError>;

    /// Apply a partial update and return the resulting ticket.
    fn update(&self, id: i64, update: TicketUpdate) -> Result<Ticket, TicketError>;

    /// Permanently delete a ticket.
    /// Returns the deleted ticket.
    fn delete(&self, id: i64) -> Result<Ticket, TicketError>;
}
