//! SQLite-backed ticket store implementation.

use std::sync::Arc;

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::{
    NewTicket, Priority, Ticket, TicketError, TicketFilter, TicketStatus, TicketStore,
    TicketUpdate, ValidationError,
};
use crate::storage::{StorageEngine, StorageError};

const TICKET_COLUMNS: &str = "id, title, description, priority, status";

/// SQLite-backed ticket store.
///
/// Every operation runs in its own session on the shared engine.
pub struct SqliteTicketStore {
    engine: Arc<StorageEngine>,
}

impl SqliteTicketStore {
    pub fn new(engine: Arc<StorageEngine>) -> Self {
        Self { engine }
    }

    /// Create a store over a fresh in-memory database (useful for testing).
    pub fn in_memory() -> Result<Self, StorageError> {
        Ok(Self::new(Arc::new(StorageEngine::in_memory()?)))
    }

    fn check_paging(offset: i64, limit: i64) -> Result<(), ValidationError> {
        if offset < 0 {
            return Err(ValidationError::new("offset", "offset must not be negative"));
        }
        if limit < 0 {
            return Err(ValidationError::new("limit", "limit must not be negative"));
        }
        Ok(())
    }

    fn build_where_clause(filter: &TicketFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(priority) = filter.priority {
            conditions.push("priority = ?");
            params.push(Box::new(priority.value()));
        }

        if let Some(status) = filter.status {
            conditions.push("status = ?");
            params.push(Box::new(status.as_str()));
        }

        if let Some(ref title) = filter.title {
            conditions.push("title = ? COLLATE NOCASE");
            params.push(Box::new(title.clone()));
        }

        if let Some(ref description) = filter.description {
            conditions.push("description = ? COLLATE NOCASE");
            params.push(Box::new(description.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn row_to_ticket(row: &rusqlite::Row) -> rusqlite::Result<Ticket> {
        let id: i64 = row.get(0)?;
        let title: String = row.get(1)?;
        let description: Option<String> = row.get(2)?;
        let priority: i64 = row.get(3)?;
        let status: String = row.get(4)?;

        // The table's CHECK constraints make these unreachable for rows we wrote.
        let priority = Priority::new(priority)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Integer, Box::new(e)))?;
        let status = TicketStatus::parse(&status)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

        Ok(Ticket {
            id,
            title,
            description,
            priority,
            status,
        })
    }

    fn fetch(conn: &Connection, id: i64) -> Result<Option<Ticket>, TicketError> {
        let ticket = conn
            .query_row(
                &format!("SELECT {} FROM tickets WHERE id = ?", TICKET_COLUMNS),
                params![id],
                Self::row_to_ticket,
            )
            .optional()?;
        Ok(ticket)
    }
}

impl TicketStore for SqliteTicketStore {
    fn create(&self, ticket: NewTicket) -> Result<Ticket, TicketError> {
        let session = self.engine.session()?;
        let conn = session.connection();

        conn.execute(
            "INSERT INTO tickets (title, description, priority, status) VALUES (?, ?, ?, ?)",
            params![
                ticket.title.as_str(),
                ticket.description,
                ticket.priority.value(),
                ticket.status.as_str(),
            ],
        )?;
        let id = conn.last_insert_rowid();

        debug!(ticket_id = id, priority = %ticket.priority, status = %ticket.status, "Created ticket");

        Ok(Ticket {
            id,
            title: ticket.title.into_inner(),
            description: ticket.description,
            priority: ticket.priority,
            status: ticket.status,
        })
    }

    fn get(&self, id: i64) -> Result<Ticket, TicketError> {
        let session = self.engine.session()?;
        Self::fetch(session.connection(), id)?.ok_or(TicketError::NotFound(id))
    }

    fn list(&self, offset: i64, limit: i64) -> Result<Vec<Ticket>, TicketError> {
        self.search(&TicketFilter::new().with_offset(offset).with_limit(limit))
    }

    fn search(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketError> {
        Self::check_paging(filter.offset, filter.limit)?;

        let session = self.engine.session()?;
        let conn = session.connection();

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT {} FROM tickets {} ORDER BY id ASC LIMIT ? OFFSET ?",
            TICKET_COLUMNS, where_clause
        );

        let mut stmt = conn.prepare(&sql)?;

        // Build parameter slice with limit and offset
        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let tickets = stmt
            .query_map(param_refs.as_slice(), Self::row_to_ticket)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tickets)
    }

    fn count(&self, filter: &TicketFilter) -> Result<i64, TicketError> {
        let session = self.engine.session()?;

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!("SELECT COUNT(*) FROM tickets {}", where_clause);

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let count: i64 = session
            .connection()
            .query_row(&sql, param_refs.as_slice(), |row| row.get(0))?;

        Ok(count)
    }

    fn update(&self, id: i64, update: TicketUpdate) -> Result<Ticket, TicketError> {
        let mut session = self.engine.session()?;

        session.transaction(|tx| -> Result<Ticket, TicketError> {
            let current = Self::fetch(tx, id)?.ok_or(TicketError::NotFound(id))?;

            if update.is_empty() {
                return Ok(current);
            }

            let updated = update.apply_to(&current);

            tx.execute(
                "UPDATE tickets SET title = ?, description = ?, priority = ?, status = ? WHERE id = ?",
                params![
                    updated.title,
                    updated.description,
                    updated.priority.value(),
                    updated.status.as_str(),
                    id,
                ],
            )?;

            if current.status != updated.status {
                debug!(ticket_id = id, from = %current.status, to = %updated.status, "Ticket status changed");
            }
            debug!(ticket_id = id, "Updated ticket");

            Ok(updated)
        })
    }

    fn delete(&self, id: i64) -> Result<Ticket, TicketError> {
        let mut session = self.engine.session()?;

        session.transaction(|tx| -> Result<Ticket, TicketError> {
            // First, get the ticket to return it
            let ticket = Self::fetch(tx, id)?.ok_or(TicketError::NotFound(id))?;

            tx.execute("DELETE FROM tickets WHERE id = ?", params![id])?;

            debug!(ticket_id = id, "Deleted ticket");
            Ok(ticket)
        })
    }
}
