//! Helpdesk tickets: model, validation and storage.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteTicketStore;
pub use store::{TicketError, TicketFilter, TicketStore, DEFAULT_LIMIT};
pub use types::{
    NewTicket, Priority, Ticket, TicketStatus, TicketUpdate, Title, ValidationError,
};
