pub mod config;
pub mod storage;
pub mod ticket;

pub use config::{
    load_config, load_config_from_str, load_default_config, validate_config, Config,
    ConfigError, DatabaseConfig, LogFormat, LoggingConfig, ServerConfig,
};
pub use storage::{Session, StorageEngine, StorageError};
pub use ticket::{
    NewTicket, Priority, SqliteTicketStore, Ticket, TicketError, TicketFilter, TicketStatus,
    TicketStore, TicketUpdate, Title, ValidationError, DEFAULT_LIMIT,
};
