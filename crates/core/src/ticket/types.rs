//! Ticket types and validation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Input rejected at the boundary, before anything reaches storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    field: &'static str,
    message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

// ============================================================================
// Status
// ============================================================================

/// Lifecycle state of a ticket.
///
/// Any status may move to any other; there is no enforced workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Closed,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 3] = [Self::Open, Self::InProgress, Self::Closed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Closed => "closed",
        }
    }

    /// Parse a status, reporting failures against the `status` field.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        value.parse()
    }
}

impl FromStr for TicketStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "closed" => Ok(Self::Closed),
            other => Err(ValidationError::new(
                "status",
                format!(
                    "invalid status '{}', expected one of: open, in_progress, closed",
                    other
                ),
            )),
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Priority
// ============================================================================

/// Urgency rating, 1 (lowest) to 5 (highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const MIN: Priority = Priority(1);
    pub const MAX: Priority = Priority(5);

    /// Accepts exactly `1..=5`; anything else is rejected, never clamped.
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if (Self::MIN.0 as i64..=Self::MAX.0 as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ValidationError::new(
                "priority",
                format!(
                    "priority must be between {} and {}, got {}",
                    Self::MIN.0,
                    Self::MAX.0,
                    value
                ),
            ))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Priority {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Title
// ============================================================================

/// A non-blank ticket title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title(String);

impl Title {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::new("title", "title must not be empty"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

// ============================================================================
// Ticket
// ============================================================================

/// A helpdesk request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Assigned by storage at creation, never reused.
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: TicketStatus,
}

/// A validated ticket that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    pub title: Title,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: TicketStatus,
}

impl NewTicket {
    /// Validate raw creation input. A missing status defaults to `open`.
    pub fn new(
        title: impl Into<String>,
        description: Option<String>,
        priority: i64,
        status: Option<&str>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            title: Title::new(title)?,
            description,
            priority: Priority::new(priority)?,
            status: status.map(TicketStatus::parse).transpose()?.unwrap_or_default(),
        })
    }
}

/// A partial update.
///
/// `None` means the field was not supplied and stays as stored. The
/// description is nullable, so `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketUpdate {
    pub title: Option<Title>,
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub status: Option<TicketStatus>,
}

impl TicketUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: Title) -> Self {
        self.title = Some(title);
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_status(mut self, status: TicketStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.status.is_none()
    }

    /// Merge the supplied fields over `ticket`.
    pub fn apply_to(&self, ticket: &Ticket) -> Ticket {
        Ticket {
            id: ticket.id,
            title: self
                .title
                .as_ref()
                .map(|t| t.as_str().to_string())
                .unwrap_or_else(|| ticket.title.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| ticket.description.clone()),
            priority: self.priority.unwrap_or(ticket.priority),
            status: self.status.unwrap_or(ticket.status),
        }
    }
}
