//! Ticket API handlers.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use tracing::info;

use helpdesk_core::{
    NewTicket, Priority, Ticket, TicketFilter, TicketStatus, TicketUpdate, Title,
    ValidationError, DEFAULT_LIMIT,
};

use super::error::ApiError;
use crate::metrics::{TICKETS_CREATED_TOTAL, TICKETS_DELETED_TOTAL, TICKETS_UPDATED_TOTAL};
use crate::state::AppState;

/// Maximum allowed limit for ticket queries
const MAX_LIMIT: i64 = 100;

// ============================================================================
// Request Types
// ============================================================================

/// Request body for creating a ticket
#[derive(Debug, Deserialize)]
pub struct CreateTicketBody {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Must be a JSON integer; the range is checked on conversion
    pub priority: i64,
    /// Defaults to "open"
    #[serde(default)]
    pub status: Option<String>,
}

impl TryFrom<CreateTicketBody> for NewTicket {
    type Error = ValidationError;

    fn try_from(body: CreateTicketBody) -> Result<Self, Self::Error> {
        NewTicket::new(
            body.title,
            body.description,
            body.priority,
            body.status.as_deref(),
        )
    }
}

/// Request body for a partial update.
///
/// The outer `Option` tells whether the key was present at all, the inner
/// one whether it was `null`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTicketBody {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub priority: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present")]
    pub status: Option<Option<String>>,
}

/// Marks a key as present, keeping an explicit `null` as `Some(None)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn not_null<T>(field: &'static str, value: Option<T>) -> Result<T, ValidationError> {
    value.ok_or_else(|| ValidationError::new(field, format!("{} must not be null", field)))
}

impl TryFrom<UpdateTicketBody> for TicketUpdate {
    type Error = ValidationError;

    fn try_from(body: UpdateTicketBody) -> Result<Self, Self::Error> {
        let mut update = TicketUpdate::new();

        if let Some(title) = body.title {
            update = update.with_title(Title::new(not_null("title", title)?)?);
        }
        if let Some(description) = body.description {
            update = update.with_description(description);
        }
        if let Some(priority) = body.priority {
            update = update.with_priority(Priority::new(not_null("priority", priority)?)?);
        }
        if let Some(status) = body.status {
            update = update.with_status(TicketStatus::parse(&not_null("status", status)?)?);
        }

        Ok(update)
    }
}

/// Query parameters for listing tickets
#[derive(Debug, Default, Deserialize)]
pub struct ListTicketsParams {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

/// Query parameters for searching tickets.
///
/// Filter values arrive as raw strings so a bad value is reported against
/// its field.
#[derive(Debug, Default, Deserialize)]
pub struct SearchTicketsParams {
    pub priority: Option<String>,
    pub status: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl TryFrom<SearchTicketsParams> for TicketFilter {
    type Error = ValidationError;

    fn try_from(params: SearchTicketsParams) -> Result<Self, Self::Error> {
        let (offset, limit) = paging(params.offset, params.limit)?;
        let mut filter = TicketFilter::new().with_offset(offset).with_limit(limit);

        if let Some(priority) = params.priority {
            let value = priority.parse::<i64>().map_err(|_| {
                ValidationError::new(
                    "priority",
                    format!("priority must be an integer, got '{}'", priority),
                )
            })?;
            filter = filter.with_priority(Priority::new(value)?);
        }

        if let Some(status) = params.status {
            filter = filter.with_status(TicketStatus::parse(&status)?);
        }

        if let Some(title) = params.title {
            filter = filter.with_title(title);
        }

        if let Some(description) = params.description {
            filter = filter.with_description(description);
        }

        Ok(filter)
    }
}

/// Resolve paging defaults and reject out-of-range values.
fn paging(offset: Option<i64>, limit: Option<i64>) -> Result<(i64, i64), ValidationError> {
    let offset = offset.unwrap_or(0);
    if offset < 0 {
        return Err(ValidationError::new("offset", "offset must not be negative"));
    }

    let limit = limit.unwrap_or(DEFAULT_LIMIT);
    if !(0..=MAX_LIMIT).contains(&limit) {
        return Err(ValidationError::new(
            "limit",
            format!("limit must be between 0 and {}", MAX_LIMIT),
        ));
    }

    Ok((offset, limit))
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a new ticket
pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateTicketBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Ticket>), ApiError> {
    let Json(body) = payload?;
    let new_ticket = NewTicket::try_from(body)?;

    let ticket = state.ticket_store().create(new_ticket)?;
    TICKETS_CREATED_TOTAL.inc();
    info!(ticket_id = ticket.id, "Ticket created");

    Ok((StatusCode::CREATED, Json(ticket)))
}

/// List tickets in id order
pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListTicketsParams>, QueryRejection>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    let Query(params) = params?;
    let (offset, limit) = paging(params.offset, params.limit)?;

    let tickets = state.ticket_store().list(offset, limit)?;
    Ok(Json(tickets))
}

/// Get a ticket by ID
pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Ticket>, ApiError> {
    let Path(id) = id?;
    let ticket = state.ticket_store().get(id)?;
    Ok(Json(ticket))
}

/// Search tickets by exact field values
pub async fn search_tickets(
    State(state): State<Arc<AppState>>,
    params: Result<Query<SearchTicketsParams>, QueryRejection>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    let Query(params) = params?;
    let filter = TicketFilter::try_from(params)?;

    let tickets = state.ticket_store().search(&filter)?;
    Ok(Json(tickets))
}

/// Apply a partial update (PATCH endpoint)
pub async fn update_ticket(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateTicketBody>, JsonRejection>,
) -> Result<Json<Ticket>, ApiError> {
    let Path(id) = id?;
    let Json(body) = payload?;
    let update = TicketUpdate::try_from(body)?;
    let writes = !update.is_empty();

    let ticket = state.ticket_store().update(id, update)?;
    if writes {
        TICKETS_UPDATED_TOTAL.inc();
        info!(ticket_id = id, status = %ticket.status, "Ticket updated");
    }

    Ok(Json(ticket))
}

/// Delete a ticket, returning it as it was
pub async fn delete_ticket(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Ticket>, ApiError> {
    let Path(id) = id?;

    let ticket = state.ticket_store().delete(id)?;
    TICKETS_DELETED_TOTAL.inc();
    info!(ticket_id = id, "Ticket deleted");

    Ok(Json(ticket))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update_body(json: serde_json::Value) -> UpdateTicketBody {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_update_body_distinguishes_absent_and_null() {
        let body = update_body(serde_json::json!({ "description": null }));
        assert_eq!(body.description, Some(None));
        assert_eq!(body.title, None);
        assert_eq!(body.priority, None);
        assert_eq!(body.status, None);
    }

    #[test]
    fn test_update_body_status_only() {
        let update =
            TicketUpdate::try_from(update_body(serde_json::json!({ "status": "in_progress" })))
                .unwrap();
        assert_eq!(update, TicketUpdate::new().with_status(TicketStatus::InProgress));
    }

    #[test]
    fn test_update_body_rejects_null_required_fields() {
        for field in ["title", "priority", "status"] {
            let body = update_body(serde_json::json!({ field: null }));
            let err = TicketUpdate::try_from(body).unwrap_err();
            assert_eq!(err.field(), field);
        }
    }

    #[test]
    fn test_update_body_rejects_invalid_values() {
        let err = TicketUpdate::try_from(update_body(serde_json::json!({ "priority": 6 })))
            .unwrap_err();
        assert_eq!(err.field(), "priority");

        let err = TicketUpdate::try_from(update_body(serde_json::json!({ "status": "done" })))
            .unwrap_err();
        assert_eq!(err.field(), "status");

        let err = TicketUpdate::try_from(update_body(serde_json::json!({ "title": "  " })))
            .unwrap_err();
        assert_eq!(err.field(), "title");
    }

    #[test]
    fn test_update_body_rejects_non_integer_priority() {
        let result: Result<UpdateTicketBody, _> =
            serde_json::from_value(serde_json::json!({ "priority": 2.5 }));
        assert!(result.is_err());
    }

    #[test]
    fn test_search_params_to_filter() {
        let params = SearchTicketsParams {
            priority: Some("5".to_string()),
            status: Some("open".to_string()),
            ..Default::default()
        };
        let filter = TicketFilter::try_from(params).unwrap();
        assert_eq!(
            filter,
            TicketFilter::new()
                .with_priority(Priority::MAX)
                .with_status(TicketStatus::Open)
        );
    }

    #[test]
    fn test_search_params_reject_bad_filters() {
        let params = SearchTicketsParams {
            priority: Some("high".to_string()),
            ..Default::default()
        };
        assert_eq!(TicketFilter::try_from(params).unwrap_err().field(), "priority");

        let params = SearchTicketsParams {
            priority: Some("0".to_string()),
            ..Default::default()
        };
        assert_eq!(TicketFilter::try_from(params).unwrap_err().field(), "priority");

        let params = SearchTicketsParams {
            priority: Some(" 5".to_string()),
            ..Default::default()
        };
        assert_eq!(TicketFilter::try_from(params).unwrap_err().field(), "priority");

        let params = SearchTicketsParams {
            status: Some("archived".to_string()),
            ..Default::default()
        };
        assert_eq!(TicketFilter::try_from(params).unwrap_err().field(), "status");
    }

    #[test]
    fn test_paging_defaults_and_bounds() {
        assert_eq!(paging(None, None).unwrap(), (0, DEFAULT_LIMIT));
        assert_eq!(paging(Some(5), Some(0)).unwrap(), (5, 0));
        assert_eq!(paging(None, Some(MAX_LIMIT)).unwrap(), (0, MAX_LIMIT));
        assert_eq!(paging(Some(-1), None).unwrap_err().field(), "offset");
        assert_eq!(paging(None, Some(MAX_LIMIT + 1)).unwrap_err().field(), "limit");
        assert_eq!(paging(None, Some(-1)).unwrap_err().field(), "limit");
    }
}
