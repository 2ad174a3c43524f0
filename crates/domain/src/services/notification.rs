//! Ticket confirmation notifications.
//!
//! Delivery (email, PDF ticket) belongs to an external collaborator. The core
//! only hands it a payload after the admission transaction has committed; a
//! failed delivery never affects the registration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Event, Registration};

/// Notification type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    TicketIssued,
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationType::TicketIssued => write!(f, "ticket_issued"),
        }
    }
}

/// Payload handed to the delivery collaborator for a new ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TicketIssuedPayload {
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub registration_id: Uuid,
    pub ticket_number: String,
    pub full_name: String,
    pub email: String,
    pub event_id: Uuid,
    pub event_title: String,
    pub event_code: String,
    pub timestamp: DateTime<Utc>,
}

impl TicketIssuedPayload {
    pub fn new(event: &Event, registration: &Registration) -> Self {
        Self {
            notification_type: NotificationType::TicketIssued,
            registration_id: registration.id,
            ticket_number: registration.ticket_number.clone(),
            full_name: registration.full_name.clone(),
            email: registration.email.clone(),
            event_id: event.id,
            event_title: event.title.clone(),
            event_code: event.code.clone(),
            timestamp: Utc::now(),
        }
    }
}

/// Result of a notification send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationResult {
    /// Notification was handed off successfully.
    Sent,
    /// Notification sending failed (but was non-blocking).
    Failed(String),
    /// Notifications are disabled.
    Skipped,
}

/// Sender for ticket confirmations.
#[async_trait::async_trait]
pub trait TicketNotifier: Send + Sync {
    async fn send_ticket_issued(&self, payload: TicketIssuedPayload) -> NotificationResult;
}

/// Notifier that logs the confirmation instead of delivering it.
#[derive(Debug, Clone, Default)]
pub struct LoggingTicketNotifier {
    pub enabled: bool,
}

impl LoggingTicketNotifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait::async_trait]
impl TicketNotifier for LoggingTicketNotifier {
    async fn send_ticket_issued(&self, payload: TicketIssuedPayload) -> NotificationResult {
        if !self.enabled {
            tracing::debug!(
                registration_id = %payload.registration_id,
                "Notifications disabled, skipping ticket confirmation"
            );
            return NotificationResult::Skipped;
        }

        tracing::info!(
            registration_id = %payload.registration_id,
            ticket_number = %payload.ticket_number,
            event_code = %payload.event_code,
            "Would send ticket_issued notification"
        );

        NotificationResult::Sent
    }
}

/// Mock notifier for tests.
#[derive(Debug, Clone, Default)]
pub struct MockTicketNotifier {
    /// Whether to simulate failures for testing.
    pub simulate_failure: bool,
}

impl MockTicketNotifier {
    pub fn new() -> Self {
        Self {
            simulate_failure: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
        }
    }
}

#[async_trait::async_trait]
impl TicketNotifier for MockTicketNotifier {
    async fn send_ticket_issued(&self, payload: TicketIssuedPayload) -> NotificationResult {
        if self.simulate_failure {
            tracing::warn!(
                registration_id = %payload.registration_id,
                "Mock ticket notifier simulating failure"
            );
            return NotificationResult::Failed("Simulated failure".to_string());
        }
        NotificationResult::Sent
    }
}
