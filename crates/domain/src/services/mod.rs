//! Domain services for event registration.
//!
//! Services contain business logic that operates on domain models.

pub mod admission;
pub mod notification;

pub use admission::evaluate_admission;
pub use notification::{
    LoggingTicketNotifier, MockTicketNotifier, NotificationResult, NotificationType,
    TicketIssuedPayload, TicketNotifier,
};
