//! Registration orchestration: admission retries, notifications, lookups.
//!
//! Admission itself is a single store transaction; this layer retries it on
//! ticket collisions, records metrics and logs, and hands the committed
//! registration to the ticket notifier on a background task.

use std::collections::HashMap;
use std::sync::Arc;

use domain::errors::{ErrorKind, RegistrationError};
use domain::models::{CheckIn, NewRegistration, Registration, RegistrationDetails};
use domain::services::{NotificationResult, TicketIssuedPayload, TicketNotifier};
use persistence::repositories::{
    AdmittedRegistration, CheckInRepository, RegistrationRepository,
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::middleware::metrics::{
    record_registration_admitted, record_registration_cancelled, record_registration_rejected,
    record_ticket_generation_retry,
};

/// Service for submitting, looking up and cancelling registrations.
pub struct RegistrationService {
    registrations: RegistrationRepository,
    check_ins: CheckInRepository,
    notifier: Arc<dyn TicketNotifier>,
    max_ticket_attempts: u32,
}

impl RegistrationService {
    pub fn new(state: &AppState) -> Self {
        Self {
            registrations: RegistrationRepository::new(
                state.pool.clone(),
                state.config.identity.policy(),
            ),
            check_ins: CheckInRepository::new(state.pool.clone()),
            notifier: state.notifier.clone(),
            max_ticket_attempts: state.config.admission.max_ticket_attempts.max(1),
        }
    }

    /// Admit a validated candidate, retrying the whole admission when the
    /// generated ticket number collides.
    pub async fn submit(
        &self,
        candidate: NewRegistration,
    ) -> Result<Registration, RegistrationError> {
        let mut attempt = 1;
        loop {
            match self.registrations.admit(&candidate).await {
                Ok(admitted) => {
                    record_registration_admitted();
                    info!(
                        event_id = %admitted.event.id,
                        registration_id = %admitted.registration.id,
                        ticket_number = %admitted.registration.ticket_number,
                        attempt,
                        "Registration admitted"
                    );
                    let registration = admitted.registration.clone();
                    self.dispatch_ticket_issued(admitted);
                    return Ok(registration);
                }
                Err(err) if err.is_retryable() && attempt < self.max_ticket_attempts => {
                    record_ticket_generation_retry();
                    warn!(
                        event_id = %candidate.event_id,
                        attempt,
                        "Ticket number collided, retrying admission"
                    );
                    attempt += 1;
                }
                Err(err) => {
                    record_registration_rejected(err.code());
                    match err.kind() {
                        ErrorKind::Storage => {
                            error!(event_id = %candidate.event_id, error = %err, "Admission failed")
                        }
                        ErrorKind::TicketGenerationConflict => warn!(
                            event_id = %candidate.event_id,
                            attempts = attempt,
                            "Ticket generation exhausted retries"
                        ),
                        _ => debug!(
                            event_id = %candidate.event_id,
                            reason = err.code(),
                            "Registration rejected"
                        ),
                    }
                    return Err(err);
                }
            }
        }
    }

    /// Hands the confirmation to the notifier after commit.
    fn dispatch_ticket_issued(&self, admitted: AdmittedRegistration) {
        let notifier = self.notifier.clone();
        let payload = TicketIssuedPayload::new(&admitted.event, &admitted.registration);
        tokio::spawn(async move {
            let registration_id = payload.registration_id;
            match notifier.send_ticket_issued(payload).await {
                NotificationResult::Sent | NotificationResult::Skipped => {}
                NotificationResult::Failed(reason) => warn!(
                    registration_id = %registration_id,
                    reason = %reason,
                    "Ticket confirmation failed"
                ),
            }
        });
    }

    /// Registration with its effective check-in.
    pub async fn details(&self, id: Uuid) -> Result<Option<RegistrationDetails>, sqlx::Error> {
        match self.registrations.find_by_id(id).await? {
            Some(registration) => self.with_check_in(registration).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn details_by_ticket(
        &self,
        ticket_number: &str,
    ) -> Result<Option<RegistrationDetails>, sqlx::Error> {
        match self.registrations.find_by_ticket(ticket_number).await? {
            Some(registration) => self.with_check_in(registration).await.map(Some),
            None => Ok(None),
        }
    }

    async fn with_check_in(
        &self,
        registration: Registration,
    ) -> Result<RegistrationDetails, sqlx::Error> {
        let effective = self.check_ins.find_effective(registration.id).await?;
        Ok(RegistrationDetails::new(registration, effective))
    }

    /// Free-text search joined with each match's effective check-in.
    pub async fn search(
        &self,
        query: &str,
        event_id: Option<Uuid>,
        active_only: bool,
        limit: i64,
    ) -> Result<Vec<RegistrationDetails>, sqlx::Error> {
        let registrations = self
            .registrations
            .search(query, event_id, active_only, limit)
            .await?;

        let ids: Vec<Uuid> = registrations.iter().map(|r| r.id).collect();
        let mut effective: HashMap<Uuid, CheckIn> = self
            .check_ins
            .find_effective_for(&ids)
            .await?
            .into_iter()
            .map(|check_in| (check_in.registration_id, check_in))
            .collect();

        Ok(registrations
            .into_iter()
            .map(|registration| {
                let check_in = effective.remove(&registration.id);
                RegistrationDetails::new(registration, check_in)
            })
            .collect())
    }

    /// Cancel a registration, voiding its effective check-in.
    pub async fn cancel(&self, id: Uuid) -> Result<Registration, RegistrationError> {
        match self.registrations.cancel(id).await {
            Ok(cancelled) => {
                record_registration_cancelled();
                info!(
                    event_id = %cancelled.registration.event_id,
                    registration_id = %id,
                    ticket_number = %cancelled.registration.ticket_number,
                    check_ins_voided = cancelled.check_ins_voided,
                    "Registration cancelled"
                );
                Ok(cancelled.registration)
            }
            Err(err) => {
                if let RegistrationError::Storage(e) = &err {
                    error!(registration_id = %id, error = %e, "Cancellation failed");
                } else {
                    debug!(registration_id = %id, reason = err.code(), "Cancellation refused");
                }
                Err(err)
            }
        }
    }
}
