//! Check-in orchestration with logging and metrics around the store
//! transactions.

use domain::errors::CheckInError;
use domain::models::CheckIn;
use persistence::repositories::{CheckInRepository, RegistrationRepository};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::app::AppState;
use crate::middleware::metrics::record_check_in;

pub struct CheckInService {
    check_ins: CheckInRepository,
    registrations: RegistrationRepository,
}

impl CheckInService {
    pub fn new(state: &AppState) -> Self {
        Self {
            check_ins: CheckInRepository::new(state.pool.clone()),
            registrations: RegistrationRepository::new(
                state.pool.clone(),
                state.config.identity.policy(),
            ),
        }
    }

    pub async fn check_in(
        &self,
        registration_id: Uuid,
        staff_id: &str,
    ) -> Result<CheckIn, CheckInError> {
        let result = self.check_ins.check_in(registration_id, staff_id).await;
        match &result {
            Ok(check_in) => {
                record_check_in("checked_in");
                info!(
                    registration_id = %registration_id,
                    check_in_id = %check_in.id,
                    staff_id = %check_in.checked_in_by,
                    "Participant checked in"
                );
            }
            Err(err) => log_refusal(registration_id, "Check-in", err),
        }
        result
    }

    pub async fn undo(
        &self,
        registration_id: Uuid,
        staff_id: Option<&str>,
    ) -> Result<CheckIn, CheckInError> {
        let result = self.check_ins.undo(registration_id, staff_id).await;
        match &result {
            Ok(check_in) => {
                record_check_in("undone");
                info!(
                    registration_id = %registration_id,
                    check_in_id = %check_in.id,
                    staff_id = check_in.undone_by.as_deref().unwrap_or("unknown"),
                    "Check-in undone"
                );
            }
            Err(err) => log_refusal(registration_id, "Undo", err),
        }
        result
    }

    /// Audit history, newest first. Unknown registrations are not found.
    pub async fn history(&self, registration_id: Uuid) -> Result<Vec<CheckIn>, CheckInError> {
        if self
            .registrations
            .find_by_id(registration_id)
            .await?
            .is_none()
        {
            return Err(CheckInError::RegistrationNotFound);
        }
        Ok(self.check_ins.history(registration_id).await?)
    }
}

fn log_refusal(registration_id: Uuid, action: &str, err: &CheckInError) {
    match err {
        CheckInError::Storage(e) => {
            record_check_in("storage_error");
            error!(registration_id = %registration_id, error = %e, "{} failed", action);
        }
        _ => {
            record_check_in(err.code());
            debug!(
                registration_id = %registration_id,
                reason = err.code(),
                "{} refused",
                action
            );
        }
    }
}
