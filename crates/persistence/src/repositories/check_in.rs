//! Check-in repository for database operations.

use domain::errors::CheckInError;
use domain::models::{CheckIn, CheckInState, Registration};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::db::unique_violation_constraint;
use crate::entities::CheckInEntity;
use crate::metrics::QueryTimer;
use crate::repositories::registration::lock_registration;

const CHECK_IN_COLUMNS: &str =
    "id, registration_id, checked_in_at, checked_in_by, status, undone_at, undone_by";

const EFFECTIVE_CHECK_IN_CONSTRAINT: &str = "check_ins_effective_registration_key";

async fn find_effective_locked(
    conn: &mut PgConnection,
    registration_id: Uuid,
) -> Result<Option<CheckInEntity>, sqlx::Error> {
    sqlx::query_as::<_, CheckInEntity>(&format!(
        r#"
        SELECT {CHECK_IN_COLUMNS} FROM check_ins
        WHERE registration_id = $1 AND status = 'checked_in'
        FOR UPDATE
        "#
    ))
    .bind(registration_id)
    .fetch_optional(conn)
    .await
}

/// Repository for check-in related database operations.
#[derive(Clone)]
pub struct CheckInRepository {
    pool: PgPool,
}

impl CheckInRepository {
    /// Creates a new CheckInRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a check-in for an active registration that is not checked in.
    ///
    /// The registration row lock serializes concurrent desks; the partial
    /// unique index turns any lost race into `AlreadyCheckedIn`.
    pub async fn check_in(
        &self,
        registration_id: Uuid,
        staff_id: &str,
    ) -> Result<CheckIn, CheckInError> {
        let timer = QueryTimer::new("check_in_registration");
        let mut tx = self.pool.begin().await?;

        let registration: Registration = lock_registration(&mut *tx, registration_id)
            .await?
            .ok_or(CheckInError::RegistrationNotFound)?
            .into();

        let effective: Option<CheckIn> = find_effective_locked(&mut *tx, registration_id)
            .await?
            .map(Into::into);
        CheckInState::from_effective(effective.as_ref()).check_in(registration.status)?;

        let entity = sqlx::query_as::<_, CheckInEntity>(&format!(
            r#"
            INSERT INTO check_ins (registration_id, checked_in_by)
            VALUES ($1, $2)
            RETURNING {CHECK_IN_COLUMNS}
            "#
        ))
        .bind(registration_id)
        .bind(staff_id.trim())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match unique_violation_constraint(&e) {
            Some(EFFECTIVE_CHECK_IN_CONSTRAINT) => CheckInError::AlreadyCheckedIn,
            _ => CheckInError::Storage(e),
        })?;

        tx.commit().await?;
        timer.record();
        Ok(entity.into())
    }

    /// Undo the effective check-in. The row is kept and marked `cancelled`.
    pub async fn undo(
        &self,
        registration_id: Uuid,
        staff_id: Option<&str>,
    ) -> Result<CheckIn, CheckInError> {
        let timer = QueryTimer::new("undo_check_in");
        let mut tx = self.pool.begin().await?;

        lock_registration(&mut *tx, registration_id)
            .await?
            .ok_or(CheckInError::RegistrationNotFound)?;

        let effective: Option<CheckIn> = find_effective_locked(&mut *tx, registration_id)
            .await?
            .map(Into::into);
        CheckInState::from_effective(effective.as_ref()).undo()?;
        let effective = effective.ok_or(CheckInError::NothingToUndo)?;

        let entity = sqlx::query_as::<_, CheckInEntity>(&format!(
            r#"
            UPDATE check_ins
            SET status = 'cancelled', undone_at = NOW(), undone_by = $2
            WHERE id = $1
            RETURNING {CHECK_IN_COLUMNS}
            "#
        ))
        .bind(effective.id)
        .bind(staff_id.map(str::trim))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(entity.into())
    }

    /// The effective check-in of a registration, if any.
    pub async fn find_effective(
        &self,
        registration_id: Uuid,
    ) -> Result<Option<CheckIn>, sqlx::Error> {
        let timer = QueryTimer::new("find_effective_check_in");
        let result = sqlx::query_as::<_, CheckInEntity>(&format!(
            r#"
            SELECT {CHECK_IN_COLUMNS} FROM check_ins
            WHERE registration_id = $1 AND status = 'checked_in'
            "#
        ))
        .bind(registration_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result.map(|entity| entity.map(Into::into))
    }

    /// Effective check-ins for a batch of registrations.
    pub async fn find_effective_for(
        &self,
        registration_ids: &[Uuid],
    ) -> Result<Vec<CheckIn>, sqlx::Error> {
        if registration_ids.is_empty() {
            return Ok(Vec::new());
        }

        let timer = QueryTimer::new("find_effective_check_ins");
        let result = sqlx::query_as::<_, CheckInEntity>(&format!(
            r#"
            SELECT {CHECK_IN_COLUMNS} FROM check_ins
            WHERE registration_id = ANY($1) AND status = 'checked_in'
            "#
        ))
        .bind(registration_ids)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result.map(|rows| rows.into_iter().map(Into::into).collect())
    }

    /// Full check-in history of a registration, newest first.
    pub async fn history(&self, registration_id: Uuid) -> Result<Vec<CheckIn>, sqlx::Error> {
        let timer = QueryTimer::new("check_in_history");
        let result = sqlx::query_as::<_, CheckInEntity>(&format!(
            r#"
            SELECT {CHECK_IN_COLUMNS} FROM check_ins
            WHERE registration_id = $1
            ORDER BY checked_in_at DESC, id
            "#
        ))
        .bind(registration_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result.map(|rows| rows.into_iter().map(Into::into).collect())
    }
}
