//! Registration repository: admission, lookup, search and cancellation.

use domain::errors::RegistrationError;
use domain::models::check_in::CANCELLATION_ACTOR;
use domain::models::ticket::{format_ticket_number, next_sequence};
use domain::models::{
    Event, IdentityConflicts, IdentityField, IdentityPolicy, IdentityScope, NewRegistration,
    Registration,
};
use domain::services::evaluate_admission;
use shared::crypto::advisory_lock_key;
use shared::validation::normalize_phone;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::db::unique_violation_constraint;
use crate::entities::{IdentityConflictEntity, RegistrationEntity};
use crate::metrics::{LockKind, LockTimer, QueryTimer};
use crate::repositories::event::{count_active_registrations, lock_event};

const REGISTRATION_COLUMNS: &str = "id, event_id, full_name, national_id, phone, email, ticket_number, ticket_sequence, status, created_at, cancelled_at";

const TICKET_NUMBER_CONSTRAINT: &str = "registrations_ticket_number_key";
const NATIONAL_ID_CONSTRAINT: &str = "registrations_active_event_national_id_key";
const EMAIL_CONSTRAINT: &str = "registrations_active_event_email_key";
const PHONE_CONSTRAINT: &str = "registrations_active_event_phone_key";

/// Locks a registration row for the rest of the transaction.
pub(crate) async fn lock_registration(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<RegistrationEntity>, sqlx::Error> {
    let wait = LockTimer::start(LockKind::RegistrationRow);
    let row = sqlx::query_as::<_, RegistrationEntity>(&format!(
        "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    wait.acquired();
    Ok(row)
}

/// LIKE pattern over the canonical phone form, for queries that look like a
/// phone number (digits with `+`, `-` or space separators only).
fn canonical_phone_pattern(query: &str) -> Option<String> {
    let looks_like_phone = query
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' '));
    let phone = normalize_phone(query);
    let digits = phone.trim_start_matches('+');
    (looks_like_phone && digits.len() >= 2).then(|| format!("%{}%", escape_like(digits)))
}

/// Maps a failed registration insert to the invariant it tripped.
fn classify_insert_error(err: sqlx::Error) -> RegistrationError {
    let classified = match unique_violation_constraint(&err) {
        Some(TICKET_NUMBER_CONSTRAINT) => Some(RegistrationError::TicketGenerationConflict),
        Some(NATIONAL_ID_CONSTRAINT) => Some(IdentityField::NationalId.into()),
        Some(EMAIL_CONSTRAINT) => Some(IdentityField::Email.into()),
        Some(PHONE_CONSTRAINT) => Some(IdentityField::Phone.into()),
        _ => None,
    };
    classified.unwrap_or_else(|| RegistrationError::Storage(err))
}

/// Escapes LIKE metacharacters so user input matches literally.
pub(crate) fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// A committed admission with the event it was admitted into.
#[derive(Debug, Clone)]
pub struct AdmittedRegistration {
    pub event: Event,
    pub registration: Registration,
}

/// Result of a cancellation, including how many check-ins were voided.
#[derive(Debug, Clone)]
pub struct CancelledRegistration {
    pub registration: Registration,
    pub check_ins_voided: u64,
}

/// Repository for registration-related database operations.
#[derive(Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
    policy: IdentityPolicy,
}

impl RegistrationRepository {
    /// Creates a new RegistrationRepository enforcing the given identity policy.
    pub fn new(pool: PgPool, policy: IdentityPolicy) -> Self {
        Self { pool, policy }
    }

    /// Admit a candidate into its event, issuing the next ticket number.
    ///
    /// Runs as a single transaction:
    /// 1. lock the event row (serializes admissions for the event)
    /// 2. take advisory locks for globally-scoped identity values
    /// 3. look up identity conflicts among active registrations
    /// 4. count active registrations and decide admission
    /// 5. derive the ticket sequence from all registrations of the event
    /// 6. insert
    ///
    /// A unique violation on insert is classified by constraint name; a
    /// ticket collision surfaces as `TicketGenerationConflict` so the caller
    /// can retry with a fresh read.
    pub async fn admit(
        &self,
        candidate: &NewRegistration,
    ) -> Result<AdmittedRegistration, RegistrationError> {
        let timer = QueryTimer::new("admit_registration");
        let mut tx = self.pool.begin().await?;

        let event: Event = lock_event(&mut *tx, candidate.event_id)
            .await?
            .ok_or(RegistrationError::EventNotFound)?
            .into();

        let keys = candidate.identity_keys();
        for field in self.policy.global_fields() {
            let wait = LockTimer::start(LockKind::IdentityKey);
            sqlx::query("SELECT pg_advisory_xact_lock($1)")
                .bind(advisory_lock_key(field.as_str(), keys.value(field)))
                .execute(&mut *tx)
                .await?;
            wait.acquired();
        }

        let conflicts: IdentityConflicts = sqlx::query_as::<_, IdentityConflictEntity>(
            r#"
            SELECT
                EXISTS (SELECT 1 FROM registrations
                        WHERE status = 'active' AND national_id = $2
                        AND ($5 OR event_id = $1)) AS national_id,
                EXISTS (SELECT 1 FROM registrations
                        WHERE status = 'active' AND email = $3
                        AND ($6 OR event_id = $1)) AS email,
                EXISTS (SELECT 1 FROM registrations
                        WHERE status = 'active' AND phone = $4
                        AND ($7 OR event_id = $1)) AS phone
            "#,
        )
        .bind(event.id)
        .bind(&keys.national_id)
        .bind(&keys.email)
        .bind(&keys.phone)
        .bind(self.policy.national_id == IdentityScope::Global)
        .bind(self.policy.email == IdentityScope::Global)
        .bind(self.policy.phone == IdentityScope::Global)
        .fetch_one(&mut *tx)
        .await?
        .into();

        let active_count = count_active_registrations(&mut *tx, event.id).await?;
        evaluate_admission(&event, active_count, &conflicts)?;

        // Highest issued sequence, not a row count, so gaps never reissue a number
        let highest: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(ticket_sequence), 0)::BIGINT FROM registrations WHERE event_id = $1",
        )
        .bind(event.id)
        .fetch_one(&mut *tx)
        .await?;
        let sequence = next_sequence(highest);
        let ticket_sequence = i32::try_from(sequence)
            .map_err(|_| RegistrationError::TicketGenerationConflict)?;
        let ticket_number = format_ticket_number(&event.code, sequence);

        let entity = sqlx::query_as::<_, RegistrationEntity>(&format!(
            r#"
            INSERT INTO registrations
                (event_id, full_name, national_id, phone, email, ticket_number, ticket_sequence)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {REGISTRATION_COLUMNS}
            "#
        ))
        .bind(event.id)
        .bind(&candidate.full_name)
        .bind(&keys.national_id)
        .bind(&keys.phone)
        .bind(&keys.email)
        .bind(&ticket_number)
        .bind(ticket_sequence)
        .fetch_one(&mut *tx)
        .await
        .map_err(classify_insert_error)?;

        tx.commit().await?;
        timer.record();
        Ok(AdmittedRegistration {
            event,
            registration: entity.into(),
        })
    }

    /// Find a registration by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Registration>, sqlx::Error> {
        let timer = QueryTimer::new("find_registration_by_id");
        let result = sqlx::query_as::<_, RegistrationEntity>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result.map(|entity| entity.map(Into::into))
    }

    /// Find a registration by its ticket number.
    pub async fn find_by_ticket(
        &self,
        ticket_number: &str,
    ) -> Result<Option<Registration>, sqlx::Error> {
        let timer = QueryTimer::new("find_registration_by_ticket");
        let result = sqlx::query_as::<_, RegistrationEntity>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE ticket_number = $1"
        ))
        .bind(ticket_number)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result.map(|entity| entity.map(Into::into))
    }

    /// Free-text search used at the check-in desk.
    ///
    /// Matches the ticket number and email exactly (case-insensitive), and the
    /// full name, phone and national ID as substrings. Phone matching uses the
    /// canonical digits, so `0812-3456` finds `081234567890`. Active
    /// registrations sort first, newest first within each status. A blank
    /// query matches nothing.
    pub async fn search(
        &self,
        query: &str,
        event_id: Option<Uuid>,
        active_only: bool,
        limit: i64,
    ) -> Result<Vec<Registration>, sqlx::Error> {
        let timer = QueryTimer::new("search_registrations");
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let pattern = format!("%{}%", escape_like(query));
        let phone_pattern = canonical_phone_pattern(query);
        let result = sqlx::query_as::<_, RegistrationEntity>(&format!(
            r#"
            SELECT {REGISTRATION_COLUMNS} FROM registrations
            WHERE ($2::uuid IS NULL OR event_id = $2)
              AND (NOT $3 OR status = 'active')
              AND (
                    ticket_number = UPPER($1)
                 OR email = LOWER($1)
                 OR full_name ILIKE $4 ESCAPE '\'
                 OR phone LIKE $4 ESCAPE '\'
                 OR phone LIKE $6 ESCAPE '\'
                 OR national_id LIKE $4 ESCAPE '\'
              )
            ORDER BY (status = 'active') DESC, created_at DESC
            LIMIT $5
            "#
        ))
        .bind(query)
        .bind(event_id)
        .bind(active_only)
        .bind(&pattern)
        .bind(limit)
        .bind(phone_pattern)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result.map(|rows| rows.into_iter().map(Into::into).collect())
    }

    /// Cancel an active registration.
    ///
    /// Frees the capacity slot and identity keys, and voids the effective
    /// check-in in the same transaction.
    pub async fn cancel(&self, id: Uuid) -> Result<CancelledRegistration, RegistrationError> {
        let timer = QueryTimer::new("cancel_registration");
        let mut tx = self.pool.begin().await?;

        let current: Registration = lock_registration(&mut *tx, id)
            .await?
            .ok_or(RegistrationError::NotFound)?
            .into();
        current.status.cancel()?;

        let entity = sqlx::query_as::<_, RegistrationEntity>(&format!(
            r#"
            UPDATE registrations
            SET status = 'cancelled', cancelled_at = NOW()
            WHERE id = $1
            RETURNING {REGISTRATION_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let check_ins_voided = sqlx::query(
            r#"
            UPDATE check_ins
            SET status = 'cancelled', undone_at = NOW(), undone_by = $2
            WHERE registration_id = $1 AND status = 'checked_in'
            "#,
        )
        .bind(id)
        .bind(CANCELLATION_ACTOR)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;
        timer.record();
        Ok(CancelledRegistration {
            registration: entity.into(),
            check_ins_voided,
        })
    }
}
