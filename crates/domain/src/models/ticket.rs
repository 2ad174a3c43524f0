//! Ticket number format: `BI<event-code><sequence>T`.
//!
//! The sequence is the 1-based ordinal of the registration within its event's
//! history (cancelled registrations keep their ordinal). It is zero-padded to
//! three digits; ordinals above 999 keep their natural width rather than
//! wrapping, so `BIABC1000T` follows `BIABC999T`.

use std::str::FromStr;

use thiserror::Error;

/// Leading marker of every ticket number.
pub const TICKET_PREFIX: &str = "BI";

/// Trailing marker of every ticket number.
pub const TICKET_SUFFIX: &str = "T";

/// Minimum number of digits in the sequence part.
pub const SEQUENCE_WIDTH: usize = 3;

/// Length of the event code embedded in a ticket number.
const EVENT_CODE_LENGTH: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TicketNumberError {
    #[error("Ticket number must look like BIXXX001T")]
    Malformed,

    #[error("Ticket sequence must be positive")]
    ZeroSequence,
}

/// Builds the ticket number for the given event code and sequence.
pub fn format_ticket_number(event_code: &str, sequence: u32) -> String {
    format!(
        "{}{}{:0width$}{}",
        TICKET_PREFIX,
        event_code,
        sequence,
        TICKET_SUFFIX,
        width = SEQUENCE_WIDTH
    )
}

/// Next sequence given the highest sequence the event has issued.
pub fn next_sequence(highest_issued: i64) -> u32 {
    u32::try_from(highest_issued.max(0))
        .unwrap_or(u32::MAX - 1)
        .saturating_add(1)
}

/// Splits a ticket number into its event code and sequence.
pub fn parse_ticket_number(ticket_number: &str) -> Result<TicketNumber, TicketNumberError> {
    ticket_number.parse()
}

/// A parsed ticket number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketNumber {
    pub event_code: String,
    pub sequence: u32,
}

impl TicketNumber {
    pub fn new(event_code: impl Into<String>, sequence: u32) -> Self {
        Self {
            event_code: event_code.into(),
            sequence,
        }
    }
}

impl std::fmt::Display for TicketNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_ticket_number(&self.event_code, self.sequence))
    }
}

impl FromStr for TicketNumber {
    type Err = TicketNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .trim()
            .strip_prefix(TICKET_PREFIX)
            .and_then(|rest| rest.strip_suffix(TICKET_SUFFIX))
            .ok_or(TicketNumberError::Malformed)?;

        if !body.is_ascii() || body.len() < EVENT_CODE_LENGTH + SEQUENCE_WIDTH {
            return Err(TicketNumberError::Malformed);
        }

        let (code, digits) = body.split_at(EVENT_CODE_LENGTH);
        if !code.bytes().all(|b| b.is_ascii_uppercase())
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(TicketNumberError::Malformed);
        }

        // Sequences above 999 never carry leading zeros.
        if digits.len() > SEQUENCE_WIDTH && digits.starts_with('0') {
            return Err(TicketNumberError::Malformed);
        }

        let sequence: u32 = digits.parse().map_err(|_| TicketNumberError::Malformed)?;
        if sequence == 0 {
            return Err(TicketNumberError::ZeroSequence);
        }

        Ok(TicketNumber::new(code, sequence))
    }
}
