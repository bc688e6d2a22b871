//! Validation errors raised before any record reaches the store.

use crate::core::roster::ParticipantId;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Description must not be empty")]
    EmptyDescription,
    #[error("Name must not be empty")]
    EmptyName,
    #[error("Title must not be empty")]
    EmptyTitle,
    #[error("Amount must be greater than zero (got {0})")]
    NonPositiveAmount(Decimal),
    #[error("Exchange rate must be greater than zero (got {0})")]
    NonPositiveRate(Decimal),
    #[error("Installment count must be at least 1")]
    ZeroInstallments,
    #[error("Installment number must be at least 1")]
    ZeroInstallmentNumber,
    #[error("A single payment expense needs a payer")]
    MissingPayer,
    #[error("Participant '{0}' is not part of this trip")]
    UnknownParticipant(ParticipantId),
    #[error("A trip needs at least one participant")]
    EmptyRoster,
    #[error("Participant '{0}' appears more than once")]
    DuplicateParticipant(ParticipantId),
    #[error("Trip end date is before its start date")]
    InvalidDateRange,
}
