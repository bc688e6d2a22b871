//! Installment accounting shared by expenses paid in installments and
//! payment plans: an obligation is a total in some currency plus the
//! payments registered against it.

use crate::core::currency::{Currency, convert};
use crate::core::error::ValidationError;
use crate::core::record::{Record, RecordStore, TripScoped};
use crate::core::roster::{ParticipantId, Roster, Session};
use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{error, info, warn};

/// One payment toward an obligation, in the obligation's currency.
pub trait Installment {
    fn amount(&self) -> Decimal;
    fn payer(&self) -> &ParticipantId;
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Progress {
    pub paid: Decimal,
    /// Never negative: overpayment is absorbed.
    pub remaining: Decimal,
    /// Whole percent, capped at 100.
    pub percent: u32,
    pub installments_paid: usize,
    /// Paid amounts per participant in the obligation's own currency.
    pub paid_by: BTreeMap<ParticipantId, Decimal>,
    /// Paid amounts per participant in the reporting currency.
    pub paid_by_reporting: BTreeMap<ParticipantId, Decimal>,
}

/// `round(100 * part / whole)`, uncapped. Zero when there is no whole.
pub fn percent_of(part: Decimal, whole: Decimal) -> u32 {
    if whole <= Decimal::ZERO || part <= Decimal::ZERO {
        return 0;
    }
    part.checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.checked_div(whole))
        .and_then(|ratio| {
            ratio
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_u32()
        })
        .unwrap_or(u32::MAX)
}

/// Accounts `payments` against `total`.
///
/// Each payment is converted into the reporting currency on its own, so a
/// long-running plan tolerates a drifting rate.
pub fn account<'a, P>(
    total: Decimal,
    currency: Currency,
    payments: impl IntoIterator<Item = &'a P>,
    rate: Decimal,
) -> Progress
where
    P: Installment + 'a,
{
    let mut progress = Progress::default();
    for payment in payments {
        let amount = payment.amount();
        progress.paid += amount;
        progress.installments_paid += 1;
        *progress
            .paid_by
            .entry(payment.payer().clone())
            .or_default() += amount;
        *progress
            .paid_by_reporting
            .entry(payment.payer().clone())
            .or_default() += convert(amount, currency, Currency::REPORTING, rate);
    }
    progress.remaining = (total - progress.paid).max(Decimal::ZERO);
    progress.percent = percent_of(progress.paid, total).min(100);
    progress
}

/// Input for registering a payment against an expense or a plan.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentDraft {
    pub parent_id: String,
    pub installment_number: u32,
    pub amount: Decimal,
    pub payer: ParticipantId,
    pub payment_date: NaiveDate,
    pub notes: Option<String>,
}

impl PaymentDraft {
    pub fn validate(&self, roster: &Roster) -> Result<(), ValidationError> {
        if self.amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount(self.amount));
        }
        if self.installment_number == 0 {
            return Err(ValidationError::ZeroInstallmentNumber);
        }
        roster.require(&self.payer)
    }
}

/// A stored payment registered against an expense or a plan.
pub trait PaymentRecord: Record + Installment {
    fn parent_id(&self) -> &str;
    fn from_draft(draft: PaymentDraft) -> Self;
}

/// Parent records of one kind and the payments registered against them.
///
/// Every call is scoped to the session's trip: records of other trips are
/// treated as missing.
pub struct Obligations<O: TripScoped, P: PaymentRecord> {
    pub(crate) parents: Arc<dyn RecordStore<O>>,
    pub(crate) payments: Arc<dyn RecordStore<P>>,
}

impl<O: TripScoped, P: PaymentRecord> Obligations<O, P> {
    pub fn new(parents: Arc<dyn RecordStore<O>>, payments: Arc<dyn RecordStore<P>>) -> Self {
        Self { parents, payments }
    }

    /// Parents of the session's trip, each with its payments.
    pub async fn joined(&self, session: &Session) -> Result<Vec<(O, Vec<P>)>> {
        let (parents, payments) = futures::try_join!(self.parents.list(), self.payments.list())?;

        let mut by_parent: HashMap<String, Vec<P>> = HashMap::new();
        for payment in payments {
            by_parent
                .entry(payment.parent_id().to_string())
                .or_default()
                .push(payment);
        }
        Ok(parents
            .into_iter()
            .filter(|p| p.trip_id() == session.trip_id)
            .map(|p| {
                let payments = by_parent.remove(p.id()).unwrap_or_default();
                (p, payments)
            })
            .collect())
    }

    /// The parent record, if it exists and belongs to the session's trip.
    pub async fn owned(&self, session: &Session, id: &str) -> Option<O> {
        match self.parents.get(id).await {
            Ok(Some(parent)) if parent.trip_id() == session.trip_id => Some(parent),
            Ok(_) => {
                warn!(collection = O::COLLECTION, id, "Not found in this trip");
                None
            }
            Err(e) => {
                error!(error = %e, collection = O::COLLECTION, id, "Failed to load record");
                None
            }
        }
    }

    /// Deletes a parent, then its payments. Already gone counts as removed.
    /// A parent owned by another trip is left alone.
    pub async fn remove(&self, session: &Session, id: &str) -> bool {
        let existed = match self.parents.get(id).await {
            Ok(Some(parent)) if parent.trip_id() != session.trip_id => {
                warn!(collection = O::COLLECTION, id, "Not found in this trip");
                return false;
            }
            Ok(found) => found.is_some(),
            Err(e) => {
                error!(error = %e, collection = O::COLLECTION, id, "Failed to load record");
                return false;
            }
        };
        let payments = match self.payments.list().await {
            Ok(payments) => payments,
            Err(e) => {
                error!(error = %e, collection = P::COLLECTION, parent_id = id, "Failed to load payments");
                return false;
            }
        };
        if existed {
            if let Err(e) = self.parents.delete(id).await {
                error!(error = %e, collection = O::COLLECTION, id, "Failed to delete record");
                return false;
            }
        }
        // Payments of a parent that is already gone are swept as well
        for payment in payments.iter().filter(|p| p.parent_id() == id) {
            if let Err(e) = self.payments.delete(payment.id()).await {
                error!(
                    error = %e,
                    collection = P::COLLECTION,
                    payment_id = payment.id(),
                    parent_id = id,
                    "Failed to delete payment, left orphaned"
                );
                return false;
            }
        }
        info!(collection = O::COLLECTION, id, existed, "Removed");
        true
    }

    /// Registers a payment against a parent of the session's trip.
    /// Cumulative payments may exceed the total.
    pub async fn add_payment(&self, session: &Session, draft: PaymentDraft) -> Option<P> {
        if let Err(e) = draft.validate(&session.roster) {
            warn!(error = %e, collection = P::COLLECTION, "Payment not submitted");
            return None;
        }
        self.owned(session, &draft.parent_id).await?;
        match self.payments.create(P::from_draft(draft)).await {
            Ok(payment) => {
                info!(
                    collection = P::COLLECTION,
                    payment_id = payment.id(),
                    parent_id = payment.parent_id(),
                    amount = %payment.amount(),
                    "Payment added"
                );
                Some(payment)
            }
            Err(e) => {
                error!(error = %e, collection = P::COLLECTION, "Failed to add payment");
                None
            }
        }
    }

    /// Deletes one payment. Already gone counts as removed; a payment whose
    /// parent belongs to another trip is left alone.
    pub async fn remove_payment(&self, session: &Session, id: &str) -> bool {
        let payment = match self.payments.get(id).await {
            Ok(Some(payment)) => payment,
            Ok(None) => {
                info!(collection = P::COLLECTION, payment_id = id, existed = false, "Payment removed");
                return true;
            }
            Err(e) => {
                error!(error = %e, collection = P::COLLECTION, payment_id = id, "Failed to load payment");
                return false;
            }
        };
        match self.parents.get(payment.parent_id()).await {
            Ok(Some(parent)) if parent.trip_id() != session.trip_id => {
                warn!(collection = P::COLLECTION, payment_id = id, "Payment not found in this trip");
                return false;
            }
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, collection = O::COLLECTION, id = payment.parent_id(), "Failed to load record");
                return false;
            }
        }
        match self.payments.delete(id).await {
            Ok(existed) => {
                info!(collection = P::COLLECTION, payment_id = id, existed, "Payment removed");
                true
            }
            Err(e) => {
                error!(error = %e, collection = P::COLLECTION, payment_id = id, "Failed to delete payment");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::roster::Participant;

    struct Paid(Decimal, ParticipantId);

    impl Installment for Paid {
        fn amount(&self) -> Decimal {
            self.0
        }

        fn payer(&self) -> &ParticipantId {
            &self.1
        }
    }

    fn paid(amount: i64, payer: &str) -> Paid {
        Paid(Decimal::from(amount), payer.into())
    }

    #[test]
    fn test_partial_progress() {
        let payments = [paid(100, "juan"), paid(100, "vale")];
        let progress = account(Decimal::from(300), Currency::Usd, &payments, Decimal::from(1000));
        assert_eq!(progress.paid, Decimal::from(200));
        assert_eq!(progress.remaining, Decimal::from(100));
        assert_eq!(progress.percent, 67);
        assert_eq!(progress.installments_paid, 2);
        assert_eq!(progress.paid_by[&ParticipantId::from("juan")], Decimal::from(100));
        assert_eq!(progress.paid_by[&ParticipantId::from("vale")], Decimal::from(100));
    }

    #[test]
    fn test_overpayment_is_clamped() {
        let payments = [paid(250, "juan"), paid(100, "juan")];
        let progress = account(Decimal::from(300), Currency::Usd, &payments, Decimal::ZERO);
        assert_eq!(progress.paid, Decimal::from(350));
        assert_eq!(progress.remaining, Decimal::ZERO);
        assert_eq!(progress.percent, 100);
    }

    #[test]
    fn test_no_payments() {
        let payments: [Paid; 0] = [];
        let progress = account(Decimal::from(300), Currency::Usd, &payments, Decimal::ONE);
        assert_eq!(progress.paid, Decimal::ZERO);
        assert_eq!(progress.remaining, Decimal::from(300));
        assert_eq!(progress.percent, 0);
        assert!(progress.paid_by.is_empty());
    }

    #[test]
    fn test_reporting_conversion_is_per_payment() {
        let payments = [paid(1500, "juan"), paid(1500, "juan")];
        let progress = account(Decimal::from(9000), Currency::Ars, &payments, Decimal::from(1000));
        assert_eq!(progress.paid_by[&ParticipantId::from("juan")], Decimal::from(3000));
        assert_eq!(progress.paid_by_reporting[&ParticipantId::from("juan")], Decimal::from(3));
        assert_eq!(progress.percent, 33);
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(Decimal::from(1), Decimal::from(2)), 50);
        assert_eq!(percent_of(Decimal::from(1), Decimal::from(200)), 1);
        assert_eq!(percent_of(Decimal::from(3), Decimal::from(2)), 150);
        assert_eq!(percent_of(Decimal::from(3), Decimal::ZERO), 0);
        assert_eq!(percent_of(Decimal::MAX, Decimal::ONE), u32::MAX);
    }

    #[test]
    fn test_payment_draft_validation() {
        let roster = Roster::new(vec![Participant::new("juan", "Juan")]).unwrap();
        let mut draft = PaymentDraft {
            parent_id: "e1".to_string(),
            installment_number: 1,
            amount: Decimal::from(10),
            payer: "juan".into(),
            payment_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            notes: None,
        };
        assert!(draft.validate(&roster).is_ok());

        draft.amount = Decimal::ZERO;
        assert_eq!(
            draft.validate(&roster),
            Err(ValidationError::NonPositiveAmount(Decimal::ZERO))
        );

        draft.amount = Decimal::from(10);
        draft.payer = "vale".into();
        assert_eq!(
            draft.validate(&roster),
            Err(ValidationError::UnknownParticipant("vale".into()))
        );
    }
}
