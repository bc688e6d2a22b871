//! Expense ledger: ad-hoc trip costs, paid at once or in installments.

use crate::core::currency::{Currency, normalize};
use crate::core::error::ValidationError;
use crate::core::obligation::{
    self, Installment, Obligations, PaymentDraft, PaymentRecord, Progress,
};
use crate::core::rate::ExchangeRateService;
use crate::core::record::{Record, RecordStore, TripScoped};
use crate::core::roster::{ParticipantId, Roster, Session};
use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    Accommodation,
    Transport,
    Food,
    Activities,
    Shopping,
    Health,
    Other,
}

impl Display for ExpenseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ExpenseCategory::Accommodation => "accommodation",
                ExpenseCategory::Transport => "transport",
                ExpenseCategory::Food => "food",
                ExpenseCategory::Activities => "activities",
                ExpenseCategory::Shopping => "shopping",
                ExpenseCategory::Health => "health",
                ExpenseCategory::Other => "other",
            }
        )
    }
}

impl FromStr for ExpenseCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "accommodation" => Ok(ExpenseCategory::Accommodation),
            "transport" => Ok(ExpenseCategory::Transport),
            "food" => Ok(ExpenseCategory::Food),
            "activities" => Ok(ExpenseCategory::Activities),
            "shopping" => Ok(ExpenseCategory::Shopping),
            "health" => Ok(ExpenseCategory::Health),
            "other" => Ok(ExpenseCategory::Other),
            _ => Err(anyhow::anyhow!("Invalid expense category: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    #[serde(default)]
    pub id: String,
    pub trip_id: String,
    pub date: NaiveDate,
    pub description: String,
    pub category: ExpenseCategory,
    pub currency: Currency,
    pub amount: Decimal,
    /// Amount in the reporting currency, locked in at entry time.
    pub amount_usd: Decimal,
    pub installments: u32,
    /// Only set for single payment expenses.
    #[serde(default)]
    pub payer: Option<ParticipantId>,
}

impl Expense {
    pub fn is_single_payment(&self) -> bool {
        self.installments <= 1
    }
}

impl Record for Expense {
    const COLLECTION: &'static str = "expenses";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl TripScoped for Expense {
    fn trip_id(&self) -> &str {
        &self.trip_id
    }

    fn set_trip_id(&mut self, trip_id: String) {
        self.trip_id = trip_id;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentPayment {
    #[serde(default)]
    pub id: String,
    pub expense_id: String,
    pub installment_number: u32,
    pub amount: Decimal,
    pub payer: ParticipantId,
    pub payment_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Record for InstallmentPayment {
    const COLLECTION: &'static str = "installment_payments";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl Installment for InstallmentPayment {
    fn amount(&self) -> Decimal {
        self.amount
    }

    fn payer(&self) -> &ParticipantId {
        &self.payer
    }
}

impl PaymentRecord for InstallmentPayment {
    fn parent_id(&self) -> &str {
        &self.expense_id
    }

    fn from_draft(draft: PaymentDraft) -> Self {
        InstallmentPayment {
            id: String::new(),
            expense_id: draft.parent_id,
            installment_number: draft.installment_number,
            amount: draft.amount,
            payer: draft.payer,
            payment_date: draft.payment_date,
            notes: draft.notes,
        }
    }
}

/// User input for creating or editing an expense.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseDraft {
    pub date: NaiveDate,
    pub description: String,
    pub category: ExpenseCategory,
    pub currency: Currency,
    pub amount: Decimal,
    pub installments: u32,
    pub payer: Option<ParticipantId>,
}

impl ExpenseDraft {
    pub fn validate(&self, roster: &Roster) -> Result<(), ValidationError> {
        if self.description.trim().is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        if self.amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount(self.amount));
        }
        if self.installments == 0 {
            return Err(ValidationError::ZeroInstallments);
        }
        if self.installments == 1 {
            let payer = self.payer.as_ref().ok_or(ValidationError::MissingPayer)?;
            roster.require(payer)?;
        }
        Ok(())
    }

    fn into_expense(self, id: String, trip_id: String, rate: Decimal) -> Expense {
        let amount_usd = match self.currency {
            Currency::Usd => self.amount,
            Currency::Ars => normalize(self.amount, rate),
        };
        let payer = if self.installments > 1 { None } else { self.payer };
        Expense {
            id,
            trip_id,
            date: self.date,
            description: self.description.trim().to_string(),
            category: self.category,
            currency: self.currency,
            amount: self.amount,
            amount_usd,
            installments: self.installments,
            payer,
        }
    }
}

/// An expense joined with its payments and derived progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseView {
    pub expense: Expense,
    pub payments: Vec<InstallmentPayment>,
    pub progress: Progress,
}

impl ExpenseView {
    pub fn new(expense: Expense, mut payments: Vec<InstallmentPayment>, rate: Decimal) -> Self {
        payments.sort_by(|a, b| {
            (a.installment_number, a.payment_date).cmp(&(b.installment_number, b.payment_date))
        });
        let progress = if expense.is_single_payment() {
            single_payment_progress(&expense)
        } else {
            obligation::account(expense.amount, expense.currency, &payments, rate)
        };
        Self {
            expense,
            payments,
            progress,
        }
    }

    /// What each participant contributed, in the expense's own currency.
    ///
    /// Single payments credit the whole amount to the payer. Installment
    /// expenses credit every registered payment to whoever made it.
    pub fn contributions(&self) -> &BTreeMap<ParticipantId, Decimal> {
        &self.progress.paid_by
    }

    /// Same as [`contributions`](Self::contributions), in the reporting
    /// currency.
    pub fn reporting_contributions(&self) -> &BTreeMap<ParticipantId, Decimal> {
        &self.progress.paid_by_reporting
    }
}

fn single_payment_progress(expense: &Expense) -> Progress {
    let mut progress = Progress {
        paid: expense.amount,
        remaining: Decimal::ZERO,
        percent: 100,
        installments_paid: 1,
        ..Progress::default()
    };
    if let Some(payer) = &expense.payer {
        progress.paid_by.insert(payer.clone(), expense.amount);
        progress
            .paid_by_reporting
            .insert(payer.clone(), expense.amount_usd);
    }
    progress
}

pub struct ExpenseLedger {
    obligations: Obligations<Expense, InstallmentPayment>,
    rates: Arc<ExchangeRateService>,
    default_rate: Decimal,
}

impl ExpenseLedger {
    pub fn new(
        expenses: Arc<dyn RecordStore<Expense>>,
        payments: Arc<dyn RecordStore<InstallmentPayment>>,
        rates: Arc<ExchangeRateService>,
        default_rate: Decimal,
    ) -> Self {
        Self {
            obligations: Obligations::new(expenses, payments),
            rates,
            default_rate,
        }
    }

    /// Expenses of the session's trip with computed fields, newest first.
    ///
    /// `rate` converts installment payments into the reporting currency.
    /// A store failure yields an empty list.
    pub async fn list(&self, session: &Session, rate: Decimal) -> Vec<ExpenseView> {
        let joined = match self.obligations.joined(session).await {
            Ok(joined) => joined,
            Err(e) => {
                error!(error = %e, trip_id = %session.trip_id, "Failed to list expenses");
                return Vec::new();
            }
        };
        let mut views: Vec<ExpenseView> = joined
            .into_iter()
            .map(|(expense, payments)| ExpenseView::new(expense, payments, rate))
            .collect();
        views.sort_by(|a, b| {
            (b.expense.date, &b.expense.id).cmp(&(a.expense.date, &a.expense.id))
        });
        debug!(count = views.len(), "Listed expenses");
        views
    }

    async fn rate_for(&self, currency: Currency) -> Decimal {
        match currency {
            Currency::Usd => Decimal::ONE,
            Currency::Ars => self.rates.get_rate(self.default_rate).await,
        }
    }

    pub async fn add(&self, session: &Session, draft: ExpenseDraft) -> Option<Expense> {
        if let Err(e) = draft.validate(&session.roster) {
            warn!(error = %e, "Expense not submitted");
            return None;
        }
        let rate = self.rate_for(draft.currency).await;
        let expense = draft.into_expense(String::new(), session.trip_id.clone(), rate);
        match self.obligations.parents.create(expense).await {
            Ok(expense) => {
                info!(expense_id = %expense.id, amount = %expense.amount, currency = %expense.currency, "Expense added");
                Some(expense)
            }
            Err(e) => {
                error!(error = %e, "Failed to add expense");
                None
            }
        }
    }

    /// Replaces an expense of the session's trip. The normalized amount is
    /// recomputed with the current rate.
    pub async fn edit(&self, session: &Session, id: &str, draft: ExpenseDraft) -> Option<Expense> {
        if let Err(e) = draft.validate(&session.roster) {
            warn!(error = %e, expense_id = id, "Expense edit not submitted");
            return None;
        }
        self.obligations.owned(session, id).await?;
        let rate = self.rate_for(draft.currency).await;
        let expense = draft.into_expense(id.to_string(), session.trip_id.clone(), rate);
        match self.obligations.parents.update(expense).await {
            Ok(expense) => {
                info!(expense_id = %expense.id, "Expense updated");
                Some(expense)
            }
            Err(e) => {
                error!(error = %e, expense_id = id, "Failed to update expense");
                None
            }
        }
    }

    /// Deletes an expense of the session's trip and its installment
    /// payments. Deleting something that is already gone succeeds.
    pub async fn remove(&self, session: &Session, id: &str) -> bool {
        self.obligations.remove(session, id).await
    }

    /// Registers a payment. Cumulative payments may exceed the expense.
    pub async fn add_payment(
        &self,
        session: &Session,
        draft: PaymentDraft,
    ) -> Option<InstallmentPayment> {
        self.obligations.add_payment(session, draft).await
    }

    pub async fn remove_payment(&self, session: &Session, id: &str) -> bool {
        self.obligations.remove_payment(session, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::Cache;
    use crate::core::currency::{CurrencyRateProvider, RateQuote};
    use crate::core::rate::CachedRate;
    use crate::core::record::ChangeEvent;
    use crate::core::roster::Participant;
    use crate::store::memory::{MemoryCache, MemoryRecords};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use tokio::sync::broadcast;

    struct OfflineProvider;

    #[async_trait]
    impl CurrencyRateProvider for OfflineProvider {
        async fn fetch_quote(&self) -> Result<RateQuote> {
            Err(anyhow!("offline"))
        }
    }

    /// A store whose every call fails.
    struct BrokenRecords;

    #[async_trait]
    impl<T: Record> RecordStore<T> for BrokenRecords {
        async fn list(&self) -> Result<Vec<T>> {
            Err(anyhow!("store unavailable"))
        }

        async fn get(&self, _id: &str) -> Result<Option<T>> {
            Err(anyhow!("store unavailable"))
        }

        async fn create(&self, _record: T) -> Result<T> {
            Err(anyhow!("store unavailable"))
        }

        async fn update(&self, _record: T) -> Result<T> {
            Err(anyhow!("store unavailable"))
        }

        async fn delete(&self, _id: &str) -> Result<bool> {
            Err(anyhow!("store unavailable"))
        }

        fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
            broadcast::channel(1).1
        }
    }

    /// Keeps records in memory but refuses to delete them.
    #[derive(Default)]
    struct NoDeletes(MemoryRecords<Expense>);

    #[async_trait]
    impl RecordStore<Expense> for NoDeletes {
        async fn list(&self) -> Result<Vec<Expense>> {
            self.0.list().await
        }

        async fn get(&self, id: &str) -> Result<Option<Expense>> {
            self.0.get(id).await
        }

        async fn create(&self, record: Expense) -> Result<Expense> {
            self.0.create(record).await
        }

        async fn update(&self, record: Expense) -> Result<Expense> {
            self.0.update(record).await
        }

        async fn delete(&self, _id: &str) -> Result<bool> {
            Err(anyhow!("read only"))
        }

        fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
            self.0.subscribe()
        }
    }

    fn session() -> Session {
        let roster = Roster::new(vec![Participant::new("juan", "Juan"), Participant::new("vale", "Vale")]).unwrap();
        Session::new("trip-1", roster)
    }

    fn rates() -> Arc<ExchangeRateService> {
        let cache: Arc<dyn Cache<CachedRate>> = Arc::new(MemoryCache::<CachedRate>::new());
        Arc::new(ExchangeRateService::new(Arc::new(OfflineProvider), cache))
    }

    fn ledger() -> ExpenseLedger {
        ExpenseLedger::new(
            Arc::new(MemoryRecords::<Expense>::new()),
            Arc::new(MemoryRecords::<InstallmentPayment>::new()),
            rates(),
            Decimal::from(1000),
        )
    }

    fn draft(currency: Currency, amount: i64, installments: u32, payer: Option<&str>) -> ExpenseDraft {
        ExpenseDraft {
            date: NaiveDate::from_ymd_opt(2026, 7, 10).unwrap(),
            description: "  Cena en el centro ".to_string(),
            category: ExpenseCategory::Food,
            currency,
            amount: Decimal::from(amount),
            installments,
            payer: payer.map(ParticipantId::from),
        }
    }

    fn payment(expense_id: &str, n: u32, amount: i64, payer: &str) -> PaymentDraft {
        PaymentDraft {
            parent_id: expense_id.to_string(),
            installment_number: n,
            amount: Decimal::from(amount),
            payer: payer.into(),
            payment_date: NaiveDate::from_ymd_opt(2026, 8, n).unwrap(),
            notes: None,
        }
    }

    #[test]
    fn test_draft_validation() {
        let roster = session().roster;
        assert!(draft(Currency::Usd, 10, 1, Some("juan")).validate(&roster).is_ok());
        assert!(draft(Currency::Usd, 10, 3, None).validate(&roster).is_ok());
        assert_eq!(
            draft(Currency::Usd, 10, 1, None).validate(&roster),
            Err(ValidationError::MissingPayer)
        );
        assert_eq!(
            draft(Currency::Usd, 0, 1, Some("juan")).validate(&roster),
            Err(ValidationError::NonPositiveAmount(Decimal::ZERO))
        );
        assert_eq!(
            draft(Currency::Usd, 10, 0, Some("juan")).validate(&roster),
            Err(ValidationError::ZeroInstallments)
        );
        assert_eq!(
            draft(Currency::Usd, 10, 1, Some("pedro")).validate(&roster),
            Err(ValidationError::UnknownParticipant("pedro".into()))
        );

        let mut blank = draft(Currency::Usd, 10, 1, Some("juan"));
        blank.description = "   ".to_string();
        assert_eq!(blank.validate(&roster), Err(ValidationError::EmptyDescription));
    }

    #[tokio::test]
    async fn test_add_normalizes_ars_with_fallback_rate() {
        let ledger = ledger();
        let session = session();

        let ars = ledger.add(&session, draft(Currency::Ars, 5000, 1, Some("juan"))).await.unwrap();
        assert_eq!(ars.amount_usd, Decimal::from(5));
        assert_eq!(ars.description, "Cena en el centro");
        assert_eq!(ars.trip_id, "trip-1");

        let usd = ledger.add(&session, draft(Currency::Usd, 42, 1, Some("vale"))).await.unwrap();
        assert_eq!(usd.amount_usd, Decimal::from(42));
    }

    #[tokio::test]
    async fn test_manual_rate_is_used_for_normalization() {
        let ledger = ledger();
        assert!(ledger.rates.set_manual_rate(Decimal::from(1250)).await);
        let expense = ledger
            .add(&session(), draft(Currency::Ars, 5000, 1, Some("juan")))
            .await
            .unwrap();
        assert_eq!(expense.amount_usd, Decimal::from(4));
    }

    #[tokio::test]
    async fn test_installments_clear_the_payer() {
        let ledger = ledger();
        let expense = ledger
            .add(&session(), draft(Currency::Usd, 300, 3, Some("juan")))
            .await
            .unwrap();
        assert_eq!(expense.payer, None);
        assert!(!expense.is_single_payment());
    }

    #[tokio::test]
    async fn test_invalid_draft_is_not_submitted() {
        let ledger = ledger();
        let session = session();
        assert!(ledger.add(&session, draft(Currency::Usd, -1, 1, Some("juan"))).await.is_none());
        assert!(ledger.list(&session, Decimal::ONE).await.is_empty());
    }

    #[tokio::test]
    async fn test_installment_progress() {
        let ledger = ledger();
        let session = session();
        let expense = ledger.add(&session, draft(Currency::Usd, 300, 3, None)).await.unwrap();
        ledger.add_payment(&session, payment(&expense.id, 2, 100, "vale")).await.unwrap();
        ledger.add_payment(&session, payment(&expense.id, 1, 100, "juan")).await.unwrap();

        let views = ledger.list(&session, Decimal::from(1000)).await;
        let view = &views[0];
        assert_eq!(view.payments[0].installment_number, 1);
        assert_eq!(view.progress.paid, Decimal::from(200));
        assert_eq!(view.progress.remaining, Decimal::from(100));
        assert_eq!(view.progress.percent, 67);
        assert_eq!(view.progress.installments_paid, 2);
        assert_eq!(view.contributions()[&ParticipantId::from("juan")], Decimal::from(100));
        assert_eq!(view.contributions()[&ParticipantId::from("vale")], Decimal::from(100));
    }

    #[tokio::test]
    async fn test_single_payment_is_fully_paid() {
        let ledger = ledger();
        let session = session();
        ledger.add(&session, draft(Currency::Ars, 12_000, 1, Some("vale"))).await.unwrap();

        let views = ledger.list(&session, Decimal::from(1000)).await;
        let view = &views[0];
        assert_eq!(view.progress.percent, 100);
        assert_eq!(view.progress.remaining, Decimal::ZERO);
        assert_eq!(view.contributions()[&ParticipantId::from("vale")], Decimal::from(12_000));
        assert_eq!(view.reporting_contributions()[&ParticipantId::from("vale")], Decimal::from(12));
        assert!(!view.contributions().contains_key(&ParticipantId::from("juan")));
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_scoped() {
        let ledger = ledger();
        let session = session();
        let mut older = draft(Currency::Usd, 10, 1, Some("juan"));
        older.date = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
        ledger.add(&session, older).await.unwrap();
        ledger.add(&session, draft(Currency::Usd, 20, 1, Some("juan"))).await.unwrap();

        let other = Session::new("trip-2", session.roster.clone());
        ledger.add(&other, draft(Currency::Usd, 99, 1, Some("juan"))).await.unwrap();

        let amounts: Vec<_> = ledger
            .list(&session, Decimal::ONE)
            .await
            .into_iter()
            .map(|v| v.expense.amount)
            .collect();
        assert_eq!(amounts, vec![Decimal::from(20), Decimal::from(10)]);
    }

    #[tokio::test]
    async fn test_edit_recomputes_and_respects_trip() {
        let ledger = ledger();
        let session = session();
        let expense = ledger.add(&session, draft(Currency::Usd, 10, 1, Some("juan"))).await.unwrap();

        let edited = ledger
            .edit(&session, &expense.id, draft(Currency::Ars, 3000, 1, Some("vale")))
            .await
            .unwrap();
        assert_eq!(edited.id, expense.id);
        assert_eq!(edited.amount_usd, Decimal::from(3));

        let other = Session::new("trip-2", session.roster.clone());
        assert!(ledger.edit(&other, &expense.id, draft(Currency::Usd, 1, 1, Some("juan"))).await.is_none());
        assert!(ledger.edit(&session, "missing", draft(Currency::Usd, 1, 1, Some("juan"))).await.is_none());
    }

    #[tokio::test]
    async fn test_remove_cascades_and_is_idempotent() {
        let ledger = ledger();
        let session = session();
        let expense = ledger.add(&session, draft(Currency::Usd, 300, 3, None)).await.unwrap();
        let paid = ledger.add_payment(&session, payment(&expense.id, 1, 100, "juan")).await.unwrap();

        assert!(ledger.remove(&session, &expense.id).await);
        assert!(ledger.obligations.payments.get(&paid.id).await.unwrap().is_none());
        assert!(ledger.remove(&session, &expense.id).await);
    }

    #[tokio::test]
    async fn test_other_trips_cannot_remove_records() {
        let ledger = ledger();
        let session = session();
        let other = Session::new("trip-2", session.roster.clone());
        let expense = ledger.add(&session, draft(Currency::Usd, 300, 3, None)).await.unwrap();
        let paid = ledger.add_payment(&session, payment(&expense.id, 1, 100, "juan")).await.unwrap();

        assert!(!ledger.remove_payment(&other, &paid.id).await);
        assert!(!ledger.remove(&other, &expense.id).await);

        let views = ledger.list(&session, Decimal::ONE).await;
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].payments, vec![paid]);
        // Unknown ids are still removed without complaint
        assert!(ledger.remove(&other, "missing").await);
        assert!(ledger.remove_payment(&other, "missing").await);
    }

    #[tokio::test]
    async fn test_failed_parent_delete_keeps_payments() {
        let payments = Arc::new(MemoryRecords::<InstallmentPayment>::new());
        let ledger = ExpenseLedger::new(Arc::new(NoDeletes::default()), payments.clone(), rates(), Decimal::from(1000));
        let session = session();
        let expense = ledger.add(&session, draft(Currency::Usd, 300, 3, None)).await.unwrap();
        let paid = ledger.add_payment(&session, payment(&expense.id, 1, 100, "juan")).await.unwrap();

        assert!(!ledger.remove(&session, &expense.id).await);
        assert!(payments.get(&paid.id).await.unwrap().is_some());
        assert_eq!(ledger.list(&session, Decimal::ONE).await[0].progress.paid, Decimal::from(100));
    }

    #[tokio::test]
    async fn test_removing_a_payment_keeps_the_expense() {
        let ledger = ledger();
        let session = session();
        let expense = ledger.add(&session, draft(Currency::Usd, 300, 3, None)).await.unwrap();
        let paid = ledger.add_payment(&session, payment(&expense.id, 1, 100, "juan")).await.unwrap();

        assert!(ledger.remove_payment(&session, &paid.id).await);
        let views = ledger.list(&session, Decimal::ONE).await;
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].progress.paid, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_payment_rejected_for_unknown_expense_or_payer() {
        let ledger = ledger();
        let session = session();
        let expense = ledger.add(&session, draft(Currency::Usd, 300, 3, None)).await.unwrap();
        assert!(ledger.add_payment(&session, payment("missing", 1, 100, "juan")).await.is_none());
        assert!(ledger.add_payment(&session, payment(&expense.id, 1, 0, "juan")).await.is_none());
        assert!(ledger.add_payment(&session, payment(&expense.id, 1, 10, "pedro")).await.is_none());
    }

    #[tokio::test]
    async fn test_store_failures_surface_as_none_or_false() {
        let ledger = ExpenseLedger::new(Arc::new(BrokenRecords), Arc::new(BrokenRecords), rates(), Decimal::from(1000));
        let session = session();

        assert!(ledger.list(&session, Decimal::ONE).await.is_empty());
        assert!(ledger.add(&session, draft(Currency::Usd, 10, 1, Some("juan"))).await.is_none());
        assert!(!ledger.remove(&session, "e1").await);
        assert!(!ledger.remove_payment(&session, "p1").await);
    }
}
