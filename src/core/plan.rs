//! Payment plans: prepaid commitments (flights, packages, insurance) that
//! are paid off installment by installment and always accounted as the sum
//! of their payments.

use crate::core::currency::{Currency, convert};
use crate::core::error::ValidationError;
use crate::core::obligation::{
    self, Installment, Obligations, PaymentDraft, PaymentRecord, Progress, percent_of,
};
use crate::core::record::{Record, RecordStore, TripScoped};
use crate::core::roster::{ParticipantId, Session};
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
pub enum PlanCategory {
    Flights,
    Accommodation,
    Package,
    Insurance,
    Tours,
    Other,
}

impl Display for PlanCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                PlanCategory::Flights => "flights",
                PlanCategory::Accommodation => "accommodation",
                PlanCategory::Package => "package",
                PlanCategory::Insurance => "insurance",
                PlanCategory::Tours => "tours",
                PlanCategory::Other => "other",
            }
        )
    }
}

impl FromStr for PlanCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "flights" => Ok(PlanCategory::Flights),
            "accommodation" => Ok(PlanCategory::Accommodation),
            "package" => Ok(PlanCategory::Package),
            "insurance" => Ok(PlanCategory::Insurance),
            "tours" => Ok(PlanCategory::Tours),
            "other" => Ok(PlanCategory::Other),
            _ => Err(anyhow::anyhow!("Invalid plan category: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPlan {
    #[serde(default)]
    pub id: String,
    pub trip_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: PlanCategory,
    pub currency: Currency,
    pub total: Decimal,
    pub installments: u32,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Record for PaymentPlan {
    const COLLECTION: &'static str = "payment_plans";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl TripScoped for PaymentPlan {
    fn trip_id(&self) -> &str {
        &self.trip_id
    }

    fn set_trip_id(&mut self, trip_id: String) {
        self.trip_id = trip_id;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanPayment {
    #[serde(default)]
    pub id: String,
    pub plan_id: String,
    pub installment_number: u32,
    pub amount: Decimal,
    pub payer: ParticipantId,
    pub payment_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Record for PlanPayment {
    const COLLECTION: &'static str = "plan_payments";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl Installment for PlanPayment {
    fn amount(&self) -> Decimal {
        self.amount
    }

    fn payer(&self) -> &ParticipantId {
        &self.payer
    }
}

impl PaymentRecord for PlanPayment {
    fn parent_id(&self) -> &str {
        &self.plan_id
    }

    fn from_draft(draft: PaymentDraft) -> Self {
        PlanPayment {
            id: String::new(),
            plan_id: draft.parent_id,
            installment_number: draft.installment_number,
            amount: draft.amount,
            payer: draft.payer,
            payment_date: draft.payment_date,
            notes: draft.notes,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanDraft {
    pub name: String,
    pub description: Option<String>,
    pub category: PlanCategory,
    pub currency: Currency,
    pub total: Decimal,
    pub installments: u32,
    pub start_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl PlanDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.total <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount(self.total));
        }
        if self.installments == 0 {
            return Err(ValidationError::ZeroInstallments);
        }
        Ok(())
    }

    fn into_plan(self, id: String, trip_id: String) -> PaymentPlan {
        PaymentPlan {
            id,
            trip_id,
            name: self.name.trim().to_string(),
            description: self.description,
            category: self.category,
            currency: self.currency,
            total: self.total,
            installments: self.installments,
            start_date: self.start_date,
            notes: self.notes,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanView {
    pub plan: PaymentPlan,
    pub payments: Vec<PlanPayment>,
    pub progress: Progress,
}

impl PlanView {
    pub fn new(plan: PaymentPlan, mut payments: Vec<PlanPayment>, rate: Decimal) -> Self {
        payments.sort_by(|a, b| {
            (a.installment_number, a.payment_date).cmp(&(b.installment_number, b.payment_date))
        });
        let progress = obligation::account(plan.total, plan.currency, &payments, rate);
        Self {
            plan,
            payments,
            progress,
        }
    }
}

/// All plans of a trip rolled up into the reporting currency.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlanSummary {
    pub committed: Decimal,
    pub paid: Decimal,
    pub remaining: Decimal,
    /// Not capped: overpaid plans can push it past 100.
    pub percent: u32,
    pub paid_by: BTreeMap<ParticipantId, Decimal>,
}

impl PlanSummary {
    pub fn from_views(views: &[PlanView], rate: Decimal) -> Self {
        let mut summary = PlanSummary::default();
        for view in views {
            let currency = view.plan.currency;
            summary.committed += convert(view.plan.total, currency, Currency::REPORTING, rate);
            summary.remaining +=
                convert(view.progress.remaining, currency, Currency::REPORTING, rate);
            for (payer, amount) in &view.progress.paid_by_reporting {
                summary.paid += amount;
                *summary.paid_by.entry(payer.clone()).or_default() += amount;
            }
        }
        summary.percent = percent_of(summary.paid, summary.committed);
        summary
    }
}

pub struct PlanLedger {
    obligations: Obligations<PaymentPlan, PlanPayment>,
}

impl PlanLedger {
    pub fn new(
        plans: Arc<dyn RecordStore<PaymentPlan>>,
        payments: Arc<dyn RecordStore<PlanPayment>>,
    ) -> Self {
        Self {
            obligations: Obligations::new(plans, payments),
        }
    }

    /// Plans of the session's trip, ordered by start date then name.
    pub async fn list(&self, session: &Session, rate: Decimal) -> Vec<PlanView> {
        let joined = match self.obligations.joined(session).await {
            Ok(joined) => joined,
            Err(e) => {
                error!(error = %e, trip_id = %session.trip_id, "Failed to list payment plans");
                return Vec::new();
            }
        };
        let mut views: Vec<PlanView> = joined
            .into_iter()
            .map(|(plan, payments)| PlanView::new(plan, payments, rate))
            .collect();
        views.sort_by(|a, b| {
            let key = |v: &PlanView| (v.plan.start_date.is_none(), v.plan.start_date, v.plan.name.clone());
            key(a).cmp(&key(b))
        });
        debug!(count = views.len(), "Listed payment plans");
        views
    }

    pub async fn summary(&self, session: &Session, rate: Decimal) -> PlanSummary {
        PlanSummary::from_views(&self.list(session, rate).await, rate)
    }

    pub async fn add(&self, session: &Session, draft: PlanDraft) -> Option<PaymentPlan> {
        if let Err(e) = draft.validate() {
            warn!(error = %e, "Payment plan not submitted");
            return None;
        }
        let plan = draft.into_plan(String::new(), session.trip_id.clone());
        match self.obligations.parents.create(plan).await {
            Ok(plan) => {
                info!(plan_id = %plan.id, total = %plan.total, currency = %plan.currency, "Payment plan added");
                Some(plan)
            }
            Err(e) => {
                error!(error = %e, "Failed to add payment plan");
                None
            }
        }
    }

    pub async fn edit(&self, session: &Session, id: &str, draft: PlanDraft) -> Option<PaymentPlan> {
        if let Err(e) = draft.validate() {
            warn!(error = %e, plan_id = id, "Payment plan edit not submitted");
            return None;
        }
        self.obligations.owned(session, id).await?;
        let plan = draft.into_plan(id.to_string(), session.trip_id.clone());
        match self.obligations.parents.update(plan).await {
            Ok(plan) => {
                info!(plan_id = %plan.id, "Payment plan updated");
                Some(plan)
            }
            Err(e) => {
                error!(error = %e, plan_id = id, "Failed to update payment plan");
                None
            }
        }
    }

    /// Deletes a plan and its payments. Already gone counts as removed.
    pub async fn remove(&self, session: &Session, id: &str) -> bool {
        self.obligations.remove(session, id).await
    }

    pub async fn add_payment(&self, session: &Session, draft: PaymentDraft) -> Option<PlanPayment> {
        self.obligations.add_payment(session, draft).await
    }

    pub async fn remove_payment(&self, session: &Session, id: &str) -> bool {
        self.obligations.remove_payment(session, id).await
    }
}
