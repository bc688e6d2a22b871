//! Who paid what, per currency, and who owes whom.
//!
//! Everything here is a pure function of ledger snapshots: nothing is read
//! from or written to a store, so the same inputs always give the same
//! balance.

use crate::core::currency::Currency;
use crate::core::expense::ExpenseView;
use crate::core::plan::PlanSummary;
use crate::core::roster::{ParticipantId, Roster};
use crate::core::settlement::{Transfer, minimal_transfers};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Settlement between exactly two participants: the one who paid less owes
/// half the difference.
#[derive(Debug, Clone, PartialEq)]
pub struct PairSettlement {
    pub difference: Decimal,
    /// `None` when both paid the same.
    pub debtor: Option<ParticipantId>,
    pub creditor: Option<ParticipantId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyBalance {
    pub currency: Currency,
    /// Paid per participant. Every roster member is present.
    pub totals: BTreeMap<ParticipantId, Decimal>,
    pub total: Decimal,
    /// Equal share of `total` per participant.
    pub share: Decimal,
    /// Paid minus share; positive means owed money.
    pub net: BTreeMap<ParticipantId, Decimal>,
    pub transfers: Vec<Transfer>,
    pub pair: Option<PairSettlement>,
}

impl CurrencyBalance {
    fn settle(currency: Currency, totals: BTreeMap<ParticipantId, Decimal>) -> Self {
        let total: Decimal = totals.values().sum();
        let share = if totals.is_empty() {
            Decimal::ZERO
        } else {
            total / Decimal::from(totals.len())
        };
        let net: BTreeMap<ParticipantId, Decimal> = totals
            .iter()
            .map(|(id, paid)| (id.clone(), *paid - share))
            .collect();
        let transfers = minimal_transfers(&net);
        let pair = pair_settlement(&totals);
        Self {
            currency,
            totals,
            total,
            share,
            net,
            transfers,
            pair,
        }
    }

    pub fn paid_by(&self, id: &ParticipantId) -> Decimal {
        self.totals.get(id).copied().unwrap_or_default()
    }
}

fn pair_settlement(totals: &BTreeMap<ParticipantId, Decimal>) -> Option<PairSettlement> {
    let mut iter = totals.iter();
    let ((a, paid_a), (b, paid_b)) = match (iter.next(), iter.next(), iter.next()) {
        (Some(first), Some(second), None) => (first, second),
        _ => return None,
    };
    let difference = (paid_a - paid_b).abs() / Decimal::TWO;
    let (debtor, creditor) = match paid_a.cmp(paid_b) {
        std::cmp::Ordering::Greater => (Some(b.clone()), Some(a.clone())),
        std::cmp::Ordering::Less => (Some(a.clone()), Some(b.clone())),
        std::cmp::Ordering::Equal => (None, None),
    };
    Some(PairSettlement {
        difference,
        debtor,
        creditor,
    })
}

/// Everything paid, in the reporting currency, regardless of the currency
/// it was paid in.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GrandTotal {
    pub totals: BTreeMap<ParticipantId, Decimal>,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Balance {
    pub by_currency: BTreeMap<Currency, CurrencyBalance>,
    pub grand_total: GrandTotal,
}

impl Balance {
    pub fn currency(&self, currency: Currency) -> Option<&CurrencyBalance> {
        self.by_currency.get(&currency)
    }
}

/// Builds the balance of a trip from its expense views and plan summary.
///
/// Expenses count in their own currency only. Plan payments are already in
/// the reporting currency and are added there. Someone who paid but is no
/// longer on the roster still shows up and is settled with the rest.
pub fn compute(roster: &Roster, expenses: &[ExpenseView], plans: &PlanSummary) -> Balance {
    let zeroed: BTreeMap<ParticipantId, Decimal> =
        roster.ids().map(|id| (id.clone(), Decimal::ZERO)).collect();

    let mut per_currency: BTreeMap<Currency, BTreeMap<ParticipantId, Decimal>> = Currency::ALL
        .iter()
        .map(|currency| (*currency, zeroed.clone()))
        .collect();
    let mut grand = GrandTotal {
        totals: zeroed,
        total: Decimal::ZERO,
    };

    for view in expenses {
        let totals = per_currency.entry(view.expense.currency).or_default();
        for (payer, amount) in view.contributions() {
            *totals.entry(payer.clone()).or_default() += amount;
        }
        for (payer, amount) in view.reporting_contributions() {
            *grand.totals.entry(payer.clone()).or_default() += amount;
        }
    }

    let reporting = per_currency.entry(Currency::REPORTING).or_default();
    for (payer, amount) in &plans.paid_by {
        *reporting.entry(payer.clone()).or_default() += amount;
        *grand.totals.entry(payer.clone()).or_default() += amount;
    }

    grand.total = grand.totals.values().sum();
    let by_currency = per_currency
        .into_iter()
        .map(|(currency, totals)| (currency, CurrencyBalance::settle(currency, totals)))
        .collect();

    Balance {
        by_currency,
        grand_total: grand,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::expense::{Expense, ExpenseCategory, InstallmentPayment};
    use crate::core::roster::Participant;
    use chrono::NaiveDate;

    fn roster() -> Roster {
        Roster::new(vec![Participant::new("juan", "Juan"), Participant::new("vale", "Vale")]).unwrap()
    }

    fn id(s: &str) -> ParticipantId {
        ParticipantId::from(s)
    }

    fn expense(
        id: &str,
        currency: Currency,
        amount: i64,
        amount_usd: i64,
        installments: u32,
        payer: Option<&str>,
    ) -> Expense {
        Expense {
            id: id.to_string(),
            trip_id: "t".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
            description: id.to_string(),
            category: ExpenseCategory::Food,
            currency,
            amount: Decimal::from(amount),
            amount_usd: Decimal::from(amount_usd),
            installments,
            payer: payer.map(ParticipantId::from),
        }
    }

    fn payment(expense_id: &str, n: u32, amount: i64, payer: &str) -> InstallmentPayment {
        InstallmentPayment {
            id: format!("{expense_id}-{n}"),
            expense_id: expense_id.to_string(),
            installment_number: n,
            amount: Decimal::from(amount),
            payer: payer.into(),
            payment_date: NaiveDate::from_ymd_opt(2026, 7, n).unwrap(),
            notes: None,
        }
    }

    fn single(id: &str, currency: Currency, amount: i64, amount_usd: i64, payer: &str) -> ExpenseView {
        ExpenseView::new(
            expense(id, currency, amount, amount_usd, 1, Some(payer)),
            vec![],
            Decimal::from(1000),
        )
    }

    #[test]
    fn test_single_payment_goes_to_payer() {
        let views = [single("e1", Currency::Usd, 80, 80, "juan")];
        let balance = compute(&roster(), &views, &PlanSummary::default());
        let usd = balance.currency(Currency::Usd).unwrap();
        assert_eq!(usd.paid_by(&id("juan")), Decimal::from(80));
        assert_eq!(usd.paid_by(&id("vale")), Decimal::ZERO);
    }

    #[test]
    fn test_installments_credit_each_payer() {
        let views = [ExpenseView::new(
            expense("e1", Currency::Usd, 300, 300, 3, None),
            vec![payment("e1", 1, 100, "juan"), payment("e1", 2, 100, "vale")],
            Decimal::from(1000),
        )];
        let balance = compute(&roster(), &views, &PlanSummary::default());
        let usd = balance.currency(Currency::Usd).unwrap();
        assert_eq!(usd.paid_by(&id("juan")), Decimal::from(100));
        assert_eq!(usd.paid_by(&id("vale")), Decimal::from(100));
        assert_eq!(views[0].progress.remaining, Decimal::from(100));
        assert_eq!(views[0].progress.percent, 67);
    }

    #[test]
    fn test_installments_without_payments_contribute_nothing() {
        let views = [ExpenseView::new(
            expense("e1", Currency::Usd, 300, 300, 3, None),
            vec![],
            Decimal::from(1000),
        )];
        let balance = compute(&roster(), &views, &PlanSummary::default());
        assert_eq!(balance.currency(Currency::Usd).unwrap().total, Decimal::ZERO);
        assert_eq!(balance.grand_total.total, Decimal::ZERO);
    }

    #[test]
    fn test_pair_debtor_and_difference() {
        let views = [
            single("e1", Currency::Usd, 100, 100, "juan"),
            single("e2", Currency::Usd, 50, 50, "vale"),
        ];
        let balance = compute(&roster(), &views, &PlanSummary::default());
        let usd = balance.currency(Currency::Usd).unwrap();
        assert_eq!(usd.total, Decimal::from(150));
        let pair = usd.pair.as_ref().unwrap();
        assert_eq!(pair.difference, Decimal::from(25));
        assert_eq!(pair.debtor, Some(id("vale")));
        assert_eq!(pair.creditor, Some(id("juan")));
        assert_eq!(usd.transfers.len(), 1);
        assert_eq!(usd.transfers[0].from, id("vale"));
        assert_eq!(usd.transfers[0].amount, Decimal::from(25));

        let reversed = [
            single("e1", Currency::Usd, 30, 30, "juan"),
            single("e2", Currency::Usd, 50, 50, "vale"),
        ];
        let balance = compute(&roster(), &reversed, &PlanSummary::default());
        let pair = balance.currency(Currency::Usd).unwrap().pair.clone().unwrap();
        assert_eq!(pair.debtor, Some(id("juan")));
        assert_eq!(pair.difference, Decimal::from(10));
    }

    #[test]
    fn test_even_pair_has_no_debtor() {
        let views = [
            single("e1", Currency::Usd, 40, 40, "juan"),
            single("e2", Currency::Usd, 40, 40, "vale"),
        ];
        let balance = compute(&roster(), &views, &PlanSummary::default());
        let usd = balance.currency(Currency::Usd).unwrap();
        let pair = usd.pair.as_ref().unwrap();
        assert_eq!(pair.debtor, None);
        assert_eq!(pair.difference, Decimal::ZERO);
        assert!(usd.transfers.is_empty());
    }

    #[test]
    fn test_currencies_never_mix_but_grand_total_does() {
        let views = [
            single("e1", Currency::Ars, 5000, 5, "juan"),
            single("e2", Currency::Usd, 20, 20, "vale"),
        ];
        let balance = compute(&roster(), &views, &PlanSummary::default());
        let ars = balance.currency(Currency::Ars).unwrap();
        let usd = balance.currency(Currency::Usd).unwrap();
        assert_eq!(ars.paid_by(&id("juan")), Decimal::from(5000));
        assert_eq!(ars.paid_by(&id("vale")), Decimal::ZERO);
        assert_eq!(usd.paid_by(&id("juan")), Decimal::ZERO);
        assert_eq!(usd.paid_by(&id("vale")), Decimal::from(20));

        assert_eq!(balance.grand_total.totals[&id("juan")], Decimal::from(5));
        assert_eq!(balance.grand_total.totals[&id("vale")], Decimal::from(20));
        assert_eq!(balance.grand_total.total, Decimal::from(25));
    }

    #[test]
    fn test_plans_count_in_reporting_currency_only() {
        let mut plans = PlanSummary::default();
        plans.paid_by.insert(id("vale"), Decimal::from(300));
        let views = [single("e1", Currency::Ars, 10_000, 10, "juan")];

        let balance = compute(&roster(), &views, &plans);
        assert_eq!(balance.currency(Currency::Usd).unwrap().paid_by(&id("vale")), Decimal::from(300));
        assert_eq!(balance.currency(Currency::Ars).unwrap().paid_by(&id("vale")), Decimal::ZERO);
        assert_eq!(balance.grand_total.total, Decimal::from(310));
    }

    #[test]
    fn test_compute_is_idempotent() {
        let views = [
            single("e1", Currency::Usd, 100, 100, "juan"),
            single("e2", Currency::Ars, 9000, 9, "vale"),
        ];
        let mut plans = PlanSummary::default();
        plans.paid_by.insert(id("juan"), Decimal::from(50));
        let first = compute(&roster(), &views, &plans);
        let second = compute(&roster(), &views, &plans);
        assert_eq!(first, second);
    }

    #[test]
    fn test_three_way_settlement() {
        let roster = Roster::new(vec![
            Participant::new("ana", "Ana"),
            Participant::new("juan", "Juan"),
            Participant::new("vale", "Vale"),
        ])
        .unwrap();
        let views = [single("e1", Currency::Usd, 90, 90, "juan")];
        let balance = compute(&roster, &views, &PlanSummary::default());
        let usd = balance.currency(Currency::Usd).unwrap();
        assert_eq!(usd.share, Decimal::from(30));
        assert!(usd.pair.is_none());
        assert_eq!(usd.transfers.len(), 2);
        assert!(usd.transfers.iter().all(|t| t.to == id("juan") && t.amount == Decimal::from(30)));
    }

    #[test]
    fn test_payer_outside_roster_is_kept() {
        let views = [single("e1", Currency::Usd, 60, 60, "pedro")];
        let balance = compute(&roster(), &views, &PlanSummary::default());
        let usd = balance.currency(Currency::Usd).unwrap();
        assert_eq!(usd.totals.len(), 3);
        assert_eq!(usd.share, Decimal::from(20));
    }
}
