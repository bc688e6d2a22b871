use crate::core::balance::Balance;
use crate::core::expense::ExpenseView;
use crate::core::itinerary::{ItineraryItem, Note, Place};
use crate::core::plan::PlanSummary;
use crate::core::roster::Trip;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// At-a-glance numbers for the trip dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct QuickStats {
    /// Negative once the trip has started.
    pub days_until_start: Option<i64>,
    pub length_in_days: Option<i64>,
    pub expense_count: usize,
    /// Grand total in the reporting currency.
    pub total_spent: Decimal,
    pub plan_percent: u32,
    pub itinerary_items: usize,
    pub places_visited: usize,
    pub places_total: usize,
    pub notes: usize,
}

pub struct TripSnapshot<'a> {
    pub trip: &'a Trip,
    pub expenses: &'a [ExpenseView],
    pub balance: &'a Balance,
    pub plans: &'a PlanSummary,
    pub itinerary: &'a [ItineraryItem],
    pub places: &'a [Place],
    pub notes: &'a [Note],
}

impl QuickStats {
    pub fn compute(snapshot: &TripSnapshot<'_>, today: NaiveDate) -> Self {
        Self {
            days_until_start: snapshot
                .trip
                .start_date
                .map(|start| (start - today).num_days()),
            length_in_days: snapshot.trip.length_in_days(),
            expense_count: snapshot.expenses.len(),
            total_spent: snapshot.balance.grand_total.total,
            plan_percent: snapshot.plans.percent,
            itinerary_items: snapshot.itinerary.len(),
            places_visited: snapshot.places.iter().filter(|p| p.visited).count(),
            places_total: snapshot.places.len(),
            notes: snapshot.notes.len(),
        }
    }
}
