use super::{today, ui};
use crate::App;
use crate::core::currency::Currency;
use crate::core::stats::{QuickStats, TripSnapshot};
use anyhow::Result;
use comfy_table::{Cell, CellAlignment};

pub fn render(trip_name: &str, stats: &QuickStats) -> String {
    let countdown = match stats.days_until_start {
        Some(days) if days > 1 => format!("{days} days to go"),
        Some(1) => "Tomorrow".to_string(),
        Some(0) => "Today".to_string(),
        Some(days) => format!("Started {} days ago", -days),
        None => "-".to_string(),
    };
    let length = stats
        .length_in_days
        .map_or("-".to_string(), |d| format!("{d} days"));

    let rows = [
        ("Starts", countdown),
        ("Length", length),
        ("Expenses", stats.expense_count.to_string()),
        ("Total spent", Currency::REPORTING.format(stats.total_spent)),
        ("Plans paid", format!("{}%", stats.plan_percent)),
        ("Itinerary items", stats.itinerary_items.to_string()),
        (
            "Places visited",
            format!("{}/{}", stats.places_visited, stats.places_total),
        ),
        ("Notes", stats.notes.to_string()),
    ];

    let mut table = ui::new_styled_table();
    for (label, value) in rows {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]);
    }
    format!("{}\n{}", ui::style_text(trip_name, ui::StyleType::Title), table)
}

pub async fn run(app: &App) -> Result<()> {
    let (trip, session) = app.session().await?;
    let spinner = ui::new_spinner("Gathering trip stats...");
    let (trip_balance, itinerary, places, notes) = futures::join!(
        app.balance(&session),
        app.itinerary.list(&session),
        app.places.list(&session),
        app.notes.list(&session)
    );
    spinner.finish_and_clear();

    let snapshot = TripSnapshot {
        trip: &trip,
        expenses: &trip_balance.expenses,
        balance: &trip_balance.balance,
        plans: &trip_balance.plans,
        itinerary: &itinerary,
        places: &places,
        notes: &notes,
    };
    let stats = QuickStats::compute(&snapshot, today());
    println!("{}", render(&trip.name, &stats));
    Ok(())
}
