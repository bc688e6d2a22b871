pub mod balance;
pub mod expense;
pub mod itinerary;
pub mod plan;
pub mod rate;
pub mod setup;
pub mod stats;
pub mod trip;
pub mod ui;

use crate::App;
use anyhow::{Result, anyhow};
use chrono::{Local, NaiveDate};
use clap::Subcommand;

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Create, list and select trips
    #[command(subcommand)]
    Trip(trip::TripCommand),
    /// Ad-hoc expenses, paid at once or in installments
    #[command(subcommand)]
    Expense(expense::ExpenseCommand),
    /// Prepaid payment plans
    #[command(subcommand)]
    Plan(plan::PlanCommand),
    /// Show who paid what and who owes whom
    Balance,
    /// Show or override the ARS/USD exchange rate
    #[command(subcommand)]
    Rate(rate::RateCommand),
    /// Day by day itinerary
    #[command(subcommand)]
    Itinerary(itinerary::ItineraryCommand),
    /// Places worth a visit
    #[command(subcommand)]
    Place(itinerary::PlaceCommand),
    /// Trip notes
    #[command(subcommand)]
    Note(itinerary::NoteCommand),
    /// Trip dashboard
    Stats,
}

pub async fn run(app: &App, command: AppCommand) -> Result<()> {
    match command {
        AppCommand::Trip(cmd) => trip::run(app, cmd).await,
        AppCommand::Expense(cmd) => expense::run(app, cmd).await,
        AppCommand::Plan(cmd) => plan::run(app, cmd).await,
        AppCommand::Balance => balance::run(app).await,
        AppCommand::Rate(cmd) => rate::run(app, cmd).await,
        AppCommand::Itinerary(cmd) => itinerary::run_itinerary(app, cmd).await,
        AppCommand::Place(cmd) => itinerary::run_place(app, cmd).await,
        AppCommand::Note(cmd) => itinerary::run_note(app, cmd).await,
        AppCommand::Stats => stats::run(app).await,
    }
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Turns a ledger's `None`/`false` into an error the user sees.
pub(crate) fn submitted<T>(outcome: Option<T>, what: &str) -> Result<T> {
    outcome.ok_or_else(|| anyhow!("{what} was not saved, run with --verbose for details"))
}

pub(crate) fn done(ok: bool, what: &str) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(anyhow!("{what} failed, run with --verbose for details"))
    }
}
