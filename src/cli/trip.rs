use super::{submitted, ui};
use crate::App;
use crate::core::roster::{Participant, Roster, Trip};
use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use clap::Subcommand;
use comfy_table::Cell;

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum TripCommand {
    /// Create a trip and make it the current one
    Create {
        name: String,
        /// Participant as `id` or `id:Display Name`, repeat for each person
        #[arg(short, long = "participant", required = true)]
        participants: Vec<String>,
        #[arg(short, long)]
        destination: Option<String>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// List all trips
    List,
    /// Select the current trip
    Use { id: String },
    /// Show the current trip and its roster
    Show,
}

/// Parses `id` or `id:Display Name`.
pub fn parse_participant(value: &str) -> Result<Participant> {
    let (id, name) = match value.split_once(':') {
        Some((id, name)) => (id.trim(), name.trim()),
        None => (value.trim(), value.trim()),
    };
    if id.is_empty() || name.is_empty() {
        return Err(anyhow!("Invalid participant: {:?}", value));
    }
    Ok(Participant::new(id, name))
}

pub fn render_trips(trips: &[Trip], current: Option<&str>) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell(""),
        ui::header_cell("Id"),
        ui::header_cell("Name"),
        ui::header_cell("Destination"),
        ui::header_cell("Dates"),
        ui::header_cell("Participants"),
    ]);
    for trip in trips {
        let marker = if Some(trip.id.as_str()) == current { "*" } else { "" };
        let dates = match (trip.start_date, trip.end_date) {
            (Some(start), Some(end)) => format!("{start} → {end}"),
            (Some(start), None) => format!("from {start}"),
            _ => "-".to_string(),
        };
        let participants = trip
            .participants
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            Cell::new(marker),
            Cell::new(&trip.id),
            Cell::new(&trip.name),
            ui::format_optional_cell(trip.destination.as_deref(), str::to_string),
            Cell::new(dates),
            Cell::new(participants),
        ]);
    }
    table.to_string()
}

pub fn render_trip(trip: &Trip, roster: &Roster) -> String {
    let mut output = format!("Trip: {}\n", ui::style_text(&trip.name, ui::StyleType::Title));
    if let Some(destination) = &trip.destination {
        output.push_str(&format!("Destination: {destination}\n"));
    }
    if let Some(days) = trip.length_in_days() {
        output.push_str(&format!("Length: {days} days\n"));
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Id"), ui::header_cell("Name")]);
    for participant in roster.participants() {
        table.add_row(vec![
            Cell::new(participant.id.as_str()),
            Cell::new(&participant.name),
        ]);
    }
    output.push('\n');
    output.push_str(&table.to_string());
    output
}

pub async fn run(app: &App, command: TripCommand) -> Result<()> {
    match command {
        TripCommand::Create {
            name,
            participants,
            destination,
            start,
            end,
        } => {
            let participants = participants
                .iter()
                .map(|p| parse_participant(p))
                .collect::<Result<Vec<_>>>()?;
            let trip = Trip {
                id: String::new(),
                name,
                destination,
                start_date: start,
                end_date: end,
                participants,
            };
            trip.validate()?;
            let trip = submitted(app.trips.create(trip).await, "Trip")?;
            app.trips.select(&trip.id).await;
            println!(
                "Created trip {} ({})",
                ui::style_text(&trip.name, ui::StyleType::TotalLabel),
                trip.id
            );
        }
        TripCommand::List => {
            let trips = app.trips.list().await;
            if trips.is_empty() {
                println!("No trips yet. Create one with `trip create`.");
                return Ok(());
            }
            let current = app.trips.restore_session().await.map(|(trip, _)| trip.id);
            println!("{}", render_trips(&trips, current.as_deref()));
        }
        TripCommand::Use { id } => {
            if !app.trips.select(&id).await {
                return Err(anyhow!("No trip with id {id}"));
            }
            println!("Current trip is now {id}");
        }
        TripCommand::Show => {
            let (trip, session) = app.session().await?;
            println!("{}", render_trip(&trip, &session.roster));
        }
    }
    Ok(())
}
