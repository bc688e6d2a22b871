use super::{done, submitted, today, ui};
use crate::App;
use crate::core::itinerary::{
    ItineraryCategory, ItineraryDay, ItineraryItem, Note, Place, PlaceCategory, PlaceFilter,
};
use crate::core::record::TripScoped;
use anyhow::Result;
use chrono::{NaiveDate, NaiveTime, Utc};
use clap::Subcommand;
use comfy_table::Cell;

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ItineraryCommand {
    /// Show the itinerary grouped by day
    List,
    /// Add an item to the itinerary
    Add {
        title: String,
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Time of day as HH:MM
        #[arg(long)]
        time: Option<NaiveTime>,
        #[arg(short = 'k', long, default_value = "other")]
        category: ItineraryCategory,
        #[arg(short, long)]
        location: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete an itinerary item
    Remove { id: String },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum PlaceCommand {
    /// List places, optionally filtered
    List {
        #[arg(short = 'k', long)]
        category: Option<PlaceCategory>,
        /// Only places already visited
        #[arg(long, conflicts_with = "pending")]
        visited: bool,
        /// Only places not visited yet
        #[arg(long)]
        pending: bool,
    },
    /// Save a place worth a visit
    Add {
        name: String,
        #[arg(short = 'k', long, default_value = "other")]
        category: PlaceCategory,
        #[arg(short, long)]
        address: Option<String>,
        #[arg(short, long)]
        url: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Flip the visited mark of a place
    Toggle { id: String },
    /// Delete a place
    Remove { id: String },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum NoteCommand {
    /// List notes, pinned first
    List,
    /// Write a note
    Add {
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        #[arg(long)]
        pinned: bool,
    },
    /// Pin or unpin a note
    Pin { id: String },
    /// Delete a note
    Remove { id: String },
}

pub fn render_days(days: &[ItineraryDay]) -> String {
    let mut sections = Vec::with_capacity(days.len());
    for day in days {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Time"),
            ui::header_cell("Title"),
            ui::header_cell("Category"),
            ui::header_cell("Location"),
            ui::header_cell("Id"),
        ]);
        for item in &day.items {
            table.add_row(vec![
                ui::format_optional_cell(item.time, |t| t.format("%H:%M").to_string()),
                Cell::new(&item.title),
                Cell::new(item.category),
                ui::format_optional_cell(item.location.as_deref(), str::to_string),
                Cell::new(&item.id),
            ]);
        }
        sections.push(format!(
            "{}\n{}",
            ui::style_text(&day.date.format("%A %d %B %Y").to_string(), ui::StyleType::Title),
            table
        ));
    }
    sections.join("\n\n")
}

pub fn render_places(places: &[Place]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell(""),
        ui::header_cell("Name"),
        ui::header_cell("Category"),
        ui::header_cell("Address"),
        ui::header_cell("Id"),
    ]);
    for place in places {
        table.add_row(vec![
            Cell::new(if place.visited { "✓" } else { "" }),
            Cell::new(&place.name),
            Cell::new(place.category),
            ui::format_optional_cell(place.address.as_deref(), str::to_string),
            Cell::new(&place.id),
        ]);
    }
    let visited = places.iter().filter(|p| p.visited).count();
    format!("{}\nVisited {}/{}", table, visited, places.len())
}

pub fn render_notes(notes: &[Note]) -> String {
    notes
        .iter()
        .map(|note| {
            let pin = if note.pinned { "📌 " } else { "" };
            let mut block = format!(
                "{}{} {}",
                pin,
                ui::style_text(&note.title, ui::StyleType::TotalLabel),
                ui::style_text(
                    &format!("({}, {})", note.created_at.format("%Y-%m-%d"), note.id),
                    ui::StyleType::Subtle
                )
            );
            if !note.content.is_empty() {
                block.push('\n');
                block.push_str(&note.content);
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub async fn run_itinerary(app: &App, command: ItineraryCommand) -> Result<()> {
    let (_, session) = app.session().await?;
    match command {
        ItineraryCommand::List => {
            let days = app.itinerary.days(&session).await;
            if days.is_empty() {
                println!("The itinerary is empty.");
                return Ok(());
            }
            println!("{}", render_days(&days));
        }
        ItineraryCommand::Add {
            title,
            date,
            time,
            category,
            location,
            description,
        } => {
            let item = ItineraryItem {
                id: String::new(),
                trip_id: String::new(),
                date: date.unwrap_or_else(today),
                time,
                title,
                description,
                location,
                category,
            };
            item.validate()?;
            let item = submitted(app.itinerary.add(&session, item).await, "Itinerary item")?;
            println!("Added {} on {} as {}", item.title, item.date, item.id);
        }
        ItineraryCommand::Remove { id } => {
            done(app.itinerary.remove(&session, &id).await, "Removing the item")?;
            println!("Removed itinerary item {id}");
        }
    }
    Ok(())
}

pub async fn run_place(app: &App, command: PlaceCommand) -> Result<()> {
    let (_, session) = app.session().await?;
    match command {
        PlaceCommand::List {
            category,
            visited,
            pending,
        } => {
            let filter = PlaceFilter {
                category,
                visited: match (visited, pending) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
            };
            let places = app.places.filtered(&session, filter).await;
            if places.is_empty() {
                println!("No places found.");
                return Ok(());
            }
            println!("{}", render_places(&places));
        }
        PlaceCommand::Add {
            name,
            category,
            address,
            url,
            notes,
        } => {
            let place = Place {
                id: String::new(),
                trip_id: String::new(),
                name,
                category,
                address,
                url,
                visited: false,
                notes,
            };
            place.validate()?;
            let place = submitted(app.places.add(&session, place).await, "Place")?;
            println!("Saved {} as {}", place.name, place.id);
        }
        PlaceCommand::Toggle { id } => {
            let place = submitted(app.places.toggle_visited(&session, &id).await, "Place")?;
            let state = if place.visited { "visited" } else { "not visited" };
            println!("{} is now {}", place.name, state);
        }
        PlaceCommand::Remove { id } => {
            done(app.places.remove(&session, &id).await, "Removing the place")?;
            println!("Removed place {id}");
        }
    }
    Ok(())
}

pub async fn run_note(app: &App, command: NoteCommand) -> Result<()> {
    let (_, session) = app.session().await?;
    match command {
        NoteCommand::List => {
            let notes = app.notes.sorted(&session).await;
            if notes.is_empty() {
                println!("No notes yet.");
                return Ok(());
            }
            println!("{}", render_notes(&notes));
        }
        NoteCommand::Add {
            title,
            content,
            pinned,
        } => {
            let note = Note {
                id: String::new(),
                trip_id: String::new(),
                title,
                content,
                pinned,
                created_at: Utc::now(),
            };
            note.validate()?;
            let note = submitted(app.notes.add(&session, note).await, "Note")?;
            println!("Saved note {}", note.id);
        }
        NoteCommand::Pin { id } => {
            let mut note = submitted(app.notes.get(&session, &id).await, "Note")?;
            note.pinned = !note.pinned;
            let note = submitted(app.notes.update(&session, note).await, "Note")?;
            let state = if note.pinned { "pinned" } else { "unpinned" };
            println!("Note {} {}", note.id, state);
        }
        NoteCommand::Remove { id } => {
            done(app.notes.remove(&session, &id).await, "Removing the note")?;
            println!("Removed note {id}");
        }
    }
    Ok(())
}
