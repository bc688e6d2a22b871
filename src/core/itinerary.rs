//! Trip planning board: day-by-day itinerary, places worth a visit and
//! free-form notes. All three are plain trip-scoped collections.

use crate::core::error::ValidationError;
use crate::core::record::{Record, RecordStore, TripScoped};
use crate::core::roster::Session;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItineraryCategory {
    Transport,
    Accommodation,
    Activity,
    Food,
    Sightseeing,
    Other,
}

impl Display for ItineraryCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ItineraryCategory::Transport => "transport",
                ItineraryCategory::Accommodation => "accommodation",
                ItineraryCategory::Activity => "activity",
                ItineraryCategory::Food => "food",
                ItineraryCategory::Sightseeing => "sightseeing",
                ItineraryCategory::Other => "other",
            }
        )
    }
}

impl FromStr for ItineraryCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "transport" => Ok(ItineraryCategory::Transport),
            "accommodation" => Ok(ItineraryCategory::Accommodation),
            "activity" => Ok(ItineraryCategory::Activity),
            "food" => Ok(ItineraryCategory::Food),
            "sightseeing" => Ok(ItineraryCategory::Sightseeing),
            "other" => Ok(ItineraryCategory::Other),
            _ => Err(anyhow::anyhow!("Invalid itinerary category: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceCategory {
    Restaurant,
    Attraction,
    Museum,
    Nature,
    Shopping,
    Nightlife,
    Other,
}

impl Display for PlaceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                PlaceCategory::Restaurant => "restaurant",
                PlaceCategory::Attraction => "attraction",
                PlaceCategory::Museum => "museum",
                PlaceCategory::Nature => "nature",
                PlaceCategory::Shopping => "shopping",
                PlaceCategory::Nightlife => "nightlife",
                PlaceCategory::Other => "other",
            }
        )
    }
}

impl FromStr for PlaceCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "restaurant" => Ok(PlaceCategory::Restaurant),
            "attraction" => Ok(PlaceCategory::Attraction),
            "museum" => Ok(PlaceCategory::Museum),
            "nature" => Ok(PlaceCategory::Nature),
            "shopping" => Ok(PlaceCategory::Shopping),
            "nightlife" => Ok(PlaceCategory::Nightlife),
            "other" => Ok(PlaceCategory::Other),
            _ => Err(anyhow::anyhow!("Invalid place category: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub trip_id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub time: Option<NaiveTime>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub category: ItineraryCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub trip_id: String,
    pub name: String,
    pub category: PlaceCategory,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub visited: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub trip_id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
}

impl Record for ItineraryItem {
    const COLLECTION: &'static str = "itinerary";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl TripScoped for ItineraryItem {
    fn trip_id(&self) -> &str {
        &self.trip_id
    }

    fn set_trip_id(&mut self, trip_id: String) {
        self.trip_id = trip_id;
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        Ok(())
    }
}

impl Record for Place {
    const COLLECTION: &'static str = "places";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl TripScoped for Place {
    fn trip_id(&self) -> &str {
        &self.trip_id
    }

    fn set_trip_id(&mut self, trip_id: String) {
        self.trip_id = trip_id;
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(())
    }
}

impl Record for Note {
    const COLLECTION: &'static str = "notes";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl TripScoped for Note {
    fn trip_id(&self) -> &str {
        &self.trip_id
    }

    fn set_trip_id(&mut self, trip_id: String) {
        self.trip_id = trip_id;
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        Ok(())
    }
}

/// Items of one day, in the order they happen.
#[derive(Debug, Clone, PartialEq)]
pub struct ItineraryDay {
    pub date: NaiveDate,
    pub items: Vec<ItineraryItem>,
}

/// Groups items by day, days ascending. Within a day timed items come
/// first by time and untimed items keep their relative order at the end.
pub fn group_by_day(mut items: Vec<ItineraryItem>) -> Vec<ItineraryDay> {
    items.sort_by_key(|item| (item.date, item.time.is_none(), item.time));

    let mut days: Vec<ItineraryDay> = Vec::new();
    for item in items {
        match days.last_mut() {
            Some(day) if day.date == item.date => day.items.push(item),
            _ => days.push(ItineraryDay {
                date: item.date,
                items: vec![item],
            }),
        }
    }
    days
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlaceFilter {
    pub category: Option<PlaceCategory>,
    pub visited: Option<bool>,
}

impl PlaceFilter {
    pub fn matches(&self, place: &Place) -> bool {
        self.category.is_none_or(|c| c == place.category)
            && self.visited.is_none_or(|v| v == place.visited)
    }

    pub fn apply(&self, places: Vec<Place>) -> Vec<Place> {
        places.into_iter().filter(|p| self.matches(p)).collect()
    }
}

/// Pinned notes first, newest first within each group.
pub fn sort_notes(notes: &mut [Note]) {
    notes.sort_by(|a, b| {
        b.pinned
            .cmp(&a.pinned)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

/// CRUD over one trip-scoped collection, with the same failure handling
/// as the ledgers: problems are logged and surface as `None` or `false`.
pub struct TripCollection<T: TripScoped> {
    store: Arc<dyn RecordStore<T>>,
}

impl<T: TripScoped> TripCollection<T> {
    pub fn new(store: Arc<dyn RecordStore<T>>) -> Self {
        Self { store }
    }

    pub async fn list(&self, session: &Session) -> Vec<T> {
        match self.store.list().await {
            Ok(records) => {
                let records: Vec<T> = records
                    .into_iter()
                    .filter(|r| r.trip_id() == session.trip_id)
                    .collect();
                debug!(collection = T::COLLECTION, count = records.len(), "Listed records");
                records
            }
            Err(e) => {
                error!(error = %e, collection = T::COLLECTION, "Failed to list records");
                Vec::new()
            }
        }
    }

    pub async fn get(&self, session: &Session, id: &str) -> Option<T> {
        match self.store.get(id).await {
            Ok(Some(record)) if record.trip_id() == session.trip_id => Some(record),
            Ok(_) => {
                warn!(collection = T::COLLECTION, id, "Record not found in this trip");
                None
            }
            Err(e) => {
                error!(error = %e, collection = T::COLLECTION, id, "Failed to load record");
                None
            }
        }
    }

    pub async fn add(&self, session: &Session, mut record: T) -> Option<T> {
        if let Err(e) = record.validate() {
            warn!(error = %e, collection = T::COLLECTION, "Record not submitted");
            return None;
        }
        record.set_trip_id(session.trip_id.clone());
        match self.store.create(record).await {
            Ok(record) => {
                info!(collection = T::COLLECTION, id = record.id(), "Record added");
                Some(record)
            }
            Err(e) => {
                error!(error = %e, collection = T::COLLECTION, "Failed to add record");
                None
            }
        }
    }

    pub async fn update(&self, session: &Session, mut record: T) -> Option<T> {
        if let Err(e) = record.validate() {
            warn!(error = %e, collection = T::COLLECTION, id = record.id(), "Record edit not submitted");
            return None;
        }
        self.get(session, record.id()).await?;
        record.set_trip_id(session.trip_id.clone());
        match self.store.update(record).await {
            Ok(record) => {
                info!(collection = T::COLLECTION, id = record.id(), "Record updated");
                Some(record)
            }
            Err(e) => {
                error!(error = %e, collection = T::COLLECTION, "Failed to update record");
                None
            }
        }
    }

    /// Already gone counts as removed. Records of other trips are kept.
    pub async fn remove(&self, session: &Session, id: &str) -> bool {
        match self.store.get(id).await {
            Ok(Some(record)) if record.trip_id() != session.trip_id => {
                warn!(collection = T::COLLECTION, id, "Record not found in this trip");
                return false;
            }
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, collection = T::COLLECTION, id, "Failed to load record");
                return false;
            }
        }
        match self.store.delete(id).await {
            Ok(existed) => {
                info!(collection = T::COLLECTION, id, existed, "Record removed");
                true
            }
            Err(e) => {
                error!(error = %e, collection = T::COLLECTION, id, "Failed to delete record");
                false
            }
        }
    }
}

impl TripCollection<ItineraryItem> {
    pub async fn days(&self, session: &Session) -> Vec<ItineraryDay> {
        group_by_day(self.list(session).await)
    }
}

impl TripCollection<Place> {
    pub async fn filtered(&self, session: &Session, filter: PlaceFilter) -> Vec<Place> {
        let mut places = filter.apply(self.list(session).await);
        places.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        places
    }

    pub async fn toggle_visited(&self, session: &Session, id: &str) -> Option<Place> {
        let mut place = self.get(session, id).await?;
        place.visited = !place.visited;
        self.update(session, place).await
    }
}

impl TripCollection<Note> {
    pub async fn sorted(&self, session: &Session) -> Vec<Note> {
        let mut notes = self.list(session).await;
        sort_notes(&mut notes);
        notes
    }
}
