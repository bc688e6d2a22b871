//! Trips, their participant roster and the session context handed to
//! every ledger call.

use crate::core::cache::Cache;
use crate::core::error::ValidationError;
use crate::core::record::{Record, RecordStore};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const CURRENT_TRIP_KEY: &str = "current_trip";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
}

impl Participant {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ParticipantId::new(id),
            name: name.into(),
        }
    }
}

/// The validated, ordered set of people sharing a trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    participants: Vec<Participant>,
}

impl Roster {
    pub fn new(participants: Vec<Participant>) -> Result<Self, ValidationError> {
        if participants.is_empty() {
            return Err(ValidationError::EmptyRoster);
        }
        let mut seen = HashSet::new();
        for participant in &participants {
            if participant.id.as_str().is_empty() {
                return Err(ValidationError::EmptyName);
            }
            if !seen.insert(&participant.id) {
                return Err(ValidationError::DuplicateParticipant(participant.id.clone()));
            }
        }
        Ok(Self { participants })
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn ids(&self) -> impl Iterator<Item = &ParticipantId> {
        self.participants.iter().map(|p| &p.id)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.participants.iter().any(|p| &p.id == id)
    }

    pub fn require(&self, id: &ParticipantId) -> Result<(), ValidationError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(ValidationError::UnknownParticipant(id.clone()))
        }
    }

    /// Display name for `id`, falling back to the id itself.
    pub fn name_of<'a>(&'a self, id: &'a ParticipantId) -> &'a str {
        self.participants
            .iter()
            .find(|p| &p.id == id)
            .map_or(id.as_str(), |p| p.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub participants: Vec<Participant>,
}

impl Trip {
    pub fn roster(&self) -> Result<Roster, ValidationError> {
        Roster::new(self.participants.clone())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(ValidationError::InvalidDateRange);
            }
        }
        self.roster().map(|_| ())
    }

    /// Inclusive length in days, when both dates are known.
    pub fn length_in_days(&self) -> Option<i64> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some((end - start).num_days() + 1),
            _ => None,
        }
    }
}

impl Record for Trip {
    const COLLECTION: &'static str = "trips";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// Explicit context for ledger calls: which trip, and who is on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub trip_id: String,
    pub roster: Roster,
}

impl Session {
    pub fn new(trip_id: impl Into<String>, roster: Roster) -> Self {
        Self {
            trip_id: trip_id.into(),
            roster,
        }
    }

    pub fn for_trip(trip: &Trip) -> Result<Self, ValidationError> {
        Ok(Self::new(trip.id.clone(), trip.roster()?))
    }
}

pub struct TripRegistry {
    trips: Arc<dyn RecordStore<Trip>>,
    session: Arc<dyn Cache<String>>,
}

impl TripRegistry {
    pub fn new(trips: Arc<dyn RecordStore<Trip>>, session: Arc<dyn Cache<String>>) -> Self {
        Self { trips, session }
    }

    pub async fn create(&self, trip: Trip) -> Option<Trip> {
        if let Err(e) = trip.validate() {
            warn!(error = %e, "Trip not submitted");
            return None;
        }
        match self.trips.create(trip).await {
            Ok(trip) => {
                info!(trip_id = %trip.id, name = %trip.name, "Trip created");
                Some(trip)
            }
            Err(e) => {
                error!(error = %e, "Failed to create trip");
                None
            }
        }
    }

    /// All trips, earliest start first; undated trips last.
    pub async fn list(&self) -> Vec<Trip> {
        let mut trips = match self.trips.list().await {
            Ok(trips) => trips,
            Err(e) => {
                error!(error = %e, "Failed to list trips");
                return Vec::new();
            }
        };
        trips.sort_by(|a, b| {
            let key = |t: &Trip| (t.start_date.is_none(), t.start_date, t.name.clone());
            key(a).cmp(&key(b))
        });
        trips
    }

    pub async fn get(&self, id: &str) -> Option<Trip> {
        match self.trips.get(id).await {
            Ok(trip) => trip,
            Err(e) => {
                error!(error = %e, trip_id = id, "Failed to load trip");
                None
            }
        }
    }

    /// Remembers `id` as the current trip. False when no such trip exists.
    pub async fn select(&self, id: &str) -> bool {
        if self.get(id).await.is_none() {
            warn!(trip_id = id, "Cannot select unknown trip");
            return false;
        }
        self.session
            .put(CURRENT_TRIP_KEY, id.to_string(), None)
            .await;
        info!(trip_id = id, "Current trip selected");
        true
    }

    /// Rebuilds the session for the remembered trip, if any.
    pub async fn restore_session(&self) -> Option<(Trip, Session)> {
        let trip_id = self.session.get(CURRENT_TRIP_KEY).await?;
        debug!(%trip_id, "Restoring session");
        let trip = self.get(&trip_id).await?;
        match Session::for_trip(&trip) {
            Ok(session) => Some((trip, session)),
            Err(e) => {
                warn!(error = %e, %trip_id, "Stored trip has an invalid roster");
                None
            }
        }
    }
}
