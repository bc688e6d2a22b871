pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

pub use cli::AppCommand;
pub use crate::core::config;

use crate::core::balance::{self, Balance};
use crate::core::cache::Cache;
use crate::core::config::AppConfig;
use crate::core::currency::CurrencyRateProvider;
use crate::core::expense::{Expense, ExpenseLedger, ExpenseView, InstallmentPayment};
use crate::core::itinerary::{ItineraryItem, Note, Place, TripCollection};
use crate::core::plan::{PaymentPlan, PlanLedger, PlanPayment, PlanSummary};
use crate::core::rate::{CachedRate, ExchangeRateService};
use crate::core::record::{ChangeEvent, Record, watch};
use crate::core::roster::{Session, Trip, TripRegistry};
use crate::providers::DolarApiProvider;
use crate::store::Store;
use anyhow::{Context, Result, anyhow};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Every collection that can be watched for changes.
pub const COLLECTIONS: [&str; 8] = [
    Trip::COLLECTION,
    Expense::COLLECTION,
    InstallmentPayment::COLLECTION,
    PaymentPlan::COLLECTION,
    PlanPayment::COLLECTION,
    ItineraryItem::COLLECTION,
    Place::COLLECTION,
    Note::COLLECTION,
];

/// The wired application: one store, one rate service and the ledgers
/// built on top of them.
pub struct App {
    pub config: AppConfig,
    pub store: Store,
    pub rates: Arc<ExchangeRateService>,
    pub trips: TripRegistry,
    pub expenses: ExpenseLedger,
    pub plans: PlanLedger,
    pub itinerary: TripCollection<ItineraryItem>,
    pub places: TripCollection<Place>,
    pub notes: TripCollection<Note>,
}

/// Ledger snapshots a balance is computed from.
pub struct TripBalance {
    pub rate: Decimal,
    pub expenses: Vec<ExpenseView>,
    pub plans: PlanSummary,
    pub balance: Balance,
}

impl App {
    pub fn new(
        config: AppConfig,
        store: Store,
        provider: Arc<dyn CurrencyRateProvider>,
    ) -> Result<Self> {
        let rate_cache: Arc<dyn Cache<CachedRate>> = store.cache("rates")?;
        let rates = Arc::new(
            ExchangeRateService::new(provider, rate_cache).with_ttl(config.exchange.rate_ttl()),
        );
        let trips = TripRegistry::new(store.records()?, store.cache("session")?);
        let expenses = ExpenseLedger::new(
            store.records()?,
            store.records()?,
            Arc::clone(&rates),
            config.exchange.default_rate,
        );
        let plans = PlanLedger::new(store.records()?, store.records()?);
        let itinerary = TripCollection::<ItineraryItem>::new(store.records()?);
        let places = TripCollection::<Place>::new(store.records()?);
        let notes = TripCollection::<Note>::new(store.records()?);

        Ok(Self {
            config,
            store,
            rates,
            trips,
            expenses,
            plans,
            itinerary,
            places,
            notes,
        })
    }

    /// Opens the store under the configured data path and the DolarApi
    /// quote source.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let db_path = config.db_path()?;
        let store = Store::open(&db_path)
            .with_context(|| format!("Cannot use the data directory {}", db_path.display()))?;
        let provider = Arc::new(DolarApiProvider::new(&config.exchange.provider.base_url)?);
        Self::new(config, store, provider)
    }

    /// Rate used for conversions right now.
    pub async fn current_rate(&self) -> Decimal {
        self.rates.get_rate(self.config.exchange.default_rate).await
    }

    /// The selected trip and its session.
    pub async fn session(&self) -> Result<(Trip, Session)> {
        self.trips
            .restore_session()
            .await
            .ok_or_else(|| anyhow!("No trip selected. Create one with `trip create` or pick one with `trip use <id>`"))
    }

    pub async fn balance(&self, session: &Session) -> TripBalance {
        let rate = self.current_rate().await;
        let (expenses, plans) = futures::join!(
            self.expenses.list(session, rate),
            self.plans.list(session, rate)
        );
        let plans = PlanSummary::from_views(&plans, rate);
        let balance = balance::compute(&session.roster, &expenses, &plans);
        debug!(%rate, expenses = expenses.len(), "Balance computed");
        TripBalance {
            rate,
            expenses,
            plans,
            balance,
        }
    }

    /// Calls `on_change` for every change made to `collection` through this
    /// `App` until the returned task is aborted. Changes made by other
    /// processes are not observed.
    pub fn watch<F>(&self, collection: &str, on_change: F) -> Result<JoinHandle<()>>
    where
        F: Fn(ChangeEvent) + Send + 'static,
    {
        let changes = match collection {
            c if c == Trip::COLLECTION => self.store.records::<Trip>()?.subscribe(),
            c if c == Expense::COLLECTION => self.store.records::<Expense>()?.subscribe(),
            c if c == InstallmentPayment::COLLECTION => {
                self.store.records::<InstallmentPayment>()?.subscribe()
            }
            c if c == PaymentPlan::COLLECTION => self.store.records::<PaymentPlan>()?.subscribe(),
            c if c == PlanPayment::COLLECTION => self.store.records::<PlanPayment>()?.subscribe(),
            c if c == ItineraryItem::COLLECTION => {
                self.store.records::<ItineraryItem>()?.subscribe()
            }
            c if c == Place::COLLECTION => self.store.records::<Place>()?.subscribe(),
            c if c == Note::COLLECTION => self.store.records::<Note>()?.subscribe(),
            other => {
                return Err(anyhow!(
                    "Unknown collection: {}. Expected one of: {}",
                    other,
                    COLLECTIONS.join(", ")
                ));
            }
        };
        info!(collection, "Watching for changes");
        Ok(watch(changes, on_change))
    }
}

fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    match config_path {
        Some(path) => AppConfig::load_from_path(path),
        None => AppConfig::load(),
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("tripsplit starting...");

    let config = load_config(config_path)?;
    debug!("Loaded config: {config:#?}");

    let app = App::from_config(config)?;
    let result = cli::run(&app, command).await;
    app.store.persist()?;
    result
}
