pub mod orchestrator;

use serde_json::Value;

use crate::automation::TaskResult;
use crate::compare::{App, RawProviderResult, RideOption, Verdict};

pub use orchestrator::{Orchestrator, SessionReport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    pub pickup: String,
    pub destination: String,
}

impl Trip {
    /// Trimmed trip, or `None` when either end is blank.
    pub fn new(pickup: &str, destination: &str) -> Option<Self> {
        let (pickup, destination) = (pickup.trim(), destination.trim());
        if pickup.is_empty() || destination.is_empty() {
            return None;
        }
        Some(Self {
            pickup: pickup.to_string(),
            destination: destination.to_string(),
        })
    }
}

/// One slot per app, each written once per fetch round.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderResults {
    uber: Option<RawProviderResult>,
    ola: Option<RawProviderResult>,
    rapido: Option<RawProviderResult>,
}

impl ProviderResults {
    fn slot_mut(&mut self, app: App) -> &mut Option<RawProviderResult> {
        match app {
            App::Uber => &mut self.uber,
            App::Ola => &mut self.ola,
            App::Rapido => &mut self.rapido,
        }
    }

    pub fn record(&mut self, app: App, raw: RawProviderResult) {
        *self.slot_mut(app) = Some(raw);
    }

    pub fn get(&self, app: App) -> Option<&RawProviderResult> {
        match app {
            App::Uber => self.uber.as_ref(),
            App::Ola => self.ola.as_ref(),
            App::Rapido => self.rapido.as_ref(),
        }
    }

    /// Slot value, treating an unfetched slot as `null`.
    pub fn raw(&self, app: App) -> &RawProviderResult {
        static MISSING: Value = Value::Null;
        self.get(app).unwrap_or(&MISSING)
    }

    pub fn is_complete(&self) -> bool {
        App::ALL.into_iter().all(|app| self.get(app).is_some())
    }
}

/// Progress published by the session worker, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    FetchStarted(App),
    FetchCompleted { app: App, raw: RawProviderResult },
    FetchFailed { app: App, error: String },
    FetchFinished,
    Compared { options: Vec<RideOption> },
    Selected(Verdict),
    NoServiceFound,
    BookingStarted(App),
    Booked { app: App, result: TaskResult },
    BookingFailed { app: App, error: String },
}
