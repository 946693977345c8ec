use anyhow::{Context, Result};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use super::{ProviderResults, SessionEvent, Trip};
use crate::apps::{default_apps, RideApp};
use crate::automation::{AutomationAgent, CommandAgent, DemoAgent, TaskResult};
use crate::compare::{compare_and_choose, App, Arbiter, Choice, Comparison, Normalizer, VehicleClass};
use crate::config::SmartCabConfig;

/// Everything a finished session produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub results: ProviderResults,
    pub comparison: Comparison,
    pub booking: Option<TaskResult>,
}

/// Drives fetch, compare and book in sequence, publishing progress as it goes.
pub struct Orchestrator {
    apps: Vec<Arc<dyn RideApp>>,
    normalizer: Normalizer,
    arbiter: Arbiter,
    events: Option<mpsc::Sender<SessionEvent>>,
}

impl Orchestrator {
    pub fn new(apps: Vec<Arc<dyn RideApp>>, normalizer: Normalizer, arbiter: Arbiter) -> Self {
        Self {
            apps,
            normalizer,
            arbiter,
            events: None,
        }
    }

    pub fn from_config(config: &SmartCabConfig) -> Result<Self> {
        let command = CommandAgent::new(config.automation.clone());
        let agent: Arc<dyn AutomationAgent> = if command.is_available() || !config.automation.demo_when_missing {
            Arc::new(command)
        } else {
            warn!(
                "'{}' not found on PATH, using demo automation agent",
                config.automation.command
            );
            Arc::new(DemoAgent::new())
        };

        let arbiter = Arbiter::from_config(&config.arbiter).context("Failed to build arbiter")?;
        Ok(Self::new(
            default_apps(agent),
            Normalizer::new(config.vehicles.clone()),
            arbiter,
        ))
    }

    pub fn with_events(mut self, events: mpsc::Sender<SessionEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn uses_model(&self) -> bool {
        self.arbiter.uses_model()
    }

    async fn publish(&self, event: SessionEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event).await;
        }
    }

    fn app_for(&self, app: App) -> Result<&Arc<dyn RideApp>> {
        self.apps
            .iter()
            .find(|candidate| candidate.app() == app)
            .with_context(|| format!("No automation adapter registered for {}", app))
    }

    /// Fetch every app in turn. A failed fetch leaves an error marker in its
    /// slot and the remaining apps are still tried.
    pub async fn fetch_all(&self, trip: &Trip) -> ProviderResults {
        let mut results = ProviderResults::default();

        for app in &self.apps {
            let name = app.app();
            info!("Fetching {} prices", name);
            self.publish(SessionEvent::FetchStarted(name)).await;

            match app.fetch_prices(&trip.pickup, &trip.destination).await {
                Ok(raw) => {
                    results.record(name, raw.clone());
                    self.publish(SessionEvent::FetchCompleted { app: name, raw }).await;
                }
                Err(e) => {
                    warn!("{} fetch failed: {}", name, e);
                    let error = e.to_string();
                    results.record(name, json!({ "error": &error }));
                    self.publish(SessionEvent::FetchFailed { app: name, error }).await;
                }
            }
        }

        self.publish(SessionEvent::FetchFinished).await;
        results
    }

    pub async fn compare(&self, results: &ProviderResults, class: VehicleClass) -> Comparison {
        let comparison = compare_and_choose(
            &self.normalizer,
            &self.arbiter,
            results.raw(App::Uber),
            results.raw(App::Ola),
            results.raw(App::Rapido),
            class,
        )
        .await;
        info!("{} {} option(s) after normalization", comparison.options.len(), class);

        self.publish(SessionEvent::Compared {
            options: comparison.options.clone(),
        })
        .await;
        match comparison.choice {
            Choice::Winner(verdict) => self.publish(SessionEvent::Selected(verdict)).await,
            Choice::NoServiceFound => self.publish(SessionEvent::NoServiceFound).await,
        }
        comparison
    }

    pub async fn book(&self, app: App, trip: &Trip, class: VehicleClass) -> Result<TaskResult> {
        info!("Booking {} on {}", class, app);
        self.publish(SessionEvent::BookingStarted(app)).await;

        let booking = match self.app_for(app) {
            Ok(adapter) => adapter
                .book_ride(&trip.pickup, &trip.destination, class)
                .await
                .map_err(anyhow::Error::from),
            Err(e) => Err(e),
        };

        match booking {
            Ok(result) => {
                self.publish(SessionEvent::Booked {
                    app,
                    result: result.clone(),
                })
                .await;
                Ok(result)
            }
            Err(e) => {
                self.publish(SessionEvent::BookingFailed {
                    app,
                    error: format!("{:#}", e),
                })
                .await;
                Err(e.context(format!("Booking on {} failed", app)))
            }
        }
    }

    /// Full session: fetch, compare, then book the winner unless nothing matched.
    pub async fn run(&self, trip: &Trip, class: VehicleClass) -> Result<SessionReport> {
        let span = info_span!("session", id = %Uuid::new_v4());
        async {
            let results = self.fetch_all(trip).await;
            let comparison = self.compare(&results, class).await;

            let booking = match comparison.choice.winner() {
                Some(app) => Some(self.book(app, trip, class).await?),
                None => {
                    info!("No service found for {}", class);
                    None
                }
            };

            Ok::<_, anyhow::Error>(SessionReport {
                results,
                comparison,
                booking,
            })
        }
        .instrument(span)
        .await
    }
}
