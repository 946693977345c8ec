use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use smartcab::apps::default_apps;
use smartcab::automation::{AgentOutcome, AutomationAgent, AutomationError};
use smartcab::compare::{App, Arbiter, Choice, Normalizer, VehicleClass, VerdictSource};
use smartcab::providers::{CompletionRequest, CompletionResponse, LLMProvider};
use smartcab::session::{Orchestrator, SessionEvent, Trip};

/// Plays the phone: answers price goals per app and remembers booking goals.
struct FakePhone {
    uber: Result<&'static str, &'static str>,
    ola: &'static str,
    rapido: &'static str,
    bookings: Mutex<Vec<String>>,
}

impl FakePhone {
    fn new(uber: Result<&'static str, &'static str>, ola: &'static str, rapido: &'static str) -> Arc<Self> {
        Arc::new(Self {
            uber,
            ola,
            rapido,
            bookings: Mutex::new(Vec::new()),
        })
    }

    fn bookings(&self) -> Vec<String> {
        self.bookings.lock().unwrap().clone()
    }
}

#[async_trait]
impl AutomationAgent for FakePhone {
    fn name(&self) -> &str {
        "fake-phone"
    }

    async fn run(&self, goal: &str) -> Result<AgentOutcome, AutomationError> {
        if goal.contains("Vehicle type preference") {
            self.bookings.lock().unwrap().push(goal.to_string());
            return Ok(AgentOutcome {
                success: true,
                reason: Some("Ride booked".to_string()),
            });
        }

        let reply = if goal.starts_with("Open Uber app.") {
            self.uber
        } else if goal.starts_with("Open Ola app.") {
            Ok(self.ola)
        } else {
            Ok(self.rapido)
        };

        match reply {
            Ok(reason) => Ok(AgentOutcome {
                success: true,
                reason: Some(reason.to_string()),
            }),
            Err(stderr) => Err(AutomationError::Failed {
                status: "exit status: 1".to_string(),
                stderr: stderr.to_string(),
            }),
        }
    }
}

struct BrokenModel;

#[async_trait]
impl LLMProvider for BrokenModel {
    fn name(&self) -> &str {
        "broken"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse> {
        anyhow::bail!("503 Service Unavailable")
    }

    async fn validate_config(&self) -> Result<()> {
        Ok(())
    }
}

const UBER_NO_AUTO: &str = r#"[{"service":"Uber Go","price":325.14,"eta":2},{"service":"Bike Saver","price":224.41,"eta":4}]"#;
const OLA_AUTO: &str = r#"[{"service":"Auto","price":120,"eta":6}]"#;
const RAPIDO_AUTO: &str = r#"[{"ride_type":"Auto","estimated_fare":"₹110","eta":"8 mins"}]"#;

fn collect(rx: &mut mpsc::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_auto_ride_is_booked_on_cheapest_app() {
    let phone = FakePhone::new(Ok(UBER_NO_AUTO), OLA_AUTO, RAPIDO_AUTO);
    let (tx, mut rx) = mpsc::channel(64);
    let orchestrator = Orchestrator::new(
        default_apps(phone.clone()),
        Normalizer::default(),
        Arbiter::fallback_only(),
    )
    .with_events(tx);

    let trip = Trip::new("A", "B").unwrap();
    let report = orchestrator.run(&trip, VehicleClass::Auto).await.unwrap();

    let options = &report.comparison.options;
    assert_eq!(options.len(), 2);
    assert_eq!((options[0].app, options[0].price, options[0].eta), (App::Ola, 120.0, 6));
    assert_eq!((options[1].app, options[1].price, options[1].eta), (App::Rapido, 110.0, 8));

    match report.comparison.choice {
        Choice::Winner(verdict) => {
            assert_eq!(verdict.app, App::Rapido);
            assert_eq!(verdict.source, VerdictSource::Fallback);
        }
        Choice::NoServiceFound => panic!("expected a winner"),
    }

    let bookings = phone.bookings();
    assert_eq!(bookings.len(), 1);
    assert!(bookings[0].starts_with("Open Rapido app."));
    assert!(bookings[0].contains(r#"Set pickup to "A"."#));
    assert!(bookings[0].contains("Vehicle type preference: auto"));
    assert_eq!(report.booking.map(|b| b.success), Some(true));

    let events = collect(&mut rx);
    assert_eq!(events.first(), Some(&SessionEvent::FetchStarted(App::Uber)));
    assert!(matches!(events.last(), Some(SessionEvent::Booked { app: App::Rapido, .. })));
}

#[tokio::test]
async fn test_model_outage_still_books() {
    let phone = FakePhone::new(Ok(UBER_NO_AUTO), OLA_AUTO, RAPIDO_AUTO);
    let orchestrator = Orchestrator::new(
        default_apps(phone.clone()),
        Normalizer::default(),
        Arbiter::new(Some(Arc::new(BrokenModel)), "gemini-2.0-flash"),
    );

    let report = orchestrator
        .run(&Trip::new("A", "B").unwrap(), VehicleClass::Auto)
        .await
        .unwrap();
    assert_eq!(report.comparison.choice.winner(), Some(App::Rapido));
    assert_eq!(phone.bookings().len(), 1);
}

#[tokio::test]
async fn test_no_matching_service_books_nothing() {
    let phone = FakePhone::new(Ok(UBER_NO_AUTO), "[]", "Could not load Rapido");
    let orchestrator = Orchestrator::new(
        default_apps(phone.clone()),
        Normalizer::default(),
        Arbiter::fallback_only(),
    );

    let report = orchestrator
        .run(&Trip::new("A", "B").unwrap(), VehicleClass::Auto)
        .await
        .unwrap();
    assert_eq!(report.comparison.choice, Choice::NoServiceFound);
    assert!(report.booking.is_none());
    assert!(phone.bookings().is_empty());
}

#[tokio::test]
async fn test_failed_uber_fetch_keeps_going() {
    let phone = FakePhone::new(Err("adb: device offline"), OLA_AUTO, RAPIDO_AUTO);
    let (tx, mut rx) = mpsc::channel(64);
    let orchestrator = Orchestrator::new(
        default_apps(phone.clone()),
        Normalizer::default(),
        Arbiter::fallback_only(),
    )
    .with_events(tx);

    let report = orchestrator
        .run(&Trip::new("A", "B").unwrap(), VehicleClass::Auto)
        .await
        .unwrap();

    let uber = report.results.get(App::Uber).unwrap();
    assert!(uber["error"].as_str().unwrap().contains("device offline"));
    assert_eq!(report.results.get(App::Ola).unwrap()["json"], json!([{"service": "Auto", "price": 120, "eta": 6}]));
    assert_eq!(report.comparison.choice.winner(), Some(App::Rapido));

    let events = collect(&mut rx);
    assert!(events
        .iter()
        .any(|event| matches!(event, SessionEvent::FetchFailed { app: App::Uber, .. })));
}
