use anyhow::{Context, Result};
use crossterm::event::{self, Event};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

use crate::compare::VehicleClass;
use crate::config::{Interface, SmartCabConfig};
use crate::session::{Orchestrator, ProviderResults, SessionEvent, Trip};
use crate::ui::{prompt, FormAction, FormState};

/// Requests from the form to the session worker.
#[derive(Debug)]
enum WorkerRequest {
    Fetch(Trip),
    CompareAndBook { trip: Trip, class: VehicleClass },
}

pub struct Application {
    config: SmartCabConfig,
    should_quit: bool,
}

impl Application {
    pub fn new(config: SmartCabConfig) -> Result<Self> {
        Ok(Self {
            config,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        match self.config.ui.interface {
            Interface::Form if self.check_terminal_capability() => self.run_form().await,
            Interface::Form => {
                println!("⚠️  Terminal is not interactive, using prompt mode");
                self.run_prompt().await
            }
            Interface::Prompt => self.run_prompt().await,
        }
    }

    fn build_orchestrator(&self, events: mpsc::Sender<SessionEvent>) -> Result<Orchestrator> {
        Ok(Orchestrator::from_config(&self.config)?.with_events(events))
    }

    async fn run_prompt(&mut self) -> Result<()> {
        println!("🚕 SmartCab");
        println!("════════════════════════════════════════");

        let (trip, class) = tokio::task::spawn_blocking(|| {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            prompt::read_trip(&mut input, &mut io::stdout())
        })
        .await
        .context("Prompt task panicked")??;

        let (event_tx, mut event_rx) = mpsc::channel(100);
        let orchestrator = self.build_orchestrator(event_tx)?;
        if !orchestrator.uses_model() {
            info!("Winner will be chosen by price/ETA ordering");
        }

        let session = tokio::spawn(async move { orchestrator.run(&trip, class).await });

        while let Some(event) = event_rx.recv().await {
            println!("\n{}", prompt::format_event(&event));
        }

        let report = session.await.context("Session task panicked")??;
        if report.booking.is_none() {
            println!("\nNothing to book for {}", class);
        }
        Ok(())
    }

    async fn run_form(&mut self) -> Result<()> {
        let (request_tx, mut request_rx) = mpsc::channel::<WorkerRequest>(16);
        let (event_tx, mut event_rx) = mpsc::channel(100);
        let orchestrator = Arc::new(self.build_orchestrator(event_tx)?);

        // The worker owns the fetched results; the form only sees published events.
        tokio::spawn(async move {
            let mut results = ProviderResults::default();

            while let Some(request) = request_rx.recv().await {
                match request {
                    WorkerRequest::Fetch(trip) => {
                        results = orchestrator.fetch_all(&trip).await;
                    }
                    WorkerRequest::CompareAndBook { trip, class } => {
                        let comparison = orchestrator.compare(&results, class).await;
                        if let Some(app) = comparison.choice.winner() {
                            // Failures reach the form as BookingFailed
                            let _ = orchestrator.book(app, &trip, class).await;
                        }
                    }
                }
            }
        });

        let mut terminal = self.setup_terminal()?;
        let mut form = FormState::new();
        let result = self
            .main_loop(&mut terminal, &mut form, &request_tx, &mut event_rx)
            .await;
        self.restore_terminal(&mut terminal)?;

        result
    }

    async fn main_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
        form: &mut FormState,
        request_tx: &mpsc::Sender<WorkerRequest>,
        event_rx: &mut mpsc::Receiver<SessionEvent>,
    ) -> Result<()> {
        while !self.should_quit {
            // Check for progress from the worker
            while let Ok(event) = event_rx.try_recv() {
                form.apply_event(event);
            }

            terminal.draw(|frame| form.render(frame))?;

            // Poll with a short timeout so worker events keep flowing
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    let request = match form.handle_key(key) {
                        Some(FormAction::Quit) => {
                            self.should_quit = true;
                            None
                        }
                        Some(FormAction::Fetch(trip)) => Some(WorkerRequest::Fetch(trip)),
                        Some(FormAction::CompareAndBook { trip, class }) => {
                            Some(WorkerRequest::CompareAndBook { trip, class })
                        }
                        None => None,
                    };
                    if let Some(request) = request {
                        request_tx
                            .send(request)
                            .await
                            .context("Session worker stopped")?;
                    }
                }
            }
        }

        Ok(())
    }

    fn check_terminal_capability(&self) -> bool {
        // Try to enable raw mode briefly to check if terminal is interactive
        match crossterm::terminal::enable_raw_mode() {
            Ok(_) => {
                let _ = crossterm::terminal::disable_raw_mode();
                true
            }
            Err(_) => false,
        }
    }

    fn setup_terminal(&self) -> Result<Terminal<CrosstermBackend<Stdout>>> {
        crossterm::terminal::enable_raw_mode()?;
        crossterm::execute!(
            io::stdout(),
            crossterm::terminal::EnterAlternateScreen,
            crossterm::event::EnableMouseCapture
        )?;
        Ok(Terminal::new(CrosstermBackend::new(io::stdout()))?)
    }

    fn restore_terminal(&self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        crossterm::terminal::disable_raw_mode()?;
        crossterm::execute!(
            terminal.backend_mut(),
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::event::DisableMouseCapture
        )?;
        terminal.show_cursor()?;
        Ok(())
    }
}
