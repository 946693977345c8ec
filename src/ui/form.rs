use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Row, Table, Tabs, Wrap};
use serde_json::Value;
use std::collections::HashMap;

use super::theme::Theme;
use crate::compare::normalize::{is_truthy, text};
use crate::compare::{App, ProviderPayload, VehicleClass, VerdictSource};
use crate::session::{SessionEvent, Trip};

const LOGS_TAB: usize = 3;
const MAX_LOG_LINES: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Pickup,
    Destination,
    Vehicle,
}

impl Field {
    fn next(self) -> Self {
        match self {
            Field::Pickup => Field::Destination,
            Field::Destination => Field::Vehicle,
            Field::Vehicle => Field::Pickup,
        }
    }

    fn previous(self) -> Self {
        match self {
            Field::Pickup => Field::Vehicle,
            Field::Destination => Field::Pickup,
            Field::Vehicle => Field::Destination,
        }
    }
}

/// What the form asks the worker to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormAction {
    Fetch(Trip),
    CompareAndBook { trip: Trip, class: VehicleClass },
    Quit,
}

/// One table row, shown as the agent reported it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRow {
    pub service: String,
    pub price: String,
    pub eta: String,
}

/// Table rows from a raw result: bare or wrapped lists, non-objects skipped,
/// each column taking the first present field.
pub fn service_rows(raw: &Value) -> Vec<ServiceRow> {
    ProviderPayload::classify(raw)
        .entries(true)
        .iter()
        .filter_map(Value::as_object)
        .map(|item| {
            let column = |keys: [&str; 2]| {
                keys.iter()
                    .filter_map(|key| item.get(*key))
                    .find(|value| is_truthy(value))
                    .map(text)
                    .unwrap_or_else(|| "-".to_string())
            };
            ServiceRow {
                service: column(["service", "ride_type"]),
                price: column(["price", "estimated_fare"]),
                eta: column(["eta", "time"]),
            }
        })
        .collect()
}

/// State of the terminal booking form.
pub struct FormState {
    pickup: String,
    destination: String,
    vehicle: VehicleClass,
    focus: Field,
    tables: HashMap<App, Vec<ServiceRow>>,
    logs: Vec<String>,
    status: String,
    status_warn: bool,
    tab: usize,
    busy: bool,
    fetched: bool,
    theme: Theme,
}

impl FormState {
    pub fn new() -> Self {
        Self {
            pickup: String::new(),
            destination: String::new(),
            vehicle: VehicleClass::Cab,
            focus: Field::Pickup,
            tables: HashMap::new(),
            logs: Vec::new(),
            status: "Idle".to_string(),
            status_warn: false,
            tab: 0,
            busy: false,
            fetched: false,
            theme: Theme::dark(),
        }
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    pub fn rows(&self, app: App) -> &[ServiceRow] {
        self.tables.get(&app).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn can_book(&self) -> bool {
        self.fetched && !self.busy
    }

    pub fn showing_logs(&self) -> bool {
        self.tab == LOGS_TAB
    }

    fn log(&mut self, message: impl AsRef<str>) {
        self.logs.push(format!(
            "[{}] {}",
            Local::now().format("%H:%M:%S"),
            message.as_ref()
        ));
        if self.logs.len() > MAX_LOG_LINES {
            let overflow = self.logs.len() - MAX_LOG_LINES;
            self.logs.drain(..overflow);
        }
    }

    fn set_status(&mut self, status: impl Into<String>, warn: bool) {
        self.status = status.into();
        self.status_warn = warn;
    }

    fn trip(&mut self) -> Option<Trip> {
        let trip = Trip::new(&self.pickup, &self.destination);
        if trip.is_none() {
            self.set_status("Please enter pickup and destination", true);
        }
        trip
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<FormAction> {
        if key.kind == KeyEventKind::Release {
            return None;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('q') | KeyCode::Char('c') => Some(FormAction::Quit),
                KeyCode::Char('f') => self.start_fetch(),
                KeyCode::Char('b') => self.start_booking(),
                KeyCode::Char('t') => {
                    self.tab = (self.tab + 1) % (LOGS_TAB + 1);
                    None
                }
                _ => None,
            };
        }

        match key.code {
            KeyCode::Esc => return Some(FormAction::Quit),
            KeyCode::Tab | KeyCode::Down => self.focus = self.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.focus = self.focus.previous(),
            KeyCode::Enter if self.focus == Field::Vehicle => return self.start_fetch(),
            KeyCode::Enter => self.focus = self.focus.next(),
            _ => self.edit_focused(key.code),
        }
        None
    }

    fn edit_focused(&mut self, code: KeyCode) {
        match self.focus {
            Field::Pickup | Field::Destination => {
                let field = if self.focus == Field::Pickup {
                    &mut self.pickup
                } else {
                    &mut self.destination
                };
                match code {
                    KeyCode::Char(c) => field.push(c),
                    KeyCode::Backspace => {
                        field.pop();
                    }
                    _ => {}
                }
            }
            Field::Vehicle => {
                let index = VehicleClass::ALL
                    .iter()
                    .position(|class| *class == self.vehicle)
                    .unwrap_or(0);
                self.vehicle = match code {
                    KeyCode::Left => VehicleClass::ALL[(index + 2) % 3],
                    KeyCode::Right | KeyCode::Char(' ') => VehicleClass::ALL[(index + 1) % 3],
                    KeyCode::Char(c @ '1'..='3') => VehicleClass::from_choice(&c.to_string()),
                    _ => self.vehicle,
                };
            }
        }
    }

    fn start_fetch(&mut self) -> Option<FormAction> {
        if self.busy {
            return None;
        }
        let trip = self.trip()?;

        self.busy = true;
        self.fetched = false;
        self.tables.clear();
        self.tab = 0;
        self.set_status("Fetching prices…", false);
        self.log("Starting price fetch…");
        Some(FormAction::Fetch(trip))
    }

    fn start_booking(&mut self) -> Option<FormAction> {
        if self.busy {
            return None;
        }
        if !self.fetched {
            self.set_status("Fetch prices before booking", true);
            return None;
        }
        let trip = self.trip()?;

        self.busy = true;
        self.set_status("Comparing options…", false);
        self.log("Comparing options…");
        Some(FormAction::CompareAndBook {
            trip,
            class: self.vehicle,
        })
    }

    pub fn apply_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::FetchStarted(app) => {
                self.set_status(format!("Fetching {} prices…", app), false);
                self.log(format!("Fetching {} prices…", app));
            }
            SessionEvent::FetchCompleted { app, raw } => {
                self.tables.insert(app, service_rows(&raw));
                self.log(format!("{} prices updated", app));
            }
            SessionEvent::FetchFailed { app, error } => {
                self.tables.insert(app, Vec::new());
                self.set_status(format!("{} fetch failed", app), true);
                self.log(format!("ERROR: {}: {}", app, error));
            }
            SessionEvent::FetchFinished => {
                self.busy = false;
                self.fetched = true;
                if !self.status_warn {
                    self.set_status("Prices fetched successfully", false);
                }
                self.log("All prices fetched");
            }
            SessionEvent::Compared { options } => {
                self.log(format!("{} matching option(s)", options.len()));
            }
            SessionEvent::Selected(verdict) => {
                let by = match verdict.source {
                    VerdictSource::Model => "model",
                    VerdictSource::Fallback => "price/ETA fallback",
                };
                self.set_status(format!("Selected: {}", verdict.app), false);
                self.log(format!("Best option selected: {} ({})", verdict.app, by));
                self.tab = LOGS_TAB;
            }
            SessionEvent::NoServiceFound => {
                self.busy = false;
                self.set_status("No suitable service found", true);
                self.log("No suitable service found");
            }
            SessionEvent::BookingStarted(app) => {
                self.set_status(format!("Booking on {}…", app), false);
                self.log(format!("Booking ride on {}…", app));
            }
            SessionEvent::Booked { app, result } => {
                self.busy = false;
                if result.success {
                    self.set_status("Booking initiated successfully ✓", false);
                    self.log(format!("Booking initiated on {}", app));
                } else {
                    self.set_status("Booking failed", true);
                    self.log(format!("Booking on {} did not complete", app));
                }
                if let Some(reason) = result.raw_reason {
                    self.log(format!("Agent: {}", reason));
                }
            }
            SessionEvent::BookingFailed { app, error } => {
                self.busy = false;
                self.set_status("Booking failed", true);
                self.log(format!("ERROR: booking on {}: {}", app, error));
            }
        }
    }

    pub fn render(&self, frame: &mut Frame) {
        let theme = &self.theme;
        frame.render_widget(Block::default().style(theme.background_style()), frame.area());

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // Header
                Constraint::Min(12),   // Form and results
                Constraint::Length(1), // Key hints
            ])
            .split(frame.area());

        let header = Paragraph::new(vec![
            Line::styled("SmartCab", theme.title_style()),
            Line::styled("Compare Uber, Ola and Rapido, then book the best ride", theme.subtitle_style()),
        ]);
        frame.render_widget(header, rows[0]);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(38), Constraint::Min(30)])
            .split(rows[1]);

        self.render_trip(frame, columns[0]);
        self.render_results(frame, columns[1]);

        let hints = Paragraph::new(
            "Tab: next field  ←/→: vehicle  Ctrl+F: fetch  Ctrl+B: compare & book  Ctrl+T: tabs  Esc: quit",
        )
        .style(theme.subtitle_style());
        frame.render_widget(hints, rows[2]);
    }

    fn border_style(&self, field: Field) -> Style {
        if self.focus == field {
            self.theme.focused_border_style()
        } else {
            self.theme.block_border_style()
        }
    }

    fn render_trip(&self, frame: &mut Frame, area: Rect) {
        let theme = &self.theme;
        let block = Block::default()
            .title(Span::styled(" Trip Details ", theme.title_style()))
            .borders(Borders::ALL)
            .border_style(theme.block_border_style());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Pickup
                Constraint::Length(3), // Destination
                Constraint::Length(3), // Vehicle
                Constraint::Length(2), // Actions
                Constraint::Min(1),    // Status
            ])
            .split(inner);

        for (field, title, value, area) in [
            (Field::Pickup, " Pickup Location ", &self.pickup, parts[0]),
            (Field::Destination, " Destination ", &self.destination, parts[1]),
        ] {
            let input = Paragraph::new(value.as_str()).style(theme.input_style()).block(
                Block::default()
                    .title(Span::styled(title, theme.label_style()))
                    .borders(Borders::ALL)
                    .border_style(self.border_style(field)),
            );
            frame.render_widget(input, area);
        }

        let choices: Vec<Span> = VehicleClass::ALL
            .iter()
            .flat_map(|class| {
                let label = format!(" {} ", capitalize(class.as_str()));
                let style = if *class == self.vehicle {
                    theme.selected_style().add_modifier(Modifier::BOLD)
                } else {
                    theme.subtitle_style()
                };
                [Span::styled(label, style), Span::raw(" ")]
            })
            .collect();
        let vehicle = Paragraph::new(Line::from(choices)).block(
            Block::default()
                .title(Span::styled(" Vehicle Type ", theme.label_style()))
                .borders(Borders::ALL)
                .border_style(self.border_style(Field::Vehicle)),
        );
        frame.render_widget(vehicle, parts[2]);

        let actions = Line::from(vec![
            Span::styled(" Fetch Prices ", theme.button_style(!self.busy)),
            Span::raw("  "),
            Span::styled(" Compare & Book ", theme.button_style(self.can_book())),
        ]);
        frame.render_widget(Paragraph::new(actions), parts[3]);

        let status = Paragraph::new(self.status.as_str())
            .style(theme.status_style(self.status_warn))
            .wrap(Wrap { trim: true });
        frame.render_widget(status, parts[4]);
    }

    fn render_results(&self, frame: &mut Frame, area: Rect) {
        let theme = &self.theme;
        let block = Block::default()
            .title(Span::styled(" Live Results ", theme.title_style()))
            .borders(Borders::ALL)
            .border_style(theme.block_border_style());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(1)])
            .split(inner);

        let titles = App::ALL
            .iter()
            .map(|app| app.name())
            .chain(std::iter::once("Logs"));
        let tabs = Tabs::new(titles)
            .select(self.tab)
            .style(theme.subtitle_style())
            .highlight_style(theme.selected_style().add_modifier(Modifier::BOLD));
        frame.render_widget(tabs, parts[0]);

        match App::ALL.get(self.tab) {
            Some(app) => self.render_table(frame, parts[1], *app),
            None => self.render_logs(frame, parts[1]),
        }
    }

    fn render_table(&self, frame: &mut Frame, area: Rect, app: App) {
        let theme = &self.theme;
        let rows = self.rows(app).iter().map(|row| {
            Row::new(vec![row.service.clone(), row.price.clone(), row.eta.clone()])
        });
        let table = Table::new(
            rows,
            [
                Constraint::Percentage(50),
                Constraint::Percentage(25),
                Constraint::Percentage(25),
            ],
        )
        .header(Row::new(vec!["Service", "Price (₹)", "ETA (min)"]).style(theme.header_style()))
        .style(theme.block_style());
        frame.render_widget(table, area);
    }

    fn render_logs(&self, frame: &mut Frame, area: Rect) {
        let visible = area.height as usize;
        let start = self.logs.len().saturating_sub(visible);
        let items: Vec<ListItem> = self.logs[start..]
            .iter()
            .map(|line| {
                let style = if line.contains("ERROR") {
                    self.theme.error_style()
                } else {
                    self.theme.block_style()
                };
                ListItem::new(line.as_str()).style(style)
            })
            .collect();
        frame.render_widget(List::new(items), area);
    }
}

impl Default for FormState {
    fn default() -> Self {
        Self::new()
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
