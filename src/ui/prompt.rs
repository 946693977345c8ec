use anyhow::{bail, Result};
use std::io::{BufRead, Write};

use crate::compare::{VehicleClass, VerdictSource};
use crate::session::{SessionEvent, Trip};

/// Ask for pickup, destination and vehicle class. Blank locations are asked
/// again; an unrecognized vehicle choice means cab.
pub fn read_trip<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<(Trip, VehicleClass)> {
    let trip = loop {
        let pickup = ask(input, output, "Enter pickup location: ")?;
        let destination = ask(input, output, "Enter destination: ")?;
        match Trip::new(&pickup, &destination) {
            Some(trip) => break trip,
            None => writeln!(output, "Please enter pickup and destination")?,
        }
    };

    writeln!(output, "Choose vehicle type:")?;
    writeln!(output, "  1. Cab")?;
    writeln!(output, "  2. Auto")?;
    writeln!(output, "  3. Bike")?;
    let choice = ask(input, output, "Enter choice (1/2/3): ")?;

    Ok((trip, VehicleClass::from_choice(&choice)))
}

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> Result<String> {
    write!(output, "{}", prompt)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        bail!("Input closed");
    }
    Ok(line.trim().to_string())
}

/// Console text for one session event.
pub fn format_event(event: &SessionEvent) -> String {
    match event {
        SessionEvent::FetchStarted(app) => format!("Fetching {} prices...", app),
        SessionEvent::FetchCompleted { app, raw } => {
            let body = serde_json::to_string_pretty(raw).unwrap_or_else(|_| raw.to_string());
            format!("{} result:\n{}", app, body)
        }
        SessionEvent::FetchFailed { app, error } => format!("{} fetch failed: {}", app, error),
        SessionEvent::FetchFinished => "All prices fetched".to_string(),
        SessionEvent::Compared { options } => {
            let mut text = format!("{} matching option(s)", options.len());
            for option in options {
                text.push_str(&format!(
                    "\n  {:<7} ₹{:<9.2} {} min",
                    option.app.name(),
                    option.price,
                    option.eta
                ));
            }
            text
        }
        SessionEvent::Selected(verdict) => {
            let by = match verdict.source {
                VerdictSource::Model => "language model",
                VerdictSource::Fallback => "price/ETA ordering",
            };
            format!("Best option: {} (chosen by {})", verdict.app, by)
        }
        SessionEvent::NoServiceFound => "No suitable service found".to_string(),
        SessionEvent::BookingStarted(app) => format!("Booking ride on {}...", app),
        SessionEvent::Booked { app, result } => {
            let status = if result.success {
                "Booking initiated successfully"
            } else {
                "Booking did not complete"
            };
            let body = serde_json::to_string_pretty(&result.to_value()).unwrap_or_default();
            format!("{} on {}\n{}", status, app, body)
        }
        SessionEvent::BookingFailed { app, error } => format!("Booking on {} failed: {}", app, error),
    }
}
