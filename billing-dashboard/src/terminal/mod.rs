//! Line-oriented terminal front end.

pub mod calendar;
pub mod frontend;

pub use calendar::{LiveInstance, TerminalCalendar};
pub use frontend::TerminalFrontend;

use billing_client::{domain::parse_iso_date, CustomerId};

use crate::{
    calendar::{CalendarAction, CalendarEvent, Step},
    dashboard::Event,
};

pub const HELP: &str = "\
commands:
  customers                 reload the customer list
  customer [id]             select a customer (no id clears the selection)
  prev | next               move the calendar one month
  range <start> <end>       select a date range (YYYY-MM-DD)
  clear                     clear the date range
  export <kwh>              exported energy for the period
  import-rate <rate>        tariff per imported kWh
  export-rate <rate>        credit per exported kWh
  compute                   compute and display the bill
  show                      print the results panel
  help | quit";

#[derive(Debug)]
pub enum Input {
    Event(Event),
    Help,
    Quit,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}', type 'help' for a list")]
    Unknown(String),
    #[error("'{0}' needs {1}")]
    MissingArgument(&'static str, &'static str),
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

/// Parse one input line. Calendar commands are bound to `instance`, the
/// calendar currently mounted. Blank lines yield `None`.
pub fn parse_command(line: &str, instance: u64) -> Result<Option<Input>, CommandError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };

    let calendar = |action| Input::Event(Event::Calendar(CalendarEvent { instance, action }));

    let input = match word {
        "" => return Ok(None),
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        "customers" => Input::Event(Event::ReloadCustomers),
        "customer" => Input::Event(Event::CustomerChanged(CustomerId::from(rest))),
        "prev" => calendar(CalendarAction::Navigate(Step::Previous)),
        "next" => calendar(CalendarAction::Navigate(Step::Next)),
        "clear" => calendar(CalendarAction::Cancel),
        "range" => {
            let mut parts = rest.split_whitespace();
            let (Some(start), Some(end)) = (parts.next(), parts.next()) else {
                return Err(CommandError::MissingArgument("range", "a start and an end date"));
            };
            let start = parse_iso_date(start).ok_or_else(|| CommandError::InvalidDate(start.to_string()))?;
            let end = parse_iso_date(end).ok_or_else(|| CommandError::InvalidDate(end.to_string()))?;
            calendar(CalendarAction::Apply { start, end })
        }
        "export" => Input::Event(Event::ExportKwhInput(rest.to_string())),
        "import-rate" => Input::Event(Event::ImportRateInput(rest.to_string())),
        "export-rate" => Input::Event(Event::ExportRateInput(rest.to_string())),
        "compute" => Input::Event(Event::ComputeRequested),
        "show" => Input::Event(Event::ShowResults),
        other => return Err(CommandError::Unknown(other.to_string())),
    };

    Ok(Some(input))
}
