//! Output formatting module
//!
//! Renders poll events as colored text lines or JSON lines, and slot lists
//! as tables or JSON.

use chrono::{DateTime, FixedOffset, Utc};
use colored::{ColoredString, Colorize};
use serde::Serialize;
use std::fmt::Display;
use tabled::{Table, Tabled};

use semeru_core::{CapacitySlot, PollEvent, SlotStatus};

/// Western Indonesia Time, UTC+7
const WIB_OFFSET_SECS: i32 = 7 * 3600;

/// Output format enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "table" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid format: {}. Use 'text' or 'json'", s)),
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

// =============================================================================
// Slot rows
// =============================================================================

/// Slot row for table display
#[derive(Debug, Serialize, Tabled)]
pub struct SlotRow {
    #[tabled(rename = "Date")]
    pub date: String,
    #[tabled(rename = "Label")]
    pub label: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Remaining")]
    pub remaining: String,
}

impl From<&CapacitySlot> for SlotRow {
    fn from(slot: &CapacitySlot) -> Self {
        Self {
            date: slot.date.to_string(),
            label: slot.label.clone(),
            status: slot.status.to_string(),
            remaining: slot
                .remaining
                .map_or_else(|| "-".to_string(), |n| n.to_string()),
        }
    }
}

/// Print data in the specified format
pub fn print_output<T>(data: &[T], format: OutputFormat) -> anyhow::Result<()>
where
    T: Serialize + Tabled,
{
    match format {
        OutputFormat::Text => {
            if data.is_empty() {
                println!("No slots found.");
            } else {
                let table = Table::new(data).to_string();
                println!("{}", table);
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(data)?;
            println!("{}", json);
        }
    }
    Ok(())
}

/// Print an info message (respects quiet mode)
pub fn print_info(message: &str, quiet: bool) {
    if !quiet {
        println!("{}", message);
    }
}

// =============================================================================
// Event reporter
// =============================================================================

/// Terminal renderer for poll events
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    format: OutputFormat,
    quiet: bool,
}

impl Reporter {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    /// Print one event; failures to serialize are logged, never fatal
    pub fn report(&self, event: &PollEvent) {
        match self.format {
            OutputFormat::Json => match serde_json::to_string(event) {
                Ok(line) => println!("{}", line),
                Err(e) => log::error!("[cli] cannot serialize event: {}", e),
            },
            OutputFormat::Text => {
                if let Some(line) = self.render_text(event) {
                    if matches!(event, PollEvent::Retrying { .. }) {
                        eprintln!("{}", line);
                    } else {
                        println!("{}", line);
                    }
                }
            }
        }
    }

    /// Text line for an event; `None` when quiet mode hides it
    pub fn render_text(&self, event: &PollEvent) -> Option<String> {
        let body: ColoredString = match event {
            PollEvent::Slot(slot_event) => {
                let line = slot_line(&slot_event.slot);
                if slot_event.changed {
                    line
                } else {
                    line.dimmed()
                }
            }
            PollEvent::TargetMissing {
                target, year_month, ..
            } => format!("{} is not listed in the {} capacity table", target, year_month)
                .yellow(),
            PollEvent::Retrying {
                kind,
                message,
                delay_ms,
                ..
            } => format!(
                "retrying in {}s after {}: {}",
                format_secs(*delay_ms),
                kind,
                message
            )
            .yellow(),
            PollEvent::SessionRefreshed { reason, .. } => {
                if self.quiet {
                    return None;
                }
                format!("session refreshed ({})", reason).dimmed()
            }
            PollEvent::Stopped { .. } => {
                if self.quiet {
                    return None;
                }
                "stopped".dimmed()
            }
        };
        Some(format!("[{}] {}", format_wib(event.timestamp()), body))
    }
}

fn slot_line(slot: &CapacitySlot) -> ColoredString {
    match slot.status {
        SlotStatus::Available => {
            let line = match slot.remaining {
                Some(n) => format!("{}: AVAILABLE ({} remaining)", slot.label, n),
                None => format!("{}: AVAILABLE", slot.label),
            };
            line.green().bold()
        }
        SlotStatus::Full => format!("{}: FULL", slot.label).red(),
        SlotStatus::Unknown => format!("{}: UNKNOWN ({})", slot.label, slot.status_text).yellow(),
    }
}

fn format_secs(millis: u64) -> String {
    if millis % 1000 == 0 {
        (millis / 1000).to_string()
    } else {
        format!("{:.1}", millis as f64 / 1000.0)
    }
}

/// Timestamp as local booking-site time
pub fn format_wib(ts: DateTime<Utc>) -> String {
    match FixedOffset::east_opt(WIB_OFFSET_SECS) {
        Some(wib) => ts
            .with_timezone(&wib)
            .format("%Y-%m-%d %H:%M:%S WIB")
            .to_string(),
        None => ts.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    }
}
