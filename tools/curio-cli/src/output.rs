//! Output formatting for the CLI.
//!
//! Human-readable messages are suppressed with `--json`; only the JSON
//! documents a command emits reach stdout then.

use std::time::Duration;

use console::{style, StyledObject};
use curio_commerce::checkout::CheckoutState;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;

#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Output handler for CLI messages.
#[derive(Clone)]
pub struct Output {
    verbose: bool,
    json: bool,
}

impl Output {
    pub fn new(verbose: bool, json: bool) -> Self {
        Self { verbose, json }
    }

    fn emit(&self, stream: Stream, marker: StyledObject<&str>, msg: impl std::fmt::Display) {
        if self.json {
            return;
        }
        match stream {
            Stream::Stdout => println!("{} {}", marker, msg),
            Stream::Stderr => eprintln!("{} {}", marker, msg),
        }
    }

    pub fn info(&self, msg: &str) {
        self.emit(Stream::Stdout, style("ℹ").blue(), msg);
    }

    pub fn success(&self, msg: &str) {
        self.emit(Stream::Stdout, style("✓").green(), msg);
    }

    pub fn warn(&self, msg: &str) {
        self.emit(Stream::Stderr, style("⚠").yellow(), msg);
    }

    /// Errors are reported in JSON mode too, as `{"error": ..}` on stderr.
    pub fn error(&self, msg: &str) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        } else {
            self.emit(Stream::Stderr, style("✗").red(), style(msg).red());
        }
    }

    /// Only shown with `--verbose`.
    pub fn debug(&self, msg: &str) {
        if self.verbose {
            self.emit(Stream::Stderr, style("→").dim(), style(msg).dim());
        }
    }

    pub fn header(&self, msg: &str) {
        if !self.json {
            println!("\n{}", style(msg).bold().underlined());
        }
    }

    /// `[n/total] msg`
    pub fn step(&self, num: usize, total: usize, msg: &str) {
        let counter = format!("[{}/{}]", num, total);
        if !self.json {
            println!("{} {}", style(counter).dim(), msg);
        }
    }

    /// Pretty-printed JSON on stdout, regardless of mode.
    pub fn json<T: serde::Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{}", text),
            Err(e) => self.error(&format!("Failed to encode output: {}", e)),
        }
    }

    pub fn kv(&self, key: &str, value: &str) {
        if !self.json {
            println!("  {}: {}", style(key).dim(), value);
        }
    }

    /// Columns left-aligned and padded to `widths`.
    pub fn table_row(&self, cols: &[&str], widths: &[usize]) {
        if self.json {
            return;
        }
        let row = cols
            .iter()
            .zip(widths)
            .map(|(col, width)| format!("{:<width$}", col, width = *width))
            .collect::<Vec<_>>()
            .join("  ");
        println!("  {}", row.trim_end());
    }

    /// Spinner shown while waiting on the gateway; hidden in JSON mode.
    pub fn spinner(&self, msg: &str) -> ProgressBar {
        if self.json {
            return ProgressBar::hidden();
        }
        let spinner = ProgressBar::new_spinner().with_message(msg.to_string());
        if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            spinner.set_style(template);
        }
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }

    pub fn is_json(&self) -> bool {
        self.json
    }
}

/// Colored label for a checkout state.
pub fn state_badge(state: CheckoutState) -> String {
    let name = state.display_name();
    match state {
        CheckoutState::PaymentSucceeded => style(name).green().to_string(),
        CheckoutState::OrderCreating | CheckoutState::PaymentInProgress => {
            style(name).yellow().to_string()
        }
        CheckoutState::PaymentFailed => style(name).red().to_string(),
        CheckoutState::Cart => style(name).dim().to_string(),
        _ => name.to_string(),
    }
}

/// Format a rate such as `0.0725` as `7.25%`.
pub fn format_rate(rate: Decimal) -> String {
    format!("{}%", (rate * Decimal::ONE_HUNDRED).normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(Decimal::from_str("0.0725").unwrap()), "7.25%");
        assert_eq!(format_rate(Decimal::from_str("0.10").unwrap()), "10%");
        assert_eq!(format_rate(Decimal::ZERO), "0%");
    }
}
