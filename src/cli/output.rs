//! Shared CLI output helpers for consistent terminal output.
//!
//! Color scheme (auto-disabled off-tty and under NO_COLOR):
//! - Green: success
//! - Red: errors
//! - Yellow: warnings
//! - Cyan: hints, paths, values
//! - Bold: section headers

use console::style;
use std::fmt::Display;
use std::io::{self, Write as IoWrite};

const RULE_WIDTH: usize = 56;

/// Print a success message with checkmark.
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green(), msg);
}

/// Print an error message to stderr.
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red().for_stderr(), msg);
}

/// Print a warning message.
pub fn warn(msg: &str) {
    println!("{} {}", style("⚠").yellow(), msg);
}

/// Print a hint message.
pub fn hint(msg: &str) {
    println!("{} {}", style("→").cyan(), style(msg).cyan());
}

/// Print a bold section header over a rule.
pub fn section(title: &str) {
    println!();
    println!("{}", style(title).bold());
    println!("{}", style("─".repeat(RULE_WIDTH)).dim());
}

/// Print a key-value pair (label dimmed, value bold).
pub fn kv(label: &str, value: impl Display) {
    println!("  {}  {}", style(label).dim(), style(value).bold());
}

/// Print a list item with bullet.
pub fn list_item(item: &str) {
    println!("  • {}", item);
}

/// Start a progress line in the format `label... `.
///
/// Finish it with [`progress_done`] or [`progress_note`].
pub fn progress(label: &str) {
    print!("{} ", style(format!("{}...", label)).dim());
    let _ = io::stdout().flush();
}

/// Finish a progress line with ok/failed.
pub fn progress_done(ok: bool) {
    if ok {
        println!("{}", style("ok").green());
    } else {
        println!("{}", style("failed").red());
    }
}

/// Finish a progress line with a neutral note, e.g. `already satisfied`.
pub fn progress_note(note: &str) {
    println!("{}", style(note).dim());
}

/// Print a single probe tick without ending the line.
pub fn tick() {
    print!(".");
    let _ = io::stdout().flush();
}

/// End a tick run.
pub fn tick_end() {
    println!();
}

/// End the current tick run with a dimmed note; further ticks continue on
/// the next line.
pub fn tick_note(note: &str) {
    println!(" {}", style(note).dim());
}
