//! Verbatim console output routed through tracing, so it lands above any
//! running phase spinner instead of tearing it.

use std::fmt::Display;

use colored::*;
use console::measure_text_width;
use tracing::info;

use crate::terminal::colors;

pub const WIDTH: usize = 64;
pub const PRINT_TARGET: &str = "reconr::print";
pub const RAW_FIELD: &str = "raw_msg";

const LABEL_WIDTH: usize = 14;

#[macro_export]
macro_rules! rprint {
    () => {
        $crate::terminal::print::print("");
    };
    ($msg:expr) => {
        $crate::terminal::print::print($msg);
    };
}

/// Writes `msg` verbatim.
pub fn print(msg: &str) {
    info!(target: PRINT_TARGET, raw_msg = msg);
}

pub fn banner() {
    let title = format!(" reconr {} ", env!("CARGO_PKG_VERSION"));
    print(&framed(&title.bright_green().bold().to_string(), '═'));
}

/// `── TITLE ──────` across the full width.
pub fn header(title: &str) {
    let title = format!(" {} ", title.to_uppercase());
    print(&framed(&title.color(colors::PRIMARY).to_string(), '─'));
}

pub fn rule() {
    print(&"═".repeat(WIDTH).color(colors::SEPARATOR).to_string());
}

/// `label ......: value`, labels padded to a common column.
pub fn field(label: &str, value: impl Display) {
    print(&format!("  {} {value}", padded_label(label).color(colors::PRIMARY)));
}

/// One failed phase, its message indented beneath it.
pub fn failure(idx: usize, phase: &str, message: &str) {
    print(&format!(
        "  {} {}",
        format!("[{}]", idx + 1).color(colors::ACCENT),
        phase.color(colors::ERROR).bold()
    ));
    print(&format!("      {} {message}", "└─".color(colors::SEPARATOR)));
}

pub fn centered(msg: &str) {
    let pad = WIDTH.saturating_sub(measure_text_width(msg)) / 2;
    print(&format!("{}{msg}", " ".repeat(pad)));
}

fn framed(title: &str, fill: char) -> String {
    let rest = WIDTH.saturating_sub(measure_text_width(title) + 2);
    format!(
        "{}{title}{}",
        fill.to_string().repeat(2).color(colors::SEPARATOR),
        fill.to_string().repeat(rest).color(colors::SEPARATOR)
    )
}

fn padded_label(label: &str) -> String {
    let dots = LABEL_WIDTH.saturating_sub(label.chars().count());
    format!("{label} {}:", ".".repeat(dots))
}
