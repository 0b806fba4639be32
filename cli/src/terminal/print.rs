//! Line-oriented output for the subcommands.
//!
//! Everything goes through [`print`], which logs on [`PRINT_TARGET`] so that
//! results share the subscriber (and the spinner) with diagnostics.

use colored::*;
use console::measure_text_width;
use phantom_common::config::Config;
use phantom_common::log::PRINT_TARGET;
use phantom_common::success;
use tracing::info;

use crate::terminal::format::{HEX_COLUMN_WIDTH, HexRow};
use crate::terminal::{banner as art, colors};

pub const WIDTH: usize = 64;
const COLUMN_GAP: usize = 2;

pub fn print(msg: &str) {
    info!(target: PRINT_TARGET, raw_msg = msg);
}

pub fn blank() {
    print("");
}

/// Pads `text` with spaces up to `width` visible columns.
fn pad(text: &str, width: usize) -> String {
    let visible: usize = measure_text_width(text);
    format!("{text}{}", " ".repeat(width.saturating_sub(visible)))
}

pub fn banner(cfg: &Config) {
    if cfg.no_banner || cfg.quiet > 0 {
        return;
    }
    art::print();
    let version: String = format!("v{}", env!("CARGO_PKG_VERSION"));
    let tagline: String = format!("dns · ports · packets  {}", version.color(colors::ACCENT));
    print(&format!("{}{}", " ".repeat(WIDTH.saturating_sub(measure_text_width(&tagline))), tagline));
}

/// `▌ TITLE ········`, hidden in quiet mode.
pub fn section(title: &str, cfg: &Config) {
    if cfg.quiet > 0 {
        return;
    }
    let head: String = format!("▌ {} ", title.to_uppercase());
    let fill: String = "·".repeat(WIDTH.saturating_sub(measure_text_width(&head)));
    print(&format!("{}{}", head.color(colors::PRIMARY).bold(), fill.color(colors::SEPARATOR)));
}

/// Key/value lines with the keys padded to a common width.
pub fn fields(rows: &[(&str, ColoredString)]) {
    let width: usize = rows.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    for (key, value) in rows {
        print(&format!("  {}  {}", pad(key, width).color(colors::SEPARATOR), value));
    }
}

/// One numbered item with its details hanging below it.
pub fn entry(idx: usize, title: &str, details: &[(&str, ColoredString)]) {
    print(&format!(
        "{} {}",
        format!("#{}", idx + 1).color(colors::ACCENT),
        title.color(colors::PRIMARY)
    ));
    let width: usize = details.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    for (i, (key, value)) in details.iter().enumerate() {
        let branch: &str = if i + 1 == details.len() { "╰" } else { "│" };
        print(&format!(
            "  {} {}  {}",
            branch.color(colors::SEPARATOR),
            pad(key, width).color(colors::TEXT_DEFAULT),
            value
        ));
    }
}

/// Column-aligned rows under a dimmed header line.
pub fn table(headers: &[&str], rows: &[Vec<ColoredString>]) {
    let mut widths: Vec<usize> = headers.iter().map(|header| header.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(measure_text_width(cell));
        }
    }

    let gap: String = " ".repeat(COLUMN_GAP);
    let head: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(header, width)| pad(header, *width))
        .collect();
    print(&format!("  {}", head.join(&gap).trim_end().color(colors::SEPARATOR)));

    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| pad(&cell.to_string(), *width))
            .collect();
        print(&format!("  {}", cells.join(&gap).trim_end()));
    }
}

/// A single terse line, used when details are suppressed.
pub fn compact(text: &str) {
    print(&format!("{} {}", "·".color(colors::SEPARATOR), text));
}

/// Offset column dimmed, ascii column highlighted.
pub fn hexdump(rows: &[HexRow]) {
    for row in rows {
        print(&format!(
            "  {}  {:<width$}  {}",
            format!("{:04x}", row.offset).color(colors::SEPARATOR),
            row.hex,
            row.ascii.color(colors::ACCENT),
            width = HEX_COLUMN_WIDTH
        ));
    }
}

/// Final line of a command: a closing rule with the summary, or a success
/// event in quiet mode.
pub fn summary(text: &str, cfg: &Config) {
    if cfg.quiet > 0 {
        success!("{text}");
        return;
    }
    print(&format!("{}", "━".repeat(WIDTH).color(colors::SEPARATOR)));
    print(&format!("  {text}"));
}

pub fn nothing_found(what: &str, cfg: &Config) {
    let text: String = format!("✗ {what}");
    if cfg.quiet > 1 {
        print(&format!("{}", text.red()));
        return;
    }
    let inner: usize = measure_text_width(&text) + 4;
    let margin: String = " ".repeat(WIDTH.saturating_sub(inner + 2) / 2);
    print(&format!("{margin}{}", format!("╭{}╮", "─".repeat(inner)).red()));
    print(&format!("{margin}{}  {}  {}", "│".red(), text.red().bold(), "│".red()));
    print(&format!("{margin}{}", format!("╰{}╯", "─".repeat(inner)).red()));
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
