use std::time::Duration;

use colored::*;
use tracing::info;

pub const PRINT_TARGET: &str = "relayr::print";
pub const TOTAL_WIDTH: usize = 64;

/// Writes `msg` to stdout verbatim, without a level glyph.
pub fn print(msg: &str) {
    info!(target: PRINT_TARGET, raw_msg = msg);
}

pub fn header(msg: &str) {
    let formatted: String = format!("⟦ {} ⟧", msg);
    let msg_len: usize = formatted.chars().count();

    let dash_count: usize = TOTAL_WIDTH.saturating_sub(msg_len);
    let left: usize = dash_count / 2;
    let right: usize = dash_count - left;

    let line: ColoredString = format!(
        "{}{}{}",
        "─".repeat(left),
        formatted.to_uppercase().bright_green(),
        "─".repeat(right)
    )
    .bright_black();

    print(&format!("{}", line));
}

pub fn fat_separator() {
    let sep: ColoredString = "═".repeat(TOTAL_WIDTH).bright_black();
    print(&format!("{}", sep));
}

pub fn centerln(msg: &str) {
    let space = " ".repeat(TOTAL_WIDTH.saturating_sub(console::measure_text_width(msg)) / 2);
    print(&format!("{}{}{}", space, msg, space));
}

/// Prints a rendered table line by line.
pub fn table(rendered: &str) {
    for line in rendered.lines() {
        print(line);
    }
}

pub fn summary(reachable: usize, probed: usize, total_time: Duration) {
    let reachable: ColoredString = format!("{reachable}/{probed} relays").bold().green();
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    fat_separator();
    centerln(&format!("Probing Complete: {reachable} answered in {total_time}"));
}
