use colored::Colorize;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

use crate::cards::{Card, Suit};
use crate::equity::EquityReport;
use crate::hand_evaluator::ALL_CATEGORIES;

pub fn equity_bar(equity: f64, width: usize) -> String {
    let filled = ((equity.clamp(0.0, 1.0) * width as f64) as usize).min(width);
    let bar: String = "\u{2588}".repeat(filled) + &"\u{2591}".repeat(width - filled);
    let pct = format!("{:.1}%", equity * 100.0);

    if equity >= 0.6 {
        format!("{} {}", bar.green(), pct)
    } else if equity >= 0.4 {
        format!("{} {}", bar.yellow(), pct)
    } else {
        format!("{} {}", bar.red(), pct)
    }
}

pub fn board_display(cards: &[Card]) -> String {
    cards
        .iter()
        .map(|card| {
            let text = card.pretty();
            match card.suit {
                Suit::Spades => text.white().to_string(),
                Suit::Hearts => text.red().to_string(),
                Suit::Diamonds => text.blue().to_string(),
                Suit::Clubs => text.green().to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn result_table(report: &EquityReport) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Metric").set_alignment(CellAlignment::Left),
        Cell::new("Value").set_alignment(CellAlignment::Right),
    ]);

    let result = &report.result;
    let rows = [
        ("Win", format!("{:.2}%", result.win * 100.0)),
        ("Tie", format!("{:.2}%", result.tie * 100.0)),
        ("Lose", format!("{:.2}%", result.lose() * 100.0)),
        ("Equity", format!("{:.2}%", result.equity() * 100.0)),
        ("Trials", format!("{}", report.trials)),
        ("Method", report.method.to_string()),
    ];
    for (label, value) in rows {
        table.add_row(vec![
            Cell::new(label.bold().to_string()),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]);
    }
    if report.iterations_per_second > 0.0 {
        table.add_row(vec![
            Cell::new("Iterations/s".bold().to_string()),
            Cell::new(format!("{:.0}", report.iterations_per_second))
                .set_alignment(CellAlignment::Right),
        ]);
    }

    table.to_string()
}

/// Category shares from strongest to weakest, skipping unseen categories.
pub fn histogram_table(report: &EquityReport) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Hand"),
        Cell::new("Share").set_alignment(CellAlignment::Right),
        Cell::new(""),
    ]);

    for category in ALL_CATEGORIES.iter().rev() {
        if let Some(&share) = report.histogram.get(category) {
            let width = (share * 20.0).round() as usize;
            table.add_row(vec![
                Cell::new(category.to_string()),
                Cell::new(format!("{:.2}%", share * 100.0)).set_alignment(CellAlignment::Right),
                Cell::new("\u{2588}".repeat(width).cyan().to_string()),
            ]);
        }
    }

    table.to_string()
}

pub fn progress_line(report: &EquityReport) -> String {
    format!(
        "  {:>9} trials  win {:>5.1}%  tie {:>4.1}%  {:>10.0} it/s",
        report.trials,
        report.result.win * 100.0,
        report.result.tie * 100.0,
        report.iterations_per_second,
    )
}

pub fn print_section(title: &str, content: &str) {
    println!("\n{}", title.cyan().bold());
    println!("{}", content);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "Error:".red().bold(), msg);
}
