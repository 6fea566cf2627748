use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::{LensError, Result};
use crate::fmt::score;
use crate::report::ClassificationReport;

pub fn format_report(report: &ClassificationReport) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Category", "Precision", "Recall", "F1", "Support"]);
    for c in &report.classes {
        table.add_row(vec![
            Cell::new(&c.category),
            Cell::new(score(c.precision)),
            Cell::new(score(c.recall)),
            Cell::new(score(c.f1)),
            Cell::new(c.support),
        ]);
    }
    table.add_row(vec![Cell::new(""), Cell::new(""), Cell::new(""), Cell::new(""), Cell::new("")]);
    table.add_row(vec![
        Cell::new("accuracy".bold()),
        Cell::new(""),
        Cell::new(""),
        Cell::new(score(report.accuracy)),
        Cell::new(report.support),
    ]);
    for (label, avg) in [("macro avg", &report.macro_avg), ("weighted avg", &report.weighted_avg)] {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(score(avg.precision)),
            Cell::new(score(avg.recall)),
            Cell::new(score(avg.f1)),
            Cell::new(report.support),
        ]);
    }

    let mut confusion = Table::new();
    let mut header = vec![Cell::new("actual \\ predicted")];
    header.extend(report.classes.iter().map(|c| Cell::new(&c.category)));
    confusion.set_header(header);
    for (c, row) in report.classes.iter().zip(&report.confusion) {
        let mut cells = vec![Cell::new(&c.category)];
        cells.extend(row.iter().map(|n| Cell::new(n)));
        confusion.add_row(cells);
    }

    format!(
        "{}\n{table}\n\n{}\n{confusion}",
        "Classification Report".bold(),
        "Confusion Matrix".bold()
    )
}

pub fn format_json(report: &ClassificationReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(LensError::from)
}
