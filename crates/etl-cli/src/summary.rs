//! Result summary rendering.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::commands::TransformOutcome;

/// Maximum row issues printed in detail.
const MAX_ISSUE_ROWS: usize = 25;

pub fn print_summary(outcome: &TransformOutcome) {
    let report = &outcome.report;
    match &outcome.written {
        Some(result) if result.sheets > 1 => {
            println!(
                "Output: {} ({} sheets)",
                result.path.display(),
                result.sheets
            );
        }
        Some(result) => println!("Output: {}", result.path.display()),
        None => println!("Output (dry run): {}", report.output_path.display()),
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Total rows"),
        header_cell("Accepted"),
        header_cell("Rejected"),
        header_cell("Issues"),
    ]);
    apply_table_style(&mut table);
    for index in 0..4 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    table.add_row(vec![
        Cell::new(report.total_rows),
        Cell::new(report.accepted_rows).fg(Color::Green),
        count_cell(report.rejected_rows, Color::Red),
        count_cell(report.issues.len(), Color::Yellow),
    ]);
    println!("{table}");

    print_issue_table(outcome);
}

fn print_issue_table(outcome: &TransformOutcome) {
    let issues = &outcome.report.issues;
    if issues.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Row"),
        header_cell("Field"),
        header_cell("Reason"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for issue in issues.iter().take(MAX_ISSUE_ROWS) {
        table.add_row(vec![
            Cell::new(issue.row),
            Cell::new(&issue.field),
            Cell::new(&issue.reason),
        ]);
    }
    println!();
    println!("Issues:");
    println!("{table}");
    if issues.len() > MAX_ISSUE_ROWS {
        println!("(and {} more)", issues.len() - MAX_ISSUE_ROWS);
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        Cell::new(count).fg(Color::DarkGrey)
    }
}
