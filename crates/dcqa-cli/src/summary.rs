use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use dcqa_model::Priority;

use crate::types::RunSummary;

pub fn print_summary(summary: &RunSummary) {
    println!(
        "Plans: {}  Budgets: {}  Batches: {}",
        summary.plans, summary.budgets, summary.batches
    );

    let mut table = Table::new();
    table.set_header(vec![header_cell("Issue"), header_cell("Count")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    if summary.by_issue.is_empty() {
        table.add_row(vec![dim_cell("no exceptions"), dim_cell("-")]);
    }
    for (issue, count) in &summary.by_issue {
        table.add_row(vec![Cell::new(issue), Cell::new(count)]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(summary.exceptions()).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");

    if !summary.by_priority.is_empty() {
        let line: Vec<String> = summary
            .by_priority
            .iter()
            .map(|(priority, count)| format!("{priority}: {count}"))
            .collect();
        println!("By priority: {}", line.join("  "));
    }
    if let Some(count) = summary.by_priority.get(&Priority::P1) {
        println!("{count} P1 exceptions need review before reporting");
    }
    for path in &summary.written {
        println!("Wrote {}", path.display());
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

pub fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell(label: &str) -> Cell {
    Cell::new(label).fg(Color::DarkGrey)
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}
