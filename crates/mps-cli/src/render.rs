//! Terminal rendering of rows, analyses and reports.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use mps_model::EntityKind;
use mps_move::{MoveReport, SelectionAnalysis};
use mps_table::{Column, ColumnCatalog, CommitReport, TableRow};

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label).add_attribute(Attribute::Bold)
}

fn dim_cell(value: &str) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

fn status_cell(ok: bool, text: &str) -> Cell {
    Cell::new(text).fg(if ok { Color::Green } else { Color::Red })
}

/// Indented plain-text outline: `*` marks rows of the editable level.
pub fn outline(rows: &[TableRow]) -> String {
    rows.iter()
        .map(|row| {
            let marker = if row.is_editable { '*' } else { '-' };
            format!(
                "{}{marker} {} [{}]",
                "  ".repeat(row.level),
                row.label(),
                row.id()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rows with the editable level's columns filled in.
pub fn rows_table<C: ColumnCatalog>(
    rows: &[TableRow],
    columns: &[Column],
    catalog: &C,
    level: EntityKind,
) -> String {
    let mut table = Table::new();
    let mut header = vec![header_cell("Row"), header_cell("Id")];
    header.extend(columns.iter().map(|c| header_cell(&c.label)));
    table.set_header(header);
    apply_table_style(&mut table);

    for row in rows {
        let label = format!("{}{}", "  ".repeat(row.level), row.label());
        let mut cells = vec![
            if row.is_editable {
                Cell::new(label)
            } else {
                dim_cell(&label)
            },
            dim_cell(row.id().as_str()),
        ];
        for column in columns {
            let text = match (row.is_editable, row.value(&column.key)) {
                (true, Some(value)) => catalog.format_value(level, &column.key, value),
                _ => String::new(),
            };
            let cell = Cell::new(text);
            cells.push(if column.kind.is_numeric() {
                cell.set_alignment(CellAlignment::Right)
            } else {
                cell
            });
        }
        table.add_row(cells);
    }
    table.to_string()
}

pub fn analysis(analysis: &SelectionAnalysis) -> String {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Id"),
        header_cell("Kind"),
        header_cell("Label"),
        header_cell("Root"),
    ]);
    apply_table_style(&mut table);
    for item in &analysis.all_elements {
        let is_root = analysis.root_elements.iter().any(|root| root.id == item.id);
        table.add_row(vec![
            Cell::new(item.id.as_str()),
            Cell::new(item.kind.as_str()),
            Cell::new(&item.label),
            if is_root {
                Cell::new("yes").fg(Color::Cyan)
            } else {
                dim_cell("-")
            },
        ]);
    }

    let mut lines = vec![table.to_string()];
    match (&analysis.error_message, analysis.move_level, analysis.target_level) {
        (Some(message), _, _) => lines.push(format!("Cannot move: {message}")),
        (None, Some(level), Some(target)) => {
            lines.push(format!("Move level: {level}"));
            lines.push(format!("Destination level: {target}"));
            lines.push(format!("Items to move: {}", analysis.total_items_to_move));
        }
        _ => {}
    }
    lines.join("\n")
}

pub fn commit_report(report: &CommitReport) -> String {
    if report.results.is_empty() {
        return "Nothing to save.".to_string();
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Entity"),
        header_cell("Kind"),
        header_cell("Fields"),
        header_cell("Result"),
    ]);
    apply_table_style(&mut table);
    for result in &report.results {
        let fields: Vec<&str> = result.changes.keys().map(String::as_str).collect();
        let status = match &result.outcome {
            Ok(()) => status_cell(true, "saved"),
            Err(error) => status_cell(false, &error.user_message()),
        };
        table.add_row(vec![
            Cell::new(result.id.as_str()),
            Cell::new(result.kind.map(EntityKind::as_str).unwrap_or("?")),
            Cell::new(fields.join(", ")),
            status,
        ]);
    }
    table.to_string()
}

pub fn move_report(report: &MoveReport) -> String {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Element"),
        header_cell("Copy"),
        header_cell("Copied"),
        header_cell("Result"),
    ]);
    apply_table_style(&mut table);
    for result in &report.results {
        let status = match &result.error {
            None => status_cell(true, "moved"),
            Some(error) => status_cell(false, &error.user_message()),
        };
        table.add_row(vec![
            Cell::new(result.source_id.as_str()),
            Cell::new(result.new_id.as_ref().map(|id| id.as_str()).unwrap_or("-")),
            Cell::new(result.copied).set_alignment(CellAlignment::Right),
            status,
        ]);
    }
    let mut text = table.to_string();
    if report.order_failures > 0 {
        text.push_str(&format!(
            "\n{} sibling order update(s) failed; refresh before editing.",
            report.order_failures
        ));
    }
    text
}
