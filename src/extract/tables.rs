//! Table flattening.

use crate::dom::Element;
use crate::text::collapse_whitespace;

use super::model::TableData;

/// Rows that belong to `table` itself, not to tables nested in its cells
pub(crate) fn own_rows(table: &Element) -> Vec<&Element> {
    let mut rows = Vec::new();
    for child in table.child_elements() {
        match child.tag.as_str() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => rows.extend(child.child_elements().filter(|e| e.is("tr"))),
            _ => {}
        }
    }
    rows
}

fn cells(row: &Element) -> impl Iterator<Item = String> + '_ {
    row.child_elements()
        .filter(|c| c.is("td") || c.is("th"))
        .map(|c| collapse_whitespace(&c.text()))
}

/// Every row of the table as collapsed cell strings, empty cells kept
pub fn table_rows(table: &Element) -> Vec<Vec<String>> {
    own_rows(table).into_iter().map(|row| cells(row).collect()).collect()
}

/// Split a table into headers and data rows, dropping empty cells
///
/// The header row is the first `thead` row when present, otherwise the first
/// row of the table. Rows left without cells are dropped. Exclusion applies to
/// whole flattened rows and is left to the caller.
pub fn parse_table(table: &Element) -> TableData {
    let rows = own_rows(table);
    let header = table
        .child_elements()
        .find(|c| c.is("thead"))
        .and_then(|thead| thead.child_elements().find(|r| r.is("tr")))
        .or_else(|| rows.first().copied());

    let keep = |row: &Element| -> Vec<String> {
        cells(row)
            .filter(|cell| !cell.is_empty())
            .collect()
    };

    let headers = header.map(keep).unwrap_or_default();
    let rows = rows
        .into_iter()
        .filter(|row| header.is_none_or(|h| !std::ptr::eq(*row, h)))
        .map(keep)
        .filter(|cells| !cells.is_empty())
        .collect();

    TableData { headers, rows }
}
