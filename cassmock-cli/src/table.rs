/// Result rendering for the CLI: comfy-table grids and JSON

use cassmock_api::{ResultSet, Row, Value};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

/// Format a result set as a table
///
/// Columns keep the order the engine reported them in.
pub fn format_rows_table(rows: &ResultSet) -> String {
    if rows.is_empty() {
        return "No rows".to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(rows.column_names().iter().map(Cell::new).collect::<Vec<_>>());

    for row in rows {
        let cells = row
            .values()
            .iter()
            .map(|value| Cell::new(format_value(value)))
            .collect::<Vec<_>>();
        table.add_row(cells);
    }

    table.to_string()
}

/// Format a value for a table cell
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Blob(bytes) => format!("<Binary {} bytes>", bytes.len()),
        other => other.to_string(),
    }
}

/// Row as a JSON object keyed by column name
pub fn row_to_json(row: &Row) -> serde_json::Value {
    let object = row
        .column_names()
        .iter()
        .zip(row.values())
        .map(|(column, value)| (column.clone(), value.to_json()))
        .collect::<serde_json::Map<_, _>>();
    serde_json::Value::Object(object)
}

/// Result set as a JSON array of row objects
pub fn rows_to_json(rows: &ResultSet) -> serde_json::Value {
    serde_json::Value::Array(rows.iter().map(row_to_json).collect())
}
