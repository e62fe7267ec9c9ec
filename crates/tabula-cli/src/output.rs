//! Response rendering

use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use tabula_core::Value;
use tabula_services::TableDataResponse;

pub fn json(response: &TableDataResponse) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(response)?)
}

/// Terminal table followed by a one-line summary
pub fn table(response: &TableDataResponse) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(response.headers.iter().map(String::as_str));

    for row in &response.data {
        table.add_row(row.iter().map(cell));
    }

    format!(
        "{}\n{} of {} rows{} ({:.2} ms)",
        table,
        response.data.len(),
        response.total_count,
        if response.cached { ", cached" } else { "" },
        response.execution_time_ms
    )
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
