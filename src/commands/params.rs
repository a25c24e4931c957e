//! `params encode` / `params decode`: the filter query string codec.

use owo_colors::OwoColorize;
use serde_json::json;

use super::{CommandOutput, filters_from_args, filters_json};
use crate::cli::OutputOptions;
use crate::error::Result;
use crate::params::{FilterParams, decode, encode};

/// Encode filters into the query string an address bar would carry.
pub fn cmd_params_encode(filters: Vec<(String, Vec<String>)>, output: OutputOptions) -> Result<()> {
    let params = filters_from_args(filters);
    let query = encode(&params);

    CommandOutput::new(json!({
        "query": query,
        "filters": filters_json(&params),
    }))
    .with_text(query.clone())
    .print(output)
}

/// Decode a query string into filters.
///
/// Unlike hydration, which falls back to no filters, a malformed query is an
/// error here.
pub fn cmd_params_decode(query: &str, output: OutputOptions) -> Result<()> {
    let params = decode(query)?;

    CommandOutput::new(json!({
        "query": encode(&params),
        "filters": filters_json(&params),
    }))
    .with_text(format_filters(&params))
    .print(output)
}

fn format_filters(params: &FilterParams) -> String {
    if params.is_empty() {
        return "No filters".dimmed().to_string();
    }
    params
        .iter()
        .map(|(key, values)| format!("{}: {}", key.cyan(), values.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}
