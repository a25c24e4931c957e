mod browse;
mod config;
mod params;

pub use browse::{BrowseOptions, cmd_browse};
pub use config::{cmd_config_set, cmd_config_show};
pub use params::{cmd_params_decode, cmd_params_encode};

use serde_json::Value;

use crate::cli::OutputOptions;
use crate::error::Result;
use crate::params::FilterParams;

/// Result of a command, printable as text or JSON.
pub struct CommandOutput {
    json: Value,
    text: Option<String>,
}

impl CommandOutput {
    pub fn new(json: Value) -> Self {
        Self { json, text: None }
    }

    /// Human-readable rendering used unless `--json` is given.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn print(self, output: OutputOptions) -> Result<()> {
        match self.text {
            Some(text) if !output.json => println!("{text}"),
            _ => println!("{}", serde_json::to_string_pretty(&self.json)?),
        }
        Ok(())
    }
}

/// Build filters from `key=values` pairs given on the command line.
pub(crate) fn filters_from_args(filters: Vec<(String, Vec<String>)>) -> FilterParams {
    let mut params = FilterParams::new();
    for (key, values) in filters {
        params.extend(key, values);
    }
    params
}

/// JSON object mapping each filter key to its values.
pub(crate) fn filters_json(params: &FilterParams) -> Value {
    serde_json::to_value(params).unwrap_or(Value::Null)
}
