//! Configuration commands.
//!
//! - `config set`: Set a configuration value
//! - `config show`: Display current configuration

use owo_colors::OwoColorize;
use serde_json::json;

use super::CommandOutput;
use crate::cli::OutputOptions;
use crate::config::{API_URL_ENV, Config, TOKEN_ENV};
use crate::error::Result;

/// Mask a sensitive value by showing only the first 2 and last 2 characters
fn mask_sensitive_value(value: &str) -> String {
    let char_count = value.chars().count();
    if char_count > 4 {
        let first: String = value.chars().take(2).collect();
        let last: String = value.chars().skip(char_count - 2).collect();
        format!("{first}...{last}")
    } else {
        "****".to_string()
    }
}

/// Show current configuration
pub fn cmd_config_show(output: OutputOptions) -> Result<()> {
    let config = Config::load()?;

    // Effective values, after environment overrides.
    let api_url = config.api_url().ok().map(|url| url.to_string());
    let token_configured = config.token().is_some();
    let masked_token = config.auth.token.as_deref().map(mask_sensitive_value);

    let json_output = json!({
        "api_url": api_url,
        "page_size": config.page_size,
        "prefetch_margin": config.prefetch_margin,
        "request_timeout": config.request_timeout,
        "auth": {
            "token_configured": token_configured,
        },
        "config_file": Config::config_path().to_string_lossy(),
    });

    let mut text_output = String::new();
    text_output.push_str(&format!("{}\n\n", "Configuration:".cyan().bold()));

    match &api_url {
        Some(url) => text_output.push_str(&format!("{}: {url}\n", "api_url".cyan())),
        None => text_output.push_str(&format!(
            "{}: {} (set it or export {API_URL_ENV})\n",
            "api_url".cyan(),
            "not configured".dimmed()
        )),
    }
    text_output.push_str(&format!("{}: {}\n", "page_size".cyan(), config.page_size));
    text_output.push_str(&format!(
        "{}: {}\n",
        "prefetch_margin".cyan(),
        config.prefetch_margin
    ));
    text_output.push_str(&format!(
        "{}: {}s\n",
        "request_timeout".cyan(),
        config.request_timeout
    ));

    text_output.push('\n');

    // Auth status (don't show actual tokens)
    text_output.push_str(&format!("{}:\n", "auth".cyan()));
    let token_status = match (&masked_token, token_configured) {
        (Some(masked), _) => format!("{} ({masked})", "configured".green()),
        (None, true) => format!("{} (from {TOKEN_ENV})", "configured".green()),
        (None, false) => "not configured".dimmed().to_string(),
    };
    text_output.push_str(&format!("  token: {token_status}\n"));

    text_output.push('\n');
    text_output.push_str(&format!(
        "{}",
        format!("Config file: {}", Config::config_path().display()).dimmed()
    ));

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output)
}

/// Set a configuration value
pub fn cmd_config_set(key: &str, value: &str, output: OutputOptions) -> Result<()> {
    let mut config = Config::load()?;
    config.set_value(key, value)?;
    config.save()?;

    let sensitive = key == "auth.token";
    let shown = if sensitive {
        mask_sensitive_value(value)
    } else {
        value.to_string()
    };

    let mut json_output = json!({
        "action": "config_set",
        "key": key,
        "success": true,
    });
    if !sensitive {
        json_output["value"] = json!(value);
    }

    CommandOutput::new(json_output)
        .with_text(format!("Set {} to {}", key.cyan(), shown))
        .print(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_sensitive_value_long() {
        assert_eq!(mask_sensitive_value("tok_abcdef"), "to...ef");
    }

    #[test]
    fn test_mask_sensitive_value_short() {
        assert_eq!(mask_sensitive_value("abcd"), "****");
        assert_eq!(mask_sensitive_value(""), "****");
    }
}
