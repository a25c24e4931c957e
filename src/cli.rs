use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io;

use crate::commands::{
    BrowseOptions, cmd_browse, cmd_config_set, cmd_config_show, cmd_params_decode,
    cmd_params_encode,
};
use crate::remote::Resource;

#[derive(Parser)]
#[command(name = "directory")]
#[command(about = "Browse Directory lists with URL-synced filters")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Output selection shared by all commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a filtered list page by page, as infinite scrolling would
    #[command(visible_alias = "b")]
    Browse {
        /// List to browse: members, teams, projects, events, demo-days
        #[arg(value_parser = parse_resource)]
        resource: Resource,

        /// Page address whose query string holds the filters
        #[arg(long)]
        url: Option<String>,

        /// Filter as key=value[,value...] (repeatable)
        #[arg(short, long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, Vec<String>)>,

        /// Items per page (default: page_size from config)
        #[arg(short, long)]
        limit: Option<u32>,

        /// Stop after this many pages
        #[arg(short, long, default_value = "3")]
        pages: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Encode and decode filter query strings
    Params {
        #[command(subcommand)]
        action: ParamsAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for [possible values: bash, zsh, fish, powershell, elvish]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ParamsAction {
    /// Encode filters into a query string
    Encode {
        /// Filters as key=value[,value...]
        #[arg(required = true, value_parser = parse_filter)]
        filters: Vec<(String, Vec<String>)>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Decode a query string into filters
    Decode {
        /// Query string, with or without the leading '?'
        query: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set a configuration value
    Set {
        /// Configuration key (api_url, page_size, prefetch_margin, request_timeout, auth.token)
        key: String,
        /// Value to set
        value: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Execute the command.
    pub async fn run(self) -> crate::error::Result<()> {
        match self {
            Commands::Browse {
                resource,
                url,
                filters,
                limit,
                pages,
                json,
            } => {
                cmd_browse(
                    BrowseOptions {
                        resource,
                        url,
                        filters,
                        limit,
                        pages,
                    },
                    OutputOptions { json },
                )
                .await
            }

            Commands::Params { action } => match action {
                ParamsAction::Encode { filters, json } => {
                    cmd_params_encode(filters, OutputOptions { json })
                }
                ParamsAction::Decode { query, json } => {
                    cmd_params_decode(&query, OutputOptions { json })
                }
            },

            Commands::Config { action } => match action {
                ConfigAction::Show { json } => cmd_config_show(OutputOptions { json }),
                ConfigAction::Set { key, value, json } => {
                    cmd_config_set(&key, &value, OutputOptions { json })
                }
            },

            Commands::Completions { shell } => {
                generate_completions(shell);
                Ok(())
            }
        }
    }
}

fn parse_resource(s: &str) -> Result<Resource, String> {
    s.parse().map_err(|_| {
        let valid: Vec<&str> = Resource::ALL.iter().map(Resource::path).collect();
        format!("invalid resource '{}'. Must be one of: {}", s, valid.join(", "))
    })
}

/// Parse `key=v1,v2` into a key and its values.
fn parse_filter(s: &str) -> Result<(String, Vec<String>), String> {
    let Some((key, values)) = s.split_once('=') else {
        return Err(format!(
            "invalid filter '{s}': expected key=value[,value...]"
        ));
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("invalid filter '{s}': key must not be empty"));
    }
    let values = values
        .split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect();
    Ok((key.to_string(), values))
}

pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "directory", &mut io::stdout());
}
