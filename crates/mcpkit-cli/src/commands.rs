//! CLI commands

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;

/// mcpkit - talk to any configured tool and prompt target
#[derive(Parser, Debug)]
#[command(name = "mcpkit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (mcpkit.{jsonc,json,yml,yaml} is searched for if omitted)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Log level, overriding the configuration file (RUST_LOG wins over both)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// List the tools the target offers
    Tools,

    /// Call a tool
    Call {
        /// Tool name
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(long, value_parser = parse_json_object)]
        arguments: Option<Map<String, Value>>,
    },

    /// List the prompts the target offers
    Prompts,

    /// Render a prompt
    Prompt {
        /// Prompt name
        name: String,

        /// Prompt argument, repeatable
        #[arg(long = "arg", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        args: Vec<(String, String)>,
    },
}

impl Commands {
    /// Prompt arguments as the target expects them; `None` when none were given
    pub fn prompt_arguments(args: &[(String, String)]) -> Option<HashMap<String, String>> {
        if args.is_empty() {
            None
        } else {
            Some(args.iter().cloned().collect())
        }
    }
}

fn parse_json_object(s: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(s) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("arguments must be a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {e}")),
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}
