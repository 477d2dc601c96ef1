use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::spawn::validate_agent_id;

#[derive(Parser, Debug)]
#[command(
    name = "opbridge",
    version,
    about = "Operator console for the agent spawn bridge"
)]
pub struct Cli {
    /// Base URL of the operator bridge API (e.g., "http://127.0.0.1:8080/api")
    #[arg(long, global = true, env = "OPBRIDGE_URL")]
    pub bridge_url: Option<String>,

    /// Bearer token sent with every bridge request
    #[arg(long, global = true, env = "OPERATOR_BRIDGE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Path to config file (overrides default search)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Interactive operator dashboard (default)
    Dashboard,
    /// Probe the bridge once and print its health
    Status,
    /// List the agents in the bridge registry
    Agents,
    /// Spawn a new agent and wait for the result
    Spawn {
        /// Agent id: lowercase letters, digits and hyphens, 2-31 chars
        #[arg(value_parser = validate_agent_id)]
        agent_id: String,

        /// Role the agent plays (e.g., "moderator")
        #[arg(short, long)]
        role: String,

        /// Free-text description or personality
        #[arg(short, long)]
        description: String,

        /// Discord bot token for the new agent
        #[arg(long, env = "DISCORD_BOT_TOKEN", hide_env_values = true)]
        discord_token: String,

        /// If another spawn is running, watch it finish before submitting
        #[arg(long)]
        wait: bool,

        /// Client-side spawn timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Stop a running agent's gateway
    Stop {
        #[arg(value_parser = validate_agent_id)]
        agent_id: String,
    },
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Dashboard)
    }
}
