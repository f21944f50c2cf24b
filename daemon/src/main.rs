//! Command-line client for the voting contract.
//!
//! Connects through a JSON-RPC wallet provider, then acts as the admin or
//! voter dashboard, or runs the HTTP proxy.

mod commands;
mod config;
mod render;

use ballot_types::{Address, ChainId};
use ballot_utils::LogFormat;
use clap::Parser;
use config::BallotConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ballot", about = "Voting contract client and HTTP proxy")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, global = true, env = "BALLOT_CONFIG")]
    config: Option<PathBuf>,

    /// JSON-RPC endpoint of the wallet provider.
    #[arg(long, global = true, env = "BALLOT_RPC_URL")]
    rpc_url: Option<String>,

    /// Chain the contract is deployed on (hex or decimal).
    #[arg(long, global = true, env = "BALLOT_CHAIN_ID")]
    chain_id: Option<ChainId>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, global = true, env = "BALLOT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, global = true, env = "BALLOT_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the HTTP proxy.
    Proxy {
        /// Port to listen on.
        #[arg(long, env = "BALLOT_PROXY_PORT")]
        port: Option<u16>,

        /// Contract address; looked up from deployments if omitted.
        #[arg(long, env = "BALLOT_PROXY_CONTRACT")]
        contract: Option<Address>,

        /// Serve Prometheus metrics at /metrics.
        #[arg(long, env = "BALLOT_ENABLE_METRICS")]
        metrics: bool,
    },

    /// Show the dashboard for the connected account.
    Status,

    /// Cast a vote for a candidate.
    Vote {
        /// Candidate id as shown by `status`.
        candidate_id: u64,
    },

    /// Authorize a voter (admin only).
    Authorize { voter: String },

    /// Add a candidate (admin only).
    AddCandidate { name: String },

    /// Open the election (admin only).
    Start {
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },

    /// Close the election (admin only).
    End {
        #[arg(long, short)]
        yes: bool,
    },

    /// Wipe candidates, voters and votes (admin only).
    Reset {
        #[arg(long, short)]
        yes: bool,
    },

    /// Follow the dashboard live until interrupted.
    Watch,
}

impl Cli {
    /// Layer CLI flags and env vars over the file (or default) config.
    fn resolve_config(&self) -> anyhow::Result<BallotConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let config = BallotConfig::from_toml_file(path)?;
                tracing::info!("Loaded config from {}", path.display());
                config
            }
            None => BallotConfig::default(),
        };

        if let Some(rpc_url) = &self.rpc_url {
            config.rpc_url = rpc_url.clone();
        }
        if let Some(chain_id) = self.chain_id {
            config.expected_chain_id = chain_id;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Command::Proxy {
            port,
            contract,
            metrics,
        } = &self.command
        {
            config.proxy_port = port.unwrap_or(config.proxy_port);
            if contract.is_some() {
                config.proxy_contract = contract.clone();
            }
            config.enable_metrics |= *metrics;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    ballot_utils::init_logging(config.log_format, &config.log_level);

    match cli.command {
        Command::Proxy { .. } => commands::proxy(&config).await,
        Command::Status => commands::status(&config).await,
        Command::Vote { candidate_id } => commands::vote(&config, candidate_id).await,
        Command::Authorize { voter } => commands::authorize(&config, &voter).await,
        Command::AddCandidate { name } => commands::add_candidate(&config, &name).await,
        Command::Start { yes } => {
            commands::admin_action(&config, ballot_sync::AdminAction::StartElection, yes).await
        }
        Command::End { yes } => {
            commands::admin_action(&config, ballot_sync::AdminAction::EndElection, yes).await
        }
        Command::Reset { yes } => {
            commands::admin_action(&config, ballot_sync::AdminAction::ResetElection, yes).await
        }
        Command::Watch => commands::watch(&config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "ballot",
            "--rpc-url",
            "http://node:8545",
            "--chain-id",
            "1337",
            "--log-format",
            "json",
            "proxy",
            "--port",
            "9000",
            "--metrics",
        ])
        .unwrap();
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.rpc_url, "http://node:8545");
        assert_eq!(config.expected_chain_id, ChainId::DEV);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.proxy_port, 9000);
        assert!(config.enable_metrics);
    }

    #[test]
    fn config_file_is_the_base() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"proxy_port = 7000\nlog_level = \"debug\"\n")
            .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = Cli::try_parse_from(["ballot", "--config", &path, "proxy"]).unwrap();
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.proxy_port, 7000);
        assert_eq!(config.log_level, "debug");

        let cli =
            Cli::try_parse_from(["ballot", "--config", &path, "--log-level", "warn", "status"])
                .unwrap();
        assert_eq!(cli.resolve_config().unwrap().log_level, "warn");
    }

    #[test]
    fn vote_takes_a_numeric_id() {
        assert!(Cli::try_parse_from(["ballot", "vote", "2"]).is_ok());
        assert!(Cli::try_parse_from(["ballot", "vote", "Alice"]).is_err());
    }
}
