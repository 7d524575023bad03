//! Ben-Or daemon: entry point for running consensus participants.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Context;
use benor_node::{
    init_logging, LocalNetwork, LogFormat, NetworkConfig, NodeError, ShutdownController,
    StandaloneNode,
};
use benor_types::{NodeId, NodeState, Value};
use clap::Parser;

#[derive(Parser)]
#[command(name = "benor-daemon", about = "Ben-Or randomized binary consensus")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, global = true, env = "BENOR_CONFIG")]
    config: Option<PathBuf>,

    /// Total number of participants (N).
    #[arg(long, global = true, env = "BENOR_NODES")]
    nodes: Option<usize>,

    /// Number of faulty participants tolerated (F).
    #[arg(long, global = true, env = "BENOR_FAULTY_COUNT")]
    faulty_count: Option<usize>,

    /// Initial values, comma-separated: "0,1,?,1".
    #[arg(long, global = true, env = "BENOR_INITIAL_VALUES", value_delimiter = ',')]
    initial_values: Vec<Value>,

    /// Indices of faulty participants, comma-separated: "2,5".
    #[arg(long, global = true, env = "BENOR_FAULTY_NODES", value_delimiter = ',')]
    faulty_nodes: Vec<usize>,

    /// Host participants bind to and are reached at.
    #[arg(long, global = true, env = "BENOR_HOST")]
    host: Option<String>,

    /// Participant i listens on base_port + i.
    #[arg(long, global = true, env = "BENOR_BASE_PORT")]
    base_port: Option<u16>,

    /// Seed for reproducible coin flips.
    #[arg(long, global = true, env = "BENOR_COIN_SEED")]
    coin_seed: Option<u64>,

    /// Seconds to wait for every correct participant to decide.
    #[arg(long, global = true, env = "BENOR_DECISION_TIMEOUT")]
    decision_timeout_secs: Option<u64>,

    /// Log format: "human" or "json".
    #[arg(long, global = true, env = "BENOR_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, global = true, env = "BENOR_LOG_LEVEL")]
    log_level: Option<String>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Launch every participant in this process, run consensus to a decision
    /// and print the final states.
    Run,

    /// Run a single participant until SIGINT/SIGTERM.
    Node {
        /// Index of this participant in [0, N).
        #[arg(long, env = "BENOR_INDEX")]
        index: usize,

        /// Start consensus as soon as every peer answers.
        #[arg(long, env = "BENOR_START")]
        start: bool,
    },
}

impl Cli {
    /// Base configuration from the file (or defaults), overridden by flags.
    fn network_config(&self) -> anyhow::Result<NetworkConfig> {
        let mut config = match &self.config {
            Some(path) => NetworkConfig::from_toml_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => NetworkConfig::default(),
        };

        if let Some(nodes) = self.nodes {
            config.nodes = nodes;
        }
        if let Some(faulty_count) = self.faulty_count {
            config.faulty_count = faulty_count;
        }
        if !self.initial_values.is_empty() {
            config.initial_values = self.initial_values.clone();
        }
        if !self.faulty_nodes.is_empty() {
            config.faulty_nodes = self.faulty_nodes.clone();
        }
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(base_port) = self.base_port {
            config.base_port = base_port;
        }
        if self.coin_seed.is_some() {
            config.coin_seed = self.coin_seed;
        }
        if let Some(secs) = self.decision_timeout_secs {
            config.decision_timeout_secs = secs;
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.network_config()?;
    init_logging(config.log_format, &config.log_level);

    if let Some(path) = &cli.config {
        tracing::info!(path = %path.display(), "loaded config");
    }

    match cli.command {
        Command::Run => run_local(config).await,
        Command::Node { index, start } => run_node(config, NodeId::new(index), start).await,
    }
}

async fn run_local(config: NetworkConfig) -> anyhow::Result<()> {
    tracing::info!(
        nodes = config.nodes,
        faulty_count = config.faulty_count,
        faulty_nodes = ?config.faulty_nodes,
        base_port = config.base_port,
        "starting local network"
    );

    let timeout = config.decision_timeout();
    let network = LocalNetwork::launch(config).await?;
    network.start_all().await?;

    let outcome = tokio::select! {
        result = network.wait_for_decision(timeout) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received SIGINT, stopping");
            Err(NodeError::Task("interrupted".into()))
        }
    };

    println!("{}", format_states(network.config(), &network.local_states()));
    network.shutdown().await?;

    match outcome {
        Ok(states) => {
            let value = states.iter().find_map(NodeState::decision);
            if let Some(value) = value {
                println!("decided: {value}");
            }
            tracing::info!("Ben-Or daemon exited cleanly");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn run_node(config: NetworkConfig, id: NodeId, start: bool) -> anyhow::Result<()> {
    tracing::info!(
        node = %id,
        nodes = config.nodes,
        listen = %config.listen_addr(id),
        "starting standalone participant"
    );

    let shutdown = ShutdownController::new();
    let node = StandaloneNode::launch(&config, id, &shutdown).await?;
    if start {
        node.start_when_ready();
    }

    shutdown.wait_for_signal().await;
    tracing::info!("shutdown signal received, stopping participant");
    node.join().await?;

    tracing::info!("Ben-Or daemon exited cleanly");
    Ok(())
}

/// One line per participant: index, role, initial value and `{killed, x, decided, k}`.
fn format_states(config: &NetworkConfig, states: &[NodeState]) -> String {
    fn show<T: ToString>(value: Option<T>) -> String {
        value.map_or_else(|| "null".to_string(), |v| v.to_string())
    }

    let mut out = String::from("node  role     initial  killed  x     decided  k\n");
    for (index, state) in states.iter().enumerate() {
        let id = NodeId::new(index);
        let role = if config.is_faulty(id) { "faulty" } else { "correct" };
        let _ = writeln!(
            out,
            "{:<5} {:<8} {:<8} {:<7} {:<5} {:<8} {}",
            index,
            role,
            config.initial_value(id).to_string(),
            state.killed,
            show(state.x),
            show(state.decided),
            show(state.k),
        );
    }
    out
}
