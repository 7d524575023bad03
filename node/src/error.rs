use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid protocol parameters: {0}")]
    Params(#[from] benor_types::TypesError),

    #[error("consensus error: {0}")]
    Consensus(#[from] benor_consensus::ConsensusError),

    #[error("network error: {0}")]
    Network(#[from] benor_network::NetworkError),

    #[error("RPC server error: {0}")]
    Rpc(#[from] benor_rpc::RpcError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no decision after {timeout_secs}s ({decided} of {expected} participants decided)")]
    DecisionTimeout {
        timeout_secs: u64,
        decided: usize,
        expected: usize,
    },

    #[error("participant task failed: {0}")]
    Task(String),
}
