use benor_types::{NodeId, TypesError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("invalid protocol parameters: {0}")]
    Params(#[from] TypesError),

    #[error("initial value of participant {node} must be 0 or 1")]
    NonBinaryInitialValue { node: NodeId },
}
