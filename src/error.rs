use super::util::Rank;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FloydError {
    /// precondition violated before any collective operation is issued, e.g. vertex count not divisible by worker count
    #[error("config error: {0}")]
    Config(String),
    #[error("input format error: {0}")]
    InputFormat(String),
    /// a worker received a collective message that doesn't belong to the operation it's waiting for
    #[error("worker {rank} desynchronized: expected {expected}, found {found}")]
    Desynchronized { rank: Rank, expected: String, found: String },
    #[error("worker {rank} lost its peer worker {peer}")]
    PeerDisconnected { rank: Rank, peer: Rank },
    #[error("thread pool error: {0}")]
    ThreadPool(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde json error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

impl FloydError {
    /// a disconnect is only the echo of another worker's failure
    pub fn is_root_cause(&self) -> bool {
        !matches!(self, Self::PeerDisconnected { .. })
    }
}

pub type Result<T> = std::result::Result<T, FloydError>;
