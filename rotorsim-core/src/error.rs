use thiserror::Error;

/// Failures reported by a [`VariableStore`](crate::store::VariableStore).
///
/// None of these are fatal to a tick: reads fall back to the last internal
/// value and writes are reported back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("unknown key: {0}")]
    UnknownKey(String),

    #[error("write rejected for {key}: {reason}")]
    Rejected { key: String, reason: String },
}
