//! Digest errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DigestError {
    /// More than `ttl` successive dirty passes: the watcher graph does not converge.
    #[error("{ttl} digest iterations reached, aborting")]
    ConvergenceExceeded { ttl: usize },

    /// `digest` or `apply` was called from a listener or evaluator of a running digest.
    #[error("digest already in progress")]
    InProgress,
}
