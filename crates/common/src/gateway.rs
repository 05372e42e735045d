use crate::{OrderRequest, Result};

/// Order-submission collaborator.
///
/// `PaperGateway` implements this for backtests; a live exchange connector
/// would implement it the same way. Submission is synchronous: the calling
/// strategy blocks until the gateway accepts the request or returns an error.
/// Fills and acks come back later as `ExecutionReport`s, never as a return value.
pub trait OrderGateway: Send + Sync {
    /// Hand one order request to the venue.
    fn submit(&self, request: &OrderRequest) -> Result<()>;
}
