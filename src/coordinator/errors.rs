use crate::coordinator::Phase;

#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("export coordinator has shut down")]
    ShutDown,
}

/// Mastership queries are only answered against a ready membership snapshot.
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum QueryError {
    #[error("export coordinator is not ready yet, it is {0:?}")]
    NotReady(Phase),
    #[error("export coordinator has shut down")]
    ShutDown,
}

