pub mod backend;
pub mod builder;
pub mod events;
pub mod expander;
pub mod filters;
pub mod flight;
pub mod ledger;
pub mod orchestrator;
pub mod place;
pub mod sorter;
pub mod wire;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Unknown departure airport code: {0}")]
    UnknownOrigin(String),
    #[error("Unknown destination code: {0}")]
    UnknownDestination(String),
    #[error("Backend error: {0}")]
    Backend(#[from] backend::BackendError),
}

pub type CoreResult<T> = Result<T, CoreError>;
