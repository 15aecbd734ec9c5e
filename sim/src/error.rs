use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("network has been stopped")]
    NetworkStopped,

    #[error("conflict resolution is already running")]
    AlreadyResolving,
}
