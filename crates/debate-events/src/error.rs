use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("no such session subscription: {0}")]
    UnknownSession(String),
}
