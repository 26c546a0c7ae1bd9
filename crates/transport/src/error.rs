#![allow(missing_docs)]

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Chord error: {0}")]
    Core(#[from] chordring_core::Error),

    #[error("Node {0} is already registered")]
    NodeAlreadyRegistered(String),

    #[error("Node {0} not found")]
    NodeNotFound(String),
}
