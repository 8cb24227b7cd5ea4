use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("empty identifier")]
    Empty,

    #[error("no profile handle in '{0}'")]
    NoHandle(String),
}
