pub mod error;
pub mod identifier;
pub mod types;

pub use error::IdentifierError;
pub use identifier::ProfileKey;
pub use types::*;
