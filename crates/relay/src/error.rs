use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A party may not be paired with itself.
    #[error("a party cannot be paired with itself")]
    InvalidPairing,
}

pub type Result<T> = std::result::Result<T, Error>;
