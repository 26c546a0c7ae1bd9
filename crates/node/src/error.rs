//! A bunch of wrap errors.

/// A wrap `Result` contains custom errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors enum mapping global custom errors.
/// The error type can be expressed in decimal, where the high decs represent
/// the error category and the low decs represent the error type.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
#[repr(u32)]
pub enum Error {
    #[error("Invalid logging level: {0}")]
    InvalidLoggingLevel(String) = 809,
    #[error("Create File Error: {0}")]
    CreateFileError(String) = 900,
    #[error("Open File Error: {0}")]
    OpenFileError(String) = 901,
    #[error("Cannot find home directory")]
    HomeDirError = 903,
    #[error("Cannot find parent directory")]
    ParentDirError = 904,
    #[error("Serde json error: {0}")]
    SerdeJsonError(#[from] serde_json::Error) = 1000,
    #[error("Serde yaml error: {0}")]
    SerdeYamlError(#[from] serde_yaml::Error) = 1001,
    #[error("Core error: {0}")]
    CoreError(#[from] chordring_core::Error) = 1102,
    #[error("Transport error: {0}")]
    TransportError(#[from] chordring_transport::error::Error) = 1103,
    #[error("Invalid simulation: {0}")]
    InvalidSimulation(String) = 1200,
}

impl Error {
    /// Numeric code of the error, the discriminant of its variant.
    pub fn code(&self) -> u32 {
        // SAFETY: `Self` is `#[repr(u32)]`, so it starts with a `u32` discriminant.
        unsafe { *(self as *const Self as *const u32) }
    }
}
