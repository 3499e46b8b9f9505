use thiserror::Error;

/// Errors that can arise inside the flat-file persistence engine.
///
/// Parse failures for individual stored values are deliberately *not*
/// represented here: a value that cannot be decoded is skipped and the
/// entity keeps its default, so the engine never surfaces them as errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A programming-time configuration problem: a value encoded under the
    /// wrong declared kind, a storage path colliding with a plain file, or
    /// a directory that could not be created. Callers should not proceed.
    #[error("storage configuration error: {0}")]
    Config(String),

    /// Wrapper around IO errors (directory streams, file writes).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
