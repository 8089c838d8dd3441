//! Error type shared by the loading, rendering, saving and printing paths.

/// Everything that can go wrong outside the UI thread's pure state updates.
///
/// None of these are fatal: the coordinator logs them and carries on.
#[derive(Debug, thiserror::Error)]
pub enum MemeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to fetch image: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("malformed URL: {0}")]
    InvalidUrl(String),

    #[error("print failed: {0}")]
    Print(String),

    #[error("caption font could not be loaded")]
    Font,

    #[error("background runtime error: {0}")]
    Runtime(String),
}

pub type Result<T> = std::result::Result<T, MemeError>;
