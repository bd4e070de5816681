use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("attribute index {index} out of range for sample with {len} attributes")]
    OutOfRange { index: usize, len: usize },

    #[error("sample dimension mismatch: expected {expected} attributes, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("cannot classify against an empty training set")]
    EmptyTrainingSet,

    #[error("k must be at least 1")]
    InvalidNeighborCount,

    #[error(
        "image size mismatch: expected {}x{}, got {}x{}",
        .expected.0, .expected.1, .actual.0, .actual.1
    )]
    ImageSizeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
