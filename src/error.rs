use thiserror::Error;

/// Everything that can stop an oncoprint from being prepared or written.
#[derive(Debug, Error)]
pub enum OncoprintError {
    #[error("at least 2 samples are required to draw an oncoprint, found {found}")]
    TooFewSamples { found: usize },

    #[error("at least 2 genes are required to draw an oncoprint, found {found}")]
    TooFewGenes { found: usize },

    #[error("sorting by annotation was requested but no annotation table was given")]
    MissingAnnotationTable,

    #[error("gene {0:?} is not present in the mutation matrix")]
    UnknownGene(String),

    #[error("gene {0:?} is listed more than once")]
    DuplicateGene(String),

    #[error("annotation column {0:?} is not present in the annotation table")]
    UnknownAnnotationColumn(String),

    #[error("matrix shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("invalid color {0:?}")]
    InvalidColor(String),

    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, OncoprintError>;
