use std::path::PathBuf;

/// Error raised while loading influence data or computing recommendations.
#[derive(Debug, thiserror::Error)]
pub enum RecommendationError {
    #[error("influence table file not found: {}", path.display())]
    FileNotFound { path: PathBuf },
    #[error("influence table is missing required factor column '{factor}'")]
    Schema { factor: String },
    #[error("invalid value '{value}' for district '{district}', factor '{factor}'")]
    DataFormat {
        district: String,
        factor: String,
        value: String,
    },
    #[error("district '{district}' appears more than once in the influence table")]
    DuplicateDistrict { district: String },
    #[error("input out of range: {detail}")]
    Range { detail: String },
    #[error("factor domain mismatch: table has {expected:?}, weights have {actual:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },
    #[error("unknown factor '{factor}'")]
    UnknownFactor { factor: String },
    #[error("no survey answer provided for factor '{factor}'")]
    MissingAnswer { factor: String },
    #[error("unknown district '{district}'")]
    UnknownDistrict { district: String },
    #[error("failed to read influence table: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid influence CSV data: {0}")]
    Csv(#[from] csv::Error),
}

impl RecommendationError {
    /// Whether the error stems from user or data input rather than a wiring defect.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, RecommendationError::SchemaMismatch { .. })
    }

    pub(crate) fn range(detail: impl Into<String>) -> Self {
        RecommendationError::Range {
            detail: detail.into(),
        }
    }
}
