#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Invalid value on line {line}, column '{column}': {value}")]
    InvalidValue {
        line: u64,
        column: String,
        value: String,
    },

    #[error("Dataset contains no result rows")]
    EmptyDataset,

    #[error("Request count overflow: {0}")]
    CountOverflow(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Render error: {0}")]
    Render(String),
}

impl ReportError {
    /// Wrap any drawing backend failure as a [`ReportError::Render`].
    pub fn render(err: impl std::fmt::Display) -> Self {
        ReportError::Render(err.to_string())
    }

    /// Whether the error was caused by the input dataset rather than the
    /// rendering stage.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ReportError::Csv(_)
                | ReportError::MissingColumn(_)
                | ReportError::InvalidValue { .. }
                | ReportError::EmptyDataset
                | ReportError::CountOverflow(_)
        )
    }
}
