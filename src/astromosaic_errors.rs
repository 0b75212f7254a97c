use thiserror::Error;

#[derive(Error, Debug)]
pub enum AstroMosaicError {
    #[error("Malformed coordinate text: {0}")]
    FormatError(String),

    #[error("Coordinate out of range: {0}")]
    RangeError(String),

    #[error("Unable to resolve target '{identifier}': {reason}")]
    ResolutionError { identifier: String, reason: String },

    #[error("Mosaic grid {axis} dimension {requested} exceeds the {max} available labels")]
    GridSizeError {
        axis: &'static str,
        requested: i32,
        max: i32,
    },

    #[error("Horizon crossing search did not converge: {0}")]
    SearchNonconvergence(String),

    #[error("Computation cancelled")]
    Cancelled,

    #[error("Invalid date or time: {0}")]
    InvalidDate(String),

    #[error("Invalid observer location: {0}")]
    InvalidObserver(String),

    #[error("HTTP ureq error: {0}")]
    HttpError(#[from] ureq::Error),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Invalid FITS file: {0}")]
    FitsError(String),

    #[error("CSV export error: {0}")]
    CsvError(#[from] csv::Error),
}

impl From<roots::SearchError> for AstroMosaicError {
    fn from(err: roots::SearchError) -> Self {
        AstroMosaicError::SearchNonconvergence(err.to_string())
    }
}

impl From<ordered_float::FloatIsNan> for AstroMosaicError {
    fn from(_: ordered_float::FloatIsNan) -> Self {
        AstroMosaicError::InvalidObserver("NaN coordinate".into())
    }
}

impl From<toml::de::Error> for AstroMosaicError {
    fn from(err: toml::de::Error) -> Self {
        AstroMosaicError::ConfigError(err.to_string())
    }
}

impl PartialEq for AstroMosaicError {
    fn eq(&self, other: &Self) -> bool {
        use AstroMosaicError::*;
        match (self, other) {
            (FormatError(a), FormatError(b)) => a == b,
            (RangeError(a), RangeError(b)) => a == b,
            (
                ResolutionError {
                    identifier: a,
                    reason: ra,
                },
                ResolutionError {
                    identifier: b,
                    reason: rb,
                },
            ) => a == b && ra == rb,
            (
                GridSizeError {
                    axis: a,
                    requested: ra,
                    max: ma,
                },
                GridSizeError {
                    axis: b,
                    requested: rb,
                    max: mb,
                },
            ) => a == b && ra == rb && ma == mb,
            (SearchNonconvergence(a), SearchNonconvergence(b)) => a == b,
            (InvalidDate(a), InvalidDate(b)) => a == b,
            (InvalidObserver(a), InvalidObserver(b)) => a == b,
            (ConfigError(a), ConfigError(b)) => a == b,
            (FitsError(a), FitsError(b)) => a == b,

            // Foreign errors: same variant is enough
            (HttpError(_), HttpError(_)) => true,
            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,

            (Cancelled, Cancelled) => true,

            _ => false,
        }
    }
}
