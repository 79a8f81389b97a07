use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("API request failed: {0}")]
    Api(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Geocode service unavailable: {message}")]
    ServiceUnavailable { message: String },
}

pub type Result<T> = std::result::Result<T, GeocodeError>;
