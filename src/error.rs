use actix_multipart::MultipartError;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Startup failures: bad configuration or a model that cannot be loaded.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model error: {0}")]
    Model(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }
}

/// Failures of a single `/analyze` request.
#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("File must be an image")]
    NotAnImage,

    #[error("No file uploaded")]
    MissingFile,

    #[error("File exceeds the upload limit of {limit} bytes")]
    TooLarge { limit: usize },

    #[error("Invalid multipart payload: {0}")]
    Multipart(String),

    #[error("Error processing image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Error processing image: {0}")]
    Scoring(String),

    #[error("Error processing image: {0}")]
    Internal(String),
}

impl AnalyzeError {
    pub fn scoring(msg: impl Into<String>) -> Self {
        Self::Scoring(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl From<MultipartError> for AnalyzeError {
    fn from(err: MultipartError) -> Self {
        Self::Multipart(err.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl ResponseError for AnalyzeError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotAnImage | Self::MissingFile | Self::Multipart(_) => StatusCode::BAD_REQUEST,
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Decode(_) | Self::Scoring(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            detail: self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(AnalyzeError::NotAnImage.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AnalyzeError::MissingFile.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AnalyzeError::TooLarge { limit: 10 }.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert!(AnalyzeError::NotAnImage.is_client_error());
    }

    #[test]
    fn processing_errors_embed_cause() {
        let err = AnalyzeError::scoring("expected 6 scores, got 4");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.to_string(),
            "Error processing image: expected 6 scores, got 4"
        );
        assert!(!err.is_client_error());
    }
}
