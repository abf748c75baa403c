//! Error handling.

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::{JsonRejection, QueryRejection},
    http::header,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::error::Error;
use thiserror::Error;
use tracing::{event, Level};

/// Analytics server error type
///
/// This type encapsulates the various errors that may occur.
/// Each variant may result in a different API error response.
///
/// Numeric and date coercion failures are deliberately absent: values that cannot be coerced are
/// treated as missing and silently dropped from computations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Error parsing an uploaded CSV file
    #[error("failed to parse CSV upload")]
    CsvParse(#[from] csv::Error),

    /// Requested dataset does not exist
    #[error("unknown dataset_id: {dataset_id}")]
    DatasetNotFound { dataset_id: String },

    /// Attempt to create a dataset from no records
    #[error("no records provided")]
    EmptyRecords,

    /// Upload was readable but not acceptable
    #[error("invalid upload: {reason}")]
    InvalidUpload { reason: String },

    /// Requested metric column does not exist and there is no fallback column
    #[error("metric column '{metric}' not found. Available columns: {available:?}")]
    MetricNotFound {
        metric: String,
        available: Vec<String>,
    },

    /// Columns required by an operation are absent from the dataset
    #[error("missing required columns: {columns:?}")]
    MissingColumns { columns: Vec<String> },

    /// Error reading a multipart upload
    #[error("failed to read multipart upload")]
    Multipart(#[from] MultipartError),

    /// Request is not a multipart upload
    #[error("request is not a valid multipart upload")]
    MultipartRejection(#[from] MultipartRejection),

    /// Error deserialising a JSON request body
    #[error("request data is not valid")]
    RequestDataJsonRejection(#[from] JsonRejection),

    /// Error deserialising request query parameters
    #[error("request query is not valid")]
    RequestQueryRejection(#[from] QueryRejection),

    /// Error validating request data (single error)
    #[error("request data is not valid")]
    RequestDataValidationSingle(#[from] validator::ValidationError),

    /// Error validating request data (multiple errors)
    #[error("request data is not valid")]
    RequestDataValidation(#[from] validator::ValidationErrors),

    /// Unsupported trend frequency requested
    #[error("unsupported frequency {freq}")]
    UnsupportedFrequency { freq: String },
}

impl IntoResponse for AnalyticsError {
    /// Convert from an `AnalyticsError` into an [axum::response::Response].
    fn into_response(self) -> Response {
        ErrorResponse::from(self).into_response()
    }
}

/// Body of error response
///
/// Implements serde (de)serialise.
#[derive(Deserialize, Serialize)]
struct ErrorBody {
    /// Main error message
    message: String,

    /// Optional list of causes
    #[serde(skip_serializing_if = "Option::is_none")]
    caused_by: Option<Vec<String>>,
}

impl ErrorBody {
    /// Return a new ErrorBody
    ///
    /// # Arguments
    ///
    /// * `error`: The error that occurred
    fn new<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        let message = error.to_string();
        let mut causes = Vec::new();
        let mut current = error.source();
        while let Some(source) = current {
            causes.push(source.to_string());
            current = source.source();
        }
        // Remove duplicate entries.
        causes.dedup();
        let caused_by = if causes.is_empty() {
            None
        } else {
            Some(causes)
        };
        ErrorBody { message, caused_by }
    }
}

/// A response to send in error cases
///
/// Implements serde (de)serialise.
#[derive(Deserialize, Serialize)]
struct ErrorResponse {
    /// HTTP status of the response
    #[serde(skip)]
    status: StatusCode,

    /// Response body
    error: ErrorBody,
}

impl ErrorResponse {
    /// Return a new ErrorResponse
    ///
    /// # Arguments
    ///
    /// * `status`: HTTP status of the response
    /// * `error`: The error that occurred. This will be formatted into a suitable `ErrorBody`
    fn new<E>(status: StatusCode, error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        ErrorResponse {
            status,
            error: ErrorBody::new(error),
        }
    }

    /// Return a 400 bad request ErrorResponse
    fn bad_request<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    /// Return a 404 not found ErrorResponse
    fn not_found<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::NOT_FOUND, error)
    }
}

impl From<AnalyticsError> for ErrorResponse {
    /// Convert from an `AnalyticsError` into an `ErrorResponse`.
    fn from(error: AnalyticsError) -> Self {
        let response = match &error {
            // Bad request
            AnalyticsError::CsvParse(_)
            | AnalyticsError::EmptyRecords
            | AnalyticsError::InvalidUpload { reason: _ }
            | AnalyticsError::MetricNotFound {
                metric: _,
                available: _,
            }
            | AnalyticsError::MissingColumns { columns: _ }
            | AnalyticsError::Multipart(_)
            | AnalyticsError::MultipartRejection(_)
            | AnalyticsError::RequestDataJsonRejection(_)
            | AnalyticsError::RequestQueryRejection(_)
            | AnalyticsError::RequestDataValidationSingle(_)
            | AnalyticsError::RequestDataValidation(_)
            | AnalyticsError::UnsupportedFrequency { freq: _ } => Self::bad_request(&error),

            // Not found
            AnalyticsError::DatasetNotFound { dataset_id: _ } => Self::not_found(&error),
        };

        event!(Level::DEBUG, status = %response.status, "{}", error);
        let mut current = error.source();
        while let Some(source) = current {
            event!(Level::DEBUG, "Caused by: {}", source);
            current = source.source();
        }

        response
    }
}

impl IntoResponse for ErrorResponse {
    /// Convert from an `ErrorResponse` into an `axum::response::Response`.
    ///
    /// Renders the response as JSON.
    fn into_response(self) -> Response {
        let json_body = serde_json::to_string_pretty(&self);
        match json_body {
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to serialise error response: {}", err),
            )
                .into_response(),
            Ok(json_body) => (
                self.status,
                [(&header::CONTENT_TYPE, mime::APPLICATION_JSON.to_string())],
                json_body,
            )
                .into_response(),
        }
    }
}
