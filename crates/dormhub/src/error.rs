use crate::config::ConfigError;
use crate::property::{InconsistentSnapshot, PropertyServiceError};
use crate::property::StatusParseError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Snapshot(serde_json::Error),
    Occupancy(InconsistentSnapshot),
    Property(PropertyServiceError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "dormhub is misconfigured: {err}"),
            AppError::Telemetry(err) => write!(f, "could not start logging: {err}"),
            AppError::Io(err) => write!(f, "file or socket access failed: {err}"),
            AppError::Server(err) => write!(f, "http listener stopped: {err}"),
            AppError::Snapshot(err) => write!(f, "storage snapshot is not valid json: {err}"),
            AppError::Occupancy(err) => write!(f, "{err}"),
            AppError::Property(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Snapshot(err) => Some(err),
            AppError::Occupancy(err) => Some(err),
            AppError::Property(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Property(err) => err.status_code(),
            AppError::Snapshot(_) | AppError::Occupancy(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Snapshot(value)
    }
}

impl From<InconsistentSnapshot> for AppError {
    fn from(value: InconsistentSnapshot) -> Self {
        Self::Occupancy(value)
    }
}

impl From<PropertyServiceError> for AppError {
    fn from(value: PropertyServiceError) -> Self {
        Self::Property(value)
    }
}

impl From<StatusParseError> for AppError {
    fn from(value: StatusParseError) -> Self {
        Self::Property(PropertyServiceError::Status(value))
    }
}
