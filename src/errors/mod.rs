use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;

#[derive(Debug, PartialEq)]
pub enum AppError {
    Validation(Vec<String>),
    WriteFailure(String),
    NotFound(String),
    InvalidName(String),
    BadRequest(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(fields) => write!(f, "Missing required fields: {}", fields.join(", ")),
            AppError::WriteFailure(msg) => write!(f, "Write Failure: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::InvalidName(name) => write!(f, "Invalid file name: {}", name),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Validation(_) => HttpResponse::BadRequest().json(ErrorResponse { error: self.to_string() }),
            AppError::WriteFailure(_) => HttpResponse::InternalServerError().json(ErrorResponse { error: "File storage operation failed".to_string() }),
            AppError::NotFound(msg) => HttpResponse::NotFound().json(ErrorResponse { error: msg.clone() }),
            AppError::InvalidName(_) => HttpResponse::BadRequest().json(ErrorResponse { error: self.to_string() }),
            AppError::BadRequest(msg) => HttpResponse::BadRequest().json(ErrorResponse { error: msg.clone() }),
        }
    }
}
