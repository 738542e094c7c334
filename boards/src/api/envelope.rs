// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::error::{ErrorKind, FieldError, ServiceError};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError, error, web};
use serde::Serialize;

/// Body shape shared by every `/api` response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            errors: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            errors: None,
        }
    }

    fn failure(error: &ServiceError) -> Self {
        let errors = if error.kind() == ErrorKind::Validation {
            Some(error.field_errors().to_vec())
        } else {
            None
        };
        Self {
            success: false,
            message: error.message().to_string(),
            data: None,
            errors,
        }
    }
}

pub fn ok<T: Serialize>(message: &str, data: T) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(message, data))
}

pub fn created<T: Serialize>(message: &str, data: T) -> HttpResponse {
    HttpResponse::Created().json(ApiResponse::ok(message, data))
}

pub fn done(message: &str) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::done(message))
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.kind() == ErrorKind::Internal {
            log::error!("Request failed: {}", self);
        } else {
            log::debug!("Request rejected: {}", self);
        }
        HttpResponse::build(self.status_code()).json(ApiResponse::failure(self))
    }
}

fn malformed(field: &str, detail: String) -> actix_web::Error {
    ServiceError::validation(vec![FieldError::new(field, detail)]).into()
}

/// Extractor settings that report malformed input as validation envelopes.
pub fn extractor_configs(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err: error::JsonPayloadError, _req| malformed("body", err.to_string())),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err: error::PathError, _req| malformed("path", err.to_string())),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err: error::QueryPayloadError, _req| malformed("query", err.to_string())),
    );
}
