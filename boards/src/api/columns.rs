// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::envelope::{created, ok};
use crate::board::model::{ColumnId, ProjectId};
use crate::board::projection::ColumnView;
use crate::board::{NewColumn, PositionInput, RenameColumn};
use crate::error::{ServiceError, ServiceResult};
use crate::gateway::{ColumnCommand, ColumnOutcome, MutationGateway};
use crate::iam::AuthRequest;
use actix_web::{HttpRequest, HttpResponse, web};

async fn run(
    req: &HttpRequest,
    gateway: &MutationGateway,
    command: ColumnCommand,
) -> ServiceResult<ColumnView> {
    let user = req.require_principal()?.user_id;
    match gateway.column(user, command).await? {
        ColumnOutcome::Column(view) => Ok(view),
        ColumnOutcome::Deleted(_) => Err(ServiceError::internal("Unexpected column removal")),
    }
}

pub async fn create_column(
    req: HttpRequest,
    gateway: web::Data<MutationGateway>,
    path: web::Path<ProjectId>,
    body: web::Json<NewColumn>,
) -> Result<HttpResponse, ServiceError> {
    let command = ColumnCommand::Create {
        project_id: path.into_inner(),
        input: body.into_inner(),
    };
    let column = run(&req, &gateway, command).await?;
    Ok(created("Column created successfully", column))
}

pub async fn list_columns(
    req: HttpRequest,
    gateway: web::Data<MutationGateway>,
    path: web::Path<ProjectId>,
) -> Result<HttpResponse, ServiceError> {
    let user = req.require_principal()?.user_id;
    let columns = gateway.board().list_columns(user, path.into_inner()).await?;
    Ok(ok("Columns retrieved successfully", columns))
}

pub async fn rename_column(
    req: HttpRequest,
    gateway: web::Data<MutationGateway>,
    path: web::Path<ColumnId>,
    body: web::Json<RenameColumn>,
) -> Result<HttpResponse, ServiceError> {
    let command = ColumnCommand::Rename {
        column_id: path.into_inner(),
        input: body.into_inner(),
    };
    let column = run(&req, &gateway, command).await?;
    Ok(ok("Column updated successfully", column))
}

pub async fn reorder_column(
    req: HttpRequest,
    gateway: web::Data<MutationGateway>,
    path: web::Path<ColumnId>,
    body: web::Json<PositionInput>,
) -> Result<HttpResponse, ServiceError> {
    let command = ColumnCommand::Reorder {
        column_id: path.into_inner(),
        input: body.into_inner(),
    };
    let column = run(&req, &gateway, command).await?;
    Ok(ok("Column reordered successfully", column))
}

/// Tasks of the deleted column move to the first remaining column; the
/// response reports where they went.
pub async fn delete_column(
    req: HttpRequest,
    gateway: web::Data<MutationGateway>,
    path: web::Path<ColumnId>,
) -> Result<HttpResponse, ServiceError> {
    let user = req.require_principal()?.user_id;
    let command = ColumnCommand::Delete {
        column_id: path.into_inner(),
    };
    match gateway.column(user, command).await? {
        ColumnOutcome::Deleted(removal) => Ok(ok("Column deleted successfully", removal)),
        ColumnOutcome::Column(_) => Err(ServiceError::internal("Unexpected column view")),
    }
}
