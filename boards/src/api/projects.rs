// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::envelope::{created, done, ok};
use crate::board::model::{FolderId, ProjectId, UserId};
use crate::board::{MemberInput, NewProject, ProjectStatusInput};
use crate::error::ServiceError;
use crate::gateway::MutationGateway;
use crate::iam::AuthRequest;
use actix_web::{HttpRequest, HttpResponse, web};

pub async fn create_project(
    req: HttpRequest,
    gateway: web::Data<MutationGateway>,
    path: web::Path<FolderId>,
    body: web::Json<NewProject>,
) -> Result<HttpResponse, ServiceError> {
    let user = req.require_principal()?.user_id;
    let project = gateway
        .board()
        .create_project(user, path.into_inner(), body.into_inner())
        .await?;
    Ok(created("Project created successfully", project))
}

pub async fn list_projects(
    req: HttpRequest,
    gateway: web::Data<MutationGateway>,
    path: web::Path<FolderId>,
) -> Result<HttpResponse, ServiceError> {
    let user = req.require_principal()?.user_id;
    let projects = gateway.board().list_projects(user, path.into_inner()).await?;
    Ok(ok("Projects retrieved successfully", projects))
}

pub async fn get_project(
    req: HttpRequest,
    gateway: web::Data<MutationGateway>,
    path: web::Path<ProjectId>,
) -> Result<HttpResponse, ServiceError> {
    let user = req.require_principal()?.user_id;
    let project = gateway.board().get_project(user, path.into_inner()).await?;
    Ok(ok("Project retrieved successfully", project))
}

pub async fn update_status(
    req: HttpRequest,
    gateway: web::Data<MutationGateway>,
    path: web::Path<ProjectId>,
    body: web::Json<ProjectStatusInput>,
) -> Result<HttpResponse, ServiceError> {
    let user = req.require_principal()?.user_id;
    let project = gateway
        .board()
        .update_project_status(user, path.into_inner(), body.into_inner())
        .await?;
    Ok(ok("Project status updated successfully", project))
}

pub async fn delete_project(
    req: HttpRequest,
    gateway: web::Data<MutationGateway>,
    path: web::Path<ProjectId>,
) -> Result<HttpResponse, ServiceError> {
    let user = req.require_principal()?.user_id;
    gateway.delete_project(user, path.into_inner()).await?;
    Ok(done("Project deleted successfully"))
}

pub async fn add_member(
    req: HttpRequest,
    gateway: web::Data<MutationGateway>,
    path: web::Path<ProjectId>,
    body: web::Json<MemberInput>,
) -> Result<HttpResponse, ServiceError> {
    let user = req.require_principal()?.user_id;
    let project = gateway
        .board()
        .add_project_member(user, path.into_inner(), body.into_inner())
        .await?;
    Ok(ok("Member added successfully", project))
}

pub async fn remove_member(
    req: HttpRequest,
    gateway: web::Data<MutationGateway>,
    path: web::Path<(ProjectId, UserId)>,
) -> Result<HttpResponse, ServiceError> {
    let user = req.require_principal()?.user_id;
    let (project_id, member) = path.into_inner();
    let project = gateway
        .board()
        .remove_project_member(user, project_id, member)
        .await?;
    Ok(ok("Member removed successfully", project))
}
