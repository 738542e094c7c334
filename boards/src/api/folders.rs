// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::envelope::{created, done, ok};
use crate::board::model::{FolderId, UserId};
use crate::board::{MemberInput, NewFolder};
use crate::error::ServiceError;
use crate::gateway::MutationGateway;
use crate::iam::AuthRequest;
use actix_web::{HttpRequest, HttpResponse, web};

pub async fn create_folder(
    req: HttpRequest,
    gateway: web::Data<MutationGateway>,
    body: web::Json<NewFolder>,
) -> Result<HttpResponse, ServiceError> {
    let user = req.require_principal()?.user_id;
    let folder = gateway.board().create_folder(user, body.into_inner()).await?;
    Ok(created("Folder created successfully", folder))
}

pub async fn list_folders(
    req: HttpRequest,
    gateway: web::Data<MutationGateway>,
) -> Result<HttpResponse, ServiceError> {
    let user = req.require_principal()?.user_id;
    let folders = gateway.board().list_folders(user).await?;
    Ok(ok("Folders retrieved successfully", folders))
}

pub async fn get_folder(
    req: HttpRequest,
    gateway: web::Data<MutationGateway>,
    path: web::Path<FolderId>,
) -> Result<HttpResponse, ServiceError> {
    let user = req.require_principal()?.user_id;
    let folder = gateway.board().get_folder(user, path.into_inner()).await?;
    Ok(ok("Folder retrieved successfully", folder))
}

pub async fn delete_folder(
    req: HttpRequest,
    gateway: web::Data<MutationGateway>,
    path: web::Path<FolderId>,
) -> Result<HttpResponse, ServiceError> {
    let user = req.require_principal()?.user_id;
    gateway.delete_folder(user, path.into_inner()).await?;
    Ok(done("Folder deleted successfully"))
}

pub async fn add_member(
    req: HttpRequest,
    gateway: web::Data<MutationGateway>,
    path: web::Path<FolderId>,
    body: web::Json<MemberInput>,
) -> Result<HttpResponse, ServiceError> {
    let user = req.require_principal()?.user_id;
    let folder = gateway
        .board()
        .add_folder_member(user, path.into_inner(), body.into_inner())
        .await?;
    Ok(ok("Member added successfully", folder))
}

pub async fn remove_member(
    req: HttpRequest,
    gateway: web::Data<MutationGateway>,
    path: web::Path<(FolderId, UserId)>,
) -> Result<HttpResponse, ServiceError> {
    let user = req.require_principal()?.user_id;
    let (folder_id, member) = path.into_inner();
    let folder = gateway
        .board()
        .remove_folder_member(user, folder_id, member)
        .await?;
    Ok(ok("Member removed successfully", folder))
}
