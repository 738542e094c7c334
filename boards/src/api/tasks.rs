// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Task routes. Mutations go through the gateway so HTTP writes reach the
//! project room exactly like push writes do.

use super::envelope::{created, done, ok};
use crate::board::filters::TaskFilter;
use crate::board::model::{ProjectId, TaskId, UserId};
use crate::board::projection::TaskView;
use crate::board::{AssigneeInput, MoveTaskInput, NewTask, PositionInput, TaskUpdate};
use crate::error::{ServiceError, ServiceResult};
use crate::gateway::{MutationGateway, TaskCommand, TaskOutcome};
use crate::iam::AuthRequest;
use actix_web::{HttpRequest, HttpResponse, web};

async fn run(
    req: &HttpRequest,
    gateway: &MutationGateway,
    command: TaskCommand,
) -> ServiceResult<TaskView> {
    let user = req.require_principal()?.user_id;
    match gateway.task(user, command).await? {
        TaskOutcome::Task(view) => Ok(view),
        TaskOutcome::Deleted(_) => Err(ServiceError::internal("Unexpected task removal")),
    }
}

pub async fn create_task(
    req: HttpRequest,
    gateway: web::Data<MutationGateway>,
    path: web::Path<ProjectId>,
    body: web::Json<NewTask>,
) -> Result<HttpResponse, ServiceError> {
    let command = TaskCommand::Create {
        project_id: path.into_inner(),
        input: body.into_inner(),
    };
    let task = run(&req, &gateway, command).await?;
    Ok(created("Task created successfully", task))
}

pub async fn list_tasks(
    req: HttpRequest,
    gateway: web::Data<MutationGateway>,
    path: web::Path<ProjectId>,
    query: web::Query<TaskFilter>,
) -> Result<HttpResponse, ServiceError> {
    let user = req.require_principal()?.user_id;
    let tasks = gateway
        .board()
        .list_tasks(user, path.into_inner(), query.into_inner())
        .await?;
    Ok(ok("Tasks retrieved successfully", tasks))
}

pub async fn get_task(
    req: HttpRequest,
    gateway: web::Data<MutationGateway>,
    path: web::Path<TaskId>,
) -> Result<HttpResponse, ServiceError> {
    let user = req.require_principal()?.user_id;
    let task = gateway.board().get_task(user, path.into_inner()).await?;
    Ok(ok("Task retrieved successfully", task))
}

pub async fn update_task(
    req: HttpRequest,
    gateway: web::Data<MutationGateway>,
    path: web::Path<TaskId>,
    body: web::Json<TaskUpdate>,
) -> Result<HttpResponse, ServiceError> {
    let command = TaskCommand::Update {
        task_id: path.into_inner(),
        input: body.into_inner(),
    };
    let task = run(&req, &gateway, command).await?;
    Ok(ok("Task updated successfully", task))
}

pub async fn delete_task(
    req: HttpRequest,
    gateway: web::Data<MutationGateway>,
    path: web::Path<TaskId>,
) -> Result<HttpResponse, ServiceError> {
    let user = req.require_principal()?.user_id;
    let command = TaskCommand::Delete {
        task_id: path.into_inner(),
    };
    gateway.task(user, command).await?;
    Ok(done("Task deleted successfully"))
}

pub async fn move_task(
    req: HttpRequest,
    gateway: web::Data<MutationGateway>,
    path: web::Path<TaskId>,
    body: web::Json<MoveTaskInput>,
) -> Result<HttpResponse, ServiceError> {
    let command = TaskCommand::Move {
        task_id: path.into_inner(),
        input: body.into_inner(),
    };
    let task = run(&req, &gateway, command).await?;
    Ok(ok("Task moved successfully", task))
}

pub async fn reorder_task(
    req: HttpRequest,
    gateway: web::Data<MutationGateway>,
    path: web::Path<TaskId>,
    body: web::Json<PositionInput>,
) -> Result<HttpResponse, ServiceError> {
    let command = TaskCommand::Reorder {
        task_id: path.into_inner(),
        input: body.into_inner(),
    };
    let task = run(&req, &gateway, command).await?;
    Ok(ok("Task reordered successfully", task))
}

pub async fn add_assignee(
    req: HttpRequest,
    gateway: web::Data<MutationGateway>,
    path: web::Path<TaskId>,
    body: web::Json<AssigneeInput>,
) -> Result<HttpResponse, ServiceError> {
    let command = TaskCommand::AddAssignee {
        task_id: path.into_inner(),
        input: body.into_inner(),
    };
    let task = run(&req, &gateway, command).await?;
    Ok(ok("Assignee added successfully", task))
}

pub async fn remove_assignee(
    req: HttpRequest,
    gateway: web::Data<MutationGateway>,
    path: web::Path<(TaskId, UserId)>,
) -> Result<HttpResponse, ServiceError> {
    let (task_id, assignee) = path.into_inner();
    let command = TaskCommand::RemoveAssignee { task_id, assignee };
    let task = run(&req, &gateway, command).await?;
    Ok(ok("Assignee removed successfully", task))
}
