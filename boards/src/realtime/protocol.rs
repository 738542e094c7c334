// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! JSON text frames of the push transport: `{"event": name, "data": payload}`.

use crate::board::model::{ColumnId, ProjectId, TaskId, UserId};
use crate::board::projection::{ColumnView, TaskView};
use crate::board::{
    AssigneeInput, MoveTaskInput, NewColumn, NewTask, PositionInput, RenameColumn, TaskUpdate,
};
use crate::gateway::{ColumnCommand, TaskCommand};
use serde::{Deserialize, Serialize};

pub const WS_MAX_MESSAGE_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct AuthPayload {
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskPayload {
    pub project_id: ProjectId,
    #[serde(flatten)]
    pub task: NewTask,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskPayload {
    pub task_id: TaskId,
    #[serde(flatten)]
    pub update: TaskUpdate,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRef {
    pub task_id: TaskId,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveTaskPayload {
    pub task_id: TaskId,
    pub column_id: ColumnId,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderTaskPayload {
    pub task_id: TaskId,
    pub order_index: u32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssigneePayload {
    pub task_id: TaskId,
    pub assignee_id: UserId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateColumnPayload {
    pub project_id: ProjectId,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateColumnPayload {
    pub column_id: ColumnId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderColumnPayload {
    pub column_id: ColumnId,
    pub order_index: u32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnRef {
    pub column_id: ColumnId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "auth")]
    Auth(AuthPayload),
    #[serde(rename = "task:join-project")]
    JoinProject(ProjectId),
    #[serde(rename = "task:leave-project")]
    LeaveProject(ProjectId),
    #[serde(rename = "task:create")]
    CreateTask(CreateTaskPayload),
    #[serde(rename = "task:update")]
    UpdateTask(UpdateTaskPayload),
    #[serde(rename = "task:delete")]
    DeleteTask(TaskRef),
    #[serde(rename = "task:move")]
    MoveTask(MoveTaskPayload),
    #[serde(rename = "task:reorder")]
    ReorderTask(ReorderTaskPayload),
    #[serde(rename = "task:add-assignee")]
    AddAssignee(AssigneePayload),
    #[serde(rename = "task:remove-assignee")]
    RemoveAssignee(AssigneePayload),
    #[serde(rename = "column:create")]
    CreateColumn(CreateColumnPayload),
    #[serde(rename = "column:update")]
    UpdateColumn(UpdateColumnPayload),
    #[serde(rename = "column:reorder")]
    ReorderColumn(ReorderColumnPayload),
    #[serde(rename = "column:delete")]
    DeleteColumn(ColumnRef),
}

/// What a client frame asks the session to do.
#[derive(Debug, Clone)]
pub enum Intent {
    Auth(String),
    Join(ProjectId),
    Leave(ProjectId),
    Task(TaskCommand),
    Column(ColumnCommand),
}

impl From<ClientEvent> for Intent {
    fn from(event: ClientEvent) -> Self {
        match event {
            ClientEvent::Auth(payload) => Intent::Auth(payload.token),
            ClientEvent::JoinProject(project_id) => Intent::Join(project_id),
            ClientEvent::LeaveProject(project_id) => Intent::Leave(project_id),
            ClientEvent::CreateTask(payload) => Intent::Task(TaskCommand::Create {
                project_id: payload.project_id,
                input: payload.task,
            }),
            ClientEvent::UpdateTask(payload) => Intent::Task(TaskCommand::Update {
                task_id: payload.task_id,
                input: payload.update,
            }),
            ClientEvent::DeleteTask(payload) => Intent::Task(TaskCommand::Delete {
                task_id: payload.task_id,
            }),
            ClientEvent::MoveTask(payload) => Intent::Task(TaskCommand::Move {
                task_id: payload.task_id,
                input: MoveTaskInput {
                    column_id: payload.column_id,
                },
            }),
            ClientEvent::ReorderTask(payload) => Intent::Task(TaskCommand::Reorder {
                task_id: payload.task_id,
                input: PositionInput {
                    order_index: payload.order_index,
                },
            }),
            ClientEvent::AddAssignee(payload) => Intent::Task(TaskCommand::AddAssignee {
                task_id: payload.task_id,
                input: AssigneeInput {
                    assignee_id: payload.assignee_id,
                },
            }),
            ClientEvent::RemoveAssignee(payload) => Intent::Task(TaskCommand::RemoveAssignee {
                task_id: payload.task_id,
                assignee: payload.assignee_id,
            }),
            ClientEvent::CreateColumn(payload) => Intent::Column(ColumnCommand::Create {
                project_id: payload.project_id,
                input: NewColumn { name: payload.name },
            }),
            ClientEvent::UpdateColumn(payload) => Intent::Column(ColumnCommand::Rename {
                column_id: payload.column_id,
                input: RenameColumn { name: payload.name },
            }),
            ClientEvent::ReorderColumn(payload) => Intent::Column(ColumnCommand::Reorder {
                column_id: payload.column_id,
                input: PositionInput {
                    order_index: payload.order_index,
                },
            }),
            ClientEvent::DeleteColumn(payload) => Intent::Column(ColumnCommand::Delete {
                column_id: payload.column_id,
            }),
        }
    }
}

/// Decodes a text frame. Undecodable column frames are reported on the
/// column error channel, everything else on the task one.
pub fn decode_client_event(text: &str) -> Result<ClientEvent, ServerEvent> {
    serde_json::from_str(text).map_err(|err| {
        let message = format!("Invalid message: {}", err);
        if event_name(text).is_some_and(|name| name.starts_with("column:")) {
            ServerEvent::column_error(message)
        } else {
            ServerEvent::task_error(message)
        }
    })
}

fn event_name(text: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    value.get("event")?.as_str().map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthOkPayload {
    pub user_id: UserId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPayload {
    pub project_id: ProjectId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDeletedPayload {
    pub task_id: TaskId,
    pub project_id: ProjectId,
    pub column_id: ColumnId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDeletedPayload {
    pub column_id: ColumnId,
    pub project_id: ProjectId,
    pub relocated_to: Option<ColumnId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "auth:ok")]
    AuthOk(AuthOkPayload),
    #[serde(rename = "auth:error")]
    AuthError(ErrorPayload),
    #[serde(rename = "task:joined")]
    Joined(RoomPayload),
    #[serde(rename = "task:left")]
    Left(RoomPayload),
    #[serde(rename = "task:error")]
    TaskError(ErrorPayload),
    #[serde(rename = "column:error")]
    ColumnError(ErrorPayload),
    #[serde(rename = "task:created")]
    TaskCreated(TaskView),
    #[serde(rename = "task:updated")]
    TaskUpdated(TaskView),
    #[serde(rename = "task:moved")]
    TaskMoved(TaskView),
    #[serde(rename = "task:reordered")]
    TaskReordered(TaskView),
    #[serde(rename = "task:deleted")]
    TaskDeleted(TaskDeletedPayload),
    #[serde(rename = "column:created")]
    ColumnCreated(ColumnView),
    #[serde(rename = "column:updated")]
    ColumnUpdated(ColumnView),
    #[serde(rename = "column:reordered")]
    ColumnReordered(ColumnView),
    #[serde(rename = "column:deleted")]
    ColumnDeleted(ColumnDeletedPayload),
    #[serde(rename = "project:deleted")]
    ProjectDeleted(RoomPayload),
}

impl ServerEvent {
    pub fn task_error(message: impl Into<String>) -> Self {
        ServerEvent::TaskError(ErrorPayload {
            message: message.into(),
        })
    }

    pub fn column_error(message: impl Into<String>) -> Self {
        ServerEvent::ColumnError(ErrorPayload {
            message: message.into(),
        })
    }

    pub fn auth_error(message: impl Into<String>) -> Self {
        ServerEvent::AuthError(ErrorPayload {
            message: message.into(),
        })
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
