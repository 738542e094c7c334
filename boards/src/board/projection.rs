// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Display-ready views built from stored records after a write completes.

use super::model::{
    Column, ColumnId, Folder, FolderId, Priority, Project, ProjectId, ProjectStatus, Task, TaskId,
    UserId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// Resolves user references for views and validates assignees and members.
pub trait UserDirectory: Send + Sync {
    fn find_user(&self, id: UserId) -> Option<UserSummary>;

    fn contains_user(&self, id: UserId) -> bool {
        self.find_user(id).is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub id: ColumnId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub project: ProjectSummary,
    pub column: ColumnSummary,
    pub order_index: u32,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub assignees: Vec<UserSummary>,
    pub created_by: Option<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnView {
    pub id: ColumnId,
    pub name: String,
    pub project_id: ProjectId,
    pub order_index: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    pub folder_id: FolderId,
    pub owner: Option<UserSummary>,
    pub members: Vec<UserSummary>,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderView {
    pub id: FolderId,
    pub name: String,
    pub description: String,
    pub owner: Option<UserSummary>,
    pub members: Vec<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Unresolvable user references are left out of the view.
fn users(directory: &dyn UserDirectory, ids: &[UserId]) -> Vec<UserSummary> {
    ids.iter().filter_map(|id| directory.find_user(*id)).collect()
}

pub fn task_view(
    directory: &dyn UserDirectory,
    task: &Task,
    project: &Project,
    column: &Column,
) -> TaskView {
    TaskView {
        id: task.id,
        title: task.title.clone(),
        description: task.description.clone(),
        project: ProjectSummary {
            id: project.id,
            name: project.name.clone(),
        },
        column: ColumnSummary {
            id: column.id,
            name: column.name.clone(),
        },
        order_index: task.order_index,
        priority: task.priority,
        due_date: task.due_date,
        assignees: users(directory, &task.assignees),
        created_by: directory.find_user(task.created_by),
        created_at: task.created_at,
        updated_at: task.updated_at,
    }
}

pub fn column_view(column: &Column) -> ColumnView {
    ColumnView {
        id: column.id,
        name: column.name.clone(),
        project_id: column.project_id,
        order_index: column.order_index,
        created_at: column.created_at,
        updated_at: column.updated_at,
    }
}

pub fn project_view(directory: &dyn UserDirectory, project: &Project) -> ProjectView {
    ProjectView {
        id: project.id,
        name: project.name.clone(),
        description: project.description.clone(),
        folder_id: project.folder_id,
        owner: directory.find_user(project.owner),
        members: users(directory, &project.members),
        status: project.status,
        created_at: project.created_at,
        updated_at: project.updated_at,
    }
}

pub fn folder_view(directory: &dyn UserDirectory, folder: &Folder) -> FolderView {
    FolderView {
        id: folder.id,
        name: folder.name.clone(),
        description: folder.description.clone(),
        owner: directory.find_user(folder.owner),
        members: users(directory, &folder.members),
        created_at: folder.created_at,
        updated_at: folder.updated_at,
    }
}
