// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::model::{Column, ColumnId, Folder, FolderId, Project, ProjectId, Task, TaskId, UserId};
use crate::error::{ErrorKind, ServiceError, ServiceResult};
use crate::store::DocumentStore;
use std::sync::Arc;

pub fn has_folder_access(folder: &Folder, user: UserId) -> bool {
    folder.is_owner(user) || folder.is_member(user)
}

/// Direct project membership or access inherited from the parent folder.
pub fn has_project_access(project: &Project, folder: Option<&Folder>, user: UserId) -> bool {
    project.is_owner(user)
        || project.is_member(user)
        || folder.is_some_and(|folder| has_folder_access(folder, user))
}

pub fn require_folder_owner(folder: &Folder, user: UserId) -> ServiceResult<()> {
    if folder.is_owner(user) {
        Ok(())
    } else {
        Err(ServiceError::forbidden(
            "Only the folder owner can perform this action",
        ))
    }
}

pub fn require_project_owner(project: &Project, user: UserId) -> ServiceResult<()> {
    if project.is_owner(user) {
        Ok(())
    } else {
        Err(ServiceError::forbidden(
            "Only the project owner can perform this action",
        ))
    }
}

fn rename_not_found(err: ServiceError, message: &str) -> ServiceError {
    if err.kind() == ErrorKind::NotFound {
        ServiceError::not_found(message)
    } else {
        err
    }
}

/// A project the caller may read and write, together with its folder.
#[derive(Debug, Clone)]
pub struct ProjectAccess {
    pub project: Project,
    pub folder: Option<Folder>,
}

/// Resolves entities for a caller, hiding everything they cannot reach.
///
/// Missing entities and entities outside the caller's reach both surface as
/// `NotFound`; ownership checks on top of that surface as `Forbidden`.
#[derive(Clone)]
pub struct AccessGate {
    store: Arc<dyn DocumentStore>,
}

impl AccessGate {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn folder(&self, user: UserId, id: FolderId) -> ServiceResult<Folder> {
        match self.store.folder(id).await? {
            Some(folder) if has_folder_access(&folder, user) => Ok(folder),
            Some(_) => {
                log::debug!("User {} denied access to folder {}", user, id);
                Err(ServiceError::not_found("Folder not found"))
            }
            None => Err(ServiceError::not_found("Folder not found")),
        }
    }

    pub async fn project(&self, user: UserId, id: ProjectId) -> ServiceResult<ProjectAccess> {
        let Some(project) = self.store.project(id).await? else {
            return Err(ServiceError::not_found("Project not found"));
        };
        let folder = self.store.folder(project.folder_id).await?;
        if !has_project_access(&project, folder.as_ref(), user) {
            log::debug!("User {} denied access to project {}", user, id);
            return Err(ServiceError::not_found("Project not found"));
        }
        Ok(ProjectAccess { project, folder })
    }

    pub async fn column(
        &self,
        user: UserId,
        id: ColumnId,
    ) -> ServiceResult<(Column, ProjectAccess)> {
        let Some(column) = self.store.column(id).await? else {
            return Err(ServiceError::not_found("Column not found"));
        };
        let access = self
            .project(user, column.project_id)
            .await
            .map_err(|err| rename_not_found(err, "Column not found"))?;
        Ok((column, access))
    }

    pub async fn task(&self, user: UserId, id: TaskId) -> ServiceResult<(Task, ProjectAccess)> {
        let Some(task) = self.store.task(id).await? else {
            return Err(ServiceError::not_found("Task not found"));
        };
        let access = self
            .project(user, task.project_id)
            .await
            .map_err(|err| rename_not_found(err, "Task not found"))?;
        Ok((task, access))
    }
}
