// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod columns;
mod hierarchy;
mod inputs;
mod tasks;

#[cfg(test)]
mod tests;

pub use hierarchy::{FolderRemoval, ProjectRemoval};
pub use inputs::{
    AssigneeInput, MemberInput, MoveTaskInput, NewColumn, NewFolder, NewProject, NewTask,
    PositionInput, ProjectStatusInput, RenameColumn, TaskUpdate,
};
pub use tasks::TaskRemoval;

use super::access::AccessGate;
use super::cascade::CascadeCoordinator;
pub use super::cascade::ColumnRemoval;
use super::model::{Column, ColumnId, Project, ProjectId, Task, TaskId, UserId};
use super::projection::{TaskView, UserDirectory, task_view};
use super::{Planned, commit_with_retry};
use crate::error::{ServiceError, ServiceResult};
use crate::store::{CommitReport, DocumentStore, UnitOfWork};
use std::sync::Arc;
use validator::Validate;

/// Every board operation, shared by the HTTP routes and the push transport.
#[derive(Clone)]
pub struct BoardService {
    store: Arc<dyn DocumentStore>,
    directory: Arc<dyn UserDirectory>,
    gate: AccessGate,
    cascade: CascadeCoordinator,
}

impl BoardService {
    pub fn new(store: Arc<dyn DocumentStore>, directory: Arc<dyn UserDirectory>) -> Self {
        let capabilities = store.capabilities();
        if capabilities.transactions {
            log::info!("Document store commits units of work atomically");
        } else {
            log::warn!(
                "Document store has no transactions; multi-step writes apply step by step"
            );
        }
        Self {
            gate: AccessGate::new(store.clone()),
            cascade: CascadeCoordinator::new(store.clone()),
            store,
            directory,
        }
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    pub fn directory(&self) -> &dyn UserDirectory {
        self.directory.as_ref()
    }

    fn require_user(&self, user: UserId) -> ServiceResult<()> {
        if self.directory.contains_user(user) {
            Ok(())
        } else {
            Err(ServiceError::not_found("User not found"))
        }
    }

    async fn load_project(&self, id: ProjectId) -> ServiceResult<Project> {
        self.store
            .project(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Project not found"))
    }

    async fn load_column(&self, id: ColumnId) -> ServiceResult<Column> {
        self.store
            .column(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Column not found"))
    }

    async fn load_task(&self, id: TaskId) -> ServiceResult<Task> {
        self.store
            .task(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Task not found"))
    }

    /// Commits writes that carry no read-time preconditions.
    async fn commit(&self, unit: UnitOfWork) -> ServiceResult<CommitReport> {
        let (_, report) = commit_with_retry(self.store.as_ref(), move || {
            let planned = Planned::new(unit.clone(), ());
            Box::pin(std::future::ready(ServiceResult::Ok(planned)))
        })
        .await?;
        Ok(report)
    }

    /// Re-reads a task after a write and projects it with its parents.
    async fn project_task(&self, id: TaskId) -> ServiceResult<TaskView> {
        let task = self.load_task(id).await?;
        let project = self.load_project(task.project_id).await?;
        let column = self.load_column(task.column_id).await?;
        Ok(task_view(self.directory.as_ref(), &task, &project, &column))
    }
}

fn validated<T: Validate>(input: &T) -> ServiceResult<()> {
    input.validate().map_err(ServiceError::from)
}
