// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Removal of a container together with everything it holds.
//!
//! Plans are ordered children first so that a store without transactions,
//! when interrupted, leaves orphans behind rather than dangling parents.

use super::model::{Column, ColumnId, Folder, FolderId, ProjectId, Task};
use super::ordering::{plan_relocation, plan_removal};
use super::{Planned, commit_with_retry};
use crate::error::{ServiceError, ServiceResult};
use crate::store::{DocumentStore, Precondition, TaskQuery, UnitOfWork, WriteOp};
use serde::Serialize;
use std::sync::Arc;

/// What a column deletion did with the tasks it held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnRemoval {
    pub column_id: ColumnId,
    pub project_id: ProjectId,
    /// First remaining column, when the tasks were kept.
    pub relocated_to: Option<ColumnId>,
    pub tasks_affected: usize,
}

pub fn folder_plan(folder_id: FolderId, projects: &[ProjectId]) -> UnitOfWork {
    let mut unit = UnitOfWork::new(format!("delete folder {}", folder_id));
    unit.push(WriteOp::Check(Precondition::FolderProjects {
        folder_id,
        projects: projects.to_vec(),
    }));
    if !projects.is_empty() {
        unit.push(WriteOp::DeleteTasksInProjects(projects.to_vec()))
            .push(WriteOp::DeleteColumnsInProjects(projects.to_vec()))
            .push(WriteOp::DeleteProjects(projects.to_vec()));
    }
    unit.push(WriteOp::DeleteFolder(folder_id));
    unit
}

pub fn project_plan(project_id: ProjectId) -> UnitOfWork {
    let mut unit = UnitOfWork::new(format!("delete project {}", project_id));
    unit.push(WriteOp::DeleteTasksInProjects(vec![project_id]))
        .push(WriteOp::DeleteColumnsInProjects(vec![project_id]))
        .push(WriteOp::DeleteProjects(vec![project_id]));
    unit
}

/// `siblings` are all columns of the project, the deleted one included, in
/// board order. `held` are the tasks of the deleted column and `resident`
/// the task count of the first remaining column.
pub fn column_plan(
    column: &Column,
    siblings: &[Column],
    held: &[Task],
    resident: usize,
) -> Planned<ColumnRemoval> {
    let mut unit = UnitOfWork::new(format!("delete column {}", column.id));
    unit.push(WriteOp::Check(Precondition::ColumnAt {
        column_id: column.id,
        order_index: column.order_index,
    }))
    .push(WriteOp::Check(Precondition::ColumnCount {
        project_id: column.project_id,
        count: siblings.len(),
    }))
    .push(WriteOp::Check(Precondition::TaskCount {
        column_id: column.id,
        count: held.len(),
    }));

    let destination = siblings.iter().find(|sibling| sibling.id != column.id);
    match destination {
        Some(destination) => {
            unit.push(WriteOp::Check(Precondition::TaskCount {
                column_id: destination.id,
                count: resident,
            }));
            let old: Vec<u32> = held.iter().map(|task| task.order_index).collect();
            let placements = plan_relocation(resident, &old);
            unit.extend(held.iter().zip(placements).map(|(task, order_index)| {
                WriteOp::PlaceTask {
                    task_id: task.id,
                    column_id: destination.id,
                    order_index,
                }
            }));
        }
        None => {
            unit.push(WriteOp::DeleteTasksInColumn(column.id));
        }
    }

    let compaction = plan_removal(column.order_index);
    unit.push(WriteOp::DeleteColumn(column.id))
        .push(WriteOp::ShiftColumns {
            project_id: column.project_id,
            range: compaction.range,
            delta: compaction.delta,
        });

    Planned::new(
        unit,
        ColumnRemoval {
            column_id: column.id,
            project_id: column.project_id,
            relocated_to: destination.map(|destination| destination.id),
            tasks_affected: held.len(),
        },
    )
}

/// Reads the children of a container and commits its removal.
///
/// Callers authorize first; nothing here checks ownership.
#[derive(Clone)]
pub struct CascadeCoordinator {
    store: Arc<dyn DocumentStore>,
}

impl CascadeCoordinator {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Returns the ids of the projects removed with the folder.
    pub async fn delete_folder(&self, folder: &Folder) -> ServiceResult<Vec<ProjectId>> {
        let folder_id = folder.id;
        let (projects, report) = commit_with_retry(self.store.as_ref(), move || {
            Box::pin(self.plan_folder(folder_id))
        })
        .await?;
        log::info!(
            "Deleted folder {} with {} projects (atomic: {})",
            folder_id,
            projects.len(),
            report.atomic
        );
        Ok(projects)
    }

    pub async fn delete_project(&self, project_id: ProjectId) -> ServiceResult<()> {
        let ((), report) = commit_with_retry(self.store.as_ref(), move || {
            let planned = Planned::new(project_plan(project_id), ());
            Box::pin(std::future::ready(ServiceResult::Ok(planned)))
        })
        .await?;
        log::info!(
            "Deleted project {} (atomic: {})",
            project_id,
            report.atomic
        );
        Ok(())
    }

    pub async fn delete_column(&self, column_id: ColumnId) -> ServiceResult<ColumnRemoval> {
        let (cascade, _) = commit_with_retry(self.store.as_ref(), move || {
            Box::pin(self.plan_column(column_id))
        })
        .await?;
        match cascade.relocated_to {
            Some(destination) => log::info!(
                "Deleted column {}, moved {} tasks to column {}",
                cascade.column_id,
                cascade.tasks_affected,
                destination
            ),
            None => log::info!(
                "Deleted last column {} with {} tasks",
                cascade.column_id,
                cascade.tasks_affected
            ),
        }
        Ok(cascade)
    }

    async fn plan_folder(&self, folder_id: FolderId) -> ServiceResult<Planned<Vec<ProjectId>>> {
        let projects: Vec<ProjectId> = self
            .store
            .projects_in_folder(folder_id)
            .await?
            .into_iter()
            .map(|project| project.id)
            .collect();
        Ok(Planned::new(folder_plan(folder_id, &projects), projects))
    }

    async fn plan_column(&self, column_id: ColumnId) -> ServiceResult<Planned<ColumnRemoval>> {
        let column = self
            .store
            .column(column_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Column not found"))?;
        let siblings = self.store.columns_in_project(column.project_id).await?;
        let held = self
            .store
            .tasks(TaskQuery::column(column.project_id, column.id))
            .await?;
        let resident = match siblings.iter().find(|sibling| sibling.id != column.id) {
            Some(destination) => self
                .store
                .tasks(TaskQuery::column(column.project_id, destination.id))
                .await?
                .len(),
            None => 0,
        };
        Ok(column_plan(&column, &siblings, &held, resident))
    }
}
