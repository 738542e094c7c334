// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::inputs::{AssigneeInput, MoveTaskInput, NewTask, PositionInput, TaskUpdate};
use super::{BoardService, validated};
use crate::board::filters::TaskFilter;
use crate::board::model::{Column, ColumnId, ProjectId, Task, TaskId, UserId, push_unique};
use crate::board::ordering::{ReorderPlan, append_index, is_dense, plan_removal, plan_reorder};
use crate::board::projection::{TaskView, task_view};
use crate::board::{Planned, commit_with_retry};
use crate::error::{ServiceError, ServiceResult};
use crate::store::{Document, Precondition, TaskQuery, UnitOfWork, WriteOp};
use chrono::Utc;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskRemoval {
    pub task_id: TaskId,
    pub project_id: ProjectId,
    pub column_id: ColumnId,
}

fn foreign_column() -> ServiceError {
    ServiceError::bad_request("Column does not belong to this project")
}

fn at(task: &Task) -> WriteOp {
    WriteOp::Check(Precondition::TaskAt {
        task_id: task.id,
        column_id: task.column_id,
        order_index: task.order_index,
    })
}

/// Content check for writes that replace the whole task.
fn unchanged(task: &Task) -> WriteOp {
    WriteOp::Check(Precondition::Unchanged(Document::Task(task.clone())))
}

fn holding(column_id: ColumnId, count: usize) -> WriteOp {
    WriteOp::Check(Precondition::TaskCount { column_id, count })
}

/// Guards every write that puts a task into `column`.
fn receiving(column: &Column) -> WriteOp {
    WriteOp::Check(Precondition::ColumnExists {
        column_id: column.id,
        project_id: column.project_id,
    })
}

/// Closes the gap a task leaves behind in `column_id`.
fn compaction(column_id: ColumnId, vacated: u32) -> WriteOp {
    let shift = plan_removal(vacated);
    WriteOp::ShiftTasks {
        column_id,
        range: shift.range,
        delta: shift.delta,
    }
}

impl BoardService {
    fn require_assignees(&self, requested: &[UserId]) -> ServiceResult<Vec<UserId>> {
        let mut assignees = Vec::with_capacity(requested.len());
        for user in requested {
            self.require_user(*user)?;
            push_unique(&mut assignees, *user);
        }
        Ok(assignees)
    }

    async fn column_indices(
        &self,
        project_id: ProjectId,
        column_id: ColumnId,
    ) -> ServiceResult<Vec<u32>> {
        let tasks = self
            .store
            .tasks(TaskQuery::column(project_id, column_id))
            .await?;
        Ok(tasks.iter().map(|task| task.order_index).collect())
    }

    /// Destination column for a task of `project_id`.
    async fn destination(
        &self,
        project_id: ProjectId,
        column_id: ColumnId,
    ) -> ServiceResult<Column> {
        let column = self.load_column(column_id).await?;
        if column.project_id != project_id {
            return Err(foreign_column());
        }
        Ok(column)
    }

    pub async fn create_task(
        &self,
        user: UserId,
        project_id: ProjectId,
        mut input: NewTask,
    ) -> ServiceResult<TaskView> {
        validated(&input)?;
        let access = self.gate.project(user, project_id).await?;
        input.assignees = self.require_assignees(&input.assignees)?;
        let project_id = access.project.id;
        let (task_id, _) = commit_with_retry(self.store.as_ref(), move || {
            Box::pin(self.plan_task_create(user, project_id, input.clone()))
        })
        .await?;
        log::debug!("User {} created task {} in project {}", user, task_id, project_id);
        self.project_task(task_id).await
    }

    async fn plan_task_create(
        &self,
        user: UserId,
        project_id: ProjectId,
        input: NewTask,
    ) -> ServiceResult<Planned<TaskId>> {
        let column = self.destination(project_id, input.column_id).await?;
        let indices = self.column_indices(project_id, column.id).await?;
        let now = Utc::now();
        let task = Task {
            id: TaskId::new(),
            title: input.title.trim().to_string(),
            description: input.description,
            project_id,
            column_id: column.id,
            order_index: append_index(&indices),
            priority: input.priority.unwrap_or_default(),
            due_date: input.due_date,
            assignees: input.assignees,
            created_by: user,
            created_at: now,
            updated_at: now,
        };

        let mut unit = UnitOfWork::new(format!("create task in column {}", column.id));
        unit.push(receiving(&column))
            .push(holding(column.id, indices.len()))
            .push(WriteOp::Insert(Document::Task(task.clone())));
        Ok(Planned::new(unit, task.id))
    }

    /// Tasks in board order: by column position, then by position in the column.
    pub async fn list_tasks(
        &self,
        user: UserId,
        project_id: ProjectId,
        filter: TaskFilter,
    ) -> ServiceResult<Vec<TaskView>> {
        let access = self.gate.project(user, project_id).await?;
        let query = filter.into_query(access.project.id)?;
        let tasks = self.store.tasks(query).await?;
        let columns: HashMap<ColumnId, Column> = self
            .store
            .columns_in_project(access.project.id)
            .await?
            .into_iter()
            .map(|column| (column.id, column))
            .collect();

        let mut placed: Vec<(&Column, &Task)> = Vec::with_capacity(tasks.len());
        for task in &tasks {
            match columns.get(&task.column_id) {
                Some(column) => placed.push((column, task)),
                None => log::warn!("Task {} references missing column {}", task.id, task.column_id),
            }
        }
        placed.sort_by_key(|(column, task)| (column.order_index, task.order_index));
        Ok(placed
            .into_iter()
            .map(|(column, task)| task_view(self.directory(), task, &access.project, column))
            .collect())
    }

    pub async fn get_task(&self, user: UserId, task_id: TaskId) -> ServiceResult<TaskView> {
        let (task, access) = self.gate.task(user, task_id).await?;
        let column = self.load_column(task.column_id).await?;
        Ok(task_view(self.directory(), &task, &access.project, &column))
    }

    pub async fn update_task(
        &self,
        user: UserId,
        task_id: TaskId,
        mut input: TaskUpdate,
    ) -> ServiceResult<TaskView> {
        validated(&input)?;
        self.gate.task(user, task_id).await?;
        if let Some(assignees) = &input.assignees {
            input.assignees = Some(self.require_assignees(assignees)?);
        }
        commit_with_retry(self.store.as_ref(), move || {
            Box::pin(self.plan_task_update(task_id, input.clone()))
        })
        .await?;
        log::debug!("User {} updated task {}", user, task_id);
        self.project_task(task_id).await
    }

    async fn plan_task_update(
        &self,
        task_id: TaskId,
        input: TaskUpdate,
    ) -> ServiceResult<Planned<()>> {
        let observed = self.load_task(task_id).await?;
        let mut task = observed.clone();
        if let Some(title) = input.title {
            task.title = title.trim().to_string();
        }
        if let Some(description) = input.description {
            task.description = description;
        }
        if let Some(priority) = input.priority {
            task.priority = priority;
        }
        if let Some(due_date) = input.due_date {
            task.due_date = due_date;
        }
        if let Some(assignees) = input.assignees {
            task.assignees = assignees;
        }
        task.updated_at = Utc::now();

        let mut unit = UnitOfWork::new(format!("update task {}", task_id));
        unit.push(unchanged(&observed));
        if input.column_id != observed.column_id {
            let column = self.destination(observed.project_id, input.column_id).await?;
            let indices = self.column_indices(observed.project_id, column.id).await?;
            task.column_id = column.id;
            task.order_index = append_index(&indices);
            unit.push(receiving(&column))
                .push(holding(column.id, indices.len()))
                .push(WriteOp::Replace(Document::Task(task)))
                .push(compaction(observed.column_id, observed.order_index));
        } else {
            unit.push(WriteOp::Replace(Document::Task(task)));
        }
        Ok(Planned::new(unit, ()))
    }

    pub async fn delete_task(&self, user: UserId, task_id: TaskId) -> ServiceResult<TaskRemoval> {
        self.gate.task(user, task_id).await?;
        let (removal, _) = commit_with_retry(self.store.as_ref(), move || {
            Box::pin(self.plan_task_delete(task_id))
        })
        .await?;
        log::debug!("User {} deleted task {}", user, task_id);
        Ok(removal)
    }

    async fn plan_task_delete(&self, task_id: TaskId) -> ServiceResult<Planned<TaskRemoval>> {
        let task = self.load_task(task_id).await?;
        let mut unit = UnitOfWork::new(format!("delete task {}", task_id));
        unit.push(at(&task))
            .push(WriteOp::DeleteTask(task.id))
            .push(compaction(task.column_id, task.order_index));
        Ok(Planned::new(
            unit,
            TaskRemoval {
                task_id: task.id,
                project_id: task.project_id,
                column_id: task.column_id,
            },
        ))
    }

    /// Appends the task to another column of its project and compacts the
    /// column it left. Moving to the current column changes nothing.
    pub async fn move_task(
        &self,
        user: UserId,
        task_id: TaskId,
        input: MoveTaskInput,
    ) -> ServiceResult<TaskView> {
        self.gate.task(user, task_id).await?;
        commit_with_retry(self.store.as_ref(), move || {
            Box::pin(self.plan_task_move(task_id, input.column_id))
        })
        .await?;
        log::debug!("User {} moved task {} to column {}", user, task_id, input.column_id);
        self.project_task(task_id).await
    }

    async fn plan_task_move(
        &self,
        task_id: TaskId,
        column_id: ColumnId,
    ) -> ServiceResult<Planned<()>> {
        let task = self.load_task(task_id).await?;
        let mut unit = UnitOfWork::new(format!("move task {}", task_id));
        if task.column_id == column_id {
            return Ok(Planned::new(unit, ()));
        }
        let column = self.destination(task.project_id, column_id).await?;
        let indices = self.column_indices(task.project_id, column.id).await?;
        unit.push(at(&task))
            .push(receiving(&column))
            .push(holding(column.id, indices.len()))
            .push(WriteOp::PlaceTask {
                task_id,
                column_id: column.id,
                order_index: append_index(&indices),
            })
            .push(compaction(task.column_id, task.order_index));
        Ok(Planned::new(unit, ()))
    }

    pub async fn reorder_task(
        &self,
        user: UserId,
        task_id: TaskId,
        input: PositionInput,
    ) -> ServiceResult<TaskView> {
        self.gate.task(user, task_id).await?;
        commit_with_retry(self.store.as_ref(), move || {
            Box::pin(self.plan_task_reorder(task_id, input.order_index))
        })
        .await?;
        self.project_task(task_id).await
    }

    async fn plan_task_reorder(&self, task_id: TaskId, target: u32) -> ServiceResult<Planned<()>> {
        let task = self.load_task(task_id).await?;
        let indices = self.column_indices(task.project_id, task.column_id).await?;
        if !is_dense(&indices) {
            log::warn!("Task order of column {} has drifted: {:?}", task.column_id, indices);
        }

        let mut unit = UnitOfWork::new(format!("reorder task {}", task_id));
        if let ReorderPlan::Move { shift, target } =
            plan_reorder(task.order_index, target, indices.len())?
        {
            unit.push(at(&task))
                .push(holding(task.column_id, indices.len()))
                .push(WriteOp::ShiftTasks {
                    column_id: task.column_id,
                    range: shift.range,
                    delta: shift.delta,
                })
                .push(WriteOp::PlaceTask {
                    task_id,
                    column_id: task.column_id,
                    order_index: target,
                });
        }
        Ok(Planned::new(unit, ()))
    }

    pub async fn add_assignee(
        &self,
        user: UserId,
        task_id: TaskId,
        input: AssigneeInput,
    ) -> ServiceResult<TaskView> {
        self.gate.task(user, task_id).await?;
        self.require_user(input.assignee_id)?;
        commit_with_retry(self.store.as_ref(), move || {
            Box::pin(self.plan_assignment(task_id, input.assignee_id, true))
        })
        .await?;
        log::debug!("User {} assigned to task {}", input.assignee_id, task_id);
        self.project_task(task_id).await
    }

    pub async fn remove_assignee(
        &self,
        user: UserId,
        task_id: TaskId,
        assignee: UserId,
    ) -> ServiceResult<TaskView> {
        self.gate.task(user, task_id).await?;
        commit_with_retry(self.store.as_ref(), move || {
            Box::pin(self.plan_assignment(task_id, assignee, false))
        })
        .await?;
        log::debug!("User {} unassigned from task {}", assignee, task_id);
        self.project_task(task_id).await
    }

    async fn plan_assignment(
        &self,
        task_id: TaskId,
        assignee: UserId,
        assign: bool,
    ) -> ServiceResult<Planned<()>> {
        let observed = self.load_task(task_id).await?;
        let mut task = observed.clone();
        if assign {
            if !push_unique(&mut task.assignees, assignee) {
                return Err(ServiceError::bad_request(
                    "User is already assigned to this task",
                ));
            }
        } else {
            let before = task.assignees.len();
            task.assignees.retain(|user| *user != assignee);
            if task.assignees.len() == before {
                return Err(ServiceError::not_found("User is not assigned to this task"));
            }
        }
        task.updated_at = Utc::now();

        let mut unit = UnitOfWork::new(format!("assignees of task {}", task_id));
        unit.push(unchanged(&observed))
            .push(WriteOp::Replace(Document::Task(task)));
        Ok(Planned::new(unit, ()))
    }
}
