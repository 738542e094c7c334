// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::{
    CommitReport, Document, DocumentStore, IndexRange, Precondition, StoreCapabilities,
    StoreError, StoreResult, TaskQuery, UnitOfWork, WriteOp,
};
use crate::board::model::{
    Column, ColumnId, Folder, FolderId, Project, ProjectId, Task, TaskId, UserId,
};
use chrono::Utc;
use futures_util::future::BoxFuture;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Collections {
    folders: HashMap<FolderId, Folder>,
    projects: HashMap<ProjectId, Project>,
    columns: HashMap<ColumnId, Column>,
    tasks: HashMap<TaskId, Task>,
}

/// Prior versions of the documents a unit of work has touched so far.
/// `None` marks a document that did not exist before the unit.
#[derive(Debug, Default)]
struct Journal {
    folders: HashMap<FolderId, Option<Folder>>,
    projects: HashMap<ProjectId, Option<Project>>,
    columns: HashMap<ColumnId, Option<Column>>,
    tasks: HashMap<TaskId, Option<Task>>,
}

fn remember<K, V>(saved: &mut HashMap<K, Option<V>>, live: &HashMap<K, V>, key: K)
where
    K: std::hash::Hash + Eq,
    V: Clone,
{
    let prior = live.get(&key).cloned();
    saved.entry(key).or_insert(prior);
}

fn restore<K, V>(live: &mut HashMap<K, V>, saved: HashMap<K, Option<V>>)
where
    K: std::hash::Hash + Eq,
{
    for (key, prior) in saved {
        match prior {
            Some(value) => {
                live.insert(key, value);
            }
            None => {
                live.remove(&key);
            }
        }
    }
}

impl Journal {
    /// Saves every document `op` is about to write, before it runs.
    fn record(&mut self, state: &Collections, op: &WriteOp) {
        match op {
            WriteOp::Check(_) => {}
            WriteOp::Insert(document) | WriteOp::Replace(document) => match document {
                Document::Folder(folder) => remember(&mut self.folders, &state.folders, folder.id),
                Document::Project(project) => {
                    remember(&mut self.projects, &state.projects, project.id)
                }
                Document::Column(column) => remember(&mut self.columns, &state.columns, column.id),
                Document::Task(task) => remember(&mut self.tasks, &state.tasks, task.id),
            },
            WriteOp::ShiftTasks {
                column_id, range, ..
            } => {
                for task in state.tasks.values() {
                    if task.column_id == *column_id && range.contains(task.order_index) {
                        remember(&mut self.tasks, &state.tasks, task.id);
                    }
                }
            }
            WriteOp::ShiftColumns {
                project_id, range, ..
            } => {
                for column in state.columns.values() {
                    if column.project_id == *project_id && range.contains(column.order_index) {
                        remember(&mut self.columns, &state.columns, column.id);
                    }
                }
            }
            WriteOp::PlaceTask { task_id, .. } | WriteOp::DeleteTask(task_id) => {
                remember(&mut self.tasks, &state.tasks, *task_id)
            }
            WriteOp::PlaceColumn { column_id, .. } | WriteOp::DeleteColumn(column_id) => {
                remember(&mut self.columns, &state.columns, *column_id)
            }
            WriteOp::DeleteTasksInColumn(column_id) => {
                for task in state.tasks.values() {
                    if task.column_id == *column_id {
                        remember(&mut self.tasks, &state.tasks, task.id);
                    }
                }
            }
            WriteOp::DeleteTasksInProjects(projects) => {
                for task in state.tasks.values() {
                    if projects.contains(&task.project_id) {
                        remember(&mut self.tasks, &state.tasks, task.id);
                    }
                }
            }
            WriteOp::DeleteColumnsInProjects(projects) => {
                for column in state.columns.values() {
                    if projects.contains(&column.project_id) {
                        remember(&mut self.columns, &state.columns, column.id);
                    }
                }
            }
            WriteOp::DeleteProjects(projects) => {
                for project_id in projects {
                    remember(&mut self.projects, &state.projects, *project_id);
                }
            }
            WriteOp::DeleteFolder(folder_id) => {
                remember(&mut self.folders, &state.folders, *folder_id)
            }
        }
    }

    fn rollback(self, state: &mut Collections) {
        restore(&mut state.folders, self.folders);
        restore(&mut state.projects, self.projects);
        restore(&mut state.columns, self.columns);
        restore(&mut state.tasks, self.tasks);
    }
}

/// Process-local document store.
///
/// With `transactions` enabled a unit of work runs under one write lock and
/// a journal of the documents it touched restores them if any step fails.
/// Without it the steps are applied one at a time with the lock released in
/// between, so other requests may observe intermediate states.
pub struct MemoryStore {
    state: RwLock<Collections>,
    capabilities: StoreCapabilities,
}

impl MemoryStore {
    pub fn new(capabilities: StoreCapabilities) -> Self {
        Self {
            state: RwLock::new(Collections::default()),
            capabilities,
        }
    }

    pub fn transactional() -> Self {
        Self::new(StoreCapabilities { transactions: true })
    }

    pub fn sequential() -> Self {
        Self::new(StoreCapabilities {
            transactions: false,
        })
    }

    async fn commit_atomic(&self, unit: UnitOfWork) -> StoreResult<CommitReport> {
        let mut guard = self.state.write().await;
        let mut journal = Journal::default();
        for op in &unit.ops {
            journal.record(&guard, op);
            if let Err(err) = apply(&mut guard, op) {
                journal.rollback(&mut guard);
                return Err(err);
            }
        }
        Ok(CommitReport {
            atomic: true,
            applied: unit.ops.len(),
        })
    }

    async fn commit_sequential(&self, unit: UnitOfWork) -> StoreResult<CommitReport> {
        let total = unit.ops.len();
        for (applied, op) in unit.ops.iter().enumerate() {
            let result = {
                let mut guard = self.state.write().await;
                apply(&mut guard, op)
            };
            if let Err(cause) = result {
                if applied == 0 {
                    return Err(cause);
                }
                return Err(StoreError::Partial {
                    label: unit.label.clone(),
                    applied,
                    total,
                    cause: Box::new(cause),
                });
            }
            tokio::task::yield_now().await;
        }
        Ok(CommitReport {
            atomic: false,
            applied: total,
        })
    }
}

fn check(state: &Collections, precondition: &Precondition) -> StoreResult<()> {
    match precondition {
        Precondition::TaskAt {
            task_id,
            column_id,
            order_index,
        } => {
            let task = state
                .tasks
                .get(task_id)
                .ok_or_else(|| StoreError::NotFound("Task".to_string()))?;
            if task.column_id != *column_id || task.order_index != *order_index {
                return Err(StoreError::Stale(format!(
                    "task {} is no longer at position {}",
                    task_id, order_index
                )));
            }
        }
        Precondition::ColumnAt {
            column_id,
            order_index,
        } => {
            let column = state
                .columns
                .get(column_id)
                .ok_or_else(|| StoreError::NotFound("Column".to_string()))?;
            if column.order_index != *order_index {
                return Err(StoreError::Stale(format!(
                    "column {} is no longer at position {}",
                    column_id, order_index
                )));
            }
        }
        Precondition::TaskCount { column_id, count } => {
            let actual = state
                .tasks
                .values()
                .filter(|task| task.column_id == *column_id)
                .count();
            if actual != *count {
                return Err(StoreError::Stale(format!(
                    "column {} holds {} tasks, expected {}",
                    column_id, actual, count
                )));
            }
        }
        Precondition::ColumnCount { project_id, count } => {
            let actual = state
                .columns
                .values()
                .filter(|column| column.project_id == *project_id)
                .count();
            if actual != *count {
                return Err(StoreError::Stale(format!(
                    "project {} holds {} columns, expected {}",
                    project_id, actual, count
                )));
            }
        }
        Precondition::ColumnExists {
            column_id,
            project_id,
        } => {
            let present = state
                .columns
                .get(column_id)
                .is_some_and(|column| column.project_id == *project_id);
            if !present {
                return Err(StoreError::Stale(format!(
                    "column {} is gone from project {}",
                    column_id, project_id
                )));
            }
        }
        Precondition::FolderExists(folder_id) => {
            if !state.folders.contains_key(folder_id) {
                return Err(StoreError::Stale(format!("folder {} is gone", folder_id)));
            }
        }
        Precondition::ProjectExists(project_id) => {
            if !state.projects.contains_key(project_id) {
                return Err(StoreError::Stale(format!("project {} is gone", project_id)));
            }
        }
        Precondition::FolderProjects {
            folder_id,
            projects,
        } => {
            let mut actual: Vec<ProjectId> = state
                .projects
                .values()
                .filter(|project| project.folder_id == *folder_id)
                .map(|project| project.id)
                .collect();
            let mut expected = projects.clone();
            actual.sort();
            expected.sort();
            if actual != expected {
                return Err(StoreError::Stale(format!(
                    "folder {} holds {} projects, expected {}",
                    folder_id,
                    actual.len(),
                    expected.len()
                )));
            }
        }
        Precondition::Unchanged(document) => {
            let (unchanged, what) = match document {
                Document::Folder(folder) => {
                    (state.folders.get(&folder.id) == Some(folder), "folder")
                }
                Document::Project(project) => {
                    (state.projects.get(&project.id) == Some(project), "project")
                }
                Document::Column(column) => {
                    (state.columns.get(&column.id) == Some(column), "column")
                }
                Document::Task(task) => (state.tasks.get(&task.id) == Some(task), "task"),
            };
            if !unchanged {
                return Err(StoreError::Stale(format!(
                    "{} was modified concurrently",
                    what
                )));
            }
        }
    }
    Ok(())
}

fn shifted(index: u32, delta: i64, what: &str) -> StoreResult<u32> {
    u32::try_from(i64::from(index) + delta).map_err(|_| {
        StoreError::InvalidShift(format!(
            "{} index {} cannot move by {}",
            what, index, delta
        ))
    })
}

fn shift_indices<'a>(
    indices: impl Iterator<Item = &'a mut u32>,
    range: IndexRange,
    delta: i64,
    what: &str,
) -> StoreResult<()> {
    let targets: Vec<&mut u32> = indices.filter(|index| range.contains(**index)).collect();
    let mut updated = Vec::with_capacity(targets.len());
    for index in &targets {
        updated.push(shifted(**index, delta, what)?);
    }
    for (index, value) in targets.into_iter().zip(updated) {
        *index = value;
    }
    Ok(())
}

fn insert<K, V>(map: &mut HashMap<K, V>, key: K, value: V, what: &str) -> StoreResult<()>
where
    K: std::hash::Hash + Eq,
{
    if map.contains_key(&key) {
        return Err(StoreError::Duplicate(what.to_string()));
    }
    map.insert(key, value);
    Ok(())
}

fn replace<K, V>(map: &mut HashMap<K, V>, key: K, value: V, what: &str) -> StoreResult<()>
where
    K: std::hash::Hash + Eq,
{
    match map.get_mut(&key) {
        Some(slot) => {
            *slot = value;
            Ok(())
        }
        None => Err(StoreError::NotFound(what.to_string())),
    }
}

fn apply(state: &mut Collections, op: &WriteOp) -> StoreResult<()> {
    match op {
        WriteOp::Check(precondition) => check(state, precondition),
        WriteOp::Insert(document) => match document.clone() {
            Document::Folder(folder) => insert(&mut state.folders, folder.id, folder, "Folder"),
            Document::Project(project) => {
                insert(&mut state.projects, project.id, project, "Project")
            }
            Document::Column(column) => insert(&mut state.columns, column.id, column, "Column"),
            Document::Task(task) => insert(&mut state.tasks, task.id, task, "Task"),
        },
        WriteOp::Replace(document) => match document.clone() {
            Document::Folder(folder) => replace(&mut state.folders, folder.id, folder, "Folder"),
            Document::Project(project) => {
                replace(&mut state.projects, project.id, project, "Project")
            }
            Document::Column(column) => {
                replace(&mut state.columns, column.id, column, "Column")
            }
            Document::Task(task) => replace(&mut state.tasks, task.id, task, "Task"),
        },
        WriteOp::ShiftTasks {
            column_id,
            range,
            delta,
        } => shift_indices(
            state
                .tasks
                .values_mut()
                .filter(|task| task.column_id == *column_id)
                .map(|task| &mut task.order_index),
            *range,
            *delta,
            "Task",
        ),
        WriteOp::ShiftColumns {
            project_id,
            range,
            delta,
        } => shift_indices(
            state
                .columns
                .values_mut()
                .filter(|column| column.project_id == *project_id)
                .map(|column| &mut column.order_index),
            *range,
            *delta,
            "Column",
        ),
        WriteOp::PlaceTask {
            task_id,
            column_id,
            order_index,
        } => {
            let task = state
                .tasks
                .get_mut(task_id)
                .ok_or_else(|| StoreError::NotFound("Task".to_string()))?;
            task.column_id = *column_id;
            task.order_index = *order_index;
            task.updated_at = Utc::now();
            Ok(())
        }
        WriteOp::PlaceColumn {
            column_id,
            order_index,
        } => {
            let column = state
                .columns
                .get_mut(column_id)
                .ok_or_else(|| StoreError::NotFound("Column".to_string()))?;
            column.order_index = *order_index;
            column.updated_at = Utc::now();
            Ok(())
        }
        WriteOp::DeleteTask(task_id) => state
            .tasks
            .remove(task_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound("Task".to_string())),
        WriteOp::DeleteTasksInColumn(column_id) => {
            state.tasks.retain(|_, task| task.column_id != *column_id);
            Ok(())
        }
        WriteOp::DeleteTasksInProjects(projects) => {
            state
                .tasks
                .retain(|_, task| !projects.contains(&task.project_id));
            Ok(())
        }
        WriteOp::DeleteColumn(column_id) => state
            .columns
            .remove(column_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound("Column".to_string())),
        WriteOp::DeleteColumnsInProjects(projects) => {
            state
                .columns
                .retain(|_, column| !projects.contains(&column.project_id));
            Ok(())
        }
        WriteOp::DeleteProjects(projects) => {
            state.projects.retain(|id, _| !projects.contains(id));
            Ok(())
        }
        WriteOp::DeleteFolder(folder_id) => state
            .folders
            .remove(folder_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound("Folder".to_string())),
    }
}

fn sorted_by_creation<T>(
    items: impl Iterator<Item = T>,
    key: impl Fn(&T) -> chrono::DateTime<Utc>,
) -> Vec<T> {
    let mut items: Vec<T> = items.collect();
    items.sort_by_key(&key);
    items
}

impl DocumentStore for MemoryStore {
    fn capabilities(&self) -> StoreCapabilities {
        self.capabilities
    }

    fn folder(&self, id: FolderId) -> BoxFuture<'_, StoreResult<Option<Folder>>> {
        Box::pin(async move { Ok(self.state.read().await.folders.get(&id).cloned()) })
    }

    fn folders_for_user(&self, user: UserId) -> BoxFuture<'_, StoreResult<Vec<Folder>>> {
        Box::pin(async move {
            let state = self.state.read().await;
            Ok(sorted_by_creation(
                state
                    .folders
                    .values()
                    .filter(|folder| folder.is_owner(user) || folder.is_member(user))
                    .cloned(),
                |folder| folder.created_at,
            ))
        })
    }

    fn project(&self, id: ProjectId) -> BoxFuture<'_, StoreResult<Option<Project>>> {
        Box::pin(async move { Ok(self.state.read().await.projects.get(&id).cloned()) })
    }

    fn projects_in_folder(&self, folder: FolderId) -> BoxFuture<'_, StoreResult<Vec<Project>>> {
        Box::pin(async move {
            let state = self.state.read().await;
            Ok(sorted_by_creation(
                state
                    .projects
                    .values()
                    .filter(|project| project.folder_id == folder)
                    .cloned(),
                |project| project.created_at,
            ))
        })
    }

    fn projects_for_user(&self, user: UserId) -> BoxFuture<'_, StoreResult<Vec<Project>>> {
        Box::pin(async move {
            let state = self.state.read().await;
            Ok(sorted_by_creation(
                state
                    .projects
                    .values()
                    .filter(|project| project.is_owner(user) || project.is_member(user))
                    .cloned(),
                |project| project.created_at,
            ))
        })
    }

    fn column(&self, id: ColumnId) -> BoxFuture<'_, StoreResult<Option<Column>>> {
        Box::pin(async move { Ok(self.state.read().await.columns.get(&id).cloned()) })
    }

    fn columns_in_project(
        &self,
        project: ProjectId,
    ) -> BoxFuture<'_, StoreResult<Vec<Column>>> {
        Box::pin(async move {
            let state = self.state.read().await;
            let mut columns: Vec<Column> = state
                .columns
                .values()
                .filter(|column| column.project_id == project)
                .cloned()
                .collect();
            columns.sort_by_key(|column| (column.order_index, column.created_at));
            Ok(columns)
        })
    }

    fn task(&self, id: TaskId) -> BoxFuture<'_, StoreResult<Option<Task>>> {
        Box::pin(async move { Ok(self.state.read().await.tasks.get(&id).cloned()) })
    }

    fn tasks(&self, query: TaskQuery) -> BoxFuture<'_, StoreResult<Vec<Task>>> {
        Box::pin(async move {
            let state = self.state.read().await;
            let mut tasks: Vec<Task> = state
                .tasks
                .values()
                .filter(|task| query.matches(task))
                .cloned()
                .collect();
            tasks.sort_by_key(|task| (task.column_id, task.order_index, task.created_at));
            Ok(tasks)
        })
    }

    fn commit(&self, unit: UnitOfWork) -> BoxFuture<'_, StoreResult<CommitReport>> {
        Box::pin(async move {
            if unit.is_empty() {
                return Ok(CommitReport {
                    atomic: self.capabilities.transactions,
                    applied: 0,
                });
            }
            if self.capabilities.transactions {
                self.commit_atomic(unit).await
            } else {
                self.commit_sequential(unit).await
            }
        })
    }
}
