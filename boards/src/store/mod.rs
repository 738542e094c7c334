// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod memory;

pub use memory::MemoryStore;

use crate::board::model::{
    Column, ColumnId, Folder, FolderId, Priority, Project, ProjectId, Task, TaskId, UserId,
};
use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    NotFound(String),
    Duplicate(String),
    /// A precondition recorded at read time no longer holds.
    Stale(String),
    InvalidShift(String),
    Partial {
        label: String,
        applied: usize,
        total: usize,
        cause: Box<StoreError>,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(what) => write!(f, "{} not found", what),
            StoreError::Duplicate(what) => write!(f, "{} already exists", what),
            StoreError::Stale(reason) => write!(f, "Stale read: {}", reason),
            StoreError::InvalidShift(reason) => write!(f, "Invalid index shift: {}", reason),
            StoreError::Partial {
                label,
                applied,
                total,
                cause,
            } => write!(
                f,
                "Unit '{}' stopped after {} of {} steps: {}",
                label, applied, total, cause
            ),
        }
    }
}

impl std::error::Error for StoreError {}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreCapabilities {
    /// Whether a unit of work commits all-or-nothing.
    pub transactions: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Folder(Folder),
    Project(Project),
    Column(Column),
    Task(Task),
}

/// Inclusive index range; `end: None` runs to the end of the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRange {
    pub start: u32,
    pub end: Option<u32>,
}

impl IndexRange {
    pub fn between(start: u32, end: u32) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    pub fn starting_at(start: u32) -> Self {
        Self { start, end: None }
    }

    pub fn contains(&self, index: u32) -> bool {
        index >= self.start && self.end.is_none_or(|end| index <= end)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Precondition {
    TaskAt {
        task_id: TaskId,
        column_id: ColumnId,
        order_index: u32,
    },
    ColumnAt {
        column_id: ColumnId,
        order_index: u32,
    },
    TaskCount {
        column_id: ColumnId,
        count: usize,
    },
    ColumnCount {
        project_id: ProjectId,
        count: usize,
    },
    /// The column is still there and still belongs to `project_id`.
    ColumnExists {
        column_id: ColumnId,
        project_id: ProjectId,
    },
    FolderExists(FolderId),
    ProjectExists(ProjectId),
    /// Exactly these projects live in the folder, in any order.
    FolderProjects {
        folder_id: FolderId,
        projects: Vec<ProjectId>,
    },
    /// The stored document still equals the one the plan was built from.
    Unchanged(Document),
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Check(Precondition),
    Insert(Document),
    Replace(Document),
    ShiftTasks {
        column_id: ColumnId,
        range: IndexRange,
        delta: i64,
    },
    ShiftColumns {
        project_id: ProjectId,
        range: IndexRange,
        delta: i64,
    },
    PlaceTask {
        task_id: TaskId,
        column_id: ColumnId,
        order_index: u32,
    },
    PlaceColumn {
        column_id: ColumnId,
        order_index: u32,
    },
    DeleteTask(TaskId),
    DeleteTasksInColumn(ColumnId),
    DeleteTasksInProjects(Vec<ProjectId>),
    DeleteColumn(ColumnId),
    DeleteColumnsInProjects(Vec<ProjectId>),
    DeleteProjects(Vec<ProjectId>),
    DeleteFolder(FolderId),
}

/// Ordered writes belonging to one logical mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitOfWork {
    pub label: String,
    pub ops: Vec<WriteOp>,
}

impl UnitOfWork {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ops: Vec::new(),
        }
    }

    pub fn push(&mut self, op: WriteOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    pub fn extend(&mut self, ops: impl IntoIterator<Item = WriteOp>) -> &mut Self {
        self.ops.extend(ops);
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitReport {
    pub atomic: bool,
    pub applied: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskQuery {
    pub project_id: ProjectId,
    pub column_id: Option<ColumnId>,
    pub assignee: Option<UserId>,
    pub priority: Option<Priority>,
    pub due_from: Option<DateTime<Utc>>,
    pub due_to: Option<DateTime<Utc>>,
}

impl TaskQuery {
    pub fn project(project_id: ProjectId) -> Self {
        Self {
            project_id,
            column_id: None,
            assignee: None,
            priority: None,
            due_from: None,
            due_to: None,
        }
    }

    pub fn column(project_id: ProjectId, column_id: ColumnId) -> Self {
        Self {
            column_id: Some(column_id),
            ..Self::project(project_id)
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        if task.project_id != self.project_id {
            return false;
        }
        if self.column_id.is_some_and(|column| task.column_id != column) {
            return false;
        }
        if self.assignee.is_some_and(|user| !task.is_assigned(user)) {
            return false;
        }
        if self.priority.is_some_and(|priority| task.priority != priority) {
            return false;
        }
        if self.due_from.is_some() || self.due_to.is_some() {
            let Some(due) = task.due_date else {
                return false;
            };
            if self.due_from.is_some_and(|from| due < from) {
                return false;
            }
            if self.due_to.is_some_and(|to| due > to) {
                return false;
            }
        }
        true
    }
}

/// Authoritative document store behind every board operation.
pub trait DocumentStore: Send + Sync {
    fn capabilities(&self) -> StoreCapabilities;

    fn folder(&self, id: FolderId) -> BoxFuture<'_, StoreResult<Option<Folder>>>;
    fn folders_for_user(&self, user: UserId) -> BoxFuture<'_, StoreResult<Vec<Folder>>>;

    fn project(&self, id: ProjectId) -> BoxFuture<'_, StoreResult<Option<Project>>>;
    fn projects_in_folder(&self, folder: FolderId) -> BoxFuture<'_, StoreResult<Vec<Project>>>;
    /// Projects naming `user` as owner or member directly.
    fn projects_for_user(&self, user: UserId) -> BoxFuture<'_, StoreResult<Vec<Project>>>;

    fn column(&self, id: ColumnId) -> BoxFuture<'_, StoreResult<Option<Column>>>;
    /// Columns of a project sorted by order index.
    fn columns_in_project(&self, project: ProjectId)
    -> BoxFuture<'_, StoreResult<Vec<Column>>>;

    fn task(&self, id: TaskId) -> BoxFuture<'_, StoreResult<Option<Task>>>;
    /// Matching tasks sorted by order index within each column.
    fn tasks(&self, query: TaskQuery) -> BoxFuture<'_, StoreResult<Vec<Task>>>;

    fn commit(&self, unit: UnitOfWork) -> BoxFuture<'_, StoreResult<CommitReport>>;
}
