// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Single entry point for task and column mutations.
//!
//! The HTTP routes and the push transport both land here, so a mutation
//! runs the same service call and notifies the project room the same way
//! whichever transport carried it.

use crate::board::model::{ColumnId, FolderId, ProjectId, TaskId, UserId};
use crate::board::projection::{ColumnView, TaskView};
use crate::board::{
    AssigneeInput, BoardService, ColumnRemoval, FolderRemoval, MoveTaskInput, NewColumn, NewTask,
    PositionInput, ProjectRemoval, RenameColumn, TaskRemoval, TaskUpdate,
};
use crate::error::{ServiceError, ServiceResult};
use crate::realtime::{
    ColumnDeletedPayload, RoomPayload, RoomRegistry, ServerEvent, SessionId, TaskDeletedPayload,
};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum TaskCommand {
    Create { project_id: ProjectId, input: NewTask },
    Update { task_id: TaskId, input: TaskUpdate },
    Delete { task_id: TaskId },
    Move { task_id: TaskId, input: MoveTaskInput },
    Reorder { task_id: TaskId, input: PositionInput },
    AddAssignee { task_id: TaskId, input: AssigneeInput },
    RemoveAssignee { task_id: TaskId, assignee: UserId },
}

#[derive(Debug, Clone)]
pub enum ColumnCommand {
    Create { project_id: ProjectId, input: NewColumn },
    Rename { column_id: ColumnId, input: RenameColumn },
    Reorder { column_id: ColumnId, input: PositionInput },
    Delete { column_id: ColumnId },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    Task(TaskView),
    Deleted(TaskRemoval),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnOutcome {
    Column(ColumnView),
    Deleted(ColumnRemoval),
}

#[derive(Clone)]
pub struct MutationGateway {
    board: BoardService,
    rooms: Arc<RoomRegistry>,
}

impl MutationGateway {
    pub fn new(board: BoardService, rooms: Arc<RoomRegistry>) -> Self {
        Self { board, rooms }
    }

    pub fn board(&self) -> &BoardService {
        &self.board
    }

    pub fn rooms(&self) -> &Arc<RoomRegistry> {
        &self.rooms
    }

    fn publish(&self, project_id: ProjectId, event: ServerEvent) {
        let delivered = self.rooms.broadcast(project_id, &event);
        log::debug!(
            "Broadcast to room {} reached {} sessions",
            project_id,
            delivered
        );
    }

    pub async fn task(&self, user: UserId, command: TaskCommand) -> ServiceResult<TaskOutcome> {
        let board = &self.board;
        let (view, event): (TaskView, fn(TaskView) -> ServerEvent) = match command {
            TaskCommand::Create { project_id, input } => (
                board.create_task(user, project_id, input).await?,
                ServerEvent::TaskCreated,
            ),
            TaskCommand::Update { task_id, input } => (
                board.update_task(user, task_id, input).await?,
                ServerEvent::TaskUpdated,
            ),
            TaskCommand::Delete { task_id } => {
                let removal = board.delete_task(user, task_id).await?;
                self.publish(
                    removal.project_id,
                    ServerEvent::TaskDeleted(TaskDeletedPayload {
                        task_id: removal.task_id,
                        project_id: removal.project_id,
                        column_id: removal.column_id,
                    }),
                );
                return Ok(TaskOutcome::Deleted(removal));
            }
            TaskCommand::Move { task_id, input } => (
                board.move_task(user, task_id, input).await?,
                ServerEvent::TaskMoved,
            ),
            TaskCommand::Reorder { task_id, input } => (
                board.reorder_task(user, task_id, input).await?,
                ServerEvent::TaskReordered,
            ),
            TaskCommand::AddAssignee { task_id, input } => (
                board.add_assignee(user, task_id, input).await?,
                ServerEvent::TaskUpdated,
            ),
            TaskCommand::RemoveAssignee { task_id, assignee } => (
                board.remove_assignee(user, task_id, assignee).await?,
                ServerEvent::TaskUpdated,
            ),
        };
        self.publish(view.project.id, event(view.clone()));
        Ok(TaskOutcome::Task(view))
    }

    pub async fn column(
        &self,
        user: UserId,
        command: ColumnCommand,
    ) -> ServiceResult<ColumnOutcome> {
        let board = &self.board;
        let (view, event): (ColumnView, fn(ColumnView) -> ServerEvent) = match command {
            ColumnCommand::Create { project_id, input } => (
                board.create_column(user, project_id, input).await?,
                ServerEvent::ColumnCreated,
            ),
            ColumnCommand::Rename { column_id, input } => (
                board.rename_column(user, column_id, input).await?,
                ServerEvent::ColumnUpdated,
            ),
            ColumnCommand::Reorder { column_id, input } => (
                board.reorder_column(user, column_id, input).await?,
                ServerEvent::ColumnReordered,
            ),
            ColumnCommand::Delete { column_id } => {
                let removal = board.delete_column(user, column_id).await?;
                self.publish(
                    removal.project_id,
                    ServerEvent::ColumnDeleted(ColumnDeletedPayload {
                        column_id: removal.column_id,
                        project_id: removal.project_id,
                        relocated_to: removal.relocated_to,
                    }),
                );
                return Ok(ColumnOutcome::Deleted(removal));
            }
        };
        self.publish(view.project_id, event(view.clone()));
        Ok(ColumnOutcome::Column(view))
    }

    pub async fn delete_project(
        &self,
        user: UserId,
        project_id: ProjectId,
    ) -> ServiceResult<ProjectRemoval> {
        let removal = self.board.delete_project(user, project_id).await?;
        self.project_gone(removal.project_id);
        Ok(removal)
    }

    pub async fn delete_folder(
        &self,
        user: UserId,
        folder_id: FolderId,
    ) -> ServiceResult<FolderRemoval> {
        let removal = self.board.delete_folder(user, folder_id).await?;
        for project_id in &removal.projects {
            self.project_gone(*project_id);
        }
        Ok(removal)
    }

    fn project_gone(&self, project_id: ProjectId) {
        self.publish(project_id, ServerEvent::ProjectDeleted(RoomPayload { project_id }));
        self.rooms.close_room(project_id);
    }

    /// Adds a session to a project room once the user passes the access gate.
    pub async fn join(
        &self,
        user: UserId,
        session: SessionId,
        project_id: ProjectId,
    ) -> ServiceResult<()> {
        let access = self.board.gate().project(user, project_id).await?;
        if !self.rooms.join(session, access.project.id) {
            log::debug!("Session {} closed before joining {}", session, project_id);
            return Err(ServiceError::conflict("Session is no longer connected"));
        }
        Ok(())
    }

    pub fn leave(&self, session: SessionId, project_id: ProjectId) -> bool {
        self.rooms.leave(session, project_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::projection::testing::StaticDirectory;
    use crate::board::{NewFolder, NewProject};
    use crate::error::ErrorKind;
    use crate::store::MemoryStore;
    use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

    struct Fixture {
        gateway: MutationGateway,
        user: UserId,
        stranger: UserId,
        project: ProjectId,
        column: ColumnId,
    }

    async fn fixture() -> Fixture {
        let mut directory = StaticDirectory::default();
        let user = directory.add("Una");
        let stranger = directory.add("Sam");
        let board = BoardService::new(Arc::new(MemoryStore::transactional()), Arc::new(directory));
        let folder = board
            .create_folder(
                user,
                NewFolder {
                    name: "F".to_string(),
                    description: String::new(),
                },
            )
            .await
            .unwrap();
        let project = board
            .create_project(
                user,
                folder.id,
                NewProject {
                    name: "P".to_string(),
                    description: String::new(),
                },
            )
            .await
            .unwrap();
        let column = board.list_columns(user, project.id).await.unwrap()[0].id;
        Fixture {
            gateway: MutationGateway::new(board, Arc::new(RoomRegistry::new())),
            user,
            stranger,
            project: project.id,
            column,
        }
    }

    fn connect(gateway: &MutationGateway, session: SessionId) -> UnboundedReceiver<ServerEvent> {
        let (outbox, inbox) = unbounded_channel();
        gateway.rooms().register(session, outbox);
        inbox
    }

    fn create(fx: &Fixture, title: &str) -> TaskCommand {
        TaskCommand::Create {
            project_id: fx.project,
            input: NewTask {
                column_id: fx.column,
                title: title.to_string(),
                description: String::new(),
                priority: None,
                due_date: None,
                assignees: Vec::new(),
            },
        }
    }

    #[tokio::test]
    async fn mutations_reach_the_room_including_the_originator() {
        let fx = fixture().await;
        let mut inboxes = Vec::new();
        for session in 1..=3 {
            inboxes.push(connect(&fx.gateway, session));
            fx.gateway.join(fx.user, session, fx.project).await.unwrap();
        }

        let outcome = fx.gateway.task(fx.user, create(&fx, "Ship")).await.unwrap();
        let TaskOutcome::Task(view) = outcome else {
            panic!("expected a task view");
        };

        for inbox in &mut inboxes {
            assert_eq!(inbox.try_recv().unwrap(), ServerEvent::TaskCreated(view.clone()));
            assert!(inbox.try_recv().is_err());
        }
    }

    #[tokio::test]
    async fn failed_mutations_broadcast_nothing() {
        let fx = fixture().await;
        let mut inbox = connect(&fx.gateway, 1);
        fx.gateway.join(fx.user, 1, fx.project).await.unwrap();

        let err = fx
            .gateway
            .task(
                fx.user,
                TaskCommand::Delete {
                    task_id: TaskId::new(),
                },
            )
            .await
            .expect_err("unknown task");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(inbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn strangers_cannot_join_rooms() {
        let fx = fixture().await;
        let _inbox = connect(&fx.gateway, 1);
        let err = fx
            .gateway
            .join(fx.stranger, 1, fx.project)
            .await
            .expect_err("no access");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(fx.gateway.rooms().room_size(fx.project), 0);
    }

    #[tokio::test]
    async fn closed_sessions_cannot_join_rooms() {
        let fx = fixture().await;
        let err = fx
            .gateway
            .join(fx.user, 7, fx.project)
            .await
            .expect_err("unregistered session");
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let _inbox = connect(&fx.gateway, 8);
        fx.gateway.rooms().disconnect(8);
        assert!(fx.gateway.join(fx.user, 8, fx.project).await.is_err());
        assert_eq!(fx.gateway.rooms().room_size(fx.project), 0);
    }

    #[tokio::test]
    async fn project_deletion_notifies_and_closes_the_room() {
        let fx = fixture().await;
        let mut inbox = connect(&fx.gateway, 1);
        fx.gateway.join(fx.user, 1, fx.project).await.unwrap();

        fx.gateway.delete_project(fx.user, fx.project).await.unwrap();
        assert_eq!(
            inbox.try_recv().unwrap(),
            ServerEvent::ProjectDeleted(RoomPayload {
                project_id: fx.project
            })
        );
        assert_eq!(fx.gateway.rooms().room_size(fx.project), 0);
    }

    #[tokio::test]
    async fn column_deletion_reports_relocation() {
        let fx = fixture().await;
        let mut inbox = connect(&fx.gateway, 1);
        fx.gateway.join(fx.user, 1, fx.project).await.unwrap();
        let columns = fx.gateway.board().list_columns(fx.user, fx.project).await.unwrap();

        fx.gateway
            .column(
                fx.user,
                ColumnCommand::Delete {
                    column_id: columns[1].id,
                },
            )
            .await
            .unwrap();
        match inbox.try_recv().unwrap() {
            ServerEvent::ColumnDeleted(payload) => {
                assert_eq!(payload.column_id, columns[1].id);
                assert_eq!(payload.relocated_to, Some(columns[0].id));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
