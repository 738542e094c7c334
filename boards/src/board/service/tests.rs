// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::*;
use crate::board::filters::TaskFilter;
use crate::board::model::{Folder, FolderId, Priority};
use crate::board::ordering::is_dense;
use crate::board::projection::testing::StaticDirectory;
use crate::error::ErrorKind;
use crate::store::{
    CommitReport, Document, MemoryStore, StoreCapabilities, StoreResult, TaskQuery, WriteOp,
};
use chrono::Utc;
use futures_util::future::BoxFuture;
use std::sync::Mutex;

struct Board {
    service: BoardService,
    store: Arc<dyn DocumentStore>,
    owner: UserId,
    member: UserId,
    outsider: UserId,
    folder: FolderId,
    project: ProjectId,
    columns: Vec<ColumnId>,
}

async fn board_on(store: Arc<dyn DocumentStore>) -> Board {
    let mut directory = StaticDirectory::default();
    let owner = directory.add("Olivia");
    let member = directory.add("Mateo");
    let outsider = directory.add("Oscar");
    let service = BoardService::new(store.clone(), Arc::new(directory));

    let folder = service
        .create_folder(
            owner,
            NewFolder {
                name: "Team".to_string(),
                description: String::new(),
            },
        )
        .await
        .unwrap();
    service
        .add_folder_member(owner, folder.id, MemberInput { user_id: member })
        .await
        .unwrap();
    let project = service
        .create_project(
            owner,
            folder.id,
            NewProject {
                name: "Launch".to_string(),
                description: String::new(),
            },
        )
        .await
        .unwrap();
    let columns = service
        .list_columns(owner, project.id)
        .await
        .unwrap()
        .into_iter()
        .map(|column| column.id)
        .collect();

    Board {
        service,
        store,
        owner,
        member,
        outsider,
        folder: folder.id,
        project: project.id,
        columns,
    }
}

async fn board() -> Board {
    board_on(Arc::new(MemoryStore::transactional())).await
}

fn new_task(column_id: ColumnId, title: &str) -> NewTask {
    NewTask {
        column_id,
        title: title.to_string(),
        description: String::new(),
        priority: None,
        due_date: None,
        assignees: Vec::new(),
    }
}

impl Board {
    async fn add_task(&self, column: usize, title: &str) -> TaskId {
        self.service
            .create_task(self.member, self.project, new_task(self.columns[column], title))
            .await
            .unwrap()
            .id
    }

    /// Task titles of one column in order, asserting the indices are dense.
    async fn column_titles(&self, column: usize) -> Vec<String> {
        let tasks = self
            .store
            .tasks(TaskQuery::column(self.project, self.columns[column]))
            .await
            .unwrap();
        let indices: Vec<u32> = tasks.iter().map(|task| task.order_index).collect();
        assert!(is_dense(&indices), "indices {:?}", indices);
        tasks.into_iter().map(|task| task.title).collect()
    }
}

#[tokio::test]
async fn new_projects_get_the_default_columns() {
    let board = board().await;
    let columns = board.service.list_columns(board.owner, board.project).await.unwrap();
    let names: Vec<&str> = columns.iter().map(|column| column.name.as_str()).collect();
    assert_eq!(names, vec!["To Do", "In Progress", "Review", "Done"]);
    let indices: Vec<u32> = columns.iter().map(|column| column.order_index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn reorder_moves_down_and_keeps_density() {
    let board = board().await;
    let a = board.add_task(0, "A").await;
    for title in ["B", "C", "D"] {
        board.add_task(0, title).await;
    }

    let view = board
        .service
        .reorder_task(board.member, a, PositionInput { order_index: 2 })
        .await
        .unwrap();
    assert_eq!(view.order_index, 2);
    assert_eq!(board.column_titles(0).await, vec!["B", "C", "A", "D"]);
}

#[tokio::test]
async fn reorder_rejects_out_of_range_targets() {
    let board = board().await;
    let a = board.add_task(0, "A").await;
    let err = board
        .service
        .reorder_task(board.member, a, PositionInput { order_index: 1 })
        .await
        .expect_err("single task column");
    assert_eq!(err.kind(), ErrorKind::BadRequest);
}

#[tokio::test]
async fn mixed_operations_keep_every_column_dense() {
    for store in [MemoryStore::transactional(), MemoryStore::sequential()] {
        let board = board_on(Arc::new(store)).await;
        let mut ids = Vec::new();
        for title in ["A", "B", "C", "D", "E"] {
            ids.push(board.add_task(0, title).await);
        }
        let service = &board.service;
        let user = board.member;

        service
            .move_task(user, ids[1], MoveTaskInput { column_id: board.columns[1] })
            .await
            .unwrap();
        service
            .reorder_task(user, ids[4], PositionInput { order_index: 0 })
            .await
            .unwrap();
        service.delete_task(user, ids[2]).await.unwrap();
        service
            .move_task(user, ids[0], MoveTaskInput { column_id: board.columns[1] })
            .await
            .unwrap();

        assert_eq!(board.column_titles(0).await, vec!["E", "D"]);
        assert_eq!(board.column_titles(1).await, vec!["B", "A"]);
    }
}

#[tokio::test]
async fn moving_to_the_same_column_changes_nothing() {
    let board = board().await;
    let a = board.add_task(0, "A").await;
    board.add_task(0, "B").await;
    let view = board
        .service
        .move_task(board.member, a, MoveTaskInput { column_id: board.columns[0] })
        .await
        .unwrap();
    assert_eq!(view.order_index, 0);
    assert_eq!(board.column_titles(0).await, vec!["A", "B"]);
}

#[tokio::test]
async fn cross_project_moves_are_rejected_without_writes() {
    let board = board().await;
    let a = board.add_task(0, "A").await;
    let other = board
        .service
        .create_project(
            board.owner,
            board.folder,
            NewProject {
                name: "Other".to_string(),
                description: String::new(),
            },
        )
        .await
        .unwrap();
    let foreign = board.service.list_columns(board.owner, other.id).await.unwrap()[0].id;

    let err = board
        .service
        .move_task(board.member, a, MoveTaskInput { column_id: foreign })
        .await
        .expect_err("column of another project");
    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert_eq!(err.message(), "Column does not belong to this project");

    let task = board.store.task(a).await.unwrap().unwrap();
    assert_eq!(task.column_id, board.columns[0]);
    assert_eq!(task.order_index, 0);
    assert!(
        board
            .store
            .tasks(TaskQuery::project(other.id))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn create_task_checks_the_column_project() {
    let board = board().await;
    let err = board
        .service
        .create_task(board.member, board.project, new_task(ColumnId::new(), "Lost"))
        .await
        .expect_err("unknown column");
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let mut input = new_task(board.columns[0], "Ghost");
    input.assignees = vec![UserId::new()];
    let err = board
        .service
        .create_task(board.member, board.project, input)
        .await
        .expect_err("unknown assignee");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn update_with_another_column_moves_the_task() {
    let board = board().await;
    let a = board.add_task(0, "A").await;
    board.add_task(0, "B").await;
    board.add_task(2, "Z").await;

    let view = board
        .service
        .update_task(
            board.member,
            a,
            TaskUpdate {
                column_id: board.columns[2],
                title: Some("A2".to_string()),
                description: None,
                priority: Some(Priority::High),
                due_date: None,
                assignees: Some(vec![board.owner, board.owner]),
            },
        )
        .await
        .unwrap();

    assert_eq!(view.column.id, board.columns[2]);
    assert_eq!(view.order_index, 1);
    assert_eq!(view.priority, Priority::High);
    assert_eq!(view.assignees.len(), 1);
    assert_eq!(board.column_titles(0).await, vec!["B"]);
    assert_eq!(board.column_titles(2).await, vec!["Z", "A2"]);
}

#[tokio::test]
async fn assignment_is_not_idempotent() {
    let board = board().await;
    let a = board.add_task(0, "A").await;
    let input = AssigneeInput {
        assignee_id: board.owner,
    };

    let view = board.service.add_assignee(board.member, a, input).await.unwrap();
    assert_eq!(view.assignees[0].name, "Olivia");

    let err = board
        .service
        .add_assignee(board.member, a, input)
        .await
        .expect_err("already assigned");
    assert_eq!(err.kind(), ErrorKind::BadRequest);

    board
        .service
        .remove_assignee(board.member, a, board.owner)
        .await
        .unwrap();
    let err = board
        .service
        .remove_assignee(board.member, a, board.owner)
        .await
        .expect_err("no longer assigned");
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = board
        .service
        .add_assignee(
            board.member,
            a,
            AssigneeInput {
                assignee_id: UserId::new(),
            },
        )
        .await
        .expect_err("unknown user");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn access_gate_hides_and_ownership_gate_forbids() {
    let board = board().await;
    let err = board
        .service
        .get_project(board.outsider, board.project)
        .await
        .expect_err("outsider");
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = board
        .service
        .delete_project(board.outsider, board.project)
        .await
        .expect_err("outsider");
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = board
        .service
        .delete_project(board.member, board.project)
        .await
        .expect_err("member");
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = board
        .service
        .update_project_status(
            board.member,
            board.project,
            ProjectStatusInput {
                status: crate::board::model::ProjectStatus::Archived,
            },
        )
        .await
        .expect_err("member");
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn membership_rules() {
    let board = board().await;
    let service = &board.service;

    let err = service
        .add_folder_member(board.owner, board.folder, MemberInput { user_id: board.member })
        .await
        .expect_err("duplicate");
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = service
        .add_folder_member(board.owner, board.folder, MemberInput { user_id: board.owner })
        .await
        .expect_err("owner");
    assert_eq!(err.kind(), ErrorKind::BadRequest);

    let err = service
        .add_folder_member(board.owner, board.folder, MemberInput { user_id: UserId::new() })
        .await
        .expect_err("unknown user");
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = service
        .remove_folder_member(board.owner, board.folder, board.outsider)
        .await
        .expect_err("not a member");
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let view = service
        .add_project_member(board.owner, board.project, MemberInput { user_id: board.outsider })
        .await
        .unwrap();
    assert_eq!(view.members[0].name, "Oscar");
    assert!(service.get_project(board.outsider, board.project).await.is_ok());

    service
        .remove_folder_member(board.owner, board.folder, board.member)
        .await
        .unwrap();
    let err = service
        .get_project(board.member, board.project)
        .await
        .expect_err("access revoked");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn list_tasks_follows_board_order_and_filters() {
    let board = board().await;
    board.add_task(1, "Later").await;
    board.add_task(0, "First").await;
    let second = board.add_task(0, "Second").await;
    board
        .service
        .add_assignee(board.member, second, AssigneeInput { assignee_id: board.member })
        .await
        .unwrap();

    let all = board
        .service
        .list_tasks(board.member, board.project, TaskFilter::default())
        .await
        .unwrap();
    let titles: Vec<&str> = all.iter().map(|task| task.title.as_str()).collect();
    assert_eq!(titles, vec!["First", "Second", "Later"]);

    let mine = board
        .service
        .list_tasks(
            board.member,
            board.project,
            TaskFilter {
                assignee_id: Some(board.member),
                ..TaskFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, second);
}

#[tokio::test]
async fn deleting_a_column_relocates_and_compacts() {
    let board = board().await;
    board.add_task(0, "Keep").await;
    board.add_task(1, "X").await;
    board.add_task(1, "Y").await;

    let removal = board
        .service
        .delete_column(board.member, board.columns[1])
        .await
        .unwrap();
    assert_eq!(removal.relocated_to, Some(board.columns[0]));
    assert_eq!(board.column_titles(0).await, vec!["Keep", "X", "Y"]);

    let columns = board.service.list_columns(board.member, board.project).await.unwrap();
    let indices: Vec<u32> = columns.iter().map(|column| column.order_index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[tokio::test]
async fn column_reorder_and_rename() {
    let board = board().await;
    let view = board
        .service
        .reorder_column(board.member, board.columns[3], PositionInput { order_index: 0 })
        .await
        .unwrap();
    assert_eq!(view.order_index, 0);
    board
        .service
        .rename_column(
            board.member,
            board.columns[3],
            RenameColumn {
                name: " Shipped ".to_string(),
            },
        )
        .await
        .unwrap();

    let columns = board.service.list_columns(board.member, board.project).await.unwrap();
    let names: Vec<&str> = columns.iter().map(|column| column.name.as_str()).collect();
    assert_eq!(names, vec!["Shipped", "To Do", "In Progress", "Review"]);
}

#[tokio::test]
async fn folder_delete_is_owner_only_and_cascades() {
    let board = board().await;
    board.add_task(0, "A").await;

    let err = board
        .service
        .delete_folder(board.member, board.folder)
        .await
        .expect_err("member");
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let removal = board.service.delete_folder(board.owner, board.folder).await.unwrap();
    assert_eq!(removal.projects, vec![board.project]);
    assert!(board.store.project(board.project).await.unwrap().is_none());
    assert!(
        board
            .store
            .tasks(TaskQuery::project(board.project))
            .await
            .unwrap()
            .is_empty()
    );
}

/// Applies a competing write right before the first commit it sees.
struct RacingStore {
    inner: MemoryStore,
    interference: Mutex<Option<UnitOfWork>>,
}

impl DocumentStore for RacingStore {
    fn capabilities(&self) -> StoreCapabilities {
        self.inner.capabilities()
    }

    fn folder(&self, id: FolderId) -> BoxFuture<'_, StoreResult<Option<Folder>>> {
        self.inner.folder(id)
    }

    fn folders_for_user(&self, user: UserId) -> BoxFuture<'_, StoreResult<Vec<Folder>>> {
        self.inner.folders_for_user(user)
    }

    fn project(&self, id: ProjectId) -> BoxFuture<'_, StoreResult<Option<Project>>> {
        self.inner.project(id)
    }

    fn projects_in_folder(&self, folder: FolderId) -> BoxFuture<'_, StoreResult<Vec<Project>>> {
        self.inner.projects_in_folder(folder)
    }

    fn projects_for_user(&self, user: UserId) -> BoxFuture<'_, StoreResult<Vec<Project>>> {
        self.inner.projects_for_user(user)
    }

    fn column(&self, id: ColumnId) -> BoxFuture<'_, StoreResult<Option<Column>>> {
        self.inner.column(id)
    }

    fn columns_in_project(
        &self,
        project: ProjectId,
    ) -> BoxFuture<'_, StoreResult<Vec<Column>>> {
        self.inner.columns_in_project(project)
    }

    fn task(&self, id: TaskId) -> BoxFuture<'_, StoreResult<Option<Task>>> {
        self.inner.task(id)
    }

    fn tasks(&self, query: TaskQuery) -> BoxFuture<'_, StoreResult<Vec<Task>>> {
        self.inner.tasks(query)
    }

    fn commit(&self, unit: UnitOfWork) -> BoxFuture<'_, StoreResult<CommitReport>> {
        let competing = self.interference.lock().unwrap().take();
        Box::pin(async move {
            if let Some(competing) = competing {
                self.inner.commit(competing).await?;
            }
            self.inner.commit(unit).await
        })
    }
}

async fn racing_board() -> (Arc<RacingStore>, Board) {
    let racing = Arc::new(RacingStore {
        inner: MemoryStore::transactional(),
        interference: Mutex::new(None),
    });
    let board = board_on(racing.clone()).await;
    (racing, board)
}

impl RacingStore {
    fn before_next_commit(&self, label: &str, ops: Vec<WriteOp>) {
        let mut competing = UnitOfWork::new(label);
        competing.extend(ops);
        *self.interference.lock().unwrap() = Some(competing);
    }
}

#[tokio::test]
async fn stale_reads_are_replanned() {
    let (racing, board) = racing_board().await;
    let a = board.add_task(0, "A").await;
    board.add_task(0, "B").await;

    // Another writer appends to the column between our read and our commit.
    let intruder = board.store.task(a).await.unwrap().unwrap();
    let intruder = Task {
        id: TaskId::new(),
        title: "Intruder".to_string(),
        order_index: 2,
        ..intruder
    };
    racing.before_next_commit(
        "competing append",
        vec![WriteOp::Insert(Document::Task(intruder))],
    );

    board
        .service
        .reorder_task(board.member, a, PositionInput { order_index: 1 })
        .await
        .unwrap();
    assert_eq!(board.column_titles(0).await, vec!["B", "A", "Intruder"]);
}

#[tokio::test]
async fn tasks_never_land_in_a_column_deleted_meanwhile() {
    let (racing, board) = racing_board().await;
    let done = board.columns[3];

    racing.before_next_commit("competing column delete", vec![WriteOp::DeleteColumn(done)]);
    let err = board
        .service
        .create_task(board.member, board.project, new_task(done, "Orphan"))
        .await
        .expect_err("column is gone");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(
        board
            .store
            .tasks(TaskQuery::project(board.project))
            .await
            .unwrap()
            .is_empty()
    );

    let a = board.add_task(0, "A").await;
    racing.before_next_commit(
        "competing column delete",
        vec![WriteOp::DeleteColumn(board.columns[2])],
    );
    let err = board
        .service
        .move_task(board.member, a, MoveTaskInput { column_id: board.columns[2] })
        .await
        .expect_err("column is gone");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(board.column_titles(0).await, vec!["A"]);
}

#[tokio::test]
async fn updates_into_a_deleted_column_are_refused() {
    let (racing, board) = racing_board().await;
    let a = board.add_task(0, "A").await;

    racing.before_next_commit(
        "competing column delete",
        vec![WriteOp::DeleteColumn(board.columns[1])],
    );
    let err = board
        .service
        .update_task(
            board.member,
            a,
            TaskUpdate {
                column_id: board.columns[1],
                title: Some("Moved".to_string()),
                description: None,
                priority: None,
                due_date: None,
                assignees: None,
            },
        )
        .await
        .expect_err("column is gone");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let stored = board.store.task(a).await.unwrap().unwrap();
    assert_eq!(stored.column_id, board.columns[0]);
    assert_eq!(stored.title, "A");
}

#[tokio::test]
async fn concurrent_assignments_are_both_kept() {
    let (racing, board) = racing_board().await;
    let a = board.add_task(0, "A").await;

    let mut theirs = board.store.task(a).await.unwrap().unwrap();
    theirs.assignees.push(board.owner);
    theirs.updated_at = Utc::now();
    racing.before_next_commit(
        "competing assignment",
        vec![WriteOp::Replace(Document::Task(theirs))],
    );

    board
        .service
        .add_assignee(board.member, a, AssigneeInput { assignee_id: board.member })
        .await
        .unwrap();
    let stored = board.store.task(a).await.unwrap().unwrap();
    assert_eq!(stored.assignees, vec![board.owner, board.member]);
}

#[tokio::test]
async fn concurrent_folder_member_edits_are_both_kept() {
    let (racing, board) = racing_board().await;

    let mut theirs = board.store.folder(board.folder).await.unwrap().unwrap();
    theirs.members.push(board.outsider);
    racing.before_next_commit(
        "competing invite",
        vec![WriteOp::Replace(Document::Folder(theirs))],
    );

    let view = board
        .service
        .remove_folder_member(board.owner, board.folder, board.member)
        .await
        .unwrap();
    assert_eq!(view.id, board.folder);
    let stored = board.store.folder(board.folder).await.unwrap().unwrap();
    assert_eq!(stored.members, vec![board.outsider]);
}

#[tokio::test]
async fn folder_delete_takes_projects_created_meanwhile() {
    let (racing, board) = racing_board().await;

    let folder = board.store.folder(board.folder).await.unwrap().unwrap();
    let late = Project::new("Late".to_string(), String::new(), &folder);
    racing.before_next_commit(
        "competing project",
        vec![WriteOp::Insert(Document::Project(late.clone()))],
    );

    let mut removal = board.service.delete_folder(board.owner, board.folder).await.unwrap();
    removal.projects.sort();
    let mut expected = vec![board.project, late.id];
    expected.sort();
    assert_eq!(removal.projects, expected);
    assert!(board.store.project(late.id).await.unwrap().is_none());
    assert!(board.store.projects_in_folder(board.folder).await.unwrap().is_empty());
}

#[tokio::test]
async fn parents_deleted_meanwhile_take_no_new_children() {
    let (racing, board) = racing_board().await;
    let spare = board
        .service
        .create_folder(
            board.owner,
            NewFolder {
                name: "Spare".to_string(),
                description: String::new(),
            },
        )
        .await
        .unwrap();

    racing.before_next_commit(
        "competing folder delete",
        vec![WriteOp::DeleteFolder(spare.id)],
    );
    let err = board
        .service
        .create_project(
            board.owner,
            spare.id,
            NewProject {
                name: "Stray".to_string(),
                description: String::new(),
            },
        )
        .await
        .expect_err("folder is gone");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(board.store.projects_in_folder(spare.id).await.unwrap().is_empty());

    racing.before_next_commit(
        "competing project delete",
        vec![
            WriteOp::DeleteColumnsInProjects(vec![board.project]),
            WriteOp::DeleteProjects(vec![board.project]),
        ],
    );
    let err = board
        .service
        .create_column(
            board.member,
            board.project,
            NewColumn {
                name: "Blocked".to_string(),
            },
        )
        .await
        .expect_err("project is gone");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(board.store.columns_in_project(board.project).await.unwrap().is_empty());
}
