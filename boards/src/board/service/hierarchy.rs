// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::inputs::{MemberInput, NewFolder, NewProject, ProjectStatusInput};
use super::{BoardService, validated};
use crate::board::access::{require_folder_owner, require_project_owner};
use crate::board::model::{
    Column, DEFAULT_COLUMNS, Folder, FolderId, Project, ProjectId, UserId, push_unique,
};
use crate::board::projection::{FolderView, ProjectView, folder_view, project_view};
use crate::board::{Planned, commit_with_retry};
use crate::error::{ServiceError, ServiceResult};
use crate::store::{Document, Precondition, UnitOfWork, WriteOp};
use chrono::Utc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRemoval {
    pub folder_id: FolderId,
    pub projects: Vec<ProjectId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectRemoval {
    pub project_id: ProjectId,
    pub folder_id: FolderId,
}

fn admit(owner: UserId, members: &mut Vec<UserId>, user: UserId) -> ServiceResult<()> {
    if owner == user {
        return Err(ServiceError::bad_request(
            "The owner cannot be added as a member",
        ));
    }
    if !push_unique(members, user) {
        return Err(ServiceError::conflict("User is already a member"));
    }
    Ok(())
}

fn dismiss(members: &mut Vec<UserId>, user: UserId) -> ServiceResult<()> {
    let position = members
        .iter()
        .position(|member| *member == user)
        .ok_or_else(|| ServiceError::not_found("User is not a member"))?;
    members.remove(position);
    Ok(())
}

impl BoardService {
    pub async fn create_folder(&self, user: UserId, input: NewFolder) -> ServiceResult<FolderView> {
        validated(&input)?;
        let folder = Folder::new(input.name.trim().to_string(), input.description, user);
        let mut unit = UnitOfWork::new("create folder");
        unit.push(WriteOp::Insert(Document::Folder(folder.clone())));
        self.commit(unit).await?;
        log::debug!("User {} created folder {}", user, folder.id);
        Ok(folder_view(self.directory(), &folder))
    }

    pub async fn list_folders(&self, user: UserId) -> ServiceResult<Vec<FolderView>> {
        let folders = self.store.folders_for_user(user).await?;
        Ok(folders
            .iter()
            .map(|folder| folder_view(self.directory(), folder))
            .collect())
    }

    pub async fn get_folder(&self, user: UserId, id: FolderId) -> ServiceResult<FolderView> {
        let folder = self.gate.folder(user, id).await?;
        Ok(folder_view(self.directory(), &folder))
    }

    pub async fn delete_folder(&self, user: UserId, id: FolderId) -> ServiceResult<FolderRemoval> {
        let folder = self.gate.folder(user, id).await?;
        require_folder_owner(&folder, user)?;
        let projects = self.cascade.delete_folder(&folder).await?;
        Ok(FolderRemoval {
            folder_id: folder.id,
            projects,
        })
    }

    pub async fn add_folder_member(
        &self,
        user: UserId,
        id: FolderId,
        input: MemberInput,
    ) -> ServiceResult<FolderView> {
        let folder = self.gate.folder(user, id).await?;
        require_folder_owner(&folder, user)?;
        self.require_user(input.user_id)?;
        let folder = self
            .edit_folder(folder.id, |folder| {
                admit(folder.owner, &mut folder.members, input.user_id)
            })
            .await?;
        log::debug!("User {} joined folder {}", input.user_id, folder.id);
        Ok(folder_view(self.directory(), &folder))
    }

    pub async fn remove_folder_member(
        &self,
        user: UserId,
        id: FolderId,
        member: UserId,
    ) -> ServiceResult<FolderView> {
        let folder = self.gate.folder(user, id).await?;
        require_folder_owner(&folder, user)?;
        let folder = self
            .edit_folder(folder.id, |folder| dismiss(&mut folder.members, member))
            .await?;
        log::debug!("User {} left folder {}", member, folder.id);
        Ok(folder_view(self.directory(), &folder))
    }

    /// Applies `edit` to the stored folder, again on a fresh read whenever
    /// another writer got there first.
    async fn edit_folder<F>(&self, id: FolderId, edit: F) -> ServiceResult<Folder>
    where
        F: Fn(&mut Folder) -> ServiceResult<()> + Sync,
    {
        let edit = &edit;
        let (folder, _) = commit_with_retry(self.store.as_ref(), move || {
            Box::pin(async move {
                let observed = self
                    .store
                    .folder(id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Folder not found"))?;
                let mut folder = observed.clone();
                edit(&mut folder)?;
                folder.updated_at = Utc::now();

                let mut unit = UnitOfWork::new(format!("update folder {}", id));
                unit.push(WriteOp::Check(Precondition::Unchanged(Document::Folder(
                    observed,
                ))))
                .push(WriteOp::Replace(Document::Folder(folder.clone())));
                ServiceResult::Ok(Planned::new(unit, folder))
            })
        })
        .await?;
        Ok(folder)
    }

    /// New projects start with the default columns in board order.
    pub async fn create_project(
        &self,
        user: UserId,
        folder_id: FolderId,
        input: NewProject,
    ) -> ServiceResult<ProjectView> {
        validated(&input)?;
        let folder = self.gate.folder(user, folder_id).await?;
        let name = input.name.trim().to_string();
        let description = input.description;
        let folder_id = folder.id;
        let (project, _) = commit_with_retry(self.store.as_ref(), move || {
            let name = name.clone();
            let description = description.clone();
            Box::pin(async move {
                let folder = self
                    .store
                    .folder(folder_id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Folder not found"))?;
                let project = Project::new(name, description, &folder);

                let mut unit = UnitOfWork::new(format!("create project in folder {}", folder.id));
                unit.push(WriteOp::Check(Precondition::FolderExists(folder.id)))
                    .push(WriteOp::Insert(Document::Project(project.clone())));
                unit.extend(DEFAULT_COLUMNS.iter().enumerate().map(|(index, name)| {
                    WriteOp::Insert(Document::Column(Column::new(
                        name.to_string(),
                        project.id,
                        index as u32,
                    )))
                }));
                ServiceResult::Ok(Planned::new(unit, project))
            })
        })
        .await?;
        log::debug!(
            "User {} created project {} in folder {}",
            user,
            project.id,
            folder.id
        );
        Ok(project_view(self.directory(), &project))
    }

    pub async fn list_projects(
        &self,
        user: UserId,
        folder_id: FolderId,
    ) -> ServiceResult<Vec<ProjectView>> {
        let folder = self.gate.folder(user, folder_id).await?;
        let projects = self.store.projects_in_folder(folder.id).await?;
        Ok(projects
            .iter()
            .map(|project| project_view(self.directory(), project))
            .collect())
    }

    pub async fn get_project(&self, user: UserId, id: ProjectId) -> ServiceResult<ProjectView> {
        let access = self.gate.project(user, id).await?;
        Ok(project_view(self.directory(), &access.project))
    }

    pub async fn update_project_status(
        &self,
        user: UserId,
        id: ProjectId,
        input: ProjectStatusInput,
    ) -> ServiceResult<ProjectView> {
        let project = self.gate.project(user, id).await?.project;
        require_project_owner(&project, user)?;
        let status = input.status;
        let project = self
            .edit_project(project.id, |project| {
                project.status = status;
                Ok(())
            })
            .await?;
        Ok(project_view(self.directory(), &project))
    }

    pub async fn delete_project(
        &self,
        user: UserId,
        id: ProjectId,
    ) -> ServiceResult<ProjectRemoval> {
        let project = self.gate.project(user, id).await?.project;
        require_project_owner(&project, user)?;
        self.cascade.delete_project(project.id).await?;
        Ok(ProjectRemoval {
            project_id: project.id,
            folder_id: project.folder_id,
        })
    }

    pub async fn add_project_member(
        &self,
        user: UserId,
        id: ProjectId,
        input: MemberInput,
    ) -> ServiceResult<ProjectView> {
        let project = self.gate.project(user, id).await?.project;
        require_project_owner(&project, user)?;
        self.require_user(input.user_id)?;
        let project = self
            .edit_project(project.id, |project| {
                admit(project.owner, &mut project.members, input.user_id)
            })
            .await?;
        log::debug!("User {} joined project {}", input.user_id, project.id);
        Ok(project_view(self.directory(), &project))
    }

    pub async fn remove_project_member(
        &self,
        user: UserId,
        id: ProjectId,
        member: UserId,
    ) -> ServiceResult<ProjectView> {
        let project = self.gate.project(user, id).await?.project;
        require_project_owner(&project, user)?;
        let project = self
            .edit_project(project.id, |project| dismiss(&mut project.members, member))
            .await?;
        log::debug!("User {} left project {}", member, project.id);
        Ok(project_view(self.directory(), &project))
    }

    async fn edit_project<F>(&self, id: ProjectId, edit: F) -> ServiceResult<Project>
    where
        F: Fn(&mut Project) -> ServiceResult<()> + Sync,
    {
        let edit = &edit;
        let (project, _) = commit_with_retry(self.store.as_ref(), move || {
            Box::pin(async move {
                let observed = self.load_project(id).await?;
                let mut project = observed.clone();
                edit(&mut project)?;
                project.updated_at = Utc::now();

                let mut unit = UnitOfWork::new(format!("update project {}", id));
                unit.push(WriteOp::Check(Precondition::Unchanged(Document::Project(
                    observed,
                ))))
                .push(WriteOp::Replace(Document::Project(project.clone())));
                ServiceResult::Ok(Planned::new(unit, project))
            })
        })
        .await?;
        Ok(project)
    }
}
